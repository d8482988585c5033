//! Configuration for Jarvis
//!
//! TOML file, every field optional. Handler settings (browser, steps, app
//! table) are hot-reloaded; pipeline sizes are read once at startup.

use arc_swap::ArcSwap;
use notify::{RecursiveMode, Watcher, recommended_watcher};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::detector::KeywordEntry;
use crate::lookups::default_app_commands;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    // Remote intent parser
    pub model: String,
    pub api_base: String,
    pub api_key_env: String,
    pub request_timeout_secs: u64,
    pub max_tokens: u32,
    pub llm_enabled: bool,

    // Pipeline
    pub buffer_max_chars: usize,
    pub tail_chars: usize,
    pub detect_interval_ms: u64,
    pub exit_phrases: Vec<String>,
    pub url_override_apps: Vec<String>,

    // Handlers
    pub default_browser: String,
    pub default_terminal: String,
    pub volume_step_percent: u32,
    pub brightness_step_percent: u32,
    pub apps: HashMap<String, String>,
    pub keywords: Vec<KeywordEntry>,

    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: "gpt-4.1-mini".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            request_timeout_secs: 10,
            max_tokens: 256,
            llm_enabled: true,
            buffer_max_chars: 2000,
            tail_chars: 250,
            detect_interval_ms: 700,
            exit_phrases: ["exit", "quit", "q", "выход", "стоп"]
                .into_iter()
                .map(String::from)
                .collect(),
            url_override_apps: ["spotify", "telegram", "discord", "steam"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_browser: "firefox".to_string(),
            default_terminal: "gnome-terminal".to_string(),
            volume_step_percent: 5,
            brightness_step_percent: 5,
            apps: default_app_commands(),
            keywords: Vec::new(),
            quiet: false,
        }
    }
}

impl Config {
    /// Find and parse the config file, creating a default one if none exists
    pub fn load(explicit: Option<&Path>) -> (Self, Option<PathBuf>) {
        if let Some(path) = explicit {
            return match Self::load_from(path) {
                Some(config) => {
                    info!("Loaded config from: {:?}", path);
                    (config, Some(path.to_path_buf()))
                }
                None => {
                    warn!("Could not load {:?}, using default config", path);
                    (Self::default(), None)
                }
            };
        }

        for path in Self::search_paths() {
            if path.exists() {
                if let Some(config) = Self::load_from(&path) {
                    info!("Loaded config from: {:?}", path);
                    return (config, Some(path));
                }
            }
        }

        // No config found - create one at the default location
        if let Some(config_path) = Self::default_path() {
            if let Some(dir) = config_path.parent() {
                if let Err(e) = fs::create_dir_all(dir) {
                    warn!("Failed to create config directory: {}", e);
                    return (Self::default(), None);
                }
            }
            match fs::write(&config_path, Self::default_config_content()) {
                Ok(()) => {
                    info!("Created default config at: {:?}", config_path);
                    return (Self::default(), Some(config_path));
                }
                Err(e) => warn!("Failed to write default config: {}", e),
            }
        }

        info!("Using default config");
        (Self::default(), None)
    }

    /// $JARVIS_CONFIG, then the XDG location, ~/.jarvis, and ./config.toml
    pub fn search_paths() -> Vec<PathBuf> {
        [
            std::env::var_os("JARVIS_CONFIG").map(PathBuf::from),
            Self::default_path(),
            dirs::home_dir().map(|p| p.join(".jarvis").join("config.toml")),
            Some(PathBuf::from("config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("jarvis").join("config.toml"))
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        let contents = fs::read_to_string(path).ok()?;
        match Self::parse(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                error!("Config parse error in {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn volume_step(&self) -> u32 {
        if self.volume_step_percent > 0 { self.volume_step_percent } else { 5 }
    }

    pub fn brightness_step(&self) -> u32 {
        if self.brightness_step_percent > 0 { self.brightness_step_percent } else { 5 }
    }

    /// Browser to open URLs with: $JARVIS_BROWSER, then default_browser
    pub fn browser(&self) -> String {
        std::env::var("JARVIS_BROWSER")
            .ok()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| {
                if self.default_browser.trim().is_empty() {
                    "firefox".to_string()
                } else {
                    self.default_browser.clone()
                }
            })
    }

    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.trim().is_empty())
    }

    /// Command line for an app name, via the [apps] table (with ~ and $VAR expansion)
    pub fn app_command(&self, name: &str) -> String {
        let key = name.trim().to_lowercase();
        match self.apps.get(&key) {
            Some(cmd) => shellexpand::full(cmd)
                .map(|c| c.into_owned())
                .unwrap_or_else(|e| {
                    warn!("Could not expand app command '{}': {}", cmd, e);
                    cmd.clone()
                }),
            None => name.trim().to_string(),
        }
    }

    pub fn detect_interval(&self) -> Duration {
        Duration::from_millis(self.detect_interval_ms)
    }

    pub fn is_exit_phrase(&self, line: &str) -> bool {
        let lower = line.trim().to_lowercase();
        !lower.is_empty() && self.exit_phrases.iter().any(|p| p.trim().to_lowercase() == lower)
    }

    pub fn default_config_content() -> &'static str {
        r##"# Jarvis Configuration
# Edit this file to customize your settings.
# Handler settings are hot-reloaded; pipeline sizes need a restart.

# Remote intent parser (used when no quick keyword matches)
# The API key is read from the environment variable named here
model = "gpt-4.1-mini"
api_base = "https://api.openai.com/v1"
api_key_env = "OPENAI_API_KEY"
request_timeout_secs = 10
max_tokens = 256
llm_enabled = true

# Rolling transcript buffer and detection debounce
buffer_max_chars = 2000
tail_chars = 250
detect_interval_ms = 700

# A stdin line that is exactly one of these stops Jarvis
exit_phrases = ["exit", "quit", "q", "выход", "стоп"]

# Quick-launch intents that yield to the remote parser when the text
# looks like a web address for the same app ("spotify dot com")
url_override_apps = ["spotify", "telegram", "discord", "steam"]

# Browser for open_url ($JARVIS_BROWSER wins)
default_browser = "firefox"

# Terminal for open_terminal ($JARVIS_TERMINAL wins)
default_terminal = "gnome-terminal"

volume_step_percent = 5
brightness_step_percent = 5

# Only log warnings and errors
quiet = false

# App name -> command line
# Supports ~ and $ENV_VAR expansion
[apps]
steam = "steam"
telegram = "telegram-desktop"
firefox = "firefox"
browser = "firefox"
code = "code"
vscode = "code"
spotify = "spotify"
chrome = "google-chrome"
chromium = "chromium"
terminal = "gnome-terminal"

# Extra quick keywords, checked after the built-in ones
# [[keywords]]
# intent = "media_play_pause"
# patterns = ["pause the music", "resume the music"]
"##
    }
}

/// Watch the config file and publish new snapshots on change
pub fn spawn_watcher(config: Arc<ArcSwap<Config>>, path: PathBuf, on_reload: impl Fn(&Config) + Send + 'static) {
    std::thread::spawn(move || {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut watcher = match recommended_watcher(tx) {
            Ok(w) => w,
            Err(e) => {
                error!("Failed to create config watcher: {}", e);
                return;
            }
        };
        if let Err(e) = watcher.watch(&path, RecursiveMode::NonRecursive) {
            error!("Failed to watch config file: {}", e);
            return;
        }
        info!("Watching config for changes: {:?}", path);

        for event in rx.into_iter().flatten() {
            if event.kind.is_modify() {
                // Editors write in bursts; let the file settle
                std::thread::sleep(Duration::from_millis(100));
                if let Some(new_config) = Config::load_from(&path) {
                    on_reload(&new_config);
                    config.store(Arc::new(new_config));
                    info!("Config reloaded");
                }
            }
        }
    });
}
