//! Lookup tables and data-driven functions for Jarvis
//!
//! This module contains the "data" parts of Jarvis:
//! - Spoken app name -> executable normalization (English and Russian)
//! - Executable -> window title query for wmctrl matching
//! - Quick-launch intent -> app
//! - Terminal emulator candidates and their exec flags
//! - Install hints for missing tools

use std::collections::HashMap;

/// Map whatever the user (or the model) called an app onto an executable name
/// Includes common STT variants; anything unrecognized passes through
pub fn normalize_app_name(raw: &str) -> String {
    let s = raw.trim().to_lowercase();
    let has = |needle: &str| s.contains(needle);

    if has("spot") || has("спот") {
        return "spotify".to_string();
    }
    if has("telegram") || has("телеграм") || has("телега") || s == "tg" {
        return "telegram-desktop".to_string();
    }
    if has("discord") || has("дискорд") || s == "дс" {
        return "discord".to_string();
    }
    if has("steam") || has("стим") {
        return "steam".to_string();
    }
    if has("firefox") || has("браузер") || has("mozilla") || has("файерфокс") || s == "browser" {
        return "firefox".to_string();
    }
    if has("chromium") {
        return "chromium".to_string();
    }
    if has("chrome") || has("хром") {
        return "google-chrome".to_string();
    }
    if has("visual studio code") || has("vs code") || has("vscode") || has("вскод") || has("вс код") || s == "code" || s == "вс" {
        return "code".to_string();
    }
    if has("gnome terminal") || has("gnome-terminal") || has("terminal") || has("терминал") || has("console") {
        return "terminal".to_string();
    }

    raw.trim().to_string()
}

/// Title fragment wmctrl should look for when closing an app's window
pub fn app_to_window_query(app: &str) -> String {
    let lower = app.to_lowercase();
    match lower.as_str() {
        "google-chrome" | "chrome" => return "chrome".to_string(),
        "telegram-desktop" | "telegram" => return "telegram".to_string(),
        "code" | "vscode" => return "visual studio code".to_string(),
        _ => {}
    }

    const CONTAINS: &[(&str, &str)] = &[
        ("visual", "visual studio code"),
        ("firefox", "firefox"),
        ("discord", "discord"),
        ("spotify", "spotify"),
        ("steam", "steam"),
        ("konsole", "konsole"),
        ("terminal", "terminal"),
    ];
    CONTAINS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, query)| query.to_string())
        .unwrap_or_else(|| app.to_string())
}

/// App launched by a fast-path quick intent
pub fn quick_launch_app(intent: &str) -> Option<&'static str> {
    match intent {
        "open_spotify" => Some("spotify"),
        "open_browser" => Some("firefox"),
        "open_telegram" => Some("telegram-desktop"),
        "open_discord" => Some("discord"),
        "open_steam" => Some("steam"),
        "open_vscode" => Some("code"),
        _ => None,
    }
}

pub const QUICK_LAUNCH_INTENTS: &[&str] = &[
    "open_spotify",
    "open_browser",
    "open_telegram",
    "open_discord",
    "open_steam",
    "open_vscode",
];

/// Tried in order after JARVIS_TERMINAL, the configured default, and gnome-terminal
pub const TERMINAL_CANDIDATES: &[&str] = &[
    "x-terminal-emulator",
    "konsole",
    "kitty",
    "alacritty",
    "xfce4-terminal",
    "tilix",
    "xterm",
];

/// Flag that separates the terminal's own args from the command to run
pub fn terminal_exec_flag(term: &str) -> &'static str {
    if term.contains("gnome-terminal") || term.contains("xfce4-terminal") || term.contains("tilix") {
        "--"
    } else {
        "-e"
    }
}

/// Small conveniences for spoken URLs
pub fn expand_url_alias(url: &str) -> Option<&'static str> {
    match url.trim().to_lowercase().as_str() {
        "gmail" => Some("https://mail.google.com"),
        "youtube" => Some("https://youtube.com"),
        _ => None,
    }
}

/// Package hint shown when an external tool is missing (Ubuntu names)
pub fn install_hint(tool: &str) -> &'static str {
    match tool {
        "wmctrl" => "sudo apt install wmctrl",
        "playerctl" => "sudo apt install playerctl",
        "pactl" => "sudo apt install pulseaudio-utils",
        "amixer" => "sudo apt install alsa-utils",
        "wpctl" => "sudo apt install wireplumber",
        "brightnessctl" => "sudo apt install brightnessctl (and join the 'video' group)",
        "xbacklight" => "sudo apt install xbacklight",
        "nmcli" => "sudo apt install network-manager",
        "bluetoothctl" => "sudo apt install bluez",
        _ => "install it with your package manager",
    }
}

/// Default app -> command table, overridable with [apps] in config
pub fn default_app_commands() -> HashMap<String, String> {
    [
        ("steam", "steam"),
        ("telegram", "telegram-desktop"),
        ("firefox", "firefox"),
        ("browser", "firefox"),
        ("code", "code"),
        ("vscode", "code"),
        ("spotify", "spotify"),
        ("chrome", "google-chrome"),
        ("chromium", "chromium"),
        ("terminal", "gnome-terminal"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_app_name() {
        assert_eq!(normalize_app_name("Spotify"), "spotify");
        assert_eq!(normalize_app_name("спотифай"), "spotify");
        assert_eq!(normalize_app_name("Telegram Desktop"), "telegram-desktop");
        assert_eq!(normalize_app_name("гугл хром"), "google-chrome");
        assert_eq!(normalize_app_name("chromium"), "chromium");
        assert_eq!(normalize_app_name("Visual Studio Code"), "code");
        assert_eq!(normalize_app_name("терминал"), "terminal");
        assert_eq!(normalize_app_name("  gimp "), "gimp");
    }

    #[test]
    fn test_short_aliases_do_not_swallow_other_names() {
        // "tg" / "вс" / "дс" only match as whole names
        assert_eq!(normalize_app_name("settings"), "settings");
        assert_eq!(normalize_app_name("tg"), "telegram-desktop");
    }

    #[test]
    fn test_app_to_window_query() {
        assert_eq!(app_to_window_query("google-chrome"), "chrome");
        assert_eq!(app_to_window_query("telegram-desktop"), "telegram");
        assert_eq!(app_to_window_query("code"), "visual studio code");
        assert_eq!(app_to_window_query("/usr/bin/firefox"), "firefox");
        assert_eq!(app_to_window_query("gnome-terminal"), "terminal");
        assert_eq!(app_to_window_query("gimp"), "gimp");
    }

    #[test]
    fn test_quick_launch_table_is_complete() {
        for intent in QUICK_LAUNCH_INTENTS {
            assert!(quick_launch_app(intent).is_some(), "{} has no app", intent);
        }
        assert_eq!(quick_launch_app("open_terminal"), None);
    }

    #[test]
    fn test_terminal_exec_flag() {
        assert_eq!(terminal_exec_flag("gnome-terminal"), "--");
        assert_eq!(terminal_exec_flag("kitty"), "-e");
        assert_eq!(terminal_exec_flag("xterm"), "-e");
    }
}
