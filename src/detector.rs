//! Fast-path intent detection
//!
//! Plain substring matching over lowercased text. Intents are checked in the
//! order they were registered and the first one with any matching pattern
//! wins, so specific intents must be registered before general ones.

use serde::Deserialize;

/// One intent and the literal phrases that trigger it
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct KeywordEntry {
    pub intent: String,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct KeywordDetector {
    patterns: Vec<(String, Vec<String>)>,
}

impl KeywordDetector {
    /// Build from (intent, patterns) pairs; patterns are lowercased here
    pub fn new<I, S, P>(patterns: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<P>)>,
        S: Into<String>,
        P: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|(intent, pats)| {
                let pats = pats.iter().map(|p| p.as_ref().to_lowercase()).collect();
                (intent.into(), pats)
            })
            .collect();
        Self { patterns }
    }

    /// Built-in quick intents followed by any extra entries from config
    pub fn with_extra(extra: &[KeywordEntry]) -> Self {
        let mut detector = Self::new(default_patterns());
        for entry in extra {
            detector.register(&entry.intent, &entry.patterns);
        }
        detector
    }

    /// Append an intent at the lowest precedence
    pub fn register(&mut self, intent: &str, patterns: &[String]) {
        let pats = patterns.iter().map(|p| p.to_lowercase()).collect();
        self.patterns.push((intent.to_string(), pats));
    }

    pub fn detect_intent(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.patterns
            .iter()
            .find(|(_, pats)| pats.iter().any(|p| !p.is_empty() && lowered.contains(p.as_str())))
            .map(|(intent, _)| intent.as_str())
    }

    pub fn intents(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(intent, _)| intent.as_str())
    }
}

impl Default for KeywordDetector {
    fn default() -> Self {
        Self::new(default_patterns())
    }
}

/// Quick-launch intents; more specific phrases come first within an intent
pub fn default_patterns() -> Vec<(&'static str, Vec<&'static str>)> {
    vec![
        ("open_spotify", vec!["open spotify", "spotify", "спотифай", "включи спотифай"]),
        ("open_browser", vec!["open browser", "open firefox", "открой браузер", "открой хром"]),
        ("open_telegram", vec!["open telegram", "открой телеграм", "телега"]),
        ("open_discord", vec!["open discord", "открой дискорд"]),
        ("open_steam", vec!["open steam", "открой стим"]),
        (
            "open_terminal",
            vec![
                "open terminal",
                "terminal",
                "new terminal",
                "new terminal window",
                "открой терминал",
                "новое окно терминала",
                "open console",
                "open command line",
            ],
        ),
        (
            "open_vscode",
            vec![
                "open vs code",
                "open vscode",
                "open visual studio code",
                "new vs code window",
                "открой вс код",
                "открой визуал студио код",
                "открой вс",
            ],
        ),
    ]
}

const SPOKEN_TLDS: &[&str] = &["dot com", "dot net", "dot org", "dot io", "www", "http"];

/// True when a quick-launch hit should be handed to the slow path instead
///
/// Applies only to `open_<app>` intents whose `<app>` is in `override_apps`,
/// and only when the text also reads like a web address for that app
/// ("spotify.com", "spotify dot com", "www spotify").
pub fn defers_to_url(intent: &str, text: &str, override_apps: &[String]) -> bool {
    let Some(app) = intent.strip_prefix("open_") else {
        return false;
    };
    if !override_apps.iter().any(|a| a.eq_ignore_ascii_case(app)) {
        return false;
    }

    let lowered = text.to_lowercase();
    if !lowered.contains(app) {
        return false;
    }
    if has_domain_suffix(&lowered, app) {
        return true;
    }
    SPOKEN_TLDS.iter().any(|cue| lowered.contains(cue))
}

// "<app>." followed by at least two letters, e.g. "spotify.com", "open.spotify.com"
fn has_domain_suffix(lowered: &str, app: &str) -> bool {
    let needle = format!("{}.", app);
    lowered.match_indices(&needle).any(|(idx, _)| {
        let rest = &lowered[idx + needle.len()..];
        rest.chars().take_while(|c| c.is_ascii_alphabetic()).count() >= 2
    })
}
