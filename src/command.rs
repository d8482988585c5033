//! Commands and the closed command grammar
//!
//! A `Command` is what the detectors produce and the dispatcher consumes. Its
//! name stays a plain string on the wire (the remote parser speaks JSON), while
//! `CommandKind` is the closed set of names the handlers are wired against.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A resolved command: a name, string arguments, and the text it came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: BTreeMap<String, String>,
    pub raw_text: String,
}

impl Command {
    pub fn new(name: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: BTreeMap::new(),
            raw_text: raw_text.into(),
        }
    }

    #[cfg(test)]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Argument value, treating an empty string as absent
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// The grammar kind for this command, if the name is part of it
    pub fn kind(&self) -> Option<CommandKind> {
        self.name.parse().ok()
    }
}

/// Argument slot in the command grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: &'static str,
    pub required: bool,
}

const fn req(name: &'static str) -> ArgSpec {
    ArgSpec { name, required: true }
}

const fn opt(name: &'static str) -> ArgSpec {
    ArgSpec { name, required: false }
}

/// Every command name the remote parser may emit and the dispatcher routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    // Apps
    OpenUrl,
    OpenApp,
    CloseApp,
    OpenTerminal,

    // Media player
    MediaPlayPause,
    MediaNext,
    MediaPrev,
    MediaVolumeUp,
    MediaVolumeDown,
    MediaVolumeMute,
    MediaVolumeUnmute,
    MediaSeekForward,
    MediaSeekBackward,

    // System
    SystemVolumeUp,
    SystemVolumeDown,
    SystemVolumeMute,
    SystemVolumeUnmute,
    SystemBrightnessUp,
    SystemBrightnessDown,
    WifiOn,
    WifiOff,
    BluetoothOn,
    BluetoothOff,
    SystemLock,
    SystemShutdown,
    SystemReboot,

    // Windows
    WindowFocus,
    WindowClose,
    WindowFocusLast,
    WindowCloseLast,
    WindowInspect,
}

impl CommandKind {
    pub const ALL: [CommandKind; 31] = [
        CommandKind::OpenUrl,
        CommandKind::OpenApp,
        CommandKind::CloseApp,
        CommandKind::OpenTerminal,
        CommandKind::MediaPlayPause,
        CommandKind::MediaNext,
        CommandKind::MediaPrev,
        CommandKind::MediaVolumeUp,
        CommandKind::MediaVolumeDown,
        CommandKind::MediaVolumeMute,
        CommandKind::MediaVolumeUnmute,
        CommandKind::MediaSeekForward,
        CommandKind::MediaSeekBackward,
        CommandKind::SystemVolumeUp,
        CommandKind::SystemVolumeDown,
        CommandKind::SystemVolumeMute,
        CommandKind::SystemVolumeUnmute,
        CommandKind::SystemBrightnessUp,
        CommandKind::SystemBrightnessDown,
        CommandKind::WifiOn,
        CommandKind::WifiOff,
        CommandKind::BluetoothOn,
        CommandKind::BluetoothOff,
        CommandKind::SystemLock,
        CommandKind::SystemShutdown,
        CommandKind::SystemReboot,
        CommandKind::WindowFocus,
        CommandKind::WindowClose,
        CommandKind::WindowFocusLast,
        CommandKind::WindowCloseLast,
        CommandKind::WindowInspect,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::OpenUrl => "open_url",
            CommandKind::OpenApp => "open_app",
            CommandKind::CloseApp => "close_app",
            CommandKind::OpenTerminal => "open_terminal",
            CommandKind::MediaPlayPause => "media_play_pause",
            CommandKind::MediaNext => "media_next",
            CommandKind::MediaPrev => "media_prev",
            CommandKind::MediaVolumeUp => "media_volume_up",
            CommandKind::MediaVolumeDown => "media_volume_down",
            CommandKind::MediaVolumeMute => "media_volume_mute",
            CommandKind::MediaVolumeUnmute => "media_volume_unmute",
            CommandKind::MediaSeekForward => "media_seek_forward",
            CommandKind::MediaSeekBackward => "media_seek_backward",
            CommandKind::SystemVolumeUp => "system_volume_up",
            CommandKind::SystemVolumeDown => "system_volume_down",
            CommandKind::SystemVolumeMute => "system_volume_mute",
            CommandKind::SystemVolumeUnmute => "system_volume_unmute",
            CommandKind::SystemBrightnessUp => "system_brightness_up",
            CommandKind::SystemBrightnessDown => "system_brightness_down",
            CommandKind::WifiOn => "wifi_on",
            CommandKind::WifiOff => "wifi_off",
            CommandKind::BluetoothOn => "bluetooth_on",
            CommandKind::BluetoothOff => "bluetooth_off",
            CommandKind::SystemLock => "system_lock",
            CommandKind::SystemShutdown => "system_shutdown",
            CommandKind::SystemReboot => "system_reboot",
            CommandKind::WindowFocus => "window_focus",
            CommandKind::WindowClose => "window_close",
            CommandKind::WindowFocusLast => "window_focus_last",
            CommandKind::WindowCloseLast => "window_close_last",
            CommandKind::WindowInspect => "window_inspect",
        }
    }

    /// Argument slots, in the order they are described to the model
    pub fn args(self) -> &'static [ArgSpec] {
        const URL: &[ArgSpec] = &[req("url")];
        const NAME: &[ArgSpec] = &[req("name")];
        const APP: &[ArgSpec] = &[req("name"), opt("command")];
        const TERMINAL: &[ArgSpec] = &[opt("command")];
        const WINDOW: &[ArgSpec] = &[opt("name"), opt("id")];
        const INSPECT: &[ArgSpec] = &[opt("name")];

        match self {
            CommandKind::OpenUrl => URL,
            CommandKind::OpenApp => APP,
            CommandKind::CloseApp => NAME,
            CommandKind::OpenTerminal => TERMINAL,
            CommandKind::WindowFocus | CommandKind::WindowClose => WINDOW,
            CommandKind::WindowInspect => INSPECT,
            _ => &[],
        }
    }

    /// Short hint appended to the grammar line in the prompt
    pub fn hint(self) -> Option<&'static str> {
        match self {
            CommandKind::WindowFocus | CommandKind::WindowClose => Some("prefer id if provided"),
            CommandKind::WindowFocusLast => Some("the window touched most recently"),
            CommandKind::WindowCloseLast => Some("close 'it': the last window or app"),
            CommandKind::WindowInspect => Some("list windows, optionally highlight best match"),
            _ => None,
        }
    }

    /// Grammar line, e.g. `window_focus(name?: string, id?: string)`
    pub fn signature(self) -> String {
        let args = self
            .args()
            .iter()
            .map(|a| {
                if a.required {
                    format!("{}: string", a.name)
                } else {
                    format!("{}?: string", a.name)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({})", self.as_str(), args)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownCommand(s.to_string()))
    }
}

/// A name outside the closed grammar
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command: {0}")]
pub struct UnknownCommand(pub String);
