//! Error types for actions and the context layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("{tool} not found ({hint})")]
    ToolMissing { tool: String, hint: &'static str },

    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: String },

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command}: missing {arg}")]
    MissingArg { command: &'static str, arg: &'static str },

    #[error("no window matching '{0}'")]
    NoWindow(String),

    #[error("no last window or app instance remembered")]
    NothingRemembered,

    #[error("failed to close last window/app")]
    CloseFailed,

    #[error("signal {signal} to pid {pid} failed: {source}")]
    Signal {
        pid: u32,
        signal: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl ActionError {
    pub fn tool_missing(tool: &str) -> Self {
        ActionError::ToolMissing {
            tool: tool.to_string(),
            hint: crate::lookups::install_hint(tool),
        }
    }
}
