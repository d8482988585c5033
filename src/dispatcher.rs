//! Routes commands to handlers by name

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::command::Command;
use crate::config::Config;
use crate::context::ContextMemory;
use crate::executor::ActionExecutor;

/// Everything a handler may touch during one dispatch
pub struct ActionContext<'a> {
    pub memory: &'a mut ContextMemory,
    pub exec: &'a dyn ActionExecutor,
    pub config: Arc<Config>,
}

pub type Handler = Box<dyn Fn(&Command, &mut ActionContext<'_>) -> anyhow::Result<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    Failed,
    NoHandler,
}

#[derive(Default)]
pub struct CommandDispatcher {
    handlers: HashMap<String, Handler>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler; replaces any existing one for `name`
    pub fn register_handler(&mut self, name: impl Into<String>, handler: Handler) {
        let name = name.into();
        if self.handlers.insert(name.clone(), handler).is_some() {
            debug!("handler for {} replaced", name);
        }
    }

    #[cfg(test)]
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn dispatch(&self, command: &Command, ctx: &mut ActionContext<'_>) -> DispatchOutcome {
        let Some(handler) = self.handlers.get(&command.name) else {
            if command.kind().is_none() {
                warn!("no handler for {} (not a known command)", command.name);
            } else {
                warn!("no handler for {}", command.name);
            }
            return DispatchOutcome::NoHandler;
        };

        debug!("dispatch {} {:?}", command.name, command.args);
        match handler(command, ctx) {
            Ok(()) => DispatchOutcome::Handled,
            Err(e) => {
                error!("{}: {:#}", command.name, e);
                DispatchOutcome::Failed
            }
        }
    }
}
