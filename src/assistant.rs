//! The transcript-to-action pipeline
//!
//! Chunks of recognized speech accumulate in a rolling buffer. Every
//! `detect_interval` the tail of that buffer is examined: a quick keyword
//! match wins outright, otherwise the remote parser gets a shot. Commands
//! found are dispatched once, then the buffer is cleared so the next cycle
//! only sees new speech.

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::buffer::TextBuffer;
use crate::command::Command;
use crate::config::Config;
use crate::context::ContextMemory;
use crate::detector::{KeywordDetector, defers_to_url};
use crate::dispatcher::{ActionContext, CommandDispatcher};
use crate::executor::ActionExecutor;
use crate::remote::RemoteIntentParser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantOptions {
    pub buffer_max_chars: usize,
    pub tail_chars: usize,
    pub detect_interval: Duration,
    pub llm_enabled: bool,
}

impl Default for AssistantOptions {
    fn default() -> Self {
        Self {
            buffer_max_chars: 2000,
            tail_chars: 250,
            detect_interval: Duration::from_millis(700),
            llm_enabled: true,
        }
    }
}

impl AssistantOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            buffer_max_chars: config.buffer_max_chars,
            tail_chars: config.tail_chars,
            detect_interval: config.detect_interval(),
            llm_enabled: config.llm_enabled,
        }
    }
}

/// What one detection cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectOutcome {
    /// Nothing but whitespace in the tail
    Blank,
    NoCommands,
    /// Same tail as the last dispatch; skipped
    Duplicate,
    Dispatched(usize),
}

pub struct Assistant {
    options: AssistantOptions,
    buffer: TextBuffer,
    detector: KeywordDetector,
    remote: Option<RemoteIntentParser>,
    dispatcher: CommandDispatcher,
    memory: ContextMemory,
    exec: Arc<dyn ActionExecutor>,
    config: Arc<ArcSwap<Config>>,
    last_detect: Instant,
    last_executed_tail: Option<String>,
    stop: Arc<AtomicBool>,
}

impl Assistant {
    pub fn new(
        options: AssistantOptions,
        config: Arc<ArcSwap<Config>>,
        detector: KeywordDetector,
        dispatcher: CommandDispatcher,
        remote: Option<RemoteIntentParser>,
        exec: Arc<dyn ActionExecutor>,
    ) -> Self {
        Self {
            buffer: TextBuffer::new(options.buffer_max_chars),
            options,
            detector,
            remote,
            dispatcher,
            memory: ContextMemory::new(),
            exec,
            config,
            last_detect: Instant::now(),
            last_executed_tail: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Feed one chunk of transcript; runs detection when the debounce allows
    pub fn on_chunk(&mut self, text: &str) -> Option<DetectOutcome> {
        if self.should_stop() {
            return None;
        }
        self.buffer.add(text);
        if self.last_detect.elapsed() < self.options.detect_interval {
            return None;
        }
        Some(self.detect())
    }

    /// One detection cycle over the buffer tail
    pub fn detect(&mut self) -> DetectOutcome {
        if self.buffer.is_empty() {
            return DetectOutcome::Blank;
        }
        let tail = self.buffer.tail(self.options.tail_chars);
        if tail.trim().is_empty() {
            return DetectOutcome::Blank;
        }
        self.last_detect = Instant::now();
        debug!("detect over {} of {} buffered bytes", tail.len(), self.buffer.len());

        let config = self.config.load_full();
        let commands = self.resolve(&tail, &config);
        if commands.is_empty() {
            debug!("no commands in: {}", tail);
            return DetectOutcome::NoCommands;
        }

        if self.last_executed_tail.as_deref() == Some(tail.as_str()) {
            debug!("tail unchanged since last dispatch, skipping");
            return DetectOutcome::Duplicate;
        }
        self.last_executed_tail = Some(tail);

        let mut ctx = ActionContext {
            memory: &mut self.memory,
            exec: self.exec.as_ref(),
            config,
        };
        for command in &commands {
            info!("command: {} {:?}", command.name, command.args);
            self.dispatcher.dispatch(command, &mut ctx);
        }

        self.buffer.clear();
        DetectOutcome::Dispatched(commands.len())
    }

    /// Quick keyword first; the remote parser only when that found nothing
    fn resolve(&self, tail: &str, config: &Config) -> Vec<Command> {
        let quick = self
            .detector
            .detect_intent(tail)
            .filter(|intent| {
                let defer = defers_to_url(intent, tail, &config.url_override_apps);
                if defer {
                    debug!("{} deferred: text looks like a web address", intent);
                }
                !defer
            });

        if let Some(intent) = quick {
            return vec![Command::new(intent, tail)];
        }

        match &self.remote {
            Some(remote) if self.options.llm_enabled => remote.parse(tail),
            _ => Vec::new(),
        }
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Shared flag for signal handlers
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn memory(&self) -> &ContextMemory {
        &self.memory
    }
}
