mod actions;
mod assistant;
mod buffer;
mod command;
mod config;
mod context;
mod detector;
mod dispatcher;
mod error;
mod executor;
mod logging;
mod lookups;
mod remote;

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::{Arc, mpsc};
use std::time::Duration;
use tracing::{debug, info, warn};

use assistant::{Assistant, AssistantOptions, DetectOutcome};
use config::{Config, spawn_watcher};
use detector::KeywordDetector;
use dispatcher::CommandDispatcher;
use executor::SystemExecutor;
use remote::{OpenAiClient, RemoteIntentParser};

/// How often the main loop wakes up to check for Ctrl-C while stdin is quiet
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Parser, Debug)]
#[command(name = "jarvis", version, about = "Voice-transcript command runner: one STT chunk per stdin line")]
struct Cli {
    /// Config file (default: search $JARVIS_CONFIG, ~/.config/jarvis, ~/.jarvis, ./config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Quick keywords only, never call the remote parser
    #[arg(long)]
    no_llm: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Only warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Print the config file that would be used and exit
    #[arg(long)]
    print_config_path: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_config_path {
        let path = cli
            .config
            .clone()
            .or_else(|| Config::search_paths().into_iter().find(|p| p.exists()))
            .or_else(Config::default_path);
        match path {
            Some(p) => println!("{}", p.display()),
            None => println!("(no config path available)"),
        }
        return Ok(());
    }

    let log = logging::init(cli.verbose, cli.quiet)?;

    let (mut config, config_path) = Config::load(cli.config.as_deref());
    if cli.no_llm {
        config.llm_enabled = false;
    }
    if config.quiet && !cli.quiet {
        log.set_quiet(true);
    }

    let options = AssistantOptions::from_config(&config);
    info!("Jarvis v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Buffer: {} chars, tail: {} chars, detect every {:?}",
        options.buffer_max_chars, options.tail_chars, options.detect_interval
    );
    if !config.apps.is_empty() {
        info!("Apps: {} loaded", config.apps.len());
    }
    if !config.keywords.is_empty() {
        info!("Extra keywords: {} loaded", config.keywords.len());
    }

    let remote = build_remote(&config, options.llm_enabled);
    let detector = KeywordDetector::with_extra(&config.keywords);
    debug!("Quick intents: {:?}", detector.intents().collect::<Vec<_>>());
    let mut dispatcher = CommandDispatcher::new();
    actions::register_all(&mut dispatcher);

    let cli_quiet = cli.quiet;
    let config = Arc::new(ArcSwap::from_pointee(config));

    // Hot-reload handler settings; pipeline sizes stay as started
    if let Some(path) = config_path {
        spawn_watcher(config.clone(), path, move |new_config| {
            log.set_quiet(new_config.quiet || cli_quiet);
        });
    }

    let mut assistant = Assistant::new(
        options,
        config.clone(),
        detector,
        dispatcher,
        remote,
        Arc::new(SystemExecutor::new()),
    );

    let stop = assistant.stop_handle();
    ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst)).context("Failed to set Ctrl-C handler")?;

    info!("Listening on stdin (one transcript chunk per line, Ctrl-C to stop)");
    let lines = spawn_stdin_reader();

    loop {
        if assistant.should_stop() {
            info!("Interrupted");
            break;
        }
        let line = match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) => line,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                // Stdin closed: give whatever is buffered one last look
                log_outcome(assistant.detect());
                break;
            }
        };

        let chunk = line.trim();
        if chunk.is_empty() {
            continue;
        }
        if config.load().is_exit_phrase(chunk) {
            info!("Exit phrase, stopping");
            assistant.stop();
            break;
        }
        if let Some(outcome) = assistant.on_chunk(chunk) {
            log_outcome(outcome);
        }
    }

    let memory = assistant.memory();
    debug!(
        "Last app: {:?}, last window: {:?}, last url: {:?}",
        memory.last_app().map(|f| &f.value),
        memory.last_window().map(|f| &f.value),
        memory.last_url()
    );
    info!("Jarvis stopped");
    Ok(())
}

fn build_remote(config: &Config, enabled: bool) -> Option<RemoteIntentParser> {
    if !enabled {
        info!("Remote parser: off (quick keywords only)");
        return None;
    }
    if config.api_key().is_none() {
        warn!(
            "{} is not set; only quick keywords will work",
            config.api_key_env
        );
    }
    match OpenAiClient::new(config) {
        Ok(client) => {
            info!("Remote parser: {} via {}", config.model, config.api_base);
            Some(RemoteIntentParser::new(Box::new(client)))
        }
        Err(e) => {
            warn!("Remote parser unavailable: {:#}", e);
            None
        }
    }
}

fn log_outcome(outcome: DetectOutcome) {
    match outcome {
        DetectOutcome::Dispatched(n) => info!("Dispatched {} command(s)", n),
        other => debug!("detect: {:?}", other),
    }
}

/// Stdin lines on a channel; the channel closes at EOF
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}
