//! Logging setup
//!
//! Everything goes to stderr so stdout stays free for whatever feeds us.
//! `RUST_LOG` always wins; otherwise the level follows `--verbose` and the
//! `quiet` config flag, and follows it again when the config is reloaded.

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
    verbose: bool,
}

pub fn init(verbose: bool, quiet: bool) -> Result<LogHandle> {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(f) => (f, true),
        Err(_) => (EnvFilter::new(directives(verbose, quiet)), false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(LogHandle {
        filter: handle,
        from_env,
        verbose,
    })
}

impl LogHandle {
    pub fn set_quiet(&self, quiet: bool) {
        if self.from_env {
            return;
        }
        if let Err(e) = self.filter.reload(EnvFilter::new(directives(self.verbose, quiet))) {
            tracing::warn!("Failed to update log level: {}", e);
        }
    }
}

/// Our own crate at the chosen level, dependencies at warn
fn directives(verbose: bool, quiet: bool) -> String {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    format!("warn,jarvis={}", level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives() {
        assert_eq!(directives(false, false), "warn,jarvis=info");
        assert_eq!(directives(false, true), "warn,jarvis=warn");
        // --verbose beats quiet
        assert_eq!(directives(true, true), "warn,jarvis=debug");
    }
}
