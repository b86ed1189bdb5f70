//! Logging initialisation for the `redraft` binary.
//!
//! One subscriber per process: an [`EnvFilter`], a stdout layer (text or
//! JSON) and, for commands that act on a project, a plain-text layer
//! appending to that project's `rewriter.log`.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// How the binary logs.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Log at debug level regardless of `RUST_LOG`
    pub verbose: bool,
    /// Emit JSON lines on stdout
    pub json_logs: bool,
    /// File that also receives every event, without ANSI colours
    pub log_file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Info-level text logging to stdout only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable debug logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enable JSON-formatted logs.
    pub fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }

    /// Also append to `path`.
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }

    fn filter(&self) -> Result<EnvFilter, Box<dyn std::error::Error>> {
        if self.verbose {
            return Ok(EnvFilter::try_new("debug")?);
        }
        Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?)
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// An invalid filter, an unwritable log file, or a subscriber that was
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = config.filter()?;

    let stdout_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_level(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_level(true)
            .boxed()
    };

    let file_layer = match &config.log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file))
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}
