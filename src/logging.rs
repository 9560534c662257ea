//! Log file setup.
//!
//! The UI owns the terminal, so diagnostics never go to stdout or stderr
//! while it runs. Logging is off unless a log file is configured.

use clap::ValueEnum;
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Verbosity selectable on the command line.
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Fatal errors only.
    Error,
    /// Failed transfers and other recoverable problems.
    Warn,
    /// Startup and shutdown.
    #[default]
    Info,
    /// State transitions of the worker and the terminal.
    Debug,
    /// Every redraw and liveness check.
    Trace,
}

impl LogLevel {
    /// The matching `tracing` level filter.
    pub const fn to_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::ERROR,
            Self::Warn => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, Default)]
pub struct LogConfig {
    /// Minimum level recorded.
    pub level: LogLevel,
    /// Append log records here. `None` disables logging.
    pub file: Option<PathBuf>,
}

/// Logging setup failure.
#[derive(Debug, Error)]
pub enum LogInitError {
    /// The log file could not be opened for appending.
    #[error("failed to open log file {path:?}")]
    Io {
        /// Path that was tried.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// A global subscriber is already installed.
    #[error("failed to install logger: {0}")]
    Configure(String),
}

/// Crates whose own records are capped at `warn` so HTTP internals do not
/// drown ours.
const QUIET_DEPENDENCIES: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "h2", "mio"];

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a global subscriber
/// is already installed.
pub fn init(config: &LogConfig) -> Result<(), LogInitError> {
    let Some(path) = &config.file else {
        return Ok(());
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LogInitError::Io {
            path: path.clone(),
            source,
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config.level))
        .with_target(config.level >= LogLevel::Debug)
        .with_thread_names(config.level >= LogLevel::Debug)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| LogInitError::Configure(e.to_string()))
}

fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::new(filter_directives(level))
}

fn filter_directives(level: LogLevel) -> String {
    let level = level.to_filter();
    let mut directives = level.to_string().to_lowercase();
    if level > LevelFilter::WARN {
        for target in QUIET_DEPENDENCIES {
            let _ = write!(directives, ",{target}=warn");
        }
    }
    directives
}
