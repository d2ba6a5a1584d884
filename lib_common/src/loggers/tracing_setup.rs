//! # Tracing Setup
//!
//! Configures the global `tracing` subscriber with two outputs:
//! - a human-readable console layer with ANSI colors and targets,
//! - a JSON file layer written through a non-blocking, daily rolling appender.
//!
//! `RUST_LOG` takes precedence over the configured level.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log directory could not be created.
    #[error("I/O error occurred: {0}")]
    Io(#[from] io::Error),
    /// The level/directive string is not a valid filter.
    #[error("Invalid log filter '{filter}': {reason}")]
    Filter {
        /// The rejected directive string.
        filter: String,
        /// Parser message.
        reason: String,
    },
    /// A global subscriber was already installed.
    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Where and how verbosely to log.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Directory for the rolling log files; created if missing.
    pub log_dir: PathBuf,
    /// File name prefix, usually the process name.
    pub file_prefix: String,
    /// Default filter directives, e.g. `info` or `info,recipes_server=debug`.
    pub level: String,
}

/// Parses a filter directive string without consulting the environment.
pub fn parse_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(level).map_err(|e| LoggingError::Filter {
        filter: level.to_string(),
        reason: e.to_string(),
    })
}

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer when dropped, so the caller
/// must keep it alive for the lifetime of the process.
pub fn setup_logging(options: &LogOptions) -> Result<WorkerGuard, LoggingError> {
    fs::create_dir_all(&options.log_dir)?;

    let file_appender = rolling::daily(&options.log_dir, &options.file_prefix);
    let (non_blocking_appender, guard) = non_blocking(file_appender);

    let console_layer = fmt::layer().with_target(true).with_ansi(true);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking_appender)
        .json();

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_filter(&options.level)?,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    info!(
        level = %options.level,
        dir = %options.log_dir.display(),
        "Logging initialized"
    );
    Ok(guard)
}
