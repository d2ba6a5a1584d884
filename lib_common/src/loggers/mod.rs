//! # Loggers
//!
//! `tracing` subscriber setup shared by every binary in the workspace.

/// Console plus daily-rolling JSON file logging.
pub mod tracing_setup;

pub use tracing_setup::{LogOptions, LoggingError, parse_filter, setup_logging};
