//! # lib_common
//!
//! Shared plumbing for the recipes services. Every top-level module sits
//! behind a cargo feature of the same name so that binaries only pull in the
//! drivers they actually use.
//!
//! - **`connections`**: pooled PostgreSQL access (`deadpool-postgres`).
//! - **`loggers`**: `tracing` subscriber setup with console and rolling JSON file output.
//! - **`scheduler`**: cron-driven recurring jobs (`tokio-cron-scheduler`).

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Connections to external services (databases).
#[cfg(feature = "connections")]
pub mod connections;

/// Logging initialisation.
#[cfg(feature = "loggers")]
pub mod loggers;

/// Recurring cron jobs.
#[cfg(feature = "scheduler")]
pub mod scheduler;
