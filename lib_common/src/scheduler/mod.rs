//! # Scheduler
//!
//! Recurring jobs driven by cron expressions, built on `tokio-cron-scheduler`.

/// Cron expression handling and the [`RecurringJob`] handle.
pub mod cron_job;

pub use cron_job::{RecurringJob, SchedulerError, normalize_cron_expression, parse_timezone};
