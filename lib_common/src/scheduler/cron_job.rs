//! # Cron Jobs
//!
//! A [`RecurringJob`] owns its own `JobScheduler` with exactly one cron job on
//! it. The handle is created explicitly by startup code and shut down
//! explicitly; there is no process-global scheduler.
//!
//! Expressions may use the classic 5-field form (`min hour dom month dow`)
//! or the seconds-first 6/7-field form understood by the scheduler. A
//! 5-field expression fires at second zero.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tokio_cron_scheduler::{JobBuilder, JobScheduler};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Errors raised while configuring or driving a recurring job.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The cron expression could not be parsed.
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidExpression {
        /// The rejected expression.
        expression: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The timezone name is not in the IANA database.
    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),
    /// The underlying scheduler failed.
    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

fn scheduler_error(e: impl std::fmt::Debug) -> SchedulerError {
    SchedulerError::Scheduler(format!("{e:?}"))
}

/// Converts an expression to the seconds-first form used by the scheduler.
pub fn normalize_cron_expression(expression: &str) -> Result<String, SchedulerError> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    match fields.len() {
        5 => Ok(format!("0 {}", fields.join(" "))),
        6 | 7 => Ok(fields.join(" ")),
        n => Err(SchedulerError::InvalidExpression {
            expression: expression.to_string(),
            reason: format!("expected 5, 6 or 7 fields, found {n}"),
        }),
    }
}

/// Looks up an IANA timezone by name (e.g. `UTC`, `Europe/Athens`).
pub fn parse_timezone(name: &str) -> Result<Tz, SchedulerError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| SchedulerError::UnknownTimezone(name.to_string()))
}

/// A started scheduler running one cron job.
pub struct RecurringJob {
    scheduler: JobScheduler,
    job_id: Uuid,
    name: String,
}

impl RecurringJob {
    /// Registers `task` under `expression` in `timezone` and starts ticking.
    ///
    /// Each tick awaits `task` to completion. Whatever the task does with its
    /// own errors is its business: the scheduler keeps firing regardless.
    pub async fn start<F, Fut>(
        name: &str,
        expression: &str,
        timezone: Tz,
        task: F,
    ) -> Result<Self, SchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let schedule = normalize_cron_expression(expression)?;
        let scheduler = JobScheduler::new().await.map_err(scheduler_error)?;

        let task = Arc::new(task);
        let job_name = name.to_string();
        let job = JobBuilder::new()
            .with_timezone(timezone)
            .with_cron_job_type()
            .with_schedule(schedule.as_str())
            .map_err(|e| SchedulerError::InvalidExpression {
                expression: expression.to_string(),
                reason: format!("{e:?}"),
            })?
            .with_run_async(Box::new(move |uuid, mut l| {
                let task = Arc::clone(&task);
                let job_name = job_name.clone();
                Box::pin(async move {
                    debug!(job = %job_name, "Cron job fired");
                    task().await;
                    match l.next_tick_for_job(uuid).await {
                        Ok(Some(ts)) => debug!(job = %job_name, next = %ts, "Next tick scheduled"),
                        _ => warn!(job = %job_name, "Could not get next tick"),
                    }
                })
            }))
            .build()
            .map_err(|e| SchedulerError::InvalidExpression {
                expression: expression.to_string(),
                reason: format!("{e:?}"),
            })?;

        let job_id = scheduler.add(job).await.map_err(scheduler_error)?;
        scheduler.start().await.map_err(scheduler_error)?;
        info!(job = %name, schedule = %schedule, timezone = timezone.name(), "Recurring job started");

        Ok(Self {
            scheduler,
            job_id,
            name: name.to_string(),
        })
    }

    /// The job's name as given to [`RecurringJob::start`].
    pub fn name(&self) -> &str {
        &self.name
    }

    /// When the job fires next, if the scheduler knows.
    pub async fn next_tick(&mut self) -> Result<Option<DateTime<Utc>>, SchedulerError> {
        self.scheduler
            .next_tick_for_job(self.job_id)
            .await
            .map_err(scheduler_error)
    }

    /// Stops the scheduler. A tick already running is not interrupted.
    pub async fn shutdown(mut self) -> Result<(), SchedulerError> {
        self.scheduler.shutdown().await.map_err(scheduler_error)?;
        info!(job = %self.name, "Recurring job stopped");
        Ok(())
    }
}
