//! # Daily Recipe Job
//!
//! Binds a [`DailyRecipeRotator`] to a cron schedule. The handle is created by
//! the server's startup routine and shut down with it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use lib_common::scheduler::{RecurringJob, SchedulerError};

use crate::recipe_logic::rotator::DailyRecipeRotator;

pub const DAILY_JOB_NAME: &str = "daily-recipe";

pub struct DailyRecipeJob {
    job: RecurringJob,
}

impl DailyRecipeJob {
    /// Starts ticking `rotator` on `schedule` (cron, 5- or 6-field) in `timezone`.
    pub async fn start(
        rotator: Arc<DailyRecipeRotator>,
        schedule: &str,
        timezone: Tz,
    ) -> Result<Self, SchedulerError> {
        let job = RecurringJob::start(DAILY_JOB_NAME, schedule, timezone, move || {
            let rotator = Arc::clone(&rotator);
            async move {
                rotator.tick().await;
            }
        })
        .await?;
        Ok(Self { job })
    }

    pub async fn next_tick(&mut self) -> Result<Option<DateTime<Utc>>, SchedulerError> {
        self.job.next_tick().await
    }

    pub async fn shutdown(self) -> Result<(), SchedulerError> {
        self.job.shutdown().await
    }
}
