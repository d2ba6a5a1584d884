//! # Daily Recipe Rotator
//!
//! Moves the "daily recipe" flag from whichever recipe holds it to a recipe
//! picked uniformly at random.
//!
//! Two modes:
//! - [`RotationMode::Atomic`]: the store clears, selects and sets in one
//!   transaction. Readers see either the old or the new daily recipe.
//! - [`RotationMode::Stepwise`]: three separate store calls. Readers can
//!   observe a window with no daily recipe, and the selected recipe can be
//!   deleted before it is flagged.
//!
//! A rotation never runs concurrently with another one on the same rotator:
//! a call that arrives while one is in flight returns
//! [`RotationOutcome::Skipped`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::ValueEnum;
use lib_common::connections::DbError;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::recipe_logic::store::RecipeStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RotationMode {
    #[default]
    Atomic,
    Stepwise,
}

impl fmt::Display for RotationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationMode::Atomic => write!(f, "atomic"),
            RotationMode::Stepwise => write!(f, "stepwise"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOutcome {
    /// The recipe now flagged as daily.
    Featured(Uuid),
    /// The table was empty at selection time; nothing is flagged.
    NoRecipes,
    /// The selected recipe was deleted before it could be flagged; nothing is flagged.
    SelectionVanished(Uuid),
    /// Another rotation was still running; this one did nothing.
    Skipped,
}

/// Clears the in-progress flag when a rotation ends, including on early return.
struct InProgress<'a>(&'a AtomicBool);

impl<'a> InProgress<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct DailyRecipeRotator {
    store: Arc<dyn RecipeStore>,
    mode: RotationMode,
    in_progress: AtomicBool,
}

impl DailyRecipeRotator {
    pub fn new(store: Arc<dyn RecipeStore>, mode: RotationMode) -> Self {
        Self {
            store,
            mode,
            in_progress: AtomicBool::new(false),
        }
    }

    pub fn mode(&self) -> RotationMode {
        self.mode
    }

    /// Runs one rotation and reports what happened. Store errors are returned
    /// to the caller; see [`DailyRecipeRotator::tick`] for the scheduled path.
    pub async fn rotate(&self) -> Result<RotationOutcome, DbError> {
        let Some(_guard) = InProgress::acquire(&self.in_progress) else {
            return Ok(RotationOutcome::Skipped);
        };

        match self.mode {
            RotationMode::Atomic => Ok(match self.store.rotate_daily_atomically().await? {
                Some(id) => RotationOutcome::Featured(id),
                None => RotationOutcome::NoRecipes,
            }),
            RotationMode::Stepwise => self.rotate_stepwise().await,
        }
    }

    async fn rotate_stepwise(&self) -> Result<RotationOutcome, DbError> {
        self.store.clear_all_daily_flags().await?;

        let Some(id) = self.store.select_random_recipe_id().await? else {
            return Ok(RotationOutcome::NoRecipes);
        };

        if self.store.set_daily_flag(id).await? == 0 {
            return Ok(RotationOutcome::SelectionVanished(id));
        }
        Ok(RotationOutcome::Featured(id))
    }

    /// Scheduled entry point: runs [`DailyRecipeRotator::rotate`], logs the
    /// outcome and swallows any error so the schedule keeps going.
    pub async fn tick(&self) -> Option<RotationOutcome> {
        info!(mode = %self.mode, "Running daily recipe rotation");
        match self.rotate().await {
            Ok(outcome) => {
                match outcome {
                    RotationOutcome::Featured(id) => info!(recipe_id = %id, "New daily recipe set"),
                    RotationOutcome::NoRecipes => info!("No recipes found to set as daily"),
                    RotationOutcome::SelectionVanished(id) => warn!(
                        recipe_id = %id,
                        "Selected recipe was deleted before it could be flagged; no daily recipe until next rotation"
                    ),
                    RotationOutcome::Skipped => {
                        warn!("Previous daily recipe rotation still running; skipping this one")
                    }
                }
                Some(outcome)
            }
            Err(e) => {
                error!(error = %e, "Error running daily recipe rotation");
                None
            }
        }
    }
}
