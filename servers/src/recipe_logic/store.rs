//! # Recipe Store
//!
//! The persistence seam shared by the rotator and the HTTP handlers.
//! [`crate::recipe_logic::postgres::PgRecipeStore`] is the production
//! implementation, [`crate::recipe_logic::memory::MemoryRecipeStore`] backs
//! tests.

use async_trait::async_trait;
use lib_common::connections::DbError;
use uuid::Uuid;

use crate::recipe_logic::model::{PageRequest, Recipe, RecipeDetail, RecipePage};

#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Clears `is_daily` on every flagged recipe. Returns the number of rows changed.
    async fn clear_all_daily_flags(&self) -> Result<u64, DbError>;

    /// Picks one recipe id uniformly at random, `None` when the table is empty.
    async fn select_random_recipe_id(&self) -> Result<Option<Uuid>, DbError>;

    /// Sets `is_daily` on one recipe. Returns the number of rows changed, which
    /// is zero when the recipe no longer exists.
    async fn set_daily_flag(&self, id: Uuid) -> Result<u64, DbError>;

    /// Clear, select and set as one unit that readers and other rotations
    /// cannot observe half-done. Returns the newly flagged id, `None` when the
    /// table is empty.
    async fn rotate_daily_atomically(&self) -> Result<Option<Uuid>, DbError>;

    /// The recipe currently flagged as daily, if any.
    async fn daily_recipe(&self) -> Result<Option<Recipe>, DbError>;

    async fn recipe_by_id(&self, id: Uuid) -> Result<Option<RecipeDetail>, DbError>;

    /// A page of recipes, optionally filtered by a case-insensitive title match.
    async fn list_recipes(&self, request: &PageRequest) -> Result<RecipePage, DbError>;

    /// Recipes whose title or description contains `term`, case-insensitively.
    async fn search_recipes(&self, term: &str, limit: i64) -> Result<Vec<Recipe>, DbError>;

    /// Cheap reachability check.
    async fn ping(&self) -> Result<(), DbError>;
}
