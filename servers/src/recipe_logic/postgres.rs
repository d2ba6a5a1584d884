//! # PostgreSQL Recipe Store
//!
//! `RecipeStore` over the pooled `lib_common` database connection. The schema is created on
//! startup if missing; a partial unique index guarantees that at most one row
//! carries `is_daily = true` no matter how writers interleave.

use async_trait::async_trait;
use lib_common::connections::{Database, DbError};
use tokio_postgres::Row;
use tracing::debug;
use uuid::Uuid;

use crate::recipe_logic::model::{Author, PageRequest, Pagination, Recipe, RecipeDetail, RecipePage};
use crate::recipe_logic::store::RecipeStore;

pub const SCHEMA_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    username    TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE,
    password    TEXT NOT NULL,
    created_at  TIMESTAMP NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS recipes (
    id            UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    title         TEXT NOT NULL,
    description   TEXT NOT NULL,
    ingredients   TEXT[],
    instructions  TEXT NOT NULL,
    prep_time     INTEGER,
    cook_time     INTEGER,
    servings      INTEGER,
    author_id     UUID REFERENCES users(id) ON DELETE CASCADE,
    image_url     TEXT,
    is_daily      BOOLEAN NOT NULL DEFAULT FALSE,
    created_at    TIMESTAMP NOT NULL DEFAULT now()
);

-- Tables created by earlier deployments may hold NULLs or several daily rows.
UPDATE recipes SET is_daily = FALSE
 WHERE is_daily IS NULL
    OR (is_daily AND id <> (SELECT id FROM recipes WHERE is_daily
                            ORDER BY created_at DESC NULLS LAST, id LIMIT 1));
UPDATE recipes SET created_at = now() WHERE created_at IS NULL;
ALTER TABLE recipes
    ALTER COLUMN is_daily SET DEFAULT FALSE,
    ALTER COLUMN is_daily SET NOT NULL,
    ALTER COLUMN created_at SET DEFAULT now(),
    ALTER COLUMN created_at SET NOT NULL;

CREATE UNIQUE INDEX IF NOT EXISTS recipes_single_daily ON recipes (is_daily) WHERE is_daily;
"#;

/// Advisory lock taken for the duration of an atomic rotation so that
/// rotations from several server instances run one after another.
const DAILY_ROTATION_LOCK_KEY: i64 = 0x7265_6369_7065;

macro_rules! recipe_columns {
    () => {
        "r.id, r.title, r.description, r.ingredients, r.instructions, r.prep_time, \
         r.cook_time, r.servings, r.author_id, r.image_url, r.is_daily, r.created_at"
    };
}

const CLEAR_DAILY: &str = "UPDATE recipes SET is_daily = FALSE WHERE is_daily";
const SELECT_RANDOM_ID: &str = "SELECT id FROM recipes ORDER BY random() LIMIT 1";
const SELECT_RANDOM_ID_FOR_UPDATE: &str =
    "SELECT id FROM recipes ORDER BY random() LIMIT 1 FOR UPDATE";
const SET_DAILY: &str = "UPDATE recipes SET is_daily = TRUE WHERE id = $1";
const SELECT_DAILY: &str = concat!(
    "SELECT ",
    recipe_columns!(),
    " FROM recipes r WHERE r.is_daily LIMIT 1"
);
const SELECT_BY_ID: &str = concat!(
    "SELECT ",
    recipe_columns!(),
    ", u.id AS author_user_id, u.username AS author_username \
     FROM recipes r LEFT JOIN users u ON u.id = r.author_id WHERE r.id = $1"
);
const SELECT_PAGE: &str = concat!(
    "SELECT ",
    recipe_columns!(),
    " FROM recipes r WHERE ($1::text IS NULL OR r.title ILIKE $1) \
     ORDER BY r.created_at DESC, r.id LIMIT $2 OFFSET $3"
);
const COUNT_PAGE: &str =
    "SELECT count(*) FROM recipes r WHERE ($1::text IS NULL OR r.title ILIKE $1)";
const SEARCH: &str = concat!(
    "SELECT ",
    recipe_columns!(),
    " FROM recipes r WHERE r.title ILIKE $1 OR r.description ILIKE $1 \
     ORDER BY r.created_at DESC, r.id LIMIT $2"
);

/// Builds a `%term%` ILIKE pattern with the LIKE wildcards in `term` escaped.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn recipe_from_row(row: &Row) -> Result<Recipe, tokio_postgres::Error> {
    Ok(Recipe {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        ingredients: row.try_get("ingredients")?,
        instructions: row.try_get("instructions")?,
        prep_time: row.try_get("prep_time")?,
        cook_time: row.try_get("cook_time")?,
        servings: row.try_get("servings")?,
        author_id: row.try_get("author_id")?,
        image_url: row.try_get("image_url")?,
        is_daily: row.try_get("is_daily")?,
        created_at: row.try_get("created_at")?,
    })
}

#[derive(Clone)]
pub struct PgRecipeStore {
    db: Database,
}

impl PgRecipeStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates the tables and the single-daily index if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), DbError> {
        self.db.bootstrap_schema(SCHEMA_DDL).await
    }
}

#[async_trait]
impl RecipeStore for PgRecipeStore {
    async fn clear_all_daily_flags(&self) -> Result<u64, DbError> {
        let client = self.db.client().await?;
        Ok(client.execute(CLEAR_DAILY, &[]).await?)
    }

    async fn select_random_recipe_id(&self) -> Result<Option<Uuid>, DbError> {
        let client = self.db.client().await?;
        let row = client.query_opt(SELECT_RANDOM_ID, &[]).await?;
        Ok(row.map(|r| r.try_get::<_, Uuid>(0)).transpose()?)
    }

    async fn set_daily_flag(&self, id: Uuid) -> Result<u64, DbError> {
        let client = self.db.client().await?;
        Ok(client.execute(SET_DAILY, &[&id]).await?)
    }

    async fn rotate_daily_atomically(&self) -> Result<Option<Uuid>, DbError> {
        let mut client = self.db.client().await?;
        let tx = client.transaction().await?;

        tx.execute("SELECT pg_advisory_xact_lock($1)", &[&DAILY_ROTATION_LOCK_KEY])
            .await?;
        let cleared = tx.execute(CLEAR_DAILY, &[]).await?;
        let selected = tx
            .query_opt(SELECT_RANDOM_ID_FOR_UPDATE, &[])
            .await?
            .map(|r| r.try_get::<_, Uuid>(0))
            .transpose()?;
        if let Some(id) = selected {
            tx.execute(SET_DAILY, &[&id]).await?;
        }
        tx.commit().await?;

        debug!(cleared, ?selected, "Atomic daily rotation committed");
        Ok(selected)
    }

    async fn daily_recipe(&self) -> Result<Option<Recipe>, DbError> {
        let client = self.db.client().await?;
        let row = client.query_opt(SELECT_DAILY, &[]).await?;
        Ok(row.as_ref().map(recipe_from_row).transpose()?)
    }

    async fn recipe_by_id(&self, id: Uuid) -> Result<Option<RecipeDetail>, DbError> {
        let client = self.db.client().await?;
        let Some(row) = client.query_opt(SELECT_BY_ID, &[&id]).await? else {
            return Ok(None);
        };

        let recipe = recipe_from_row(&row)?;
        let author_id: Option<Uuid> = row.try_get("author_user_id")?;
        let author_name: Option<String> = row.try_get("author_username")?;
        let author = match (author_id, author_name) {
            (Some(id), Some(username)) => Some(Author { id, username }),
            _ => None,
        };
        Ok(Some(RecipeDetail { recipe, author }))
    }

    async fn list_recipes(&self, request: &PageRequest) -> Result<RecipePage, DbError> {
        let client = self.db.client().await?;
        let pattern = request.search.as_deref().map(like_pattern);
        let offset = request.offset();

        let rows = client
            .query(SELECT_PAGE, &[&pattern, &request.limit, &offset])
            .await?;
        let total: i64 = client.query_one(COUNT_PAGE, &[&pattern]).await?.try_get(0)?;

        let data = rows
            .iter()
            .map(recipe_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RecipePage {
            data,
            pagination: Pagination {
                total,
                page: request.page,
                limit: request.limit,
            },
        })
    }

    async fn search_recipes(&self, term: &str, limit: i64) -> Result<Vec<Recipe>, DbError> {
        let client = self.db.client().await?;
        let pattern = like_pattern(term);
        let rows = client.query(SEARCH, &[&pattern, &limit]).await?;
        Ok(rows
            .iter()
            .map(recipe_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn ping(&self) -> Result<(), DbError> {
        self.db.ping().await
    }
}
