//! # HTTP Routes
//!
//! Read-only recipe API:
//!
//! | Method | Path                      | Response                                   |
//! |--------|---------------------------|--------------------------------------------|
//! | GET    | `/api/health`             | `{"status": "OK"}`                         |
//! | GET    | `/api/v1/recipes`         | paginated list, `?page=&limit=&search=`    |
//! | GET    | `/api/v1/recipes/daily`   | today's recipe or 404                      |
//! | GET    | `/api/v1/recipes/search`  | up to 20 matches for `?query=`             |
//! | GET    | `/api/v1/recipes/{id}`    | recipe with author, or 404                 |

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderValue, Method, header},
    routing::get,
};
use serde_json::{Value, json};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::recipe_logic::error::AppError;
use crate::recipe_logic::model::{
    ListQuery, PageRequest, Recipe, RecipeDetail, RecipePage, SEARCH_LIMIT, SearchQuery,
};
use crate::recipe_logic::state::AppState;

/// Routes only, no middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/v1/recipes", get(list_recipes))
        .route("/api/v1/recipes/daily", get(daily_recipe))
        .route("/api/v1/recipes/search", get(search_recipes))
        .route("/api/v1/recipes/{id}", get(recipe_by_id))
        .with_state(state)
}

/// Routes wrapped with request tracing and CORS for `allowed_origins`.
pub fn app(state: AppState, allowed_origins: &[String]) -> Router {
    router(state)
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

async fn list_recipes(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<RecipePage>, AppError> {
    let request = PageRequest::from_query(&query);
    debug!(?request, "Listing recipes");
    Ok(Json(state.store.list_recipes(&request).await?))
}

async fn daily_recipe(State(state): State<AppState>) -> Result<Json<Recipe>, AppError> {
    state
        .store
        .daily_recipe()
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No daily recipe set".to_string()))
}

async fn search_recipes(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Recipe>>, AppError> {
    // Whitespace is a valid term; only an absent or empty query is rejected.
    let term = query
        .query
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("Search query is required".to_string()))?;
    Ok(Json(state.store.search_recipes(term, SEARCH_LIMIT).await?))
}

async fn recipe_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecipeDetail>, AppError> {
    let not_found = || AppError::NotFound("Recipe not found".to_string());
    // A malformed id cannot name an existing recipe.
    let id = Uuid::parse_str(&id).map_err(|_| not_found())?;
    state
        .store
        .recipe_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}
