use std::sync::Arc;

use axum::http::StatusCode;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use recipes_server::recipe_logic::memory::MemoryRecipeStore;
use recipes_server::recipe_logic::model::NewRecipe;
use recipes_server::recipe_logic::rotator::{DailyRecipeRotator, RotationMode, RotationOutcome};
use recipes_server::recipe_logic::routes;
use recipes_server::recipe_logic::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn app(store: &Arc<MemoryRecipeStore>) -> axum::Router {
    routes::router(AppState::new(store.clone()))
}

/// Send a GET request via `oneshot` and return (status, parsed JSON body).
async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn store_with(titles: &[&str]) -> Arc<MemoryRecipeStore> {
    let store = Arc::new(MemoryRecipeStore::new());
    for title in titles {
        store
            .insert(NewRecipe::new(*title, format!("All about {title}"), "Mix and bake"))
            .await;
    }
    store
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_ok() {
    let store = store_with(&[]).await;
    let (status, body) = get(app(&store), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
}

// ---------------------------------------------------------------------------
// Daily recipe
// ---------------------------------------------------------------------------

#[tokio::test]
async fn daily_is_404_before_any_rotation() {
    let store = store_with(&["A", "B", "C"]).await;
    let (status, body) = get(app(&store), "/api/v1/recipes/daily").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No daily recipe set");
}

#[tokio::test]
async fn daily_returns_the_rotated_recipe() {
    let store = store_with(&["A", "B", "C"]).await;
    let rotator = DailyRecipeRotator::new(store.clone(), RotationMode::Atomic);
    let RotationOutcome::Featured(id) = rotator.rotate().await.unwrap() else {
        panic!("rotation over three recipes must feature one");
    };

    let (status, body) = get(app(&store), "/api/v1/recipes/daily").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.to_string());
    assert_eq!(body["is_daily"], true);
    let title = body["title"].as_str().unwrap();
    assert!(["A", "B", "C"].contains(&title), "unexpected title {title}");
}

#[tokio::test]
async fn daily_is_404_again_after_its_recipe_is_deleted() {
    let store = store_with(&["A"]).await;
    let rotator = DailyRecipeRotator::new(store.clone(), RotationMode::Stepwise);
    let Some(RotationOutcome::Featured(id)) = rotator.tick().await else {
        panic!("expected a featured recipe");
    };
    assert!(store.remove(id).await);

    let (status, _) = get(app(&store), "/api/v1/recipes/daily").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Listing and search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_paginates_newest_first() {
    let titles: Vec<String> = (1..=12).map(|i| format!("Recipe {i}")).collect();
    let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
    let store = store_with(&refs).await;

    let (status, body) = get(app(&store), "/api/v1/recipes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 12);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 10);
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
    assert_eq!(body["data"][0]["title"], "Recipe 12");

    let (_, body) = get(app(&store), "/api/v1/recipes?page=2&limit=10").await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[1]["title"], "Recipe 1");
}

#[tokio::test]
async fn list_falls_back_on_junk_parameters() {
    let store = store_with(&["A", "B"]).await;

    let (status, body) = get(app(&store), "/api/v1/recipes?page=zero&limit=-4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 10);

    let (_, body) = get(app(&store), "/api/v1/recipes?limit=5000").await;
    assert_eq!(body["pagination"]["limit"], 100);
}

#[tokio::test]
async fn list_filters_by_title() {
    let store = store_with(&["Lemon Cake", "Carrot Cake", "Tomato Soup"]).await;

    let (_, body) = get(app(&store), "/api/v1/recipes?search=cake").await;
    assert_eq!(body["pagination"]["total"], 2);
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Carrot Cake", "Lemon Cake"]);
}

#[tokio::test]
async fn search_requires_a_query() {
    let store = store_with(&["A"]).await;

    for uri in ["/api/v1/recipes/search", "/api/v1/recipes/search?query="] {
        let (status, body) = get(app(&store), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["message"], "Search query is required");
    }
}

#[tokio::test]
async fn search_accepts_a_whitespace_term() {
    let store = store_with(&["Pad Thai", "Ramen"]).await;

    let (status, body) = get(app(&store), "/api/v1/recipes/search?query=%20").await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    // Only "Pad Thai" contains a space in its title; both descriptions do.
    assert_eq!(titles.len(), 2);
    assert!(titles.contains(&"Pad Thai"));
}

#[tokio::test]
async fn search_matches_title_and_description() {
    let store = store_with(&["Pancakes", "Waffles"]).await;
    store
        .insert(NewRecipe::new("Crepes", "Thin pancakes from France", "Swirl the pan"))
        .await;

    let (status, body) = get(app(&store), "/api/v1/recipes/search?query=PANCAKES").await;
    assert_eq!(status, StatusCode::OK);
    let mut titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    titles.sort_unstable();
    assert_eq!(titles, vec!["Crepes", "Pancakes"]);
}

// ---------------------------------------------------------------------------
// Lookup by id
// ---------------------------------------------------------------------------

#[tokio::test]
async fn recipe_by_id_includes_the_author() {
    let store = Arc::new(MemoryRecipeStore::new());
    let author = store.add_author("chef_ana").await;
    let recipe = store
        .insert(
            NewRecipe::new("Shakshuka", "Eggs in tomato sauce", "Simmer, crack, cover")
                .with_ingredients(["eggs", "tomatoes", "peppers"])
                .with_times(10, 20, 2)
                .with_author(author),
        )
        .await;

    let (status, body) = get(app(&store), &format!("/api/v1/recipes/{}", recipe.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Shakshuka");
    assert_eq!(body["servings"], 2);
    assert_eq!(body["ingredients"][1], "tomatoes");
    assert_eq!(body["author"]["username"], "chef_ana");
    assert_eq!(body["author"]["id"], author.to_string());
}

#[tokio::test]
async fn recipe_by_id_is_404_for_unknown_or_malformed_ids() {
    let store = store_with(&["A"]).await;

    for uri in [
        format!("/api/v1/recipes/{}", uuid::Uuid::new_v4()),
        "/api/v1/recipes/not-a-uuid".to_string(),
    ] {
        let (status, body) = get(app(&store), &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["message"], "Recipe not found");
    }
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cors_allows_configured_origin_only() {
    let store = store_with(&[]).await;
    let app = routes::app(
        AppState::new(store.clone()),
        &["https://recipes.example".to_string()],
    );

    let req = axum::http::Request::builder()
        .uri("/api/health")
        .header("origin", "https://recipes.example")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "https://recipes.example"
    );

    let req = axum::http::Request::builder()
        .uri("/api/health")
        .header("origin", "https://elsewhere.example")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert!(
        response
            .headers()
            .get("access-control-allow-origin")
            .is_none()
    );
}
