//! # Application Error
//!
//! Error type returned by the HTTP handlers. Every variant renders as a JSON
//! body of the form `{"message": "..."}`. Store failures are logged with
//! their detail and reported to the client as a generic 500.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lib_common::connections::DbError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The request is missing a required parameter or carries an invalid one.
    #[error("Bad request: {0}")]
    BadRequest(String),
    /// The addressed resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
    /// Error originating from the recipe store.
    #[error("Store error: {0}")]
    Store(#[from] DbError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::Store(e) => {
                error!("Store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}
