//! HTTP request handlers for the mock server.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tokio::sync::RwLock;

use super::state::MockState;

pub mod auth;
pub mod feeds;
pub mod products;

pub use auth::*;
pub use feeds::*;
pub use products::*;

/// State handle shared by every handler.
pub type SharedState = Arc<RwLock<MockState>>;

/// Build a SystemLink error envelope.
pub fn error_response(status: StatusCode, name: &str, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": {
                "name": name,
                "message": message,
                "args": [],
                "innerErrors": []
            }
        })),
    )
        .into_response()
}

impl IntoResponse for super::state::MockError {
    fn into_response(self) -> Response {
        use super::state::MockError;

        let (status, name) = match &self {
            MockError::NotFound(_) => (StatusCode::NOT_FOUND, "Skyline.NotFound"),
            MockError::Conflict(_) => (StatusCode::CONFLICT, "Skyline.Conflict"),
            MockError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Skyline.BadRequest"),
        };
        error_response(status, name, self.message())
    }
}
