//! Auth endpoint handlers.

use axum::{extract::State, Json};

use super::SharedState;
use crate::AuthInfo;

/// GET /niauth/v1/auth
pub async fn get_auth(State(state): State<SharedState>) -> Json<AuthInfo> {
    Json(state.read().await.auth.clone())
}
