//! Feed endpoint handlers.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::SharedState;
use crate::mock_server::state::MockError;
use crate::{CreateFeedRequest, Feed, Package, Platform};

/// Query parameters for listing feeds.
#[derive(Debug, Default, Deserialize)]
pub struct ListFeedsParams {
    pub platform: Option<Platform>,
    pub workspace: Option<String>,
}

/// Query parameters for uploading a package.
#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    #[serde(rename = "ShouldOverwrite", default)]
    pub should_overwrite: bool,
}

/// GET /nifeed/v1/feeds
pub async fn list_feeds(
    State(state): State<SharedState>,
    Query(params): Query<ListFeedsParams>,
) -> Json<Value> {
    let state = state.read().await;
    let feeds: Vec<&Feed> = state.list_feeds(params.platform, params.workspace.as_deref());
    Json(json!({ "feeds": feeds }))
}

/// POST /nifeed/v1/feeds
pub async fn create_feed(
    State(state): State<SharedState>,
    Json(request): Json<CreateFeedRequest>,
) -> Result<(StatusCode, Json<Feed>), MockError> {
    let mut state = state.write().await;

    let exists = state
        .list_feeds(Some(request.platform), request.workspace.as_deref())
        .iter()
        .any(|f| f.name == request.name);
    if exists {
        return Err(MockError::Conflict(format!(
            "A feed named '{}' already exists.",
            request.name
        )));
    }

    Ok((StatusCode::CREATED, Json(state.create_feed(request))))
}

/// POST /nifeed/v1/feeds/{feed_id}/packages
pub async fn upload_package(
    State(state): State<SharedState>,
    Path(feed_id): Path<String>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Result<Json<Package>, MockError> {
    let mut file_name = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| MockError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("package") {
            file_name = field.file_name().map(str::to_string);
            // Drain the body; the mock stores metadata only
            field
                .bytes()
                .await
                .map_err(|e| MockError::BadRequest(e.to_string()))?;
        }
    }

    let file_name = file_name
        .ok_or_else(|| MockError::BadRequest("missing 'package' form field".to_string()))?;

    let mut state = state.write().await;
    state
        .add_package(&feed_id, &file_name, params.should_overwrite)
        .map(Json)
}

/// DELETE /nifeed/v1/feeds/{feed_id}
pub async fn delete_feed(
    State(state): State<SharedState>,
    Path(feed_id): Path<String>,
) -> Result<StatusCode, MockError> {
    let mut state = state.write().await;
    if state.delete_feed(&feed_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(MockError::NotFound(format!("Feed '{feed_id}' not found.")))
    }
}
