//! Partial-success batch responses.
//!
//! Batch create/update/delete endpoints answer `200 OK` even when only some
//! items were applied. The applied items, the rejected requests and an
//! aggregate error come back side by side; callers inspect them explicitly.
//! Neither list is guaranteed to follow request order, so results are
//! matched back to requests by business key.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Matches a request to the record it produced.
pub trait Correlate<T> {
    /// Whether `item` is the result of this request.
    fn correlates_with(&self, item: &T) -> bool;
}

/// Outcome of a batch create or update.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResponse<T, R> {
    /// Records the server persisted.
    pub succeeded: Vec<T>,
    /// Requests the server rejected, echoed back.
    pub failed: Option<Vec<R>>,
    /// Why the rejected requests failed.
    pub error: Option<ApiError>,
}

impl<T, R> BatchResponse<T, R> {
    /// True when nothing was rejected.
    pub fn is_complete_success(&self) -> bool {
        self.failed_count() == 0 && self.error.is_none()
    }

    /// Number of rejected requests.
    pub fn failed_count(&self) -> usize {
        self.failed.as_ref().map_or(0, Vec::len)
    }

    /// Rejected requests, empty when none.
    pub fn failed_items(&self) -> &[R] {
        self.failed.as_deref().unwrap_or(&[])
    }

    /// The persisted record produced by `request`, if it succeeded.
    pub fn succeeded_for(&self, request: &R) -> Option<&T>
    where
        R: Correlate<T>,
    {
        self.succeeded.iter().find(|item| request.correlates_with(item))
    }
}

/// Outcome of a batch delete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Ids that were deleted.
    #[serde(default)]
    pub ids: Vec<String>,
    /// Ids that could not be deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<Vec<String>>,
    /// Why the failed ids were not deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl DeleteResponse {
    /// Response for a request the server accepted without a body.
    pub(crate) fn all_deleted(ids: Vec<String>) -> Self {
        Self {
            ids,
            failed: None,
            error: None,
        }
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.as_ref().map_or(true, Vec::is_empty) && self.error.is_none()
    }
}
