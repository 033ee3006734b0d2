//! Error types for SystemLink API operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during SystemLink API operations.
#[derive(Debug, Error)]
pub enum SystemLinkError {
    /// Configuration is missing or incomplete.
    #[error("SystemLink configuration required: {0}")]
    ConfigMissing(String),

    /// The request was rejected locally and never sent.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The server answered with a non-success status.
    #[error("SystemLink API error ({status_code}): {message}")]
    Api {
        status_code: u16,
        message: String,
        /// Structured error payload, when the server sent one.
        error: Option<Box<ApiError>>,
    },

    /// A response was missing a field the caller relies on.
    #[error("Response {record} is missing required field '{field}'")]
    Schema {
        record: &'static str,
        field: &'static str,
    },

    /// The server returned a continuation token already followed in this session.
    #[error("Pagination stalled: server repeated continuation token '{token}'")]
    StalledPagination { token: String },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// Local file access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rate limited.
    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },
}

impl SystemLinkError {
    /// HTTP status code of an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status_code, .. } => Some(*status_code),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Whether the server reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// The structured server error, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api { error, .. } => error.as_deref(),
            _ => None,
        }
    }
}

/// Error payload returned by SystemLink services.
///
/// Appears both in failed HTTP responses (under an `error` key) and inside
/// partial-success batch responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// String error code (e.g. `Skyline.OneOrMoreErrorsOccurred`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Numeric error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,

    /// Type of resource associated with the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    /// Identifier of the resource associated with the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    /// Complete error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Positional argument values for the error code.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Errors that caused this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inner_errors: Vec<ApiError>,
}

impl ApiError {
    /// Walk this error and every nested inner error, depth first.
    pub fn flatten(&self) -> Vec<&ApiError> {
        let mut out = vec![self];
        for inner in &self.inner_errors {
            out.extend(inner.flatten());
        }
        out
    }
}

/// Result type alias for SystemLink operations.
pub type Result<T> = core::result::Result<T, SystemLinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_deserialize_nested() {
        let json = r#"{
            "name": "Skyline.OneOrMoreErrorsOccurred",
            "code": -251041,
            "message": "One or more errors occurred.",
            "innerErrors": [
                {
                    "name": "Skyline.TestMonitor.ProductNotFound",
                    "resourceType": "product",
                    "resourceId": "invalid_id",
                    "message": "Product not found."
                }
            ]
        }"#;
        let error: ApiError = serde_json::from_str(json).unwrap();
        assert_eq!(error.code, Some(-251041));
        assert_eq!(error.inner_errors.len(), 1);
        assert_eq!(error.inner_errors[0].resource_id.as_deref(), Some("invalid_id"));
        assert_eq!(error.flatten().len(), 2);
    }

    #[test]
    fn test_status_helpers() {
        let err = SystemLinkError::Api {
            status_code: 404,
            message: "404 Not Found".to_string(),
            error: None,
        };
        assert!(err.is_not_found());
        assert_eq!(err.status_code(), Some(404));
        assert!(err.api_error().is_none());

        let err = SystemLinkError::Validation("bad".to_string());
        assert!(!err.is_not_found());
        assert_eq!(err.status_code(), None);
    }
}
