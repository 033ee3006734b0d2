//! Package feeds and the feeds service endpoints.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::client::SystemLinkClient;
use crate::error::{Result, SystemLinkError};

const SERVICE: &str = "nifeed/v1/";

/// Target platform of a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Platform {
    #[serde(alias = "windows")]
    Windows,
    #[serde(alias = "ni-linux-rt", alias = "ni_linux_rt")]
    NiLinuxRt,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "WINDOWS",
            Platform::NiLinuxRt => "NI_LINUX_RT",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = SystemLinkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "windows" => Ok(Platform::Windows),
            "ni_linux_rt" | "linux" => Ok(Platform::NiLinuxRt),
            _ => Err(SystemLinkError::Validation(format!("unknown platform '{s}'"))),
        }
    }
}

/// A package feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub platform: Platform,
    #[serde(default)]
    pub workspace: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub package_sources: Vec<String>,
    #[serde(default)]
    pub deleted: bool,
}

/// Body of [`create_feed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub platform: Platform,
    /// Workspace id; the caller's default workspace when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
}

impl CreateFeedRequest {
    pub fn new(name: impl Into<String>, platform: Platform) -> Self {
        Self {
            name: name.into(),
            description: None,
            platform,
            workspace: None,
        }
    }
}

/// Filters for [`query_feeds`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    /// Workspace id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
}

/// Control metadata read from an uploaded package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMetadata {
    #[serde(default)]
    pub package_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub depends: Vec<String>,
    #[serde(default)]
    pub breaks: Vec<String>,
    #[serde(default)]
    pub conflicts: Vec<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// A package stored in a feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    #[serde(default)]
    pub id: Option<String>,
    pub file_name: String,
    #[serde(default)]
    pub feed_id: Option<String>,
    #[serde(default)]
    pub workspace: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Option<PackageMetadata>,
}

#[derive(Debug, Deserialize)]
struct FeedsResponse {
    #[serde(default)]
    feeds: Vec<Feed>,
}

/// List the feeds visible to the caller.
#[tracing::instrument(skip(client))]
pub async fn query_feeds(client: &SystemLinkClient, query: &FeedQuery) -> Result<Vec<Feed>> {
    let path = format!("{SERVICE}feeds");
    let response = client.get_with_query(&path, query).await?;
    let body: FeedsResponse = response.json().await.map_err(SystemLinkError::HttpError)?;
    Ok(body.feeds)
}

/// Create a feed.
#[tracing::instrument(skip(client))]
pub async fn create_feed(client: &SystemLinkClient, request: &CreateFeedRequest) -> Result<Feed> {
    if request.name.trim().is_empty() {
        return Err(SystemLinkError::Validation(
            "feed name must not be empty".to_string(),
        ));
    }
    let path = format!("{SERVICE}feeds");
    let response = client.post(&path, request).await?;
    response.json().await.map_err(SystemLinkError::HttpError)
}

/// Upload a package file into a feed.
///
/// # Errors
///
/// Returns [`SystemLinkError::Io`] if the file cannot be read and an API
/// error if the feed rejects it (e.g. a duplicate without `overwrite`).
#[tracing::instrument(skip(client))]
pub async fn upload_package(
    client: &SystemLinkClient,
    feed_id: &str,
    package: &Path,
    overwrite: bool,
) -> Result<Package> {
    let file_name = package
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            SystemLinkError::Validation(format!("'{}' is not a file path", package.display()))
        })?
        .to_string();

    let bytes = tokio::fs::read(package).await?;
    let part = Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("application/octet-stream")
        .map_err(SystemLinkError::HttpError)?;
    let form = Form::new().part("package", part);

    #[derive(Serialize)]
    struct UploadParams {
        #[serde(rename = "ShouldOverwrite")]
        should_overwrite: bool,
    }

    let path = format!("{SERVICE}feeds/{}/packages", urlencoding::encode(feed_id));
    let params = UploadParams {
        should_overwrite: overwrite,
    };
    let response = client.post_multipart(&path, &params, form).await?;
    response.json().await.map_err(SystemLinkError::HttpError)
}

/// Delete a feed and its packages.
#[tracing::instrument(skip(client))]
pub async fn delete_feed(client: &SystemLinkClient, feed_id: &str) -> Result<()> {
    let path = format!("{SERVICE}feeds/{}", urlencoding::encode(feed_id));
    client.delete(&path).await?;
    Ok(())
}
