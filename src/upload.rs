//! Feed package upload helpers.
//!
//! Packages go into a named feed per platform. The feed is looked up in the
//! target workspace and created when missing, then each package file is
//! uploaded into it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::client::SystemLinkClient;
use crate::error::{Result, SystemLinkError};
use crate::models::{
    authenticate, create_feed, query_feeds, upload_package, CreateFeedRequest, FeedQuery, Platform,
};

/// Extension of Windows packages; anything else targets NI Linux RT.
pub const NIPKG_EXTENSION: &str = "nipkg";

/// Where and how packages are uploaded.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Feed to upload into, created when missing.
    pub feed_name: String,
    /// Workspace name; the caller's default workspace when `None`.
    pub workspace: Option<String>,
    /// Replace packages that already exist in the feed.
    pub overwrite: bool,
}

impl UploadOptions {
    pub fn new(feed_name: impl Into<String>) -> Self {
        Self {
            feed_name: feed_name.into(),
            ..Default::default()
        }
    }
}

/// Outcome of [`upload_packages`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadReport {
    /// File names accepted by the feed, in input order.
    pub uploaded: Vec<String>,
    /// Packages that could not be uploaded and why.
    pub failed: Vec<(PathBuf, String)>,
}

impl UploadReport {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Feed platform for a package file.
pub fn platform_for_package(path: &Path) -> Platform {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext == NIPKG_EXTENSION => Platform::Windows,
        _ => Platform::NiLinuxRt,
    }
}

/// Id of the workspace called `name`.
///
/// # Errors
///
/// Returns [`SystemLinkError::Validation`] when the caller has no workspace
/// with that name.
#[tracing::instrument(skip(client))]
pub async fn resolve_workspace_id(client: &SystemLinkClient, name: &str) -> Result<String> {
    let info = authenticate(client).await?;
    info.workspace_id(name)
        .map(str::to_string)
        .ok_or_else(|| SystemLinkError::Validation(format!("unknown workspace '{name}'")))
}

/// Id of the feed called `name`, creating it when it does not exist.
#[tracing::instrument(skip(client))]
pub async fn ensure_feed(
    client: &SystemLinkClient,
    name: &str,
    platform: Platform,
    workspace_id: Option<&str>,
) -> Result<String> {
    let query = FeedQuery {
        platform: Some(platform),
        workspace: workspace_id.map(str::to_string),
    };
    let feeds = query_feeds(client, &query).await?;
    if let Some(existing) = feeds.into_iter().find(|f| f.name == name) {
        tracing::debug!(feed_id = %existing.id, "feed exists");
        return Ok(existing.id);
    }

    let mut request = CreateFeedRequest::new(name, platform);
    request.workspace = workspace_id.map(str::to_string);
    let feed = create_feed(client, &request).await?;
    tracing::info!(feed_id = %feed.id, feed = name, %platform, "created feed");
    Ok(feed.id)
}

async fn workspace_id_for(
    client: &SystemLinkClient,
    options: &UploadOptions,
) -> Result<Option<String>> {
    match &options.workspace {
        Some(name) => resolve_workspace_id(client, name).await.map(Some),
        None => Ok(None),
    }
}

/// Upload one package, returning the file name the feed stored.
#[tracing::instrument(skip(client))]
pub async fn upload_single_package(
    client: &SystemLinkClient,
    options: &UploadOptions,
    path: &Path,
) -> Result<String> {
    let workspace_id = workspace_id_for(client, options).await?;
    let platform = platform_for_package(path);
    let feed_id = ensure_feed(client, &options.feed_name, platform, workspace_id.as_deref()).await?;
    let package = upload_package(client, &feed_id, path, options.overwrite).await?;
    Ok(package.file_name)
}

/// Upload several packages.
///
/// The workspace and each platform's feed are resolved once; the uploads
/// then run concurrently. A failed package does not stop the others.
///
/// # Errors
///
/// Only workspace resolution fails the whole call. Per-package problems,
/// including a feed that could not be created, land in
/// [`UploadReport::failed`].
#[tracing::instrument(skip(client, paths), fields(count = paths.len()))]
pub async fn upload_packages(
    client: &SystemLinkClient,
    options: &UploadOptions,
    paths: &[PathBuf],
) -> Result<UploadReport> {
    let workspace_id = workspace_id_for(client, options).await?;

    let mut feeds: HashMap<Platform, std::result::Result<String, String>> = HashMap::new();
    let mut pending = Vec::with_capacity(paths.len());

    for path in paths {
        let platform = platform_for_package(path);
        let feed = match feeds.get(&platform) {
            Some(feed) => feed.clone(),
            None => {
                let workspace = workspace_id.as_deref();
                let feed = ensure_feed(client, &options.feed_name, platform, workspace)
                    .await
                    .map_err(|e| e.to_string());
                feeds.insert(platform, feed.clone());
                feed
            }
        };

        let task = feed.map(|feed_id| {
            let client = client.clone();
            let path = path.clone();
            let overwrite = options.overwrite;
            tokio::spawn(async move { upload_package(&client, &feed_id, &path, overwrite).await })
        });
        pending.push((path.clone(), task));
    }

    let mut report = UploadReport::default();
    for (path, task) in pending {
        let outcome = match task {
            Ok(handle) => match handle.await {
                Ok(Ok(package)) => Ok(package.file_name),
                Ok(Err(e)) => Err(e.to_string()),
                Err(e) => Err(format!("upload task failed: {e}")),
            },
            Err(message) => Err(message),
        };

        match outcome {
            Ok(file_name) => {
                tracing::info!(file = %file_name, "uploaded package");
                report.uploaded.push(file_name);
            }
            Err(message) => {
                tracing::warn!(path = %path.display(), error = %message, "package upload failed");
                report.failed.push((path, message));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_for_package() {
        assert_eq!(
            platform_for_package(Path::new("out/sample_0.5.0_windows_x64.nipkg")),
            Platform::Windows
        );
        assert_eq!(
            platform_for_package(Path::new("out/sample_0.5.0_x64.ipk")),
            Platform::NiLinuxRt
        );
        assert_eq!(platform_for_package(Path::new("no_extension")), Platform::NiLinuxRt);
        // Extension match is exact
        assert_eq!(platform_for_package(Path::new("pkg.NIPKG")), Platform::NiLinuxRt);
    }

    #[test]
    fn test_report_success() {
        let mut report = UploadReport::default();
        assert!(report.is_complete_success());
        report.failed.push((PathBuf::from("a.ipk"), "boom".to_string()));
        assert!(!report.is_complete_success());
    }
}
