//! Cached release persistence via the `CacheStore` collaborator.

use serde::{Deserialize, Serialize};

use crate::interfaces::CacheStore;

use super::ReleaseInfo;

/// Loads the cached release for `repo_full_name` from `store`, if present
/// and decodable.
pub async fn load(store: &dyn CacheStore, repo_full_name: &str) -> Option<ReleaseInfo> {
    let bytes = store.read(repo_full_name).await?;
    serde_json::from_slice(&bytes).ok()
}

/// Persists `release` for `repo_full_name` into `store`.
pub async fn save(store: &dyn CacheStore, repo_full_name: &str, release: &ReleaseInfo) {
    if let Ok(bytes) = serde_json::to_vec(release) {
        store.write(repo_full_name, &bytes).await;
    }
}

/// A release as decoded directly from the GitHub API, before this crate
/// computes `version_string`/`is_newer_than_current`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawGithubRelease {
    /// The tag this release was cut from (e.g. `"v1.2.3"`).
    pub tag_name: String,
    /// Release title, if set.
    pub name: Option<String>,
    /// Release notes body, if set.
    pub body: Option<String>,
    /// Web URL for the release page.
    pub html_url: Option<String>,
    /// Publish timestamp, RFC 3339.
    pub published_at: Option<String>,
    /// Whether GitHub marked this as a prerelease.
    pub prerelease: bool,
}
