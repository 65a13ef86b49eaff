//! Periodic GitHub Releases poller with caching, pause/skip semantics,
//! retry/backoff, and Debian-style version comparison against the running
//! version.

mod cache;

pub use cache::RawGithubRelease;

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{UpdateError, UpdateResult};
use crate::interfaces::{CacheStore, HttpFetcher, UPDATE_AVAILABLE_NOTIFICATION};
use crate::logging::Logger;
use crate::version::compare_version_string;

/// A decoded GitHub release, with this crate's derived fields attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseInfo {
    /// The tag this release was cut from (e.g. `"v1.2.3"`).
    pub tag_name: String,
    /// `tag_name` with a single leading `v` stripped, if present.
    pub version_string: String,
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
    /// Whether this release's version compares greater than the
    /// configured current version.
    pub is_newer_than_current: bool,
}

impl ReleaseInfo {
    fn from_raw(raw: RawGithubRelease, current_version: &str) -> Self {
        let version_string = raw.tag_name.strip_prefix('v').unwrap_or(&raw.tag_name).to_string();
        let is_newer_than_current = compare_version_string(&version_string, current_version) > 0;
        Self {
            tag_name: raw.tag_name,
            version_string,
            name: raw.name,
            body: raw.body,
            html_url: raw.html_url,
            published_at: raw.published_at,
            prerelease: raw.prerelease,
            is_newer_than_current,
        }
    }
}

/// Poll cadence and retry/backoff tuning, plus GitHub repo identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStrategy {
    /// `"owner/repo"`.
    pub repo_full_name: String,
    /// Minimum gap between successive checks, absent `check_now`.
    #[serde(with = "duration_secs")]
    pub min_check_interval: Duration,
    /// Maximum retry attempts per logical check.
    pub max_retry_count: u32,
    /// Base retry backoff; actual wait is `min_retry_interval * 2^attempt`.
    #[serde(with = "duration_secs")]
    pub min_retry_interval: Duration,
    /// Whether to consider prerelease tags.
    pub include_prereleases: bool,
    /// Bearer token for the GitHub API, if required (private repos / rate
    /// limit headroom).
    pub token: Option<String>,
}

impl Default for UpdateStrategy {
    fn default() -> Self {
        Self {
            repo_full_name: String::new(),
            min_check_interval: Duration::from_secs(6 * 60 * 60),
            max_retry_count: 3,
            min_retry_interval: Duration::from_secs(60),
            include_prereleases: false,
            token: None,
        }
    }
}

type UpdateHandler = Box<dyn FnMut(ReleaseInfo) + Send>;
type CheckNowHandler = Box<dyn FnOnce(UpdateResult<()>) + Send>;

struct Inner {
    strategy: UpdateStrategy,
    current_version: String,
    last_check_time: Option<Instant>,
    paused_until: Option<Instant>,
    skipped_version: Option<String>,
    cached_release: Option<ReleaseInfo>,
    last_error: Option<UpdateError>,
}

/// A periodic GitHub Releases poller.
pub struct UpdatePoller {
    http: Arc<dyn HttpFetcher>,
    cache_store: Arc<dyn CacheStore>,
    inner: Mutex<Inner>,
    handler: Mutex<Option<UpdateHandler>>,
    logger: Logger,
}

impl UpdatePoller {
    /// Builds a poller against `http`/`cache_store`, configured with
    /// `strategy` against `current_version`.
    #[must_use]
    pub fn new(strategy: UpdateStrategy, current_version: String, http: Arc<dyn HttpFetcher>, cache_store: Arc<dyn CacheStore>, logger: Logger) -> Self {
        Self {
            http,
            cache_store,
            inner: Mutex::new(Inner {
                strategy,
                current_version,
                last_check_time: None,
                paused_until: None,
                skipped_version: None,
                cached_release: None,
                last_error: None,
            }),
            handler: Mutex::new(None),
            logger,
        }
    }

    /// Replaces the strategy/current-version, cancelling any in-flight check.
    pub async fn configure(&self, strategy: UpdateStrategy, current_version: String) {
        let mut inner = self.inner.lock().await;
        inner.strategy = strategy;
        inner.current_version = current_version;
        inner.last_check_time = None;
    }

    /// Registers the callback invoked with newly-found releases.
    pub async fn start(&self, handler: UpdateHandler) {
        *self.handler.lock().await = Some(handler);
        if let Some(cached) = self.cached_latest_release().await {
            self.logger.debug(&format!("update poller loaded cached release {}", cached.version_string));
        }
    }

    /// Clears the handler.
    pub async fn stop(&self) {
        *self.handler.lock().await = None;
    }

    /// Suppresses checks until `until`.
    pub async fn pause_until(&self, until: Instant) {
        self.inner.lock().await.paused_until = Some(until);
    }

    /// Suppresses checks for `duration` from now.
    pub async fn pause_for(&self, duration: Duration) {
        self.pause_until(Instant::now() + duration).await;
    }

    /// Suppresses `UpdateAvailable` notifications until a release strictly
    /// newer than `version` appears.
    pub async fn skip_version(&self, version: String) {
        self.inner.lock().await.skipped_version = Some(version);
    }

    /// Removes any skip-version suppression.
    pub async fn clear_skipped_version(&self) {
        self.inner.lock().await.skipped_version = None;
    }

    /// Returns the cached release, if any.
    pub async fn cached_latest_release(&self) -> Option<ReleaseInfo> {
        let mut inner = self.inner.lock().await;
        if inner.cached_release.is_none() {
            inner.cached_release = cache::load(self.cache_store.as_ref(), &inner.strategy.repo_full_name).await;
        }
        inner.cached_release.clone()
    }

    /// Whether the cached release compares newer than the configured
    /// current version.
    pub async fn has_newer_version_in_cache(&self) -> bool {
        self.cached_latest_release().await.is_some_and(|release| release.is_newer_than_current)
    }

    /// The last error observed by a check, if any.
    pub async fn last_error(&self) -> Option<UpdateError> {
        self.inner.lock().await.last_error.clone()
    }

    /// Runs a regular tick: honors `paused_until`, `skipped_version`, and
    /// `min_check_interval`.
    pub async fn tick(&self) {
        let skip_due_to_cadence = {
            let inner = self.inner.lock().await;
            let now = Instant::now();
            let paused = inner.paused_until.is_some_and(|until| until > now);
            let skipped = inner.cached_release.as_ref().is_some_and(|r| Some(&r.version_string) == inner.skipped_version.as_ref());
            let too_soon = inner.last_check_time.is_some_and(|last| last + inner.strategy.min_check_interval > now);
            paused || skipped || too_soon
        };
        if skip_due_to_cadence {
            return;
        }
        self.run_check(None).await;
    }

    /// Forces an immediate check, bypassing `min_check_interval` but still
    /// honoring pause and the retry budget. `on_done` is invoked with the
    /// outcome.
    pub async fn check_now(&self, on_done: CheckNowHandler) {
        let paused = {
            let inner = self.inner.lock().await;
            inner.paused_until.is_some_and(|until| until > Instant::now())
        };
        if paused {
            on_done(Ok(()));
            return;
        }
        let result = self.run_check(None).await;
        on_done(result);
    }

    async fn run_check(&self, _reserved: Option<()>) -> UpdateResult<()> {
        let (repo, token, max_retry, base_backoff, include_prereleases, current_version) = {
            let mut inner = self.inner.lock().await;
            inner.last_check_time = Some(Instant::now());
            (
                inner.strategy.repo_full_name.clone(),
                inner.strategy.token.clone(),
                inner.strategy.max_retry_count,
                inner.strategy.min_retry_interval,
                inner.strategy.include_prereleases,
                inner.current_version.clone(),
            )
        };

        if repo.is_empty() {
            return Err(UpdateError::NoReleases);
        }

        let url = if include_prereleases {
            format!("https://api.github.com/repos/{repo}/releases")
        } else {
            format!("https://api.github.com/repos/{repo}/releases/latest")
        };
        let mut headers = vec![("User-Agent".to_string(), "mobile-vnc-core".to_string())];
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        let mut attempt = 0u32;
        let result = loop {
            match self.http.get(&url, &headers).await {
                Ok((status, body)) if (200..300).contains(&status) => break self.decode_and_record(&body, include_prereleases, &current_version, &repo).await,
                Ok((status, _)) if status == 429 => break Err(UpdateError::RateLimited),
                Ok((status, _)) if (500..600).contains(&status) => {
                    if attempt >= max_retry {
                        break Err(UpdateError::Http(status));
                    }
                }
                Ok((status, _)) => break Err(UpdateError::Http(status)),
                Err(message) => {
                    if attempt >= max_retry {
                        break Err(UpdateError::Transport(message));
                    }
                }
            }
            let backoff = base_backoff * 2u32.pow(attempt);
            attempt += 1;
            tokio::time::sleep(backoff).await;
        };

        let mut inner = self.inner.lock().await;
        inner.last_error = result.as_ref().err().cloned();
        result
    }

    async fn decode_and_record(&self, body: &[u8], include_prereleases: bool, current_version: &str, repo: &str) -> UpdateResult<()> {
        let release = if include_prereleases {
            let raw: Vec<RawGithubRelease> = serde_json::from_slice(body).map_err(|e| UpdateError::Decode(e.to_string()))?;
            raw.into_iter().next().ok_or(UpdateError::NoReleases)?
        } else {
            serde_json::from_slice::<RawGithubRelease>(body).map_err(|e| UpdateError::Decode(e.to_string()))?
        };

        let release = ReleaseInfo::from_raw(release, current_version);
        cache::save(self.cache_store.as_ref(), repo, &release).await;

        let should_notify = {
            let mut inner = self.inner.lock().await;
            let suppressed = inner.skipped_version.as_deref() == Some(release.version_string.as_str());
            inner.cached_release = Some(release.clone());
            release.is_newer_than_current && !suppressed
        };

        if should_notify {
            self.logger.info(&format!("{UPDATE_AVAILABLE_NOTIFICATION}: {}", release.version_string));
            if let Some(handler) = self.handler.lock().await.as_mut() {
                handler(release);
            }
        }
        Ok(())
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        value.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Mutex as AsyncMutex;

    struct FakeFetcher {
        body: Vec<u8>,
        status: u16,
        calls: AtomicU32,
    }

    #[async_trait::async_trait]
    impl HttpFetcher for FakeFetcher {
        async fn get(&self, _url: &str, _headers: &[(String, String)]) -> Result<(u16, Vec<u8>), String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((self.status, self.body.clone()))
        }
    }

    struct MemCache {
        store: AsyncMutex<Option<Vec<u8>>>,
    }

    #[async_trait::async_trait]
    impl CacheStore for MemCache {
        async fn read(&self, _key: &str) -> Option<Vec<u8>> {
            self.store.lock().await.clone()
        }

        async fn write(&self, _key: &str, value: &[u8]) {
            *self.store.lock().await = Some(value.to_vec());
        }
    }

    fn release_body(tag: &str) -> Vec<u8> {
        serde_json::to_vec(&RawGithubRelease {
            tag_name: tag.to_string(),
            name: None,
            body: None,
            html_url: None,
            published_at: None,
            prerelease: false,
        })
        .unwrap()
    }

    fn strategy() -> UpdateStrategy {
        UpdateStrategy { repo_full_name: "acme/widget".into(), min_check_interval: Duration::from_secs(0), ..Default::default() }
    }

    #[tokio::test]
    async fn newer_release_dispatches_update_available() {
        let fetcher = Arc::new(FakeFetcher { body: release_body("v1.1.0"), status: 200, calls: AtomicU32::new(0) });
        let cache = Arc::new(MemCache { store: AsyncMutex::new(None) });
        let poller = UpdatePoller::new(strategy(), "1.0.0".into(), fetcher, cache, Logger::default());

        let notified = Arc::new(AsyncMutex::new(None));
        let notified_clone = Arc::clone(&notified);
        poller
            .start(Box::new(move |release: ReleaseInfo| {
                let notified_clone = Arc::clone(&notified_clone);
                tokio::spawn(async move {
                    *notified_clone.lock().await = Some(release);
                });
            }))
            .await;

        poller.tick().await;
        tokio::task::yield_now().await;
        assert!(poller.has_newer_version_in_cache().await);
    }

    #[tokio::test]
    async fn skip_version_suppresses_notification_for_that_version() {
        let fetcher = Arc::new(FakeFetcher { body: release_body("v1.1.0"), status: 200, calls: AtomicU32::new(0) });
        let cache = Arc::new(MemCache { store: AsyncMutex::new(None) });
        let poller = UpdatePoller::new(strategy(), "1.0.0".into(), fetcher, cache, Logger::default());
        poller.skip_version("1.1.0".into()).await;

        let fired = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let fired_clone = Arc::clone(&fired);
        poller.start(Box::new(move |_| fired_clone.store(true, Ordering::SeqCst))).await;
        poller.tick().await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn pause_suppresses_ticks() {
        let fetcher = Arc::new(FakeFetcher { body: release_body("v1.1.0"), status: 200, calls: AtomicU32::new(0) });
        let cache = Arc::new(MemCache { store: AsyncMutex::new(None) });
        let poller = UpdatePoller::new(strategy(), "1.0.0".into(), fetcher, cache, Logger::default());
        poller.pause_for(Duration::from_secs(60)).await;
        poller.tick().await;
        assert!(poller.cached_latest_release().await.is_none());
    }
}
