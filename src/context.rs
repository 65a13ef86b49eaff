//! Wiring: constructs one instance of each component from a [`Config`] and
//! a set of platform collaborators, replacing the singletons
//! (`+sharedCapturer`, `+sharedManager`, ...) the original implementation
//! exposes as class methods. Callers build exactly one `Context` at startup
//! and pass it (or its component handles) around explicitly; nothing here
//! is a process-wide global.

use std::sync::Arc;

use crate::capture::CapturePipeline;
use crate::clipboard::ClipboardBridge;
use crate::config::Config;
use crate::interfaces::{CacheStore, HidProvider, HttpFetcher, LayerId, PasteboardProvider, ProcessRunner, SurfaceProvider};
use crate::logging::Logger;
use crate::update::UpdatePoller;
use crate::watchdog::Watchdog;

/// The platform-specific collaborators a host binary supplies.
///
/// Every field is a trait object because the concrete implementation is
/// device-specific; the core only ever calls through the trait boundary.
pub struct Providers {
    /// Display/surface capture.
    pub surface: Arc<dyn SurfaceProvider>,
    /// HID event injection. Not wired to any component directly — the core
    /// never decides *when* to inject input, only a host's RFB message
    /// decoder does — but it's threaded through `Context` so callers have
    /// one place to reach it from.
    pub hid: Arc<dyn HidProvider>,
    /// Local pasteboard access.
    pub pasteboard: Arc<dyn PasteboardProvider>,
    /// Child process spawning/signaling for the watchdog.
    pub process_runner: Arc<dyn ProcessRunner>,
    /// Outbound HTTP for the update poller.
    pub http: Arc<dyn HttpFetcher>,
    /// Persisted key/value storage for the update poller's release cache.
    pub cache_store: Arc<dyn CacheStore>,
}

/// Owns one instance of every core component, wired against the
/// [`Providers`] a host binary supplies.
///
/// Construct exactly one `Context` at process startup (behind a
/// thread-safe lazy initializer if the host binary itself wants a
/// singleton-looking entry point) and pass it, or the specific component
/// handles it exposes, to the rest of the application explicitly.
pub struct Context {
    /// Screen-capture pipeline.
    pub capture: CapturePipeline,
    /// Process supervisor for the RFB server's own child process, if any.
    pub watchdog: Arc<Watchdog>,
    /// GitHub Releases update poller.
    pub update: Arc<UpdatePoller>,
    /// Local/remote clipboard bridge.
    pub clipboard: Arc<ClipboardBridge>,
    /// The HID injection collaborator, passed through unwired.
    pub hid: Arc<dyn HidProvider>,
    /// The logger handle every component above was built with.
    pub logger: Logger,
}

impl Context {
    /// Builds a `Context`, constructing one instance of each component from
    /// `config` and wiring it against the matching collaborator in
    /// `providers`.
    #[must_use]
    pub fn new(config: Config, providers: Providers, logger: Logger, capture_layer: LayerId, current_version: String) -> Self {
        let capture = CapturePipeline::new(config.capture, Arc::clone(&providers.surface), capture_layer, logger);

        let watchdog = Arc::new(Watchdog::new(config.watchdog, Arc::clone(&providers.process_runner), logger));

        let update = Arc::new(UpdatePoller::new(
            config.update,
            current_version,
            Arc::clone(&providers.http),
            Arc::clone(&providers.cache_store),
            logger,
        ));

        let clipboard = Arc::new(ClipboardBridge::new(Arc::clone(&providers.pasteboard), logger));

        Self { capture, watchdog, update, clipboard, hid: providers.hid, logger }
    }
}
