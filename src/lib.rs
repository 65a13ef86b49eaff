//! # mobile-vnc-core
//!
//! Core engine for a mobile-device RFB/VNC server: screen capture, process
//! supervision, pixel imaging, update polling, and clipboard sync. This
//! crate implements the subsystems where the real engineering lives; it
//! does not open sockets, encode the RFB wire protocol, render to a GUI of
//! its own, or talk to the real OS HID layer. All of that lives behind the
//! traits in [`interfaces`], which a host binary implements against the
//! actual device.
//!
//! ## Components
//!
//! - [`pixel`] — an oriented, 32-bit-per-pixel image abstraction with
//!   coordinate remapping, alpha blending, crop/resize/reflect/normalize,
//!   and PNG/JPEG/TIFF export.
//! - [`version`] — Debian-style (`dpkg --compare-versions`) version parsing
//!   and comparison.
//! - [`capture`] — a fixed-cadence screen-capture pipeline producing
//!   dirty-rectangle deltas.
//! - [`watchdog`] — a process-supervisor state machine with configurable
//!   keep-alive policy.
//! - [`update`] — a periodic GitHub Releases poller with caching and
//!   retry/backoff.
//! - [`clipboard`] — an echo-suppressing bridge between a local pasteboard
//!   and remote clients.
//! - [`Context`] — constructs one instance of each component from a
//!   [`Config`], replacing the singletons the original implementation
//!   exposes as `+sharedXXX` class methods.
//!
//! ## Quick start
//!
//! ```no_run
//! use mobile_vnc_core::{Config, Context, Providers, Logger};
//! # fn build_providers() -> Providers { unimplemented!() }
//!
//! let providers = build_providers();
//! let context = Context::new(Config::default(), providers, Logger::default(), 0, "1.0.0".to_string());
//! assert!(!context.capture.is_active());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod capture;
pub mod clipboard;
pub mod config;
pub mod context;
pub mod error;
pub mod interfaces;
pub mod logging;
pub mod pixel;
pub mod update;
pub mod version;
pub mod watchdog;

// Re-exports
pub use capture::{CaptureConfig, CaptureFrame, CapturePipeline};
pub use clipboard::ClipboardBridge;
pub use config::Config;
pub use context::{Context, Providers};
pub use error::{PixelError, UpdateError, WatchdogError};
pub use logging::{LogConfig, Logger};
pub use pixel::{Orientation, Pixel, PixelImage, Rect};
pub use update::{ReleaseInfo, UpdatePoller, UpdateStrategy};
pub use version::DpkgVersion;
pub use watchdog::{KeepAlive, Watchdog, WatchdogConfig, WatchdogState};
