//! Error types shared across the core components.
//!
//! Each component that can fail gets its own `thiserror`-derived enum.
//! Configuration errors are returned synchronously from validation/start;
//! runtime errors are delivered through a completion callback or event
//! stream without tearing the component down (the watchdog moves to
//! `Crashed`, the update poller just waits for the next tick).

use thiserror::Error;

/// Errors produced by the pixel engine.
#[derive(Debug, Error)]
pub enum PixelError {
    /// A coordinate, rectangle, or crop region fell outside the image's bounds.
    #[error("out of bounds")]
    OutOfBounds,

    /// A requested size (width/height) was not positive, or an operation that
    /// requires a normalized image was called on one that isn't.
    #[error("invalid size")]
    InvalidSize,
}

/// Result type for pixel engine operations.
pub type PixelResult<T> = std::result::Result<T, PixelError>;

/// Watchdog public error domain, mirroring `TRWatchDogErrorDomain` for host
/// binaries that bridge onto an existing error-domain-based reporting scheme.
pub const WATCHDOG_ERROR_DOMAIN: &str = "TRWatchDogErrorDomain";

/// Errors produced by the watchdog, both configuration-time and runtime.
///
/// Numeric codes match the original implementation's error codes so host
/// binaries that surface them to a legacy error domain keep doing so.
#[derive(Debug, Error)]
pub enum WatchdogError {
    /// `label` was empty. Code 1001.
    #[error("missing label")]
    MissingLabel,

    /// `program_arguments` was empty. Code 1002.
    #[error("missing program")]
    MissingProgram,

    /// `program_arguments[0]` was not an absolute, existing, executable file. Code 1003.
    #[error("invalid executable: {0}")]
    InvalidExecutable(String),

    /// `working_directory` was set but is not a directory. Code 1004.
    #[error("invalid working directory: {0}")]
    InvalidWorkingDirectory(String),

    /// The `ProcessRunner` failed to launch the child process. Code 1101.
    #[error("task launch failed: {0}")]
    TaskLaunchFailed(String),

    /// The requested operation isn't valid from the watchdog's current state. Code 1102.
    #[error("invalid state for this operation")]
    InvalidState,
}

impl WatchdogError {
    /// Returns the original implementation's numeric error code for this variant.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::MissingLabel => 1001,
            Self::MissingProgram => 1002,
            Self::InvalidExecutable(_) => 1003,
            Self::InvalidWorkingDirectory(_) => 1004,
            Self::TaskLaunchFailed(_) => 1101,
            Self::InvalidState => 1102,
        }
    }
}

/// Result type for watchdog operations.
pub type WatchdogResult<T> = std::result::Result<T, WatchdogError>;

/// Update poller public error domain, mirroring `GitHubReleaseUpdaterErrorDomain`.
pub const UPDATE_ERROR_DOMAIN: &str = "GitHubReleaseUpdaterErrorDomain";

/// Errors produced by the update poller.
#[derive(Debug, Clone, Error)]
pub enum UpdateError {
    /// The `HttpFetcher` failed below the HTTP layer (DNS, connect, TLS, I/O).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server returned a non-2xx status.
    #[error("HTTP error: {0}")]
    Http(u16),

    /// The response body could not be decoded into a release.
    #[error("decode error: {0}")]
    Decode(String),

    /// The request was rejected due to rate limiting.
    #[error("rate limited")]
    RateLimited,

    /// The in-flight check was cancelled by `stop()`/`configure()`.
    #[error("cancelled")]
    Cancelled,

    /// The repository has no releases.
    #[error("no releases")]
    NoReleases,
}

/// Result type for update poller operations.
pub type UpdateResult<T> = std::result::Result<T, UpdateError>;
