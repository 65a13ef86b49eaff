//! Aggregate, `serde`-deserializable configuration for a [`crate::Context`].
//!
//! This is the typed counterpart of the on-disk configuration reader
//! `spec.md` §1 places out of scope: the crate never reads a file itself,
//! but it owns the struct a host binary deserializes one into.

use serde::{Deserialize, Serialize};

use crate::capture::CaptureConfig;
use crate::logging::LogConfig;
use crate::update::UpdateStrategy;
use crate::watchdog::WatchdogConfig;

/// Aggregates every component's configuration into one deserializable tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Capture pipeline tuning.
    pub capture: CaptureConfig,
    /// Supervised child process configuration.
    pub watchdog: WatchdogConfig,
    /// Update poller cadence/retry/repo identity.
    pub update: UpdateStrategy,
    /// Normal/verbose logging gates.
    pub log: LogConfig,
}
