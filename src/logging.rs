//! Logging facade: two severity channels (normal, verbose) over the `log`
//! crate, replacing the original implementation's `logging_enabled` /
//! `verbose_logging_enabled` process-wide booleans with an explicit handle
//! threaded through [`crate::context::Context`].

use serde::{Deserialize, Serialize};

/// Controls whether normal and verbose logging are active.
///
/// Both channels ultimately go through the `log` crate's macros — this
/// struct only gates whether a component bothers to format and emit a
/// message, not the `log` crate's own level filter (set that with
/// `env_logger`/`RUST_LOG` as usual).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LogConfig {
    /// Normal-severity logging (`info!`/`warn!`/`error!`).
    pub enabled: bool,
    /// Verbose logging (`debug!`/`trace!`).
    pub verbose: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { enabled: true, verbose: false }
    }
}

/// A logger handle components hold instead of reading a global flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger {
    config: LogConfig,
}

impl Logger {
    /// Builds a logger from `config`.
    #[must_use]
    pub fn new(config: LogConfig) -> Self {
        Self { config }
    }

    /// Whether normal-severity logging is active.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Whether verbose logging is active.
    #[must_use]
    pub fn verbose(&self) -> bool {
        self.config.verbose
    }

    /// Logs `msg` at `info` level if normal logging is enabled.
    pub fn info(&self, msg: &str) {
        if self.config.enabled {
            log::info!("{msg}");
        }
    }

    /// Logs `msg` at `warn` level if normal logging is enabled.
    pub fn warn(&self, msg: &str) {
        if self.config.enabled {
            log::warn!("{msg}");
        }
    }

    /// Logs `msg` at `error` level. Errors are always logged regardless of
    /// the normal/verbose gates.
    pub fn error(&self, msg: &str) {
        log::error!("{msg}");
    }

    /// Logs `msg` at `debug` level if verbose logging is enabled.
    pub fn debug(&self, msg: &str) {
        if self.config.verbose {
            log::debug!("{msg}");
        }
    }

    /// Logs `msg` at `trace` level if verbose logging is enabled.
    pub fn trace(&self, msg: &str) {
        if self.config.verbose {
            log::trace!("{msg}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_normal_without_verbose() {
        let logger = Logger::default();
        assert!(logger.enabled());
        assert!(!logger.verbose());
    }

    #[test]
    fn config_gates_are_independent() {
        let logger = Logger::new(LogConfig { enabled: false, verbose: true });
        assert!(!logger.enabled());
        assert!(logger.verbose());
    }
}
