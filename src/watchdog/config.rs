//! Watchdog configuration and keep-alive policy.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{WatchdogError, WatchdogResult};
use crate::interfaces::{ExitOutcome, TerminationReason};

/// Whether a crashed/exited child should be relaunched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum KeepAlive {
    /// Always restart.
    Always,
    /// Never restart.
    Never,
    /// Restart iff every specified sub-condition matches the observed exit.
    /// Unspecified fields are treated as "don't care".
    Policy {
        /// Matches iff exit status was 0.
        successful_exit: Option<bool>,
        /// Matches iff the termination reason was `UncaughtSignal` or the
        /// exit status was nonzero.
        crashed: Option<bool>,
        /// Reserved for coordinating with a sibling job; always matches
        /// since this crate has no notion of other jobs.
        other_job_enabled: Option<bool>,
    },
}

impl Default for KeepAlive {
    fn default() -> Self {
        Self::Always
    }
}

impl KeepAlive {
    /// Decides whether `outcome` should trigger a restart.
    #[must_use]
    pub fn should_restart(&self, outcome: &ExitOutcome) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Policy { successful_exit, crashed, .. } => {
                let is_successful = outcome.exit_status == Some(0);
                let is_crashed = outcome.reason == TerminationReason::UncaughtSignal || outcome.exit_status.is_some_and(|s| s != 0);

                if successful_exit.is_none() && crashed.is_none() {
                    return true;
                }
                let success_matches = successful_exit.is_none_or(|want| want == is_successful);
                let crash_matches = crashed.is_none_or(|want| want == is_crashed);
                success_matches && crash_matches
            }
        }
    }
}

/// Configuration for a supervised child process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchdogConfig {
    /// A human-readable identifier for logs and error messages.
    pub label: String,
    /// argv; `program_arguments[0]` is the executable path.
    pub program_arguments: Vec<String>,
    /// Environment variables passed to the child.
    pub environment: Vec<(String, String)>,
    /// Working directory, if not inherited.
    pub working_directory: Option<PathBuf>,
    /// Redirect target for stdin.
    pub stdin_path: Option<PathBuf>,
    /// Redirect target for stdout.
    pub stdout_path: Option<PathBuf>,
    /// Redirect target for stderr.
    pub stderr_path: Option<PathBuf>,
    /// User to run as.
    pub user_name: Option<String>,
    /// Group to run as.
    pub group_name: Option<String>,
    /// `-1` unset, `0` default (new group), `>0` explicit pgid.
    pub process_group_identifier: i32,
    /// How long `Stopping` waits for a graceful exit before escalating to
    /// SIGKILL.
    #[serde(with = "duration_secs")]
    pub exit_timeout: Duration,
    /// Minimum gap between successive launches.
    #[serde(with = "duration_secs")]
    pub throttle_interval: Duration,
    /// Restart policy.
    pub keep_alive: KeepAlive,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            label: String::new(),
            program_arguments: Vec::new(),
            environment: Vec::new(),
            working_directory: None,
            stdin_path: None,
            stdout_path: None,
            stderr_path: None,
            user_name: None,
            group_name: None,
            process_group_identifier: -1,
            exit_timeout: Duration::from_secs(5),
            throttle_interval: Duration::from_secs(10),
            keep_alive: KeepAlive::Always,
        }
    }
}

impl WatchdogConfig {
    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::MissingLabel`] if `label` is empty,
    /// [`WatchdogError::MissingProgram`] if `program_arguments` is empty,
    /// [`WatchdogError::InvalidExecutable`] if `program_arguments[0]` isn't
    /// an absolute, existing, executable file, or
    /// [`WatchdogError::InvalidWorkingDirectory`] if `working_directory` is
    /// set but isn't a directory.
    pub fn validate(&self) -> WatchdogResult<()> {
        if self.label.is_empty() {
            return Err(WatchdogError::MissingLabel);
        }
        let Some(executable) = self.program_arguments.first() else {
            return Err(WatchdogError::MissingProgram);
        };
        if !is_executable_file(Path::new(executable)) {
            return Err(WatchdogError::InvalidExecutable(executable.clone()));
        }
        if let Some(dir) = &self.working_directory {
            if !dir.is_dir() {
                return Err(WatchdogError::InvalidWorkingDirectory(dir.display().to_string()));
            }
        }
        Ok(())
    }
}

fn is_executable_file(path: &Path) -> bool {
    if !path.is_absolute() {
        return false;
    }
    let Ok(metadata) = path.metadata() else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
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

    fn outcome(exit_status: Option<i32>, reason: TerminationReason) -> ExitOutcome {
        ExitOutcome { reason, exit_status, signal: None }
    }

    #[test]
    fn validate_rejects_empty_label() {
        let config = WatchdogConfig { label: String::new(), program_arguments: vec!["/bin/true".into()], ..Default::default() };
        assert!(matches!(config.validate(), Err(WatchdogError::MissingLabel)));
    }

    #[test]
    fn validate_rejects_empty_program_arguments() {
        let config = WatchdogConfig { label: "svc".into(), program_arguments: vec![], ..Default::default() };
        assert!(matches!(config.validate(), Err(WatchdogError::MissingProgram)));
    }

    #[test]
    fn validate_rejects_relative_executable() {
        let config = WatchdogConfig { label: "svc".into(), program_arguments: vec!["true".into()], ..Default::default() };
        assert!(matches!(config.validate(), Err(WatchdogError::InvalidExecutable(_))));
    }

    #[test]
    fn keep_alive_always_always_restarts() {
        assert!(KeepAlive::Always.should_restart(&outcome(Some(1), TerminationReason::Exit)));
    }

    #[test]
    fn keep_alive_never_never_restarts() {
        assert!(!KeepAlive::Never.should_restart(&outcome(Some(0), TerminationReason::Exit)));
    }

    #[test]
    fn keep_alive_policy_with_no_fields_set_behaves_like_always() {
        let policy = KeepAlive::Policy { successful_exit: None, crashed: None, other_job_enabled: None };
        assert!(policy.should_restart(&outcome(Some(0), TerminationReason::Exit)));
    }

    #[test]
    fn keep_alive_policy_restarts_only_on_crash() {
        let policy = KeepAlive::Policy { successful_exit: None, crashed: Some(true), other_job_enabled: None };
        assert!(policy.should_restart(&outcome(Some(1), TerminationReason::Exit)));
        assert!(!policy.should_restart(&outcome(Some(0), TerminationReason::Exit)));
    }

    #[test]
    fn keep_alive_policy_restarts_only_on_successful_exit() {
        let policy = KeepAlive::Policy { successful_exit: Some(true), crashed: None, other_job_enabled: None };
        assert!(policy.should_restart(&outcome(Some(0), TerminationReason::Exit)));
        assert!(!policy.should_restart(&outcome(Some(1), TerminationReason::Exit)));
    }
}
