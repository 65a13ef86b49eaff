//! Process supervisor: launches, monitors, throttles, and restarts a child
//! process according to a configurable keep-alive policy.

mod config;

pub use config::{KeepAlive, WatchdogConfig};

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::error::{WatchdogError, WatchdogResult};
use crate::interfaces::{ExitOutcome, LaunchRequest, ProcessHandle, ProcessRunner, TerminationReason};
use crate::logging::Logger;

/// Supervisor state, per `spec.md` §4.5's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WatchdogState {
    /// Not running, no pending relaunch.
    Stopped = 0,
    /// Launch requested, awaiting the process runner's result.
    Starting = 1,
    /// Child is alive.
    Running = 2,
    /// SIGTERM sent, awaiting exit or escalation to SIGKILL.
    Stopping = 3,
    /// Child has exited; keep-alive decision pending or already applied.
    Crashed = 4,
    /// Restart deferred until the throttle interval elapses.
    Throttled = 5,
}

impl TryFrom<u8> for WatchdogState {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Stopped),
            1 => Ok(Self::Starting),
            2 => Ok(Self::Running),
            3 => Ok(Self::Stopping),
            4 => Ok(Self::Crashed),
            5 => Ok(Self::Throttled),
            _ => Err(()),
        }
    }
}

/// Observable metrics and last-exit details.
#[derive(Debug, Clone, Default)]
pub struct WatchdogMetrics {
    /// Number of `Starting` → `Running` transitions after the first.
    pub restart_count: u32,
    /// Sum of `process_end - process_start` across generations, plus the
    /// live delta if currently running.
    pub total_uptime: Duration,
    /// Exit status of the last completed run, if it exited normally.
    pub last_exit_status: Option<i32>,
    /// Signal that terminated the last completed run, if any.
    pub last_uncaught_signal: Option<i32>,
    /// Why the last run ended.
    pub last_termination_reason: Option<TerminationReason>,
}

struct Inner {
    handle: Option<ProcessHandle>,
    pid: Option<u32>,
    process_start_time: Option<Instant>,
    last_start_time: Option<Instant>,
    metrics: WatchdogMetrics,
    generation: u64,
}

impl Default for Inner {
    fn default() -> Self {
        Self { handle: None, pid: None, process_start_time: None, last_start_time: None, metrics: WatchdogMetrics::default(), generation: 0 }
    }
}

type StateHandler = Box<dyn FnMut(WatchdogState) + Send>;

/// A supervised child process.
///
/// All public state is readable from any thread via atomic snapshots;
/// mutation is serialized through an internal `tokio::sync::Mutex`, the
/// async analog of a single serial queue.
pub struct Watchdog {
    config: Mutex<WatchdogConfig>,
    process_runner: Arc<dyn ProcessRunner>,
    state: Arc<AtomicU8>,
    inner: Arc<Mutex<Inner>>,
    handler: Arc<Mutex<Option<StateHandler>>>,
    logger: Logger,
}

impl Watchdog {
    /// Builds a watchdog in the `Stopped` state.
    #[must_use]
    pub fn new(config: WatchdogConfig, process_runner: Arc<dyn ProcessRunner>, logger: Logger) -> Self {
        Self {
            config: Mutex::new(config),
            process_runner,
            state: Arc::new(AtomicU8::new(WatchdogState::Stopped as u8)),
            inner: Arc::new(Mutex::new(Inner::default())),
            handler: Arc::new(Mutex::new(None)),
            logger,
        }
    }

    /// An atomic snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> WatchdogState {
        WatchdogState::try_from(self.state.load(Ordering::Acquire)).unwrap_or(WatchdogState::Stopped)
    }

    fn set_state(&self, state: WatchdogState) {
        self.state.store(state as u8, Ordering::Release);
        if let Ok(mut handler) = self.handler.try_lock() {
            if let Some(handler) = handler.as_mut() {
                handler(state);
            }
        }
    }

    /// Registers a callback invoked on every state transition, replacing any
    /// previous callback.
    pub async fn on_state_change(&self, handler: StateHandler) {
        *self.handler.lock().await = Some(handler);
    }

    /// A snapshot of the current metrics.
    pub async fn metrics(&self) -> WatchdogMetrics {
        let inner = self.inner.lock().await;
        let mut metrics = inner.metrics.clone();
        if self.state() == WatchdogState::Running {
            if let Some(start) = inner.process_start_time {
                metrics.total_uptime += start.elapsed();
            }
        }
        metrics
    }

    /// Remaining time before the next restart attempt is permitted; `0` if
    /// a relaunch may proceed immediately.
    pub async fn time_until_next_restart(&self) -> Duration {
        let inner = self.inner.lock().await;
        let config = self.config.lock().await;
        match inner.last_start_time {
            Some(last) => {
                let elapsed = last.elapsed();
                config.throttle_interval.saturating_sub(elapsed)
            }
            None => Duration::ZERO,
        }
    }

    /// Validates the configuration and launches the child.
    ///
    /// # Errors
    ///
    /// Returns the validation error without changing state if the
    /// configuration is invalid. Returns
    /// [`WatchdogError::TaskLaunchFailed`] if the process runner fails to
    /// launch the process (state becomes `Crashed` in that case, per the
    /// state machine).
    pub async fn start(self: &Arc<Self>) -> WatchdogResult<()> {
        if self.state() == WatchdogState::Running || self.state() == WatchdogState::Starting {
            return Ok(());
        }

        let config = self.config.lock().await.clone();
        config.validate()?;

        self.set_state(WatchdogState::Starting);

        let request = LaunchRequest {
            argv: config.program_arguments.clone(),
            environment: config.environment.clone(),
            working_directory: config.working_directory.as_ref().map(|p| p.display().to_string()),
            stdin_path: config.stdin_path.as_ref().map(|p| p.display().to_string()),
            stdout_path: config.stdout_path.as_ref().map(|p| p.display().to_string()),
            stderr_path: config.stderr_path.as_ref().map(|p| p.display().to_string()),
            user_name: config.user_name.clone(),
            group_name: config.group_name.clone(),
            process_group_identifier: config.process_group_identifier,
        };

        {
            let mut inner = self.inner.lock().await;
            inner.last_start_time = Some(Instant::now());
        }

        let runner = Arc::clone(&self.process_runner);
        let launch_result = tokio::task::spawn_blocking(move || runner.launch(&request)).await;

        let (handle, pid) = match launch_result {
            Ok(Ok(pair)) => pair,
            Ok(Err(err)) => {
                self.logger.error(&format!("{} failed to launch: {err}", config.label));
                let outcome = ExitOutcome { reason: TerminationReason::Exit, exit_status: None, signal: None };
                {
                    let mut inner = self.inner.lock().await;
                    Self::record_exit(&mut inner, outcome);
                }
                self.set_state(WatchdogState::Crashed);
                self.apply_keep_alive(outcome).await;
                return Err(WatchdogError::TaskLaunchFailed(err));
            }
            Err(join_err) => {
                self.logger.error(&format!("{} launch task panicked: {join_err}", config.label));
                let outcome = ExitOutcome { reason: TerminationReason::Exit, exit_status: None, signal: None };
                {
                    let mut inner = self.inner.lock().await;
                    Self::record_exit(&mut inner, outcome);
                }
                self.set_state(WatchdogState::Crashed);
                self.apply_keep_alive(outcome).await;
                return Err(WatchdogError::TaskLaunchFailed(join_err.to_string()));
            }
        };

        {
            let mut inner = self.inner.lock().await;
            inner.handle = Some(handle);
            inner.pid = Some(pid);
            inner.process_start_time = Some(Instant::now());
            if inner.generation > 0 {
                inner.metrics.restart_count += 1;
            }
            inner.generation += 1;
        }
        self.set_state(WatchdogState::Running);
        self.logger.info(&format!("{} running as pid {pid}", config.label));

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.supervise(handle).await;
        });

        Ok(())
    }

    /// Waits for the child to exit (on a blocking worker) and applies the
    /// keep-alive decision.
    async fn supervise(self: Arc<Self>, handle: ProcessHandle) {
        let runner = Arc::clone(&self.process_runner);
        let outcome = tokio::task::spawn_blocking(move || runner.wait(handle)).await;
        let Ok(outcome) = outcome else {
            return;
        };

        if self.state() == WatchdogState::Stopping {
            self.set_state(WatchdogState::Stopped);
            let mut inner = self.inner.lock().await;
            Self::record_exit(&mut inner, outcome);
            return;
        }

        {
            let mut inner = self.inner.lock().await;
            Self::record_exit(&mut inner, outcome);
        }
        self.set_state(WatchdogState::Crashed);
        self.apply_keep_alive(outcome).await;
    }

    fn record_exit(inner: &mut Inner, outcome: ExitOutcome) {
        inner.metrics.last_exit_status = outcome.exit_status;
        inner.metrics.last_uncaught_signal = outcome.signal;
        inner.metrics.last_termination_reason = Some(outcome.reason);
        if let Some(start) = inner.process_start_time.take() {
            inner.metrics.total_uptime += start.elapsed();
        }
        inner.handle = None;
        inner.pid = None;
    }

    async fn apply_keep_alive(self: &Arc<Self>, outcome: ExitOutcome) {
        let keep_alive = self.config.lock().await.keep_alive.clone();
        if !keep_alive.should_restart(&outcome) {
            self.set_state(WatchdogState::Stopped);
            return;
        }

        let wait = self.time_until_next_restart().await;
        if wait.is_zero() {
            let _ = self.start().await;
            return;
        }

        self.set_state(WatchdogState::Throttled);
        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            if this.state() == WatchdogState::Throttled {
                let _ = this.start().await;
            }
        });
    }

    /// Requests graceful shutdown: sends SIGTERM and starts the exit timer;
    /// escalates to SIGKILL if the child hasn't exited within
    /// `exit_timeout`.
    pub async fn stop(self: &Arc<Self>) {
        if self.state() != WatchdogState::Running {
            return;
        }
        self.set_state(WatchdogState::Stopping);

        let handle = self.inner.lock().await.handle;
        let Some(handle) = handle else {
            self.set_state(WatchdogState::Stopped);
            return;
        };

        let exit_timeout = self.config.lock().await.exit_timeout;
        let runner = Arc::clone(&self.process_runner);
        tokio::task::spawn_blocking(move || {
            runner.signal(handle, libc_sigterm());
        })
        .await
        .ok();

        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(exit_timeout).await;
            if this.state() == WatchdogState::Stopping {
                let runner = Arc::clone(&this.process_runner);
                tokio::task::spawn_blocking(move || {
                    runner.terminate_and_wait(handle, Duration::ZERO);
                })
                .await
                .ok();
                this.set_state(WatchdogState::Stopped);
            }
        });
    }

    /// Restarts the child: stop (if running) followed by start.
    pub async fn restart(self: &Arc<Self>) -> WatchdogResult<()> {
        self.stop().await;
        self.start().await
    }

    /// Delivers `sig` to the child. Returns `false` unless the state is
    /// `Running` or `Stopping`.
    pub async fn send_signal(&self, sig: i32) -> bool {
        if !matches!(self.state(), WatchdogState::Running | WatchdogState::Stopping) {
            return false;
        }
        let Some(handle) = self.inner.lock().await.handle else {
            return false;
        };
        let runner = Arc::clone(&self.process_runner);
        tokio::task::spawn_blocking(move || runner.signal(handle, sig)).await.unwrap_or(false)
    }

    /// Replaces the watchdog's configuration. Takes effect on the next
    /// `start()`/`restart()`.
    pub async fn reconfigure(&self, config: WatchdogConfig) {
        *self.config.lock().await = config;
    }
}

/// `SIGTERM`'s numeric value on the platforms this crate targets.
fn libc_sigterm() -> i32 {
    15
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex as StdMutex;

    struct ScriptedRunner {
        launch_calls: AtomicU32,
        exit_status: StdMutex<Option<i32>>,
    }

    /// A runner whose first `fail_until` launches fail, after which it
    /// succeeds. Used to exercise keep-alive-driven retry after a
    /// launch-failure crash.
    struct FlakyLaunchRunner {
        launch_calls: AtomicU32,
        fail_until: u32,
    }

    impl ProcessRunner for FlakyLaunchRunner {
        fn launch(&self, _request: &LaunchRequest) -> Result<(ProcessHandle, u32), String> {
            let attempt = self.launch_calls.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_until {
                Err("launch failed".to_string())
            } else {
                Ok((1, 1234))
            }
        }

        fn wait(&self, _handle: ProcessHandle) -> ExitOutcome {
            ExitOutcome { reason: TerminationReason::Exit, exit_status: Some(0), signal: None }
        }

        fn signal(&self, _handle: ProcessHandle, _sig: i32) -> bool {
            true
        }

        fn terminate_and_wait(&self, _handle: ProcessHandle, _timeout: Duration) -> TerminationReason {
            TerminationReason::Exit
        }
    }

    impl ProcessRunner for ScriptedRunner {
        fn launch(&self, _request: &LaunchRequest) -> Result<(ProcessHandle, u32), String> {
            self.launch_calls.fetch_add(1, Ordering::SeqCst);
            Ok((1, 1234))
        }

        fn wait(&self, _handle: ProcessHandle) -> ExitOutcome {
            let status = *self.exit_status.lock().unwrap();
            ExitOutcome { reason: TerminationReason::Exit, exit_status: status, signal: None }
        }

        fn signal(&self, _handle: ProcessHandle, _sig: i32) -> bool {
            true
        }

        fn terminate_and_wait(&self, _handle: ProcessHandle, _timeout: Duration) -> TerminationReason {
            TerminationReason::Exit
        }
    }

    fn valid_config() -> WatchdogConfig {
        WatchdogConfig {
            label: "test".into(),
            program_arguments: vec!["/bin/true".into()],
            throttle_interval: Duration::from_millis(10),
            ..Default::default()
        }
    }

    #[test]
    fn initial_state_is_stopped() {
        let runner = Arc::new(ScriptedRunner { launch_calls: AtomicU32::new(0), exit_status: StdMutex::new(Some(0)) });
        let watchdog = Watchdog::new(WatchdogConfig::default(), runner, Logger::default());
        assert_eq!(watchdog.state(), WatchdogState::Stopped);
    }

    #[tokio::test]
    async fn start_with_invalid_config_returns_error_and_stays_stopped() {
        let runner = Arc::new(ScriptedRunner { launch_calls: AtomicU32::new(0), exit_status: StdMutex::new(Some(0)) });
        let watchdog = Arc::new(Watchdog::new(WatchdogConfig::default(), runner, Logger::default()));
        let result = watchdog.start().await;
        assert!(matches!(result, Err(WatchdogError::MissingLabel)));
        assert_eq!(watchdog.state(), WatchdogState::Stopped);
    }

    #[tokio::test]
    async fn send_signal_fails_when_not_running() {
        let runner = Arc::new(ScriptedRunner { launch_calls: AtomicU32::new(0), exit_status: StdMutex::new(Some(0)) });
        let watchdog = Arc::new(Watchdog::new(valid_config(), runner, Logger::default()));
        assert!(!watchdog.send_signal(15).await);
    }

    #[tokio::test]
    async fn time_until_next_restart_is_zero_before_any_launch() {
        let runner = Arc::new(ScriptedRunner { launch_calls: AtomicU32::new(0), exit_status: StdMutex::new(Some(0)) });
        let watchdog = Arc::new(Watchdog::new(valid_config(), runner, Logger::default()));
        assert_eq!(watchdog.time_until_next_restart().await, Duration::ZERO);
    }

    #[tokio::test]
    async fn launch_failure_with_keep_alive_always_retries_until_it_runs() {
        let runner = Arc::new(FlakyLaunchRunner { launch_calls: AtomicU32::new(0), fail_until: 2 });
        let runner_handle = Arc::clone(&runner);
        let config = WatchdogConfig {
            keep_alive: KeepAlive::Always,
            throttle_interval: Duration::ZERO,
            ..valid_config()
        };
        let watchdog = Arc::new(Watchdog::new(config, runner, Logger::default()));

        let result = watchdog.start().await;

        // The outer call reports the first launch attempt's own failure...
        assert!(matches!(result, Err(WatchdogError::TaskLaunchFailed(_))));
        // ...but keep-alive must have retried synchronously (throttle_interval
        // is zero) until a launch finally succeeded, rather than leaving the
        // watchdog stuck in `Crashed`.
        assert_eq!(watchdog.state(), WatchdogState::Running);
        assert_eq!(runner_handle.launch_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn launch_failure_with_keep_alive_never_stays_stopped() {
        let runner = Arc::new(FlakyLaunchRunner { launch_calls: AtomicU32::new(0), fail_until: 100 });
        let config = WatchdogConfig { keep_alive: KeepAlive::Never, throttle_interval: Duration::ZERO, ..valid_config() };
        let watchdog = Arc::new(Watchdog::new(config, runner, Logger::default()));

        let result = watchdog.start().await;

        assert!(matches!(result, Err(WatchdogError::TaskLaunchFailed(_))));
        assert_eq!(watchdog.state(), WatchdogState::Stopped);
    }
}
