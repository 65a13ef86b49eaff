//! External interfaces: traits the core is wired against rather than
//! implemented by the core itself. Every platform-specific collaborator
//! (surface capture, HID injection, pasteboard, process spawning, HTTP,
//! on-disk caching) lives behind one of these.

use std::time::Duration;

/// Opaque handle to a display, returned by [`SurfaceProvider::get_main_display`].
pub type DisplayHandle = u64;

/// Opaque handle to a surface (a displayed frame buffer).
pub type SurfaceHandle = u64;

/// A compositing layer selector, passed through to the Surface Provider
/// unexamined by the core.
pub type LayerId = u32;

/// Pixel format of a surface. The core only ever requests `Argb8888`, but
/// the type exists so a `SurfaceProvider` can report what it actually
/// handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfacePixelFormat {
    /// 32 bits per pixel, byte order A,R,G,B in memory.
    Argb8888,
    /// 32 bits per pixel, byte order R,G,B,A in memory.
    Rgba8888,
}

/// A read-only view onto a captured surface's backing memory.
#[derive(Debug, Clone)]
pub struct SurfaceView {
    /// Row-major pixel data, `stride * height` bytes.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row stride in pixels (may exceed `width`).
    pub stride: u32,
    /// Pixel format of `data`.
    pub format: SurfacePixelFormat,
    /// Opaque generation counter. The capture pipeline treats two
    /// consecutive ticks with an unchanged generation as producing no new
    /// frame (absent `force_next_update`).
    pub generation: u64,
}

/// Access to the device's display surfaces.
///
/// Implemented by a host binary on top of the real platform capture API
/// (`IOSurface`/`CADisplayLink` on the original device, a framebuffer device
/// or compositor protocol elsewhere).
pub trait SurfaceProvider: Send + Sync {
    /// Returns a handle to the main display.
    fn get_main_display(&self) -> DisplayHandle;

    /// Returns the pixel dimensions of `display`.
    fn get_display_size(&self, display: DisplayHandle) -> (u32, u32);

    /// Returns the default (not-yet-composited) surface for `display`/`layer`.
    fn get_default_surface(&self, display: DisplayHandle, layer: LayerId) -> Option<SurfaceView>;

    /// Returns a copy of the currently displayed (fully composited) surface
    /// for `display`/`layer`. This is the surface the capture pipeline reads
    /// from each tick.
    fn copy_displayed_surface(&self, display: DisplayHandle, layer: LayerId) -> Option<SurfaceView>;

    /// Whether `surface`'s backing memory is still valid/in use.
    fn is_in_use(&self, surface: &SurfaceView) -> bool;
}

/// A point in oriented screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HidPoint {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

/// A hardware button the device exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareButton {
    /// Home/menu button.
    HomeMenu,
    /// Power button.
    Power,
    /// Mute switch.
    Mute,
    /// Volume up/down.
    Volume,
    /// Screen brightness up/down.
    Brightness,
}

/// How a button or tap gesture should be actuated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuationKind {
    /// A single, brief press (~50ms).
    Press,
    /// Two presses in quick succession (~150ms gap).
    Double,
    /// Three presses in quick succession.
    Triple,
    /// A press held for the long-press duration (~2s).
    Long,
    /// Press down only, held until a matching `Up`.
    Down,
    /// Release a previously-held `Down`.
    Up,
}

/// Single press duration, per `spec.md`'s HID timing constants.
pub const SINGLE_PRESS_DURATION: Duration = Duration::from_millis(50);
/// Gap between presses in a double/triple tap.
pub const MULTI_PRESS_GAP: Duration = Duration::from_millis(150);
/// Duration a long press is held.
pub const LONG_PRESS_DURATION: Duration = Duration::from_secs(2);

/// Primitive HID operations the core invokes in response to decoded client
/// input. Implemented by a host binary against the real HID injection layer.
pub trait HidProvider: Send + Sync {
    /// Begins a touch with `count` simultaneous contact points at `point`.
    fn touch_down(&self, point: HidPoint, count: u32);
    /// Ends a touch with `count` simultaneous contact points at `point`.
    fn lift_up(&self, point: HidPoint, count: u32);

    /// Stylus contacts the surface.
    fn stylus_down(&self, point: HidPoint, azimuth: f64, altitude: f64, pressure: f64);
    /// Stylus moves while in contact.
    fn stylus_move(&self, point: HidPoint, azimuth: f64, altitude: f64, pressure: f64);
    /// Stylus lifts off the surface.
    fn stylus_up(&self, point: HidPoint);
    /// Stylus taps without a move phase.
    fn stylus_tap(&self, point: HidPoint, azimuth: f64, altitude: f64, pressure: f64);

    /// A parameterized run of taps at `point`.
    fn send_taps(&self, point: HidPoint, kind: ActuationKind, finger_count: u32);
    /// Linear drag from `from` to `to`.
    fn drag_linear(&self, from: HidPoint, to: HidPoint, duration: Duration);
    /// Drag along an intermediate `via` point, to `to`.
    fn drag_curved(&self, from: HidPoint, via: HidPoint, to: HidPoint, duration: Duration);
    /// Pinch gesture within `bounds`, `scale` > 1 expands, < 1 contracts.
    fn pinch(&self, bounds: (HidPoint, HidPoint), scale: f64, duration: Duration);
    /// A long press at `point`.
    fn long_press(&self, point: HidPoint);

    /// Sends a single character as a key event of `kind`.
    fn key_event(&self, character: char, kind: ActuationKind);

    /// Actuates a named hardware button.
    fn hardware_button(&self, button: HardwareButton, kind: ActuationKind);
    /// Shakes the device (accelerometer event simulation).
    fn shake(&self);
    /// Generic HID usage-page event, for buttons with no named constant.
    fn other_page_usage(&self, page: u16, usage: u16, kind: ActuationKind);
    /// Actuates the snapshot (screenshot) shortcut.
    fn snapshot_press(&self);
    /// Shows/hides the on-screen keyboard.
    fn toggle_on_screen_keyboard(&self);
    /// Shows/hides Spotlight-style search.
    fn toggle_spotlight(&self);
    /// Locks the device's input.
    fn hardware_lock(&self);
    /// Unlocks the device's input.
    fn hardware_unlock(&self);
    /// Releases every currently-held key/button/touch.
    fn release_every_keys(&self);
}

/// A subscription handle for pasteboard change notifications. Dropping it
/// unsubscribes.
pub type ChangeSubscription = Box<dyn FnOnce() + Send>;

/// Access to the local system pasteboard/clipboard.
pub trait PasteboardProvider: Send + Sync {
    /// Reads the current pasteboard contents as UTF-8 text, if any.
    fn read_utf8(&self) -> Option<String>;

    /// Writes UTF-8 text to the pasteboard.
    fn write_utf8(&self, text: &str);

    /// Registers `callback` to be invoked whenever the pasteboard changes.
    /// Returns a subscription that unsubscribes when invoked/dropped.
    fn subscribe(&self, callback: Box<dyn Fn() + Send + Sync>) -> ChangeSubscription;
}

/// Opaque handle to a launched child process.
pub type ProcessHandle = u64;

/// Why a process run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The process exited on its own (possibly nonzero).
    Exit,
    /// The process was killed by a signal.
    UncaughtSignal,
    /// `terminate_and_wait` forced termination after its timeout elapsed.
    TimedOut,
}

/// The outcome of waiting on a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// Why the process ended.
    pub reason: TerminationReason,
    /// Exit status, if the process exited normally.
    pub exit_status: Option<i32>,
    /// Signal number, if the process was signaled.
    pub signal: Option<i32>,
}

/// Launch parameters for [`ProcessRunner::launch`].
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// argv; `argv[0]` is the executable path.
    pub argv: Vec<String>,
    /// Environment variables.
    pub environment: Vec<(String, String)>,
    /// Working directory, if not inherited.
    pub working_directory: Option<String>,
    /// Redirect target for stdin, if any.
    pub stdin_path: Option<String>,
    /// Redirect target for stdout, if any.
    pub stdout_path: Option<String>,
    /// Redirect target for stderr, if any.
    pub stderr_path: Option<String>,
    /// User to run as, if not inherited.
    pub user_name: Option<String>,
    /// Group to run as, if not inherited.
    pub group_name: Option<String>,
    /// `-1` unset, `0` default (new group), `>0` explicit pgid.
    pub process_group_identifier: i32,
}

/// Spawns and controls child processes on behalf of the watchdog.
pub trait ProcessRunner: Send + Sync {
    /// Launches a process per `request`, returning a handle and OS pid.
    ///
    /// # Errors
    ///
    /// Returns an error description on launch failure (exec failed, missing
    /// binary, permission denied, etc).
    fn launch(&self, request: &LaunchRequest) -> Result<(ProcessHandle, u32), String>;

    /// Waits for `handle` to exit, blocking the calling worker.
    fn wait(&self, handle: ProcessHandle) -> ExitOutcome;

    /// Delivers a signal to `handle`'s process. Returns `false` if the
    /// process is no longer running.
    fn signal(&self, handle: ProcessHandle, sig: i32) -> bool;

    /// Requests graceful termination (SIGTERM), escalating to SIGKILL if
    /// `handle` hasn't exited within `timeout`.
    fn terminate_and_wait(&self, handle: ProcessHandle, timeout: Duration) -> TerminationReason;
}

/// Performs outbound HTTP GET requests on behalf of the update poller.
///
/// Uses `async_trait` (rather than a native `async fn` in the trait) so the
/// poller can hold this collaborator as `Arc<dyn HttpFetcher>`.
#[async_trait::async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Issues `GET url` with `headers`, returning `(status, body)`.
    ///
    /// # Errors
    ///
    /// Returns an error description for transport-level failures (DNS,
    /// connect, TLS, I/O) below the HTTP layer.
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<(u16, Vec<u8>), String>;
}

/// Persists small keyed blobs (the update poller's cached release) across
/// process restarts.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Reads the bytes stored under `key`, if any.
    async fn read(&self, key: &str) -> Option<Vec<u8>>;

    /// Writes `value` under `key`, replacing any previous contents.
    async fn write(&self, key: &str, value: &[u8]);
}

/// Darwin-notification-style signal name for `UpdateAvailable`, kept as a
/// string constant for host binaries bridging onto an existing pub/sub bus.
pub const UPDATE_AVAILABLE_NOTIFICATION: &str = "GitHubReleaseUpdaterDidFindUpdateNotification";

/// Service-status-changed signal name.
pub const SERVICE_STATUS_CHANGED_NOTIFICATION: &str = "TVNCServiceStatusDidChangeNotification";
