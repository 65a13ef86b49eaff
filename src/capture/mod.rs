//! Screen-capture pipeline: turns raw surface reads into dirty-rectangle
//! deltas and frame-ready events at a configurable cadence.

mod dirty;
mod stats;

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::interfaces::{DisplayHandle, LayerId, SurfaceProvider, SurfacePixelFormat};
use crate::logging::Logger;
use crate::pixel::{PixelImage, Rect};
use stats::CaptureStats;

/// Min/preferred/max FPS triple and tile/stats tuning for [`CapturePipeline`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Minimum acceptable frame rate. `0` means unspecified.
    pub min_fps: u32,
    /// Preferred frame rate. `0` means unspecified.
    pub preferred_fps: u32,
    /// Maximum frame rate. `0` means unspecified.
    pub max_fps: u32,
    /// Tile edge length, in pixels, used for dirty-rectangle detection.
    pub tile_size: u32,
    /// Rolling-average FPS window, in seconds. `<= 0` disables it.
    pub stats_log_window_seconds: f64,
    /// EMA smoothing factor for instantaneous FPS, clamped to `[0, 1]`.
    pub instant_fps_smoothing_factor: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            min_fps: 0,
            preferred_fps: 0,
            max_fps: 0,
            tile_size: 64,
            stats_log_window_seconds: 5.0,
            instant_fps_smoothing_factor: 0.2,
        }
    }
}

/// Describes the oriented pixel format a consumer should allocate
/// compatible buffers against, the Rust analog of the IOSurface
/// property-dictionary `renderProperties` accessor.
#[derive(Debug, Clone, Copy)]
pub struct RenderProperties {
    /// Oriented width.
    pub width: u32,
    /// Oriented height.
    pub height: u32,
    /// Pixel format surfaces are captured in.
    pub format: SurfacePixelFormat,
}

/// A ready-to-encode frame: the full image plus the rectangles that changed
/// since the previous emitted frame.
#[derive(Debug, Clone)]
pub struct CaptureFrame {
    /// The captured, oriented image.
    pub image: Arc<PixelImage>,
    /// Monotonic counter; increments iff this frame's content differs from
    /// the previously emitted frame.
    pub seed: u32,
    /// Dirty rectangles, in oriented coordinates.
    pub dirty_rects: Vec<Rect>,
    /// Wall-clock capture time.
    pub timestamp: Instant,
}

struct LastFrame {
    raw: Vec<u8>,
    width: u32,
    height: u32,
    generation: u64,
}

/// A fixed-cadence capture pipeline driven by an external vsync-style caller.
///
/// `tick()` does not suspend or spawn work of its own; the caller (the
/// UI-affine thread in the concurrency model) is responsible for calling it
/// at the display's refresh cadence.
pub struct CapturePipeline {
    config: CaptureConfig,
    surface_provider: Arc<dyn SurfaceProvider>,
    display: DisplayHandle,
    layer: LayerId,
    handler: Option<Box<dyn FnMut(CaptureFrame) + Send>>,
    last_frame: Option<LastFrame>,
    seed: u32,
    force_next_update: bool,
    active: bool,
    stats: CaptureStats,
    logger: Logger,
}

impl CapturePipeline {
    /// Builds a pipeline reading from `display`/`layer` via `surface_provider`.
    #[must_use]
    pub fn new(config: CaptureConfig, surface_provider: Arc<dyn SurfaceProvider>, layer: LayerId, logger: Logger) -> Self {
        let display = surface_provider.get_main_display();
        let stats = CaptureStats::new(config.stats_log_window_seconds, config.instant_fps_smoothing_factor);
        Self {
            config,
            surface_provider,
            display,
            layer,
            handler: None,
            last_frame: None,
            seed: 0,
            force_next_update: false,
            active: false,
            stats,
            logger,
        }
    }

    /// Starts (or, if already active, replaces the handler of) the pipeline.
    /// Does not restart dirty-rect state.
    pub fn start(&mut self, handler: Box<dyn FnMut(CaptureFrame) + Send>) {
        self.handler = Some(handler);
        self.active = true;
        self.logger.debug("capture pipeline started");
    }

    /// Stops the pipeline: releases the surface wrapping and clears the
    /// handler. Idempotent.
    pub fn stop(&mut self) {
        self.active = false;
        self.handler = None;
        self.last_frame = None;
        self.logger.debug("capture pipeline stopped");
    }

    /// Whether the pipeline currently has an active handler.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Forces the next `tick()` to treat the whole frame as one dirty
    /// rectangle, even if the surface's generation hasn't changed.
    pub fn force_next_frame_update(&mut self) {
        self.force_next_update = true;
    }

    /// Surfaces the render-property description consumers should allocate
    /// compatible buffers against.
    #[must_use]
    pub fn render_properties(&self) -> RenderProperties {
        let (width, height) = self.surface_provider.get_display_size(self.display);
        RenderProperties { width, height, format: SurfacePixelFormat::Argb8888 }
    }

    /// The rolling-average FPS over the configured stats window.
    #[must_use]
    pub fn average_fps(&self) -> f64 {
        self.stats.average_fps()
    }

    /// The EMA-smoothed instantaneous FPS.
    #[must_use]
    pub fn instant_fps(&self) -> f64 {
        self.stats.instant_fps()
    }

    /// Runs one capture tick. No-ops if not active or if the Surface
    /// Provider has nothing to offer. Returns the emitted frame, if any,
    /// in addition to invoking the handler (so tests and synchronous
    /// callers can observe it directly).
    pub fn tick(&mut self) -> Option<CaptureFrame> {
        if !self.active {
            return None;
        }

        let surface = self.surface_provider.copy_displayed_surface(self.display, self.layer)?;
        let now = Instant::now();

        let unchanged_generation = self
            .last_frame
            .as_ref()
            .is_some_and(|f| f.generation == surface.generation && f.width == surface.width && f.height == surface.height);

        if unchanged_generation && !self.force_next_update {
            return None;
        }

        let dirty_rects = if self.force_next_update || self.last_frame.is_none() {
            vec![Rect::new(0, 0, i64::from(surface.width), i64::from(surface.height))]
        } else {
            let prev = self.last_frame.as_ref().unwrap();
            if prev.width == surface.width && prev.height == surface.height {
                dirty::dirty_rects(&prev.raw, &surface.data, surface.width, surface.height, self.config.tile_size)
            } else {
                vec![Rect::new(0, 0, i64::from(surface.width), i64::from(surface.height))]
            }
        };
        self.force_next_update = false;

        if dirty_rects.is_empty() {
            self.last_frame = Some(LastFrame {
                raw: surface.data,
                width: surface.width,
                height: surface.height,
                generation: surface.generation,
            });
            return None;
        }

        let content_changed = self
            .last_frame
            .as_ref()
            .map_or(true, |prev| prev.raw != surface.data || prev.width != surface.width || prev.height != surface.height);
        if content_changed {
            self.seed = self.seed.wrapping_add(1);
        }

        let image = match PixelImage::from_bitmap(surface.width, surface.height, &surface.data) {
            Ok(image) => Arc::new(image),
            Err(_) => {
                self.logger.error("capture tick produced an invalid bitmap, dropping frame");
                return None;
            }
        };

        self.last_frame =
            Some(LastFrame { raw: surface.data, width: surface.width, height: surface.height, generation: surface.generation });
        self.stats.record_tick(now);

        let frame = CaptureFrame { image, seed: self.seed, dirty_rects, timestamp: now };
        if let Some(handler) = self.handler.as_mut() {
            handler(frame.clone());
        }
        Some(frame)
    }
}

impl Clone for CaptureFrame {
    fn clone(&self) -> Self {
        Self { image: Arc::clone(&self.image), seed: self.seed, dirty_rects: self.dirty_rects.clone(), timestamp: self.timestamp }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct FakeSurfaceProvider {
        frames: StdMutex<Vec<(u32, u32, Vec<u8>, u64)>>,
    }

    impl SurfaceProvider for FakeSurfaceProvider {
        fn get_main_display(&self) -> DisplayHandle {
            1
        }

        fn get_display_size(&self, _display: DisplayHandle) -> (u32, u32) {
            let frames = self.frames.lock().unwrap();
            frames.last().map(|(w, h, _, _)| (*w, *h)).unwrap_or((0, 0))
        }

        fn get_default_surface(&self, display: DisplayHandle, layer: LayerId) -> Option<crate::interfaces::SurfaceView> {
            self.copy_displayed_surface(display, layer)
        }

        fn copy_displayed_surface(&self, _display: DisplayHandle, _layer: LayerId) -> Option<crate::interfaces::SurfaceView> {
            let mut frames = self.frames.lock().unwrap();
            if frames.len() > 1 {
                frames.remove(0);
            }
            let (w, h, data, generation) = frames.first()?.clone();
            Some(crate::interfaces::SurfaceView { data, width: w, height: h, stride: w, format: SurfacePixelFormat::Rgba8888, generation })
        }

        fn is_in_use(&self, _surface: &crate::interfaces::SurfaceView) -> bool {
            true
        }
    }

    fn solid_frame(w: u32, h: u32, value: u8, generation: u64) -> (u32, u32, Vec<u8>, u64) {
        (w, h, vec![value; (w as usize) * (h as usize) * 4], generation)
    }

    #[test]
    fn unchanged_generation_emits_nothing() {
        let provider = Arc::new(FakeSurfaceProvider { frames: StdMutex::new(vec![solid_frame(4, 4, 1, 7), solid_frame(4, 4, 1, 7)]) });
        let mut pipeline = CapturePipeline::new(CaptureConfig::default(), provider, 0, Logger::default());
        pipeline.start(Box::new(|_| {}));
        assert!(pipeline.tick().is_some(), "first tick should always emit");
        assert!(pipeline.tick().is_none(), "unchanged generation should emit nothing");
    }

    #[test]
    fn force_next_update_emits_full_frame_rect_even_if_unchanged() {
        let provider = Arc::new(FakeSurfaceProvider { frames: StdMutex::new(vec![solid_frame(4, 4, 1, 7), solid_frame(4, 4, 1, 7)]) });
        let mut pipeline = CapturePipeline::new(CaptureConfig::default(), provider, 0, Logger::default());
        pipeline.start(Box::new(|_| {}));
        pipeline.tick();
        pipeline.force_next_frame_update();
        let frame = pipeline.tick().expect("forced tick should emit");
        assert_eq!(frame.dirty_rects, vec![Rect::new(0, 0, 4, 4)]);
    }

    #[test]
    fn stopped_pipeline_ticks_to_nothing() {
        let provider = Arc::new(FakeSurfaceProvider { frames: StdMutex::new(vec![solid_frame(4, 4, 1, 1)]) });
        let mut pipeline = CapturePipeline::new(CaptureConfig::default(), provider, 0, Logger::default());
        assert!(pipeline.tick().is_none());
    }

    #[test]
    fn seed_increments_only_on_content_change() {
        let provider = Arc::new(FakeSurfaceProvider {
            frames: StdMutex::new(vec![solid_frame(4, 4, 1, 1), solid_frame(4, 4, 1, 2), solid_frame(4, 4, 2, 3)]),
        });
        let mut pipeline = CapturePipeline::new(CaptureConfig::default(), provider, 0, Logger::default());
        pipeline.start(Box::new(|_| {}));
        let first = pipeline.tick().unwrap();
        pipeline.force_next_frame_update();
        let second = pipeline.tick().unwrap();
        pipeline.force_next_frame_update();
        let third = pipeline.tick().unwrap();
        assert_eq!(first.seed, 1);
        assert_eq!(second.seed, 1, "same pixel values, different generation: no content change");
        assert_eq!(third.seed, 2, "different pixel values: content changed");
    }
}
