//! Frame-rate statistics: a rolling-window average and an EMA-smoothed
//! instantaneous estimate.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Tracks frame timestamps to report a rolling-average FPS and an
/// exponentially-smoothed instantaneous FPS.
#[derive(Debug)]
pub struct CaptureStats {
    window: Duration,
    smoothing: f64,
    ticks: VecDeque<Instant>,
    last_tick: Option<Instant>,
    instant_fps: f64,
}

impl CaptureStats {
    /// Builds a tracker with a rolling window of `window_seconds` (`<= 0`
    /// disables the rolling average, which then always reports 0) and an
    /// EMA smoothing factor clamped to `[0, 1]`.
    #[must_use]
    pub fn new(window_seconds: f64, smoothing: f64) -> Self {
        Self {
            window: Duration::from_secs_f64(window_seconds.max(0.0)),
            smoothing: smoothing.clamp(0.0, 1.0),
            ticks: VecDeque::new(),
            last_tick: None,
            instant_fps: 0.0,
        }
    }

    /// Records a frame tick at `now`, updating both estimates.
    pub fn record_tick(&mut self, now: Instant) {
        if let Some(last) = self.last_tick {
            let dt = now.saturating_duration_since(last).as_secs_f64();
            if dt > 0.0 {
                let sample = 1.0 / dt;
                self.instant_fps = self.smoothing * sample + (1.0 - self.smoothing) * self.instant_fps;
            }
        }
        self.last_tick = Some(now);

        if !self.window.is_zero() {
            self.ticks.push_back(now);
            while let Some(&front) = self.ticks.front() {
                if now.saturating_duration_since(front) > self.window {
                    self.ticks.pop_front();
                } else {
                    break;
                }
            }
        }
    }

    /// The rolling-window average FPS (0 if the window is disabled or fewer
    /// than two ticks have landed in it).
    #[must_use]
    pub fn average_fps(&self) -> f64 {
        if self.window.is_zero() || self.ticks.len() < 2 {
            return 0.0;
        }
        let span = self.ticks.back().unwrap().saturating_duration_since(*self.ticks.front().unwrap()).as_secs_f64();
        if span <= 0.0 {
            return 0.0;
        }
        (self.ticks.len() - 1) as f64 / span
    }

    /// The EMA-smoothed instantaneous FPS.
    #[must_use]
    pub fn instant_fps(&self) -> f64 {
        self.instant_fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_leaves_instant_fps_at_zero() {
        let mut stats = CaptureStats::new(5.0, 0.2);
        stats.record_tick(Instant::now());
        assert_eq!(stats.instant_fps(), 0.0);
    }

    #[test]
    fn regular_ticks_converge_instant_fps_toward_sample_rate() {
        let mut stats = CaptureStats::new(5.0, 1.0);
        let mut now = Instant::now();
        for _ in 0..5 {
            stats.record_tick(now);
            now += Duration::from_millis(100);
        }
        assert!((stats.instant_fps() - 10.0).abs() < 0.01, "fps was {}", stats.instant_fps());
    }

    #[test]
    fn disabled_window_always_reports_zero_average() {
        let mut stats = CaptureStats::new(0.0, 0.2);
        let mut now = Instant::now();
        for _ in 0..10 {
            stats.record_tick(now);
            now += Duration::from_millis(16);
        }
        assert_eq!(stats.average_fps(), 0.0);
    }

    #[test]
    fn average_fps_reflects_rolling_window() {
        let mut stats = CaptureStats::new(1.0, 0.2);
        let mut now = Instant::now();
        for _ in 0..11 {
            stats.record_tick(now);
            now += Duration::from_millis(100);
        }
        assert!((stats.average_fps() - 10.0).abs() < 0.5, "fps was {}", stats.average_fps());
    }
}
