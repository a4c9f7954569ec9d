//! Frame clock feeding `dt` to the simulation.
//!
//! ```ignore
//! use pmorph::FrameClock;
//!
//! let mut clock = FrameClock::new();
//! loop {
//!     let dt = clock.tick().delta;
//!     simulation.update(dt)?;
//! }
//! ```

use std::time::{Duration, Instant};

/// Longest frame the clock will report. A stall (window drag, debugger)
/// would otherwise teleport every particle by one huge step.
pub const MAX_DELTA: f32 = 0.1;

/// Values produced by one [`FrameClock::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Scaled seconds since the previous tick. Zero while paused.
    pub delta: f32,
    /// Sum of all deltas so far.
    pub elapsed: f32,
    /// Number of ticks that advanced time.
    pub frame: u64,
}

/// Measures frame time with pause, time scale and an optional fixed step.
#[derive(Debug)]
pub struct FrameClock {
    last: Instant,
    elapsed: f32,
    delta: f32,
    frame: u64,
    paused: bool,
    time_scale: f32,
    fixed_delta: Option<f32>,
    fps: f32,
    fps_window_start: Instant,
    fps_window_frames: u64,
}

impl FrameClock {
    const FPS_WINDOW: Duration = Duration::from_millis(500);

    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            last: now,
            elapsed: 0.0,
            delta: 0.0,
            frame: 0,
            paused: false,
            time_scale: 1.0,
            fixed_delta: None,
            fps: 0.0,
            fps_window_start: now,
            fps_window_frames: 0,
        }
    }

    /// Advance to now. Call once per rendered frame.
    pub fn tick(&mut self) -> FrameTick {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTick {
        let raw = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;

        if self.paused {
            self.delta = 0.0;
        } else {
            let step = self.fixed_delta.unwrap_or(raw).min(MAX_DELTA);
            self.delta = step * self.time_scale;
            self.elapsed += self.delta;
            self.frame += 1;
        }

        self.fps_window_frames += 1;
        let window = now.saturating_duration_since(self.fps_window_start);
        if window >= Self::FPS_WINDOW {
            self.fps = self.fps_window_frames as f32 / window.as_secs_f32();
            self.fps_window_start = now;
            self.fps_window_frames = 0;
        }

        FrameTick {
            delta: self.delta,
            elapsed: self.elapsed,
            frame: self.frame,
        }
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Rendered frames per second, refreshed twice a second.
    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Multiply every delta by `scale`. Negative values clamp to zero.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Report `delta` every tick regardless of wall time. `None` restores
    /// measured timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta.map(|d| d.max(0.0));
    }

    /// Zero the counters. Used when the simulation restarts.
    pub fn reset(&mut self) {
        let paused = self.paused;
        let time_scale = self.time_scale;
        let fixed_delta = self.fixed_delta;
        *self = Self::new();
        self.paused = paused;
        self.time_scale = time_scale;
        self.fixed_delta = fixed_delta;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_tick_measures_delta() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        let tick = clock.tick_at(t0 + ms(16));
        assert!((tick.delta - 0.016).abs() < 1e-4);
        assert_eq!(tick.frame, 1);
        assert_eq!(tick.elapsed, tick.delta);
    }

    #[test]
    fn test_stall_is_clamped() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        assert_eq!(clock.tick_at(t0 + Duration::from_secs(3)).delta, MAX_DELTA);
    }

    #[test]
    fn test_pause_freezes_time() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        clock.tick_at(t0 + ms(10));
        let before = clock.elapsed();

        clock.toggle_pause();
        let tick = clock.tick_at(t0 + ms(50));
        assert_eq!(tick.delta, 0.0);
        assert_eq!(tick.elapsed, before);
        assert_eq!(tick.frame, 1);

        // Time spent paused is not replayed on resume.
        clock.toggle_pause();
        let tick = clock.tick_at(t0 + ms(60));
        assert!((tick.delta - 0.010).abs() < 1e-4);
    }

    #[test]
    fn test_time_scale() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        clock.set_time_scale(0.5);
        assert!((clock.tick_at(t0 + ms(20)).delta - 0.010).abs() < 1e-4);

        clock.set_time_scale(-1.0);
        assert_eq!(clock.time_scale(), 0.0);
    }

    #[test]
    fn test_fixed_delta_ignores_wall_time() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        clock.set_fixed_delta(Some(1.0 / 60.0));
        let tick = clock.tick_at(t0 + ms(45));
        assert!((tick.delta - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_fps_window() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        for i in 1..=30 {
            clock.tick_at(t0 + ms(i * 20));
        }
        assert!((clock.fps() - 50.0).abs() < 1.0);
    }

    #[test]
    fn test_reset_keeps_settings() {
        let mut clock = FrameClock::new();
        clock.set_time_scale(2.0);
        clock.set_paused(true);
        clock.reset();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.time_scale(), 2.0);
        assert!(clock.is_paused());
    }
}
