//! Smoothed start/end colors and emissive intensity.
//!
//! Shape switches never snap the palette. Each frame the current values move
//! toward the target by `min(dt, 1)` of the remaining distance.

use crate::kernel::FrameColors;
use crate::shape::Palette;

/// Palette state that eases toward a target palette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorState {
    current: Palette,
}

impl ColorState {
    /// Start exactly at `palette`.
    pub fn new(palette: Palette) -> Self {
        Self { current: palette }
    }

    pub fn current(&self) -> Palette {
        self.current
    }

    /// Move toward `target` for a frame of length `dt` seconds.
    pub fn approach(&mut self, target: &Palette, dt: f32) {
        let t = dt.clamp(0.0, 1.0);
        self.current.start = self.current.start.lerp(target.start, t);
        self.current.end = self.current.end.lerp(target.end, t);
        self.current.emissive_intensity +=
            (target.emissive_intensity - self.current.emissive_intensity) * t;
    }

    /// Values handed to the derive pass.
    pub fn frame_colors(&self) -> FrameColors {
        FrameColors {
            start: self.current.start,
            end: self.current.end,
            emissive_intensity: self.current.emissive_intensity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;

    #[test]
    fn test_approach_moves_partway() {
        let from = Shape::Fox.palette();
        let to = Shape::Humanoid.palette();
        let mut state = ColorState::new(from);

        state.approach(&to, 0.016);
        let now = state.current();

        let total = (to.start - from.start).length();
        let left = (to.start - now.start).length();
        assert!(left < total);
        assert!(left > total * 0.9);
        assert!(now.emissive_intensity > from.emissive_intensity);
        assert!(now.emissive_intensity < to.emissive_intensity);
    }

    #[test]
    fn test_approach_converges() {
        let to = Shape::Book.palette();
        let mut state = ColorState::new(Shape::Humanoid.palette());
        for _ in 0..2000 {
            state.approach(&to, 1.0 / 60.0);
        }
        assert!((state.current().start - to.start).length() < 1e-4);
        assert!((state.current().emissive_intensity - to.emissive_intensity).abs() < 1e-3);
    }

    #[test]
    fn test_large_dt_does_not_overshoot() {
        let to = Shape::Book.palette();
        let mut state = ColorState::new(Shape::Fox.palette());
        state.approach(&to, 5.0);
        assert!((state.current().end - to.end).length() < 1e-6);
    }

    #[test]
    fn test_zero_dt_keeps_colors() {
        let from = Shape::Fox.palette();
        let mut state = ColorState::new(from);
        state.approach(&Shape::Book.palette(), 0.0);
        assert_eq!(state.current(), from);
    }
}
