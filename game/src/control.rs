use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationRange;
use crate::physics::{GAME_HEIGHT, PADDLE_HEIGHT, PADDLE_MAX_Y, PADDLE_MIN_Y};

/// Exponential-approach rate, normalized to 60 FPS.
pub const SMOOTHING_BASE: f32 = 0.2;
/// Within this distance the paddle snaps to the target, ending
/// micro-oscillation.
pub const SNAP_DISTANCE: f32 = 0.5;

/// Maps a raw normalized hand y onto a paddle center in pixels.
///
/// With a valid calibration the player's personal range covers the full
/// paddle travel; without one the whole camera frame does. Returns `None`
/// for a non-finite result so the caller keeps its previous target instead
/// of feeding NaN into rendering.
pub fn map_to_paddle_y(raw_y: f32, range: Option<&CalibrationRange>) -> Option<f32> {
    let normalized = match range.filter(|r| r.is_valid()) {
        Some(r) => ((raw_y - r.min) / r.span()).clamp(0.0, 1.0),
        None => raw_y.clamp(0.0, 1.0),
    };
    let mapped = normalized * (GAME_HEIGHT - PADDLE_HEIGHT) + PADDLE_HEIGHT * 0.5;
    if mapped.is_finite() {
        Some(mapped.clamp(PADDLE_MIN_Y, PADDLE_MAX_Y))
    } else {
        None
    }
}

/// Frame-rate-independent paddle smoothing.
///
/// Each tick the paddle covers `smoothing_base * dt * 60` of the remaining
/// distance (capped at all of it), so the feel is identical at 30 and at
/// 144 FPS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSmoother {
    current: f32,
    target: f32,
}

impl Default for MotionSmoother {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionSmoother {
    pub fn new() -> Self {
        let center = GAME_HEIGHT * 0.5;
        Self {
            current: center,
            target: center,
        }
    }

    pub fn position(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn set_target(&mut self, target: f32) {
        if target.is_finite() {
            self.target = target.clamp(PADDLE_MIN_Y, PADDLE_MAX_Y);
        }
    }

    /// Snaps both target and position back to the court center; used
    /// whenever the game leaves a state where paddle control is meaningful.
    pub fn recenter(&mut self) {
        let center = GAME_HEIGHT * 0.5;
        self.current = center;
        self.target = center;
    }

    pub fn tick(&mut self, dt: Duration) -> f32 {
        let delta = self.target - self.current;
        if delta.abs() < SNAP_DISTANCE {
            self.current = self.target;
        } else {
            let rate = (SMOOTHING_BASE * dt.as_secs_f32() * 60.0).min(1.0);
            self.current += delta * rate;
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: Duration = Duration::from_millis(16);

    fn valid_range() -> CalibrationRange {
        CalibrationRange { min: 0.2, max: 0.8 }
    }

    #[test]
    fn mapping_is_monotonic_within_bounds() {
        let range = valid_range();
        let mut last = f32::MIN;
        let mut y = 0.0_f32;
        while y <= 1.0 {
            let mapped = map_to_paddle_y(y, Some(&range)).expect("finite input maps");
            assert!(mapped >= last, "mapping decreased at raw_y={y}");
            assert!((PADDLE_MIN_Y..=PADDLE_MAX_Y).contains(&mapped));
            last = mapped;
            y += 0.01;
        }
    }

    #[test]
    fn range_endpoints_cover_full_travel() {
        let range = valid_range();
        let top = map_to_paddle_y(range.min, Some(&range)).expect("maps");
        let bottom = map_to_paddle_y(range.max, Some(&range)).expect("maps");
        assert!((top - PADDLE_MIN_Y).abs() < 1e-3);
        assert!((bottom - PADDLE_MAX_Y).abs() < 1e-3);
    }

    #[test]
    fn invalid_range_falls_back_to_full_frame() {
        let narrow = CalibrationRange {
            min: 0.5,
            max: 0.55,
        };
        let with_narrow = map_to_paddle_y(0.5, Some(&narrow)).expect("maps");
        let with_none = map_to_paddle_y(0.5, None).expect("maps");
        assert_eq!(with_narrow, with_none);
    }

    #[test]
    fn non_finite_input_is_a_no_op() {
        assert_eq!(map_to_paddle_y(f32::NAN, None), None);
        let range = valid_range();
        assert_eq!(map_to_paddle_y(f32::INFINITY, Some(&range)), None);
    }

    #[test]
    fn smoother_converges_monotonically_and_terminates() {
        let mut smoother = MotionSmoother::new();
        smoother.set_target(PADDLE_MAX_Y);
        let mut last = smoother.position();
        let mut settled_at = None;
        for frame in 0..600 {
            let pos = smoother.tick(DT);
            assert!(pos >= last, "overshoot at frame {frame}");
            last = pos;
            if pos == smoother.target() {
                settled_at = Some(frame);
                break;
            }
        }
        assert!(settled_at.is_some(), "never settled on the target");
    }

    #[test]
    fn smoother_snaps_within_half_pixel() {
        let mut smoother = MotionSmoother::new();
        let target = smoother.position() + 0.4;
        smoother.set_target(target);
        assert_eq!(smoother.tick(DT), target);
    }

    #[test]
    fn smoothing_is_frame_rate_invariant() {
        // Same wall-clock time at different frame rates lands in roughly the
        // same place.
        let mut at_30 = MotionSmoother::new();
        let mut at_120 = MotionSmoother::new();
        at_30.set_target(PADDLE_MAX_Y);
        at_120.set_target(PADDLE_MAX_Y);

        for _ in 0..30 {
            at_30.tick(Duration::from_secs_f32(1.0 / 30.0));
        }
        for _ in 0..120 {
            at_120.tick(Duration::from_secs_f32(1.0 / 120.0));
        }
        assert!(
            (at_30.position() - at_120.position()).abs() < 12.0,
            "30fps={} 120fps={}",
            at_30.position(),
            at_120.position()
        );
    }

    #[test]
    fn recenter_returns_to_court_center() {
        let mut smoother = MotionSmoother::new();
        smoother.set_target(PADDLE_MIN_Y);
        smoother.tick(DT);
        smoother.recenter();
        assert_eq!(smoother.position(), GAME_HEIGHT * 0.5);
        assert_eq!(smoother.target(), GAME_HEIGHT * 0.5);
    }
}
