use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::physics::{PADDLE_MAX_Y, PADDLE_MIN_Y};

/// A committed range only counts when it covers more than 10% of the
/// normalized vertical camera space.
pub const MIN_SPAN: f32 = 0.1;
/// How close (px) the mapped paddle must sit to a screen edge to count as
/// holding that edge.
pub const EDGE_TOLERANCE_PX: f32 = 5.0;
/// Continuous dwell required before an edge commits.
pub const HOLD_TO_COMMIT: Duration = Duration::from_millis(1500);
/// How long the success flag stays visible after a save.
pub const SUCCESS_FLASH: Duration = Duration::from_secs(4);

/// The player's personal vertical sweep in normalized camera y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRange {
    pub min: f32,
    pub max: f32,
}

impl CalibrationRange {
    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    pub fn is_valid(&self) -> bool {
        self.span() > MIN_SPAN
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationPhase {
    #[default]
    Idle,
    SettingTop,
    SettingBottom,
}

/// One tick's worth of control input while calibrating: the raw normalized y
/// of the control landmark, and where the full-frame mapping would put the
/// paddle for it.
#[derive(Debug, Clone, Copy)]
pub struct RawSample {
    pub raw_y: f32,
    pub paddle_px: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationOutcome {
    None,
    TopCommitted,
    Saved(CalibrationRange),
    Discarded,
}

/// Learns the player's comfortable vertical hand range by hold-to-confirm at
/// each screen edge.
///
/// The player parks the paddle against the top edge until the dwell timer
/// fills, then the bottom edge. Each commit takes the *extremum* of raw y
/// seen during the dwell, not the last sample, so a noisy final frame cannot
/// corrupt the boundary. Repeated calibrations accumulate: the active range
/// is the mean of every accepted range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationEngine {
    phase: CalibrationPhase,
    #[serde(with = "crate::serde_duration")]
    held: Duration,
    extremum: Option<f32>,
    draft_min: f32,
    history: Vec<CalibrationRange>,
    active: Option<CalibrationRange>,
    #[serde(default, with = "crate::serde_duration::option")]
    success_until: Option<Duration>,
}

impl Default for CalibrationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrationEngine {
    pub fn new() -> Self {
        Self {
            phase: CalibrationPhase::Idle,
            held: Duration::ZERO,
            extremum: None,
            draft_min: 0.0,
            history: Vec::new(),
            active: None,
            success_until: None,
        }
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase != CalibrationPhase::Idle
    }

    pub fn active(&self) -> Option<&CalibrationRange> {
        self.active.as_ref()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Fraction of the dwell completed, for the calibration UI.
    pub fn hold_fraction(&self) -> f32 {
        (self.held.as_secs_f32() / HOLD_TO_COMMIT.as_secs_f32()).min(1.0)
    }

    pub fn success_visible(&self, now: Duration) -> bool {
        self.success_until.is_some_and(|until| now < until)
    }

    /// Seeds history from persisted progress; the active range is rebuilt
    /// from whatever survives validation.
    pub fn seed_history(&mut self, ranges: Vec<CalibrationRange>) {
        self.history = ranges
            .into_iter()
            .filter(CalibrationRange::is_valid)
            .collect();
        self.recompute_active();
    }

    pub fn ranges(&self) -> &[CalibrationRange] {
        &self.history
    }

    pub fn begin(&mut self) {
        self.phase = CalibrationPhase::SettingTop;
        self.held = Duration::ZERO;
        self.extremum = None;
    }

    /// Abandons an in-flight calibration without touching history. Safe to
    /// call in any phase.
    pub fn cancel(&mut self) {
        self.phase = CalibrationPhase::Idle;
        self.held = Duration::ZERO;
        self.extremum = None;
    }

    /// Full reset: drops history and the active range as well.
    pub fn clear(&mut self) {
        self.cancel();
        self.history.clear();
        self.active = None;
        self.success_until = None;
    }

    /// Advances the dwell state machine by one tick.
    ///
    /// `sample` is `None` when no fresh landmark frame arrived this tick;
    /// that pauses the dwell without resetting it, since a dropped inference
    /// frame is "no update", not evidence the hand moved away.
    pub fn update(
        &mut self,
        now: Duration,
        dt: Duration,
        sample: Option<RawSample>,
    ) -> CalibrationOutcome {
        let setting_top = match self.phase {
            CalibrationPhase::Idle => return CalibrationOutcome::None,
            CalibrationPhase::SettingTop => true,
            CalibrationPhase::SettingBottom => false,
        };
        let Some(sample) = sample else {
            return CalibrationOutcome::None;
        };
        if !sample.raw_y.is_finite() || !sample.paddle_px.is_finite() {
            return CalibrationOutcome::None;
        }

        let in_zone = if setting_top {
            sample.paddle_px - PADDLE_MIN_Y <= EDGE_TOLERANCE_PX
        } else {
            PADDLE_MAX_Y - sample.paddle_px <= EDGE_TOLERANCE_PX
        };
        if !in_zone {
            // No partial credit: leaving the zone restarts the dwell.
            self.held = Duration::ZERO;
            self.extremum = None;
            return CalibrationOutcome::None;
        }

        self.held += dt;
        self.extremum = Some(match self.extremum {
            None => sample.raw_y,
            Some(seen) if setting_top => seen.min(sample.raw_y),
            Some(seen) => seen.max(sample.raw_y),
        });

        if self.held < HOLD_TO_COMMIT {
            return CalibrationOutcome::None;
        }

        let committed = self.extremum.take().unwrap_or(sample.raw_y);
        self.held = Duration::ZERO;
        if setting_top {
            self.draft_min = committed;
            self.phase = CalibrationPhase::SettingBottom;
            return CalibrationOutcome::TopCommitted;
        }

        self.phase = CalibrationPhase::Idle;
        let range = CalibrationRange {
            min: self.draft_min,
            max: committed,
        };
        if range.is_valid() {
            self.history.push(range);
            self.recompute_active();
            self.success_until = Some(now + SUCCESS_FLASH);
            // recompute_active always succeeds with non-empty history
            let active = self.active.unwrap_or(range);
            CalibrationOutcome::Saved(active)
        } else {
            tracing::debug!(
                min = range.min,
                max = range.max,
                "discarding calibration: span too small"
            );
            CalibrationOutcome::Discarded
        }
    }

    fn recompute_active(&mut self) {
        if self.history.is_empty() {
            self.active = None;
            return;
        }
        let n = self.history.len() as f32;
        let min = self.history.iter().map(|r| r.min).sum::<f32>() / n;
        let max = self.history.iter().map(|r| r.max).sum::<f32>() / n;
        self.active = Some(CalibrationRange { min, max });
    }
}
