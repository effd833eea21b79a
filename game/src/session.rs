use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationEngine, CalibrationPhase, CalibrationOutcome, CalibrationRange, RawSample};
use crate::control::{MotionSmoother, map_to_paddle_y};
use crate::gesture::{Gesture, classify};
use crate::landmark::{Landmark, well_formed};
use crate::physics::{Ball, Court, MAX_STEP, PhysicsEvent, Side, WINNING_SCORE};
use crate::settings::PlayerSettings;
use crate::state::{GameStatus, StatusEffect, StatusEvent};

/// Lock after a gesture-triggered start or calibration request.
pub const START_COOLDOWN: Duration = Duration::from_millis(1000);
/// Lock after a pause toggle, so one held spread fires one transition.
pub const PAUSE_COOLDOWN: Duration = Duration::from_millis(1000);
/// Lock after a full reset.
pub const RESET_COOLDOWN: Duration = Duration::from_millis(2000);
/// Delay between the winning point and the over screen, so the final score
/// registers before the overlay switches.
pub const OVER_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub player: u32,
    pub computer: u32,
}

impl Score {
    pub fn of(&self, side: Side) -> u32 {
        match side {
            Side::Player => self.player,
            Side::Computer => self.computer,
        }
    }
}

/// The most recent classified landmark frame, written by the inference
/// callback and consumed by the next tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HandSample {
    pub gesture: Gesture,
    /// Raw normalized y of the control joint; `None` when no readable hand.
    pub control_y: Option<f32>,
}

/// Everything collaborators need to react to a tick: persistence listens for
/// score and calibration changes, the banter feed for scoring, sfx for
/// contact events.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StatusChanged(GameStatus),
    ScoreChanged(Score),
    /// The named side just scored; feed it to the banter service.
    Banter(Side),
    /// Fires exactly once per match, when the over screen is entered.
    GameOver(Side),
    CalibrationSaved(CalibrationRange),
    PaddleHit(Side),
    WallBounce,
}

/// Read-only per-tick view for the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot {
    pub status: GameStatus,
    pub score: Score,
    pub ball: Ball,
    pub ball_in_play: bool,
    pub player_y: f32,
    pub computer_y: f32,
    pub gesture: Gesture,
    pub calibration: CalibrationUi,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalibrationUi {
    pub phase: CalibrationPhase,
    pub hold_fraction: f32,
    pub success_visible: bool,
    pub active: Option<CalibrationRange>,
}

/// The simulation core: one of these owns all process-lifetime game state.
///
/// Two entry points, both called from the same logical thread: the landmark
/// source calls [`handle_landmarks`](Self::handle_landmarks) at the camera's
/// own cadence, which only records a pending sample; the render loop calls
/// [`tick`](Self::tick) once per frame, which is the sole place any game
/// state mutates. Dropped inference frames simply mean a tick without a
/// fresh sample.
///
/// The session is a plain value: cloneable and serializable, so whole
/// matches can be recorded and replayed by the engine's time machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    settings: PlayerSettings,
    status: GameStatus,
    #[serde(with = "crate::serde_duration")]
    clock: Duration,
    score: Score,
    court: Court,
    calibration: CalibrationEngine,
    smoother: MotionSmoother,
    #[serde(default)]
    latest: HandSample,
    #[serde(default)]
    fresh: bool,
    #[serde(default)]
    source_ready: bool,
    #[serde(with = "crate::serde_duration")]
    locked_until: Duration,
    #[serde(default, with = "crate::serde_duration::option")]
    over_at: Option<Duration>,
    pending_winner: Option<Side>,
}

impl GameSession {
    pub fn new(settings: PlayerSettings, seed: u64) -> Self {
        Self {
            settings,
            status: GameStatus::Idle,
            clock: Duration::ZERO,
            score: Score::default(),
            court: Court::new(seed),
            calibration: CalibrationEngine::new(),
            smoother: MotionSmoother::new(),
            latest: HandSample::default(),
            fresh: false,
            source_ready: false,
            locked_until: Duration::ZERO,
            over_at: None,
            pending_winner: None,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Accumulated session clock: the sum of every tick's `dt`.
    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn gesture(&self) -> Gesture {
        self.latest.gesture
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: PlayerSettings) {
        self.settings = settings;
    }

    pub fn calibration(&self) -> &CalibrationEngine {
        &self.calibration
    }

    /// Seeds the calibration history from persisted progress.
    pub fn seed_calibration(&mut self, ranges: Vec<CalibrationRange>) {
        self.calibration.seed_history(ranges);
    }

    /// Seeds the displayed score from persisted progress; starting a match
    /// still zeroes it.
    pub fn seed_score(&mut self, score: Score) {
        if self.status == GameStatus::Idle {
            self.score = score;
        }
    }

    /// Landmark-source callback. Classifies the frame and records it as the
    /// pending sample for the next tick; malformed frames count as "no
    /// hand". Never mutates physics or status.
    pub fn handle_landmarks(&mut self, points: Option<&[Landmark]>) {
        self.source_ready = true;
        let gesture = classify(points);
        let control_y = points.filter(|p| well_formed(p)).and_then(|p| {
            let joint = p[self.settings.control_gesture.control_joint()];
            joint.y.is_finite().then_some(joint.y)
        });
        self.latest = HandSample { gesture, control_y };
        self.fresh = true;
    }

    pub fn request_start(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.source_ready {
            self.dispatch(StatusEvent::Start, &mut events);
        }
        events
    }

    pub fn request_calibration(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        self.dispatch(StatusEvent::Calibrate, &mut events);
        events
    }

    pub fn request_restart(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        self.dispatch(StatusEvent::Restart, &mut events);
        events
    }

    pub fn request_reset(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        self.dispatch(StatusEvent::Reset, &mut events);
        events
    }

    /// Advances the whole pipeline by one rendered frame.
    pub fn tick(&mut self, dt: Duration) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        self.clock += dt;
        let now = self.clock;
        let fresh = std::mem::take(&mut self.fresh);

        if let Some(at) = self.over_at {
            if now >= at && self.status == GameStatus::Running {
                self.over_at = None;
                self.dispatch(StatusEvent::WinDelayElapsed, &mut events);
                if let Some(winner) = self.pending_winner.take() {
                    events.push(SessionEvent::GameOver(winner));
                }
            }
        }

        if now >= self.locked_until {
            if let Some((event, cooldown)) = self.gesture_event() {
                self.locked_until = now + cooldown;
                self.dispatch(event, &mut events);
            }
        }

        match self.status {
            GameStatus::Calibrating => {
                let sample = if fresh {
                    self.full_frame_sample()
                } else {
                    None
                };
                if let Some(sample) = sample {
                    self.smoother.set_target(sample.paddle_px);
                }
                self.smoother.tick(dt);
                match self.calibration.update(now, dt, sample) {
                    CalibrationOutcome::Saved(range) => {
                        events.push(SessionEvent::CalibrationSaved(range));
                        self.dispatch(StatusEvent::CalibrationDone, &mut events);
                    }
                    CalibrationOutcome::Discarded => {
                        self.dispatch(StatusEvent::CalibrationDone, &mut events);
                    }
                    CalibrationOutcome::TopCommitted | CalibrationOutcome::None => {}
                }
            }
            GameStatus::Running | GameStatus::Paused => {
                if fresh && self.latest.gesture == self.settings.control_gesture.gesture() {
                    if let Some(raw) = self.latest.control_y {
                        if let Some(px) = map_to_paddle_y(raw, self.calibration.active()) {
                            self.smoother.set_target(px);
                        }
                    }
                }
                self.smoother.tick(dt);

                if self.status == GameStatus::Running {
                    let params = self.settings.difficulty.court_params();
                    let mut physics_events = Vec::new();
                    self.court.step(
                        now,
                        dt.min(MAX_STEP),
                        self.smoother.position(),
                        &params,
                        &mut physics_events,
                    );
                    self.apply_physics_events(now, &physics_events, &mut events);
                }
            }
            GameStatus::Idle | GameStatus::Over => {
                self.smoother.recenter();
            }
        }

        events
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot {
            status: self.status,
            score: self.score,
            ball: self.court.ball,
            ball_in_play: self.court.in_play(),
            player_y: self.smoother.position(),
            computer_y: self.court.computer_y,
            gesture: self.latest.gesture,
            calibration: CalibrationUi {
                phase: self.calibration.phase(),
                hold_fraction: self.calibration.hold_fraction(),
                success_visible: self.calibration.success_visible(self.clock),
                active: self.calibration.active().copied(),
            },
        }
    }

    /// While calibrating, dwell detection and the displayed paddle both use
    /// the full-frame mapping: the player is sweeping out the raw range, so
    /// the old calibration must not shrink what they can reach.
    fn full_frame_sample(&self) -> Option<RawSample> {
        let raw_y = self.latest.control_y?;
        let paddle_px = map_to_paddle_y(raw_y, None)?;
        Some(RawSample { raw_y, paddle_px })
    }

    fn gesture_event(&self) -> Option<(StatusEvent, Duration)> {
        match (self.status, self.latest.gesture) {
            (GameStatus::Idle, Gesture::ThumbsUp) if self.source_ready => {
                Some((StatusEvent::Start, START_COOLDOWN))
            }
            (GameStatus::Idle, Gesture::Victory) => {
                Some((StatusEvent::Calibrate, START_COOLDOWN))
            }
            (GameStatus::Running | GameStatus::Paused, Gesture::Spread) => {
                Some((StatusEvent::TogglePause, PAUSE_COOLDOWN))
            }
            (GameStatus::Running | GameStatus::Paused, Gesture::ThumbsDown) => {
                Some((StatusEvent::Reset, RESET_COOLDOWN))
            }
            _ => None,
        }
    }

    fn dispatch(&mut self, event: StatusEvent, events: &mut Vec<SessionEvent>) {
        let (next, effect) = self.status.handle(event);
        let changed = next != self.status;
        self.status = next;

        match effect {
            StatusEffect::BeginMatch => {
                self.score = Score::default();
                self.over_at = None;
                self.pending_winner = None;
                self.court.begin_match(self.clock);
                events.push(SessionEvent::ScoreChanged(self.score));
            }
            StatusEffect::BeginCalibration => {
                self.calibration.begin();
            }
            StatusEffect::ClearProgress => {
                self.score = Score::default();
                self.over_at = None;
                self.pending_winner = None;
                self.calibration.clear();
                self.court.stop();
                events.push(SessionEvent::ScoreChanged(self.score));
            }
            StatusEffect::EndMatch | StatusEffect::None => {}
        }

        if changed {
            events.push(SessionEvent::StatusChanged(self.status));
        }
    }

    fn apply_physics_events(
        &mut self,
        now: Duration,
        physics_events: &[PhysicsEvent],
        events: &mut Vec<SessionEvent>,
    ) {
        for event in physics_events {
            match *event {
                PhysicsEvent::WallBounce => events.push(SessionEvent::WallBounce),
                PhysicsEvent::PaddleHit(side) => events.push(SessionEvent::PaddleHit(side)),
                PhysicsEvent::Scored(side) => {
                    match side {
                        Side::Player => self.score.player += 1,
                        Side::Computer => self.score.computer += 1,
                    }
                    events.push(SessionEvent::ScoreChanged(self.score));
                    events.push(SessionEvent::Banter(side));
                    if self.score.of(side) >= WINNING_SCORE {
                        // The match is decided: no reset serve, freeze the
                        // court and let the over transition land shortly.
                        self.court.cancel_serve();
                        self.over_at = Some(now + OVER_DELAY);
                        self.pending_winner = Some(side);
                    }
                }
            }
        }
    }
}
