//! Scripted sessions without a camera: synthetic landmark poses plus a
//! [`Simulation`] wrapper so the engine's headless runner can drive whole
//! matches deterministically.

use std::time::Duration;

use engine::Simulation;

use crate::landmark::{
    INDEX_DIP, INDEX_MCP, INDEX_PIP, INDEX_TIP, LANDMARK_COUNT, Landmark, MIDDLE_DIP, MIDDLE_MCP,
    MIDDLE_PIP, MIDDLE_TIP, PINKY_DIP, PINKY_MCP, PINKY_PIP, PINKY_TIP, RING_DIP, RING_MCP,
    RING_PIP, RING_TIP, THUMB_CMC, THUMB_IP, THUMB_MCP, THUMB_TIP, WRIST,
};
use crate::session::{GameSession, SessionEvent};
use crate::settings::PlayerSettings;

/// A canonical hand pose the synthetic generator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandPose {
    Fist,
    Pointer,
    Open,
    Spread,
    ThumbsUp,
    ThumbsDown,
    Victory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ThumbShape {
    Neutral,
    Up,
    Down,
    Extended,
}

/// Builds a 21-landmark frame for `pose` with the wrist at normalized
/// `wrist_y`. Fingers extend upward from the wrist, so joints can land
/// slightly outside [0,1] near the frame top — the classifier only needs
/// finite coordinates, and the mapper clamps.
pub fn pose_landmarks(pose: HandPose, wrist_y: f32) -> [Landmark; 21] {
    let (extended, thumb, wide) = match pose {
        HandPose::Fist => ([false; 4], ThumbShape::Neutral, false),
        HandPose::Pointer => ([true, false, false, false], ThumbShape::Neutral, false),
        HandPose::Victory => ([true, true, false, false], ThumbShape::Neutral, false),
        HandPose::Open => ([true; 4], ThumbShape::Neutral, false),
        HandPose::Spread => ([true; 4], ThumbShape::Extended, true),
        HandPose::ThumbsUp => ([false; 4], ThumbShape::Up, false),
        HandPose::ThumbsDown => ([false; 4], ThumbShape::Down, false),
    };

    let w = wrist_y;
    let at = |x: f32, dy: f32| Landmark::new(x, w + dy, 0.0);
    let mut points = [Landmark::default(); LANDMARK_COUNT];

    points[WRIST] = at(0.50, 0.0);

    let finger_x: [f32; 4] = if wide {
        [0.38, 0.46, 0.54, 0.62]
    } else {
        [0.44, 0.48, 0.52, 0.56]
    };
    let joints: [[usize; 4]; 4] = [
        [INDEX_MCP, INDEX_PIP, INDEX_DIP, INDEX_TIP],
        [MIDDLE_MCP, MIDDLE_PIP, MIDDLE_DIP, MIDDLE_TIP],
        [RING_MCP, RING_PIP, RING_DIP, RING_TIP],
        [PINKY_MCP, PINKY_PIP, PINKY_DIP, PINKY_TIP],
    ];
    for (finger, &[mcp, pip, dip, tip]) in joints.iter().enumerate() {
        let x = finger_x[finger];
        points[mcp] = at(x, -0.15);
        points[pip] = at(x, -0.18);
        points[dip] = at(x, -0.21);
        // Extended tips rise above the PIP; curled tips fold back below it.
        points[tip] = if extended[finger] {
            at(x, -0.24)
        } else {
            at(x, -0.16)
        };
    }

    points[THUMB_CMC] = at(0.58, -0.05);
    points[THUMB_MCP] = at(0.60, -0.09);
    points[THUMB_IP] = at(0.61, -0.12);
    points[THUMB_TIP] = match thumb {
        ThumbShape::Neutral => at(0.63, -0.13),
        ThumbShape::Up => at(0.60, -0.22),
        ThumbShape::Down => at(0.63, -0.02),
        ThumbShape::Extended => at(0.55, -0.13),
    };

    points
}

/// What the landmark source did this frame, from the session's perspective.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum HandInput {
    /// Inference fired and saw no hand.
    Absent,
    /// Inference fired with the given pose, wrist at the given normalized y.
    Pose(HandPose, f32),
    /// Inference produced nothing this tick (dropped frame).
    #[default]
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiRequest {
    Start,
    Calibrate,
    Restart,
    Reset,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionInput {
    pub hand: HandInput,
    pub request: Option<UiRequest>,
}

impl SessionInput {
    pub fn pose(pose: HandPose, wrist_y: f32) -> Self {
        Self {
            hand: HandInput::Pose(pose, wrist_y),
            request: None,
        }
    }

    pub fn absent() -> Self {
        Self {
            hand: HandInput::Absent,
            request: None,
        }
    }

    pub fn skipped() -> Self {
        Self::default()
    }

    pub fn request(request: UiRequest) -> Self {
        Self {
            hand: HandInput::Skipped,
            request: Some(request),
        }
    }
}

/// Applies one scripted input to a session in place, returning the tick's
/// events. The [`Simulation`] impl below wraps this for the time machine;
/// tests that care about events call it directly.
pub fn apply_input(session: &mut GameSession, input: SessionInput, dt: Duration) -> Vec<SessionEvent> {
    match input.hand {
        HandInput::Absent => session.handle_landmarks(None),
        HandInput::Pose(pose, wrist_y) => {
            let points = pose_landmarks(pose, wrist_y);
            session.handle_landmarks(Some(points.as_slice()));
        }
        HandInput::Skipped => {}
    }

    let mut events = match input.request {
        Some(UiRequest::Start) => session.request_start(),
        Some(UiRequest::Calibrate) => session.request_calibration(),
        Some(UiRequest::Restart) => session.request_restart(),
        Some(UiRequest::Reset) => session.request_reset(),
        None => Vec::new(),
    };
    events.extend(session.tick(dt));
    events
}

/// Deterministic gesture-pong session for the engine's headless runner.
#[derive(Debug, Clone)]
pub struct PongLogic {
    settings: PlayerSettings,
    seed: u64,
}

impl PongLogic {
    pub fn new(settings: PlayerSettings, seed: u64) -> Self {
        Self { settings, seed }
    }
}

impl Simulation for PongLogic {
    type State = GameSession;
    type Input = SessionInput;

    fn initial_state(&self) -> GameSession {
        GameSession::new(self.settings, self.seed)
    }

    fn step(&self, state: &GameSession, input: SessionInput, dt: Duration) -> GameSession {
        let mut next = state.clone();
        apply_input(&mut next, input, dt);
        next
    }
}
