use std::time::Duration;

use serde::{Deserialize, Serialize};

// Court geometry in logical pixels.
pub const GAME_WIDTH: f32 = 1280.0;
pub const GAME_HEIGHT: f32 = 720.0;
pub const PADDLE_WIDTH: f32 = 18.0;
pub const PADDLE_HEIGHT: f32 = 110.0;
pub const PADDLE_MARGIN: f32 = 24.0;
pub const BALL_RADIUS: f32 = 9.0;

/// Paddle centers stay within the court.
pub const PADDLE_MIN_Y: f32 = PADDLE_HEIGHT * 0.5;
pub const PADDLE_MAX_Y: f32 = GAME_HEIGHT - PADDLE_HEIGHT * 0.5;

/// Collision planes sit just outside each paddle's near face, offset by the
/// ball radius so contact happens at the ball's edge.
pub const PLAYER_PLANE_X: f32 = PADDLE_MARGIN + PADDLE_WIDTH + BALL_RADIUS;
pub const COMPUTER_PLANE_X: f32 = GAME_WIDTH - PADDLE_MARGIN - PADDLE_WIDTH - BALL_RADIUS;

pub const WINNING_SCORE: u32 = 5;

/// `|vx|` never exceeds the serve speed times this factor.
pub const MAX_SPEED_MULTIPLIER: f32 = 2.5;
pub const SPEED_UP_PER_HIT: f32 = 1.06;
/// Full-deflection vertical speed for an edge-of-paddle hit, px/s.
pub const BOUNCE_VY: f32 = 320.0;
pub const AI_DEAD_ZONE: f32 = 22.0;

/// Largest single integration step; anything longer (tab stall, GC pause)
/// is clamped before it can destabilize the simulation.
pub const MAX_STEP: Duration = Duration::from_millis(50);
/// Pause between a point and the next serve so the score lands visually.
pub const SERVE_DELAY: Duration = Duration::from_millis(800);
pub const SERVE_VY_MIN: f32 = 60.0;
pub const SERVE_VY_MAX: f32 = 160.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

impl Ball {
    fn centered() -> Self {
        Self {
            x: GAME_WIDTH * 0.5,
            y: GAME_HEIGHT * 0.5,
            vx: 0.0,
            vy: 0.0,
        }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.vx.is_finite() && self.vy.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Player,
    Computer,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Computer,
            Side::Computer => Side::Player,
        }
    }
}

/// Difficulty-derived tuning consumed by the court each step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CourtParams {
    /// AI paddle travel speed, px/s.
    pub ai_speed: f32,
    /// Initial horizontal ball speed, px/s; also the base for the speed cap.
    pub serve_speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsEvent {
    WallBounce,
    PaddleHit(Side),
    /// The named side won the point.
    Scored(Side),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Rng {
    state: u64,
}

impl Rng {
    fn new(seed: u64) -> Self {
        let seed = if seed == 0 {
            0x9E37_79B9_7F4A_7C15
        } else {
            seed
        };
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        (x.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 32) as u32
    }

    fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }

    fn coin(&mut self) -> bool {
        self.next_u32() & 1 == 1
    }
}

/// Ball and AI-paddle simulation for one match.
///
/// The court only ever advances from the session tick while the game is
/// running; the player paddle position is an input, never owned here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Court {
    pub ball: Ball,
    pub computer_y: f32,
    /// False between a point and the next serve.
    in_play: bool,
    #[serde(default, with = "crate::serde_duration::option")]
    serve_at: Option<Duration>,
    serve_toward: Side,
    rng: Rng,
}

impl Court {
    pub fn new(seed: u64) -> Self {
        Self {
            ball: Ball::centered(),
            computer_y: GAME_HEIGHT * 0.5,
            in_play: false,
            serve_at: None,
            serve_toward: Side::Player,
            rng: Rng::new(seed),
        }
    }

    pub fn in_play(&self) -> bool {
        self.in_play
    }

    /// Arms the opening serve of a fresh match.
    pub fn begin_match(&mut self, now: Duration) {
        self.ball = Ball::centered();
        self.computer_y = GAME_HEIGHT * 0.5;
        self.in_play = false;
        self.serve_toward = if self.rng.coin() {
            Side::Player
        } else {
            Side::Computer
        };
        self.serve_at = Some(now + SERVE_DELAY);
    }

    /// Returns the court to its idle shape with nothing pending.
    pub fn stop(&mut self) {
        self.ball = Ball::centered();
        self.computer_y = GAME_HEIGHT * 0.5;
        self.in_play = false;
        self.serve_at = None;
    }

    /// Drops a pending serve; used when a point just ended the match.
    pub fn cancel_serve(&mut self) {
        self.serve_at = None;
    }

    /// Advances the simulation by `dt` (already clamped by the caller to
    /// [`MAX_STEP`]). Events are appended in the order they occurred.
    pub fn step(
        &mut self,
        now: Duration,
        dt: Duration,
        player_y: f32,
        params: &CourtParams,
        events: &mut Vec<PhysicsEvent>,
    ) {
        if let Some(at) = self.serve_at {
            if now >= at {
                self.serve_at = None;
                self.launch_serve(params);
            }
        }

        if self.in_play {
            self.step_ball(now, dt, player_y, params, events);
        }

        self.step_ai(dt, params);
    }

    fn launch_serve(&mut self, params: &CourtParams) {
        let dir = match self.serve_toward {
            Side::Player => -1.0,
            Side::Computer => 1.0,
        };
        let vy_mag = self.rng.range(SERVE_VY_MIN, SERVE_VY_MAX);
        let vy = if self.rng.coin() { vy_mag } else { -vy_mag };
        self.ball = Ball {
            x: GAME_WIDTH * 0.5,
            y: GAME_HEIGHT * 0.5,
            vx: params.serve_speed * dir,
            vy,
        };
        self.in_play = true;
    }

    fn step_ball(
        &mut self,
        now: Duration,
        dt: Duration,
        player_y: f32,
        params: &CourtParams,
        events: &mut Vec<PhysicsEvent>,
    ) {
        let dt = dt.as_secs_f32();
        let prev = self.ball;
        let mut vx = prev.vx;
        let mut vy = prev.vy;
        let mut next_x = prev.x + vx * dt;
        // The raw projected y defines the frame's motion segment for paddle
        // interpolation, even when a wall bounce also lands this frame.
        let raw_next_y = prev.y + vy * dt;
        let mut next_y = raw_next_y;

        if next_y < BALL_RADIUS {
            next_y = BALL_RADIUS;
            vy = -vy;
            events.push(PhysicsEvent::WallBounce);
        } else if next_y > GAME_HEIGHT - BALL_RADIUS {
            next_y = GAME_HEIGHT - BALL_RADIUS;
            vy = -vy;
            events.push(PhysicsEvent::WallBounce);
        }

        let speed_cap = params.serve_speed * MAX_SPEED_MULTIPLIER;
        let half_extent = PADDLE_HEIGHT * 0.5 + BALL_RADIUS;

        // Swept paddle collision: a hit is a sign change across the plane
        // within one frame, with the contact y interpolated along the motion
        // segment. A fast ball cannot tunnel through the plane unnoticed.
        if vx < 0.0 && prev.x > PLAYER_PLANE_X && next_x <= PLAYER_PLANE_X {
            let t = (PLAYER_PLANE_X - prev.x) / (next_x - prev.x);
            let y_at_plane = prev.y + (raw_next_y - prev.y) * t;
            if (y_at_plane - player_y).abs() <= half_extent {
                next_x = PLAYER_PLANE_X;
                // Angle response: the further off-center the impact, the
                // steeper the return.
                vy = -((player_y - y_at_plane) / (PADDLE_HEIGHT * 0.5)) * BOUNCE_VY;
                vx = (vx.abs() * SPEED_UP_PER_HIT).min(speed_cap);
                events.push(PhysicsEvent::PaddleHit(Side::Player));
            }
        } else if vx > 0.0 && prev.x < COMPUTER_PLANE_X && next_x >= COMPUTER_PLANE_X {
            let t = (COMPUTER_PLANE_X - prev.x) / (next_x - prev.x);
            let y_at_plane = prev.y + (raw_next_y - prev.y) * t;
            if (y_at_plane - self.computer_y).abs() <= half_extent {
                next_x = COMPUTER_PLANE_X;
                vx = -(vx.abs() * SPEED_UP_PER_HIT).min(speed_cap);
                events.push(PhysicsEvent::PaddleHit(Side::Computer));
            }
        }

        let next = Ball {
            x: next_x,
            y: next_y,
            vx,
            vy,
        };
        if !next.is_finite() {
            tracing::warn!(?prev, "discarding non-finite ball update");
            return;
        }
        self.ball = next;

        // Out of bounds past a goal line: exactly one point per rally, the
        // in_play latch prevents double counting while the ball sits out.
        if self.ball.x < 0.0 {
            self.in_play = false;
            self.serve_toward = Side::Player;
            self.serve_at = Some(now + SERVE_DELAY);
            events.push(PhysicsEvent::Scored(Side::Computer));
        } else if self.ball.x > GAME_WIDTH {
            self.in_play = false;
            self.serve_toward = Side::Computer;
            self.serve_at = Some(now + SERVE_DELAY);
            events.push(PhysicsEvent::Scored(Side::Player));
        }
    }

    /// Proportional controller with a dead zone: the paddle chases the ball
    /// at a fixed speed but ignores small offsets, which keeps it humanly
    /// imperfect instead of a wall.
    fn step_ai(&mut self, dt: Duration, params: &CourtParams) {
        let target = if self.in_play {
            self.ball.y
        } else {
            GAME_HEIGHT * 0.5
        };
        let diff = target - self.computer_y;
        if diff.abs() <= AI_DEAD_ZONE {
            return;
        }
        let step = (params.ai_speed * dt.as_secs_f32()).min(diff.abs());
        let next = (self.computer_y + diff.signum() * step).clamp(PADDLE_MIN_Y, PADDLE_MAX_Y);
        if next.is_finite() {
            self.computer_y = next;
        }
    }
}
