use std::time::Duration;

/// Shared SFX volumes (0.0..=1.0) and beep pitches, used by the headful
/// client. Kept here so the mix stays consistent if another client appears.
pub const PADDLE_HIT_SFX_VOLUME: f32 = 0.3;
pub const WALL_SFX_VOLUME: f32 = 0.18;
pub const SCORE_SFX_VOLUME: f32 = 0.4;
pub const GAME_OVER_SFX_VOLUME: f32 = 0.5;

pub const PADDLE_HIT_HZ: f32 = 660.0;
pub const WALL_HZ: f32 = 440.0;
pub const SCORE_HZ: f32 = 330.0;
pub const GAME_OVER_HZ: f32 = 220.0;

pub const BEEP_LENGTH: Duration = Duration::from_millis(90);
