use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    #[default]
    Idle,
    Calibrating,
    Running,
    Paused,
    Over,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    Start,
    Calibrate,
    TogglePause,
    Reset,
    /// The win-score delay elapsed; the match is decided.
    WinDelayElapsed,
    Restart,
    CalibrationDone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEffect {
    None,
    BeginMatch,
    BeginCalibration,
    /// Zero scores, drop calibration history, return the court to idle.
    ClearProgress,
    /// Freeze the court as-is so the final score stays visible.
    EndMatch,
}

impl GameStatus {
    /// Pure transition function for the overall game mode.
    ///
    /// Side effects (resetting the court, starting calibration) are reported
    /// as a [`StatusEffect`] so the session applies them and the machine
    /// itself stays trivially testable. Events that make no sense in the
    /// current state are ignored.
    pub fn handle(self, event: StatusEvent) -> (GameStatus, StatusEffect) {
        match (self, event) {
            (GameStatus::Idle, StatusEvent::Start) => (GameStatus::Running, StatusEffect::BeginMatch),
            (GameStatus::Idle, StatusEvent::Calibrate) => {
                (GameStatus::Calibrating, StatusEffect::BeginCalibration)
            }

            (GameStatus::Running, StatusEvent::TogglePause) => {
                (GameStatus::Paused, StatusEffect::None)
            }
            (GameStatus::Paused, StatusEvent::TogglePause) => {
                (GameStatus::Running, StatusEffect::None)
            }

            (GameStatus::Running | GameStatus::Paused, StatusEvent::Reset) => {
                (GameStatus::Idle, StatusEffect::ClearProgress)
            }

            (GameStatus::Running, StatusEvent::WinDelayElapsed) => {
                (GameStatus::Over, StatusEffect::EndMatch)
            }

            (GameStatus::Over, StatusEvent::Restart) => (GameStatus::Idle, StatusEffect::None),

            (GameStatus::Calibrating, StatusEvent::CalibrationDone) => {
                (GameStatus::Idle, StatusEffect::None)
            }

            (state, _) => (state, StatusEffect::None),
        }
    }

    /// True while paddle control follows the hand (the smoother runs).
    pub fn control_active(self) -> bool {
        matches!(
            self,
            GameStatus::Running | GameStatus::Paused | GameStatus::Calibrating
        )
    }
}
