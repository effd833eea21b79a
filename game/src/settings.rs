use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::gesture::Gesture;
use crate::landmark::{INDEX_TIP, WRIST};
use crate::physics::CourtParams;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// AI travel speed and serve speed per difficulty, px/s.
    pub fn court_params(self) -> CourtParams {
        match self {
            Difficulty::Easy => CourtParams {
                ai_speed: 180.0,
                serve_speed: 260.0,
            },
            Difficulty::Medium => CourtParams {
                ai_speed: 260.0,
                serve_speed: 300.0,
            },
            Difficulty::Hard => CourtParams {
                ai_speed: 340.0,
                serve_speed: 360.0,
            },
        }
    }
}

/// Which classified gesture drives the paddle, and through which landmark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlGesture {
    #[default]
    Fist,
    Pointer,
}

impl ControlGesture {
    pub fn gesture(self) -> Gesture {
        match self {
            ControlGesture::Fist => Gesture::Fist,
            ControlGesture::Pointer => Gesture::Pointer,
        }
    }

    /// The joint whose y steers the paddle: the wrist tracks a fist, the
    /// index tip tracks a pointer.
    pub fn control_joint(self) -> usize {
        match self {
            ControlGesture::Fist => WRIST,
            ControlGesture::Pointer => INDEX_TIP,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub control_gesture: ControlGesture,
    #[serde(default = "default_sound_enabled")]
    pub sound_enabled: bool,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            difficulty: Difficulty::default(),
            control_gesture: ControlGesture::default(),
            sound_enabled: default_sound_enabled(),
        }
    }
}

impl PlayerSettings {
    pub fn sanitized(mut self) -> Self {
        self.version = default_version();
        self
    }
}

fn default_version() -> u32 {
    1
}

fn default_sound_enabled() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn from_env() -> Self {
        if let Some(explicit) = std::env::var_os("HANDPONG_SETTINGS_PATH") {
            return Self {
                path: PathBuf::from(explicit),
            };
        }

        Self {
            path: config_dir().join("settings.json"),
        }
    }

    pub fn load(&self) -> PlayerSettings {
        let Ok(bytes) = fs::read(&self.path) else {
            return PlayerSettings::default();
        };
        serde_json::from_slice::<PlayerSettings>(&bytes)
            .map(PlayerSettings::sanitized)
            .unwrap_or_else(|_| PlayerSettings::default())
    }

    pub fn save(&self, settings: &PlayerSettings) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(settings)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, text)
    }
}

pub(crate) fn config_dir() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME").map(|home| {
                let mut p = PathBuf::from(home);
                p.push(".config");
                p
            })
        })
        .unwrap_or_else(|| PathBuf::from("."));

    base.join("handpong")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harder_difficulties_are_faster() {
        let easy = Difficulty::Easy.court_params();
        let medium = Difficulty::Medium.court_params();
        let hard = Difficulty::Hard.court_params();
        assert!(easy.ai_speed < medium.ai_speed && medium.ai_speed < hard.ai_speed);
        assert!(easy.serve_speed < medium.serve_speed && medium.serve_speed < hard.serve_speed);
    }

    #[test]
    fn control_gesture_picks_the_matching_joint() {
        assert_eq!(ControlGesture::Fist.control_joint(), WRIST);
        assert_eq!(ControlGesture::Pointer.control_joint(), INDEX_TIP);
        assert_eq!(ControlGesture::Fist.gesture(), Gesture::Fist);
        assert_eq!(ControlGesture::Pointer.gesture(), Gesture::Pointer);
    }

    #[test]
    fn serde_defaults_fill_missing_fields() {
        let parsed: PlayerSettings =
            serde_json::from_str(r#"{"version":1}"#).expect("settings JSON should parse");
        assert_eq!(parsed.difficulty, Difficulty::Medium);
        assert_eq!(parsed.control_gesture, ControlGesture::Fist);
        assert!(parsed.sound_enabled);
    }

    #[test]
    fn sanitized_rewrites_the_version() {
        let settings = PlayerSettings {
            version: 99,
            ..PlayerSettings::default()
        }
        .sanitized();
        assert_eq!(settings.version, 1);
    }
}
