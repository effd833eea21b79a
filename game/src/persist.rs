use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationRange;
use crate::session::Score;
use crate::settings::config_dir;

/// Fire-and-forget progress blob: last seen score plus every accepted
/// calibration range. The core never depends on this surviving; at startup
/// it is read back purely as an optional seed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub score: Score,
    #[serde(default)]
    pub calibration: Vec<CalibrationRange>,
}

#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn from_env() -> Self {
        if let Some(explicit) = std::env::var_os("HANDPONG_PROGRESS_PATH") {
            return Self {
                path: PathBuf::from(explicit),
            };
        }

        Self {
            path: config_dir().join("progress.json"),
        }
    }

    pub fn load(&self) -> Progress {
        let Ok(bytes) = fs::read(&self.path) else {
            return Progress::default();
        };
        serde_json::from_slice(&bytes).unwrap_or_default()
    }

    pub fn save(&self, progress: &Progress) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(progress)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, text)
    }

    /// Best-effort save: failures are logged, never surfaced — persistence
    /// must not be able to stall the game.
    pub fn save_quietly(&self, progress: &Progress) {
        if let Err(err) = self.save(progress) {
            tracing::warn!(path = %self.path.display(), %err, "failed saving progress");
        }
    }
}
