//! Settings management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings {} are malformed: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid setting '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    pub simulation: SimulationSettings,
    pub scene: SceneSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSettings {
    pub tick_rate_hz: u32,
    pub max_ticks_per_frame: u32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            max_ticks_per_frame: 5,
        }
    }
}

/// The scene built at start-up, if any.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneSettings {
    pub id: Option<String>,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl LoggingSettings {
    pub fn max_level(&self) -> Result<Level, SettingsError> {
        self.level.parse().map_err(|_| SettingsError::Invalid {
            key: "logging.level",
            reason: format!("'{}' is not one of trace, debug, info, warn, error", self.level),
        })
    }
}

impl EngineSettings {
    /// Read and validate the settings file at `path`.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings: Self = serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;

        // A relative scene path is relative to the settings file.
        if let (Some(scene), Some(root)) = (settings.scene.path.as_mut(), path.parent()) {
            *scene = root.join(&*scene);
        }
        Ok(settings)
    }

    /// Like [`EngineSettings::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.simulation.tick_rate_hz == 0 {
            return Err(SettingsError::Invalid {
                key: "simulation.tick_rate_hz",
                reason: "must be at least 1".into(),
            });
        }
        if self.simulation.max_ticks_per_frame == 0 {
            return Err(SettingsError::Invalid {
                key: "simulation.max_ticks_per_frame",
                reason: "must be at least 1".into(),
            });
        }
        self.logging.max_level()?;
        Ok(())
    }
}
