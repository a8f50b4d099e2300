use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::EntityKind;

/// Names the JSON config file read by the sandbox binary.
pub const CONFIG_ENV_VAR: &str = "OVERWATCH_CONFIG";

pub const DEFAULT_BUILDING_FRAMES: u32 = 256;
pub const DEFAULT_VEHICLE_FRAMES: u32 = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config '{path}' at {field}: {source}")]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value at {field}: {message}")]
    Invalid { field: String, message: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorToggles {
    pub building: bool,
    pub vehicle: bool,
    pub animal: bool,
}

impl MonitorToggles {
    pub fn all() -> Self {
        Self {
            building: true,
            vehicle: true,
            animal: true,
        }
    }

    /// Animals are discovered through buildings, so they drag the building
    /// monitor in with them.
    pub fn normalized(mut self) -> Self {
        self.building |= self.animal;
        self
    }

    pub fn for_kind(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Building => self.building,
            EntityKind::Vehicle => self.vehicle,
            EntityKind::Animal => self.animal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverwatchConfig {
    pub enable: MonitorToggles,
    pub debug: MonitorToggles,
    /// Display names that earn their own named category when present.
    pub tracked_animals: Vec<String>,
    pub building_frames: u32,
    pub vehicle_frames: u32,
}

impl Default for OverwatchConfig {
    fn default() -> Self {
        Self {
            enable: MonitorToggles::default(),
            debug: MonitorToggles::default(),
            tracked_animals: default_tracked_animals(),
            building_frames: DEFAULT_BUILDING_FRAMES,
            vehicle_frames: DEFAULT_VEHICLE_FRAMES,
        }
    }
}

pub fn default_tracked_animals() -> Vec<String> {
    [
        "Seagull",
        "Cow",
        "Pig",
        "Dog",
        "Wolf",
        "Bear",
        "MooseMale",
        "MooseFemale",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl OverwatchConfig {
    /// Every monitor enabled, no debug output.
    pub fn all_enabled() -> Self {
        Self {
            enable: MonitorToggles::all(),
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Self::parse(Path::new("<inline>"), raw)
    }

    fn parse(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config: Self = serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let field = error.path().to_string();
            ConfigError::Parse {
                path: path.to_path_buf(),
                field,
                source: error.into_inner(),
            }
        })?;
        let config = config.normalized();
        config.validate()?;
        Ok(config)
    }

    /// Applies the animal-implies-building rule to both toggle sets.
    pub fn normalized(mut self) -> Self {
        self.enable = self.enable.normalized();
        self.debug = self.debug.normalized();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // One frame never advances past the frame it started on.
        for (field, frames) in [
            ("building_frames", self.building_frames),
            ("vehicle_frames", self.vehicle_frames),
        ] {
            if frames < 2 {
                return Err(ConfigError::Invalid {
                    field: field.to_string(),
                    message: format!("expected at least 2 frames, got {frames}"),
                });
            }
        }
        if let Some(index) = self.tracked_animals.iter().position(|name| name.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: format!("tracked_animals[{index}]"),
                message: "display name must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
