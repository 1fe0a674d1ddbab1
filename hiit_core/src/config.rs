//! Configuration file support for hiit.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/hiit/config.toml`.

use crate::{Equipment, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub equipment: EquipmentConfig,

    #[serde(default)]
    pub workout: WorkoutConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Equipment the user owns; used when `--equipment` is not given
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EquipmentConfig {
    #[serde(default = "default_equipment")]
    pub available: Vec<Equipment>,
}

impl Default for EquipmentConfig {
    fn default() -> Self {
        Self {
            available: default_equipment(),
        }
    }
}

/// Interval timing used by the plan generator
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutConfig {
    #[serde(default = "default_minutes")]
    pub default_minutes: u32,

    #[serde(default = "default_exercise_time_seconds")]
    pub exercise_time_seconds: u32,

    #[serde(default = "default_rest_time_seconds")]
    pub rest_time_seconds: u32,

    #[serde(default = "default_exercises_per_round")]
    pub exercises_per_round: usize,
}

impl Default for WorkoutConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_minutes(),
            exercise_time_seconds: default_exercise_time_seconds(),
            rest_time_seconds: default_rest_time_seconds(),
            exercises_per_round: default_exercises_per_round(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("hiit")
}

fn default_equipment() -> Vec<Equipment> {
    vec![Equipment::None]
}

fn default_minutes() -> u32 {
    20
}

fn default_exercise_time_seconds() -> u32 {
    40
}

fn default_rest_time_seconds() -> u32 {
    20
}

fn default_exercises_per_round() -> usize {
    5
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("hiit").join("config.toml")
    }

    /// Reject timings the plan generator cannot turn into a runnable plan
    pub fn validate(&self) -> Result<()> {
        if self.workout.exercise_time_seconds == 0 {
            return Err(Error::Config(
                "workout.exercise_time_seconds must be greater than zero".into(),
            ));
        }
        if self.workout.exercises_per_round == 0 {
            return Err(Error::Config(
                "workout.exercises_per_round must be at least 1".into(),
            ));
        }
        if self.workout.default_minutes == 0 {
            return Err(Error::Config(
                "workout.default_minutes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
