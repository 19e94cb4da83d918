//! Code for loading program settings.
//!
//! Settings live in an optional `settings.toml` next to the model's CSV files; every field has a
//! default, so a model directory without one runs the deterministic problem with exact coverage.
use crate::formulation::CoverageMode;
use crate::id::VehicleType;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const SETTINGS_FILE_NAME: &str = "settings.toml";

/// The vehicle type used for facility-to-cluster legs unless configured otherwise.
fn default_delivery_vehicle() -> VehicleType {
    VehicleType(3)
}

fn default_scenarios() -> u32 {
    1
}

/// Program settings from the model directory's settings file.
#[derive(Debug, Deserialize, PartialEq)]
pub struct Settings {
    /// The program log level (overridable with the `MECWLP_LOG_LEVEL` environment variable)
    #[serde(default)]
    pub log_level: Option<String>,
    /// Number of demand scenarios to plan against; 1 solves the deterministic problem
    #[serde(default = "default_scenarios")]
    pub scenarios: u32,
    /// How delivery must cover cluster demand
    #[serde(default)]
    pub coverage: CoverageMode,
    /// The vehicle type used for facility-to-cluster legs
    #[serde(default = "default_delivery_vehicle")]
    pub delivery_vehicle: VehicleType,
    /// Solver wall-clock budget in seconds; unset means no limit
    #[serde(default)]
    pub time_limit: Option<f64>,
    /// Whether to write log files into the output directory
    #[serde(default)]
    pub save_log_files: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            log_level: None,
            scenarios: default_scenarios(),
            coverage: CoverageMode::default(),
            delivery_vehicle: default_delivery_vehicle(),
            time_limit: None,
            save_log_files: false,
        }
    }
}

impl Settings {
    /// Read the settings file from the model directory, or defaults if there is none.
    pub fn from_path(model_dir: &Path) -> Result<Settings> {
        let file_path = model_dir.join(SETTINGS_FILE_NAME);
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        let contents = fs::read_to_string(&file_path)
            .with_context(|| format!("Could not read {}", file_path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid settings file {}", file_path.display()))
    }
}
