//! Pipeline configuration: defaults, JSON config file, CLI overrides.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::cli::types::Week;
use crate::error::{ProjError, Result};
use crate::projection::regression::TrainingWindow;
use crate::projection::simulate::{DEFAULT_FALLBACK_STD, DEFAULT_SIMULATIONS};

/// Which residuals a player's simulation resamples from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResidualScope {
    /// Every training residual for the player's position.
    #[default]
    Position,
    /// Only the player's own training residuals.
    Player,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub train_start: Week,
    pub train_end: Week,
    pub target_week: Week,
    pub min_training_rows: usize,
    pub min_rate_volume: f64,
    pub simulations: usize,
    pub fallback_std: f64,
    pub residual_scope: ResidualScope,
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            train_start: Week::new(1),
            train_end: Week::new(9),
            target_week: Week::new(11),
            min_training_rows: 5,
            min_rate_volume: 1.0,
            simulations: DEFAULT_SIMULATIONS,
            fallback_std: DEFAULT_FALLBACK_STD,
            residual_scope: ResidualScope::Position,
            seed: None,
        }
    }
}

/// Values given on the command line; `None` keeps the file/default value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub train_start: Option<Week>,
    pub train_end: Option<Week>,
    pub target_week: Option<Week>,
    pub min_training_rows: Option<usize>,
    pub simulations: Option<usize>,
    pub residual_scope: Option<ResidualScope>,
    pub seed: Option<u64>,
}

impl PipelineConfig {
    /// Parse a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = try_read_to_string(path).ok_or_else(|| ProjError::InvalidConfig {
            message: format!("could not read config file {}", path.display()),
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Defaults, then the config file (if any), then CLI overrides.
    pub fn resolve(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(v) = overrides.train_start {
            self.train_start = v;
        }
        if let Some(v) = overrides.train_end {
            self.train_end = v;
        }
        if let Some(v) = overrides.target_week {
            self.target_week = v;
        }
        if let Some(v) = overrides.min_training_rows {
            self.min_training_rows = v;
        }
        if let Some(v) = overrides.simulations {
            self.simulations = v;
        }
        if let Some(v) = overrides.residual_scope {
            self.residual_scope = v;
        }
        if overrides.seed.is_some() {
            self.seed = overrides.seed;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(ProjError::InvalidConfig {
                message: message.to_string(),
            })
        };

        if self.train_start > self.train_end {
            return invalid("train_start must not exceed train_end");
        }
        if self.target_week <= self.train_end {
            return invalid("target_week must come after train_end");
        }
        if self.min_training_rows == 0 {
            return invalid("min_training_rows must be at least 1");
        }
        if self.simulations == 0 {
            return invalid("simulations must be at least 1");
        }
        if self.fallback_std <= 0.0 || !self.fallback_std.is_finite() {
            return invalid("fallback_std must be a positive number");
        }
        if self.min_rate_volume.is_nan() || self.min_rate_volume < 0.0 {
            return invalid("min_rate_volume must not be negative");
        }
        Ok(())
    }

    pub fn window(&self) -> TrainingWindow {
        TrainingWindow {
            start: self.train_start,
            end: self.train_end,
        }
    }
}

/// Try to read a file into a String
fn try_read_to_string(path: &Path) -> Option<String> {
    let mut f = fs::File::open(path).ok()?;
    let mut s = String::new();

    f.read_to_string(&mut s).ok()?;

    Some(s)
}

/// Default config location: `<config_dir>/ffl-proj/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ffl-proj").join("config.json"))
}
