//! TOML analysis settings: one file carrying stats, simulation and portfolio inputs.
//!
//! Every table is optional; missing fields take their defaults. `[plan]`
//! configures the fixed-horizon trading plan independently of the simulation.
//!
//! ```toml
//! [stats.distribution]
//! high = 0.67
//! medium = 0.31
//! low = 0.02
//!
//! [simulation]
//! num_simulations = 10000
//! master_seed = 42
//!
//! [portfolio]
//! total_capital = 1000.0
//!
//! [plan]
//! starting_capital = 100.0
//! days = 30
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use kellylab_core::{validate_inputs, ConfigError, SimulationConfig, StrategyStats};

use crate::plan::{PlanConfig, PlanError};
use crate::sizing::PortfolioConfig;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid settings: {0}")]
    Invalid(#[from] ConfigError),
    #[error("invalid plan settings: {0}")]
    InvalidPlan(#[from] PlanError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub stats: StrategyStats,
    pub simulation: SimulationConfig,
    pub portfolio: PortfolioConfig,
    pub plan: PlanConfig,
}

impl AnalysisSettings {
    /// Load and validate a settings file.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_inputs(&self.stats, &self.simulation)?;
        self.portfolio.validate()?;
        self.plan.validate()?;
        Ok(())
    }
}
