//! Guardian configuration.
//!
//! Resolution order for the binary:
//! 1. Environment variable (`RAKSHAK_MEMORY_PATH` overrides the ledger location)
//! 2. TOML file named by `RAKSHAK_CONFIG`
//! 3. Compiled defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::kernel::health::HealthThresholds;
use crate::kernel::risk::{RiskWeights, ScoringModel};
use crate::kernel::tier::{AlertTier, TierThresholds};
use crate::kernel::time::DEFAULT_TICK_MS;
use crate::memory::FlushPolicy;

pub const CONFIG_ENV: &str = "RAKSHAK_CONFIG";
pub const MEMORY_PATH_ENV: &str = "RAKSHAK_MEMORY_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardianConfig {
    pub tick_interval_ms: u64,
    /// Upper bound for any single provider or sink call.
    pub io_timeout_ms: u64,
    pub weights: RiskWeights,
    pub tier_thresholds: TierThresholds,
    pub scoring_model: ScoringModel,
    pub memory_path: PathBuf,
    pub flush_policy: FlushPolicy,
    /// Alerts at or above this tier are also broadcast over V2V.
    pub v2v_min_tier: AlertTier,
    /// Append a trip summary to the ledger when a run ends.
    pub record_trips: bool,
    pub health: HealthThresholds,
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_MS,
            io_timeout_ms: 250,
            weights: RiskWeights::default(),
            tier_thresholds: TierThresholds::default(),
            scoring_model: ScoringModel::default(),
            memory_path: PathBuf::from("data/memory.json"),
            flush_policy: FlushPolicy::default(),
            v2v_min_tier: AlertTier::High,
            record_trips: true,
            health: HealthThresholds::default(),
        }
    }
}

impl GuardianConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Builds the effective configuration from the environment.
    pub fn resolve() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        if let Some(path) = std::env::var_os(MEMORY_PATH_ENV) {
            config.memory_path = PathBuf::from(path);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration { name: "tick_interval_ms" });
        }
        if self.io_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration { name: "io_timeout_ms" });
        }
        self.weights.validate()?;
        self.tier_thresholds.validate()?;
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}
