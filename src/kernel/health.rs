//! Vehicle health rules over a single telemetry sample.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::signals::TelemetrySample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    LowTirePressure,
    BrakeWarning,
}

/// Each code appears at most once.
pub type IssueSet = BTreeSet<IssueCode>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthThresholds {
    /// Pressure strictly below this raises `LOW_TIRE_PRESSURE`.
    pub low_tire_pressure: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self { low_tire_pressure: 27.0 }
    }
}

/// Pure: rules are evaluated independently, not as a cascade.
pub fn analyze(sample: &TelemetrySample) -> IssueSet {
    analyze_with(sample, &HealthThresholds::default())
}

pub fn analyze_with(sample: &TelemetrySample, thresholds: &HealthThresholds) -> IssueSet {
    let mut issues = IssueSet::new();
    if sample.tire_pressure < thresholds.low_tire_pressure {
        issues.insert(IssueCode::LowTirePressure);
    }
    if sample.brake_flag {
        issues.insert(IssueCode::BrakeWarning);
    }
    debug!(?issues, "vehicle health analyzed");
    issues
}
