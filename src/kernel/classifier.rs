//! Fuses an observation and the vehicle's issues into one driver state.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::health::{IssueCode, IssueSet};
use super::signals::Observation;

pub const DROWSY_THRESHOLD: f64 = 0.6;

/// Exactly one state is active per tick.
///
/// `Alert` means "nominal / attentive". It is not an alarm; alarms are `AlertTier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverState {
    Alert,
    Drowsy,
    Distracted,
    MechanicalRisk,
}

impl DriverState {
    /// Severity rank. Higher wins.
    pub fn severity(&self) -> u8 {
        match self {
            Self::Alert => 0,
            Self::Drowsy => 1,
            Self::Distracted => 2,
            Self::MechanicalRisk => 3,
        }
    }

    pub fn is_nominal(&self) -> bool {
        matches!(self, Self::Alert)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alert => "ALERT",
            Self::Drowsy => "DROWSY",
            Self::Distracted => "DISTRACTED",
            Self::MechanicalRisk => "MECHANICAL_RISK",
        }
    }
}

impl PartialOrd for DriverState {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DriverState {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl std::fmt::Display for DriverState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidates are computed independently, then the most severe one wins.
pub fn classify(obs: &Observation, issues: &IssueSet) -> DriverState {
    let candidates = [
        (obs.drowsy_score > DROWSY_THRESHOLD, DriverState::Drowsy),
        (obs.phone_detected, DriverState::Distracted),
        (issues.contains(&IssueCode::BrakeWarning), DriverState::MechanicalRisk),
    ];

    let state = resolve(candidates);
    debug!(%state, "driver state classified");
    state
}

fn resolve(candidates: impl IntoIterator<Item = (bool, DriverState)>) -> DriverState {
    candidates
        .into_iter()
        .filter_map(|(active, state)| active.then_some(state))
        .max()
        .unwrap_or(DriverState::Alert)
}
