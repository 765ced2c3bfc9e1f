use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PersistenceError, SinkError};
use crate::kernel::{AlertTier, DriverState, GeoPoint, IssueSet, Tick};
use crate::memory::TripSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonitorState {
    Stopped,
    Running,
}

impl std::fmt::Display for MonitorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stopped => f.write_str("STOPPED"),
            Self::Running => f.write_str("RUNNING"),
        }
    }
}

/// Handed to the alert sink. Only exists for tiers above `NONE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub tier: AlertTier,
    pub message: String,
    pub location: GeoPoint,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn new(tier: AlertTier, message: impl Into<String>, location: GeoPoint) -> Option<Self> {
        if !tier.is_alerting() {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4(),
            tier,
            message: message.into(),
            location,
            timestamp: Utc::now(),
        })
    }
}

pub fn alert_message(score: f64, state: DriverState) -> String {
    format!("Risk {:.1}% detected ({})", score, state)
}

/// Everything one completed tick decided and did.
#[derive(Debug)]
pub struct TickOutcome {
    pub tick: Tick,
    pub issues: IssueSet,
    pub state: DriverState,
    pub score: f64,
    pub tier: AlertTier,
    pub alert: Option<Alert>,
    pub broadcast: bool,
    pub sink_error: Option<SinkError>,
    pub v2v_error: Option<SinkError>,
    /// Set when the hotspot could not be flushed. It is still held in memory.
    pub persistence_error: Option<PersistenceError>,
}

impl TickOutcome {
    pub fn hotspot_recorded(&self) -> bool {
        self.alert.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// `stop()` was requested.
    Stopped,
    /// The run reached its `max_ticks` budget.
    MaxTicks,
}

/// Returned by `GuardianMonitor::join` once a run has ended.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub ticks: u64,
    pub exit: ExitReason,
    pub trip: TripSummary,
    pub trip_persisted: bool,
}
