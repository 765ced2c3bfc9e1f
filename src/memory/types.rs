use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kernel::context::GeoPoint;

/// Where and when an elevated-risk tick happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub geo: GeoPoint,
    /// 0.0 - 100.0
    pub score: f64,
    /// Epoch seconds.
    pub ts: f64,
}

/// Aggregate of one guardian run, appended to the ledger when the run ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub trip_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub ticks: u64,
    pub failed_ticks: u64,
    pub alerts: u64,
    pub high_risk: u64,
    pub max_score: f64,
    pub mean_score: f64,
    pub persistence_failures: u64,
}

/// On-disk document. Trips are kept opaque so foreign trip records survive a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryLedger {
    #[serde(default)]
    pub hotspots: Vec<Hotspot>,
    #[serde(default)]
    pub trips: Vec<serde_json::Value>,
}

/// How the store reacts when a flush fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicy {
    /// Keep unflushed records in memory and write them with the next flush.
    #[default]
    RetryOnNextFlush,
    /// After the first failure stop touching disk for the rest of the process.
    InMemoryOnly,
}

/// What `MemoryStore::load` found at the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Existing,
    Missing,
    Corrupt(String),
}
