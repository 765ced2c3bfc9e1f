use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Ordinal of one monitor tick. The first tick of a monitor is `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Tick {
    pub ordinal: u64,
}

pub const DEFAULT_TICK_MS: u64 = 100;

impl Tick {
    pub fn new() -> Self {
        Tick { ordinal: 0 }
    }

    pub fn next(&self) -> Self {
        Tick { ordinal: self.ordinal + 1 }
    }
}

impl std::fmt::Display for Tick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.ordinal)
    }
}

/// Wall clock in fractional epoch seconds, the unit persisted in the ledger.
pub fn epoch_seconds() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}
