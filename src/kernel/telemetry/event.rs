use serde::{Deserialize, Serialize};

use crate::kernel::classifier::DriverState;
use crate::kernel::tier::AlertTier;
use crate::kernel::time::Tick;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TelemetryEvent {
    /// A tick ran the full fusion pipeline.
    TickCompleted {
        tick: Tick,
        state: DriverState,
        tier: AlertTier,
        score: f64,
    },

    /// A provider failure aborted the tick.
    TickFailed { tick: Tick },

    DispatchFailed { tick: Tick, channel: DispatchChannel },

    PersistenceFailed { tick: Tick },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchChannel {
    AlertSink,
    V2V,
}
