//! Session telemetry for the guardian loop.
//!
//! Telemetry is a read-only side channel: the monitor writes events here, but
//! no scoring or dispatch decision ever reads them back. At the end of a run
//! the recorded events are folded into a trip summary.

pub mod event;
pub mod metrics;
pub mod recorder;
