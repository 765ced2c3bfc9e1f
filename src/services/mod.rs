//! Boundary adapters. The guardian only ever talks to these traits.
//!
//! Every call may be slow or fail; the monitor wraps each one in a timeout and
//! treats failure as a per-tick event, never as a reason to stop.

pub mod alert;
pub mod obd;
pub mod v2v;
pub mod vision;

use async_trait::async_trait;

use crate::error::{ProviderError, SinkError};
use crate::kernel::{AlertTier, FrameRef, GeoPoint, Observation, TelemetrySample};

pub use alert::{RecordingAlertSink, TracingAlertSink};
pub use obd::{ScriptedTelemetry, SimulatedObd};
pub use v2v::{RecordingBroadcaster, TracingBroadcaster};
pub use vision::{MockVision, ScriptedVision};

#[async_trait]
pub trait VisionProvider: Send + Sync {
    async fn analyze(&self, frame: FrameRef) -> Result<Observation, ProviderError>;
}

#[async_trait]
pub trait TelemetryReader: Send + Sync {
    async fn read(&self) -> Result<TelemetrySample, ProviderError>;
}

/// Fire-and-forget alert delivery (HMI, phone, buzzer...).
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn push(
        &self,
        tier: AlertTier,
        message: &str,
        location: GeoPoint,
    ) -> Result<(), SinkError>;
}

#[async_trait]
pub trait V2VBroadcaster: Send + Sync {
    async fn broadcast(&self, message: &str, location: GeoPoint) -> Result<(), SinkError>;
}
