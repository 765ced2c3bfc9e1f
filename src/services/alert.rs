use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::warn;

use super::AlertSink;
use crate::error::SinkError;
use crate::kernel::{AlertTier, GeoPoint};

/// Delivers alerts as structured `warn` events.
#[derive(Debug, Clone, Default)]
pub struct TracingAlertSink;

#[async_trait]
impl AlertSink for TracingAlertSink {
    async fn push(
        &self,
        tier: AlertTier,
        message: &str,
        location: GeoPoint,
    ) -> Result<(), SinkError> {
        warn!(target: "rakshak::alert", %tier, level = tier.level(), %location, "{}", message);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PushedAlert {
    pub tier: AlertTier,
    pub message: String,
    pub location: GeoPoint,
}

/// Keeps every pushed alert. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingAlertSink {
    pushed: Arc<Mutex<Vec<PushedAlert>>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pushed(&self) -> Vec<PushedAlert> {
        self.pushed.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AlertSink for RecordingAlertSink {
    async fn push(
        &self,
        tier: AlertTier,
        message: &str,
        location: GeoPoint,
    ) -> Result<(), SinkError> {
        let mut pushed = self
            .pushed
            .lock()
            .map_err(|_| SinkError::rejected("recording", "record poisoned"))?;
        pushed.push(PushedAlert {
            tier,
            message: message.to_string(),
            location,
        });
        Ok(())
    }
}
