use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::info;

use super::V2VBroadcaster;
use crate::error::SinkError;
use crate::kernel::GeoPoint;

/// No radio: each broadcast becomes a structured log event.
#[derive(Debug, Clone, Default)]
pub struct TracingBroadcaster;

#[async_trait]
impl V2VBroadcaster for TracingBroadcaster {
    async fn broadcast(&self, message: &str, location: GeoPoint) -> Result<(), SinkError> {
        info!(target: "rakshak::v2v", %location, "{}", message);
        Ok(())
    }
}

/// Records broadcasts instead of transmitting them. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingBroadcaster {
    sent: Arc<Mutex<Vec<(String, GeoPoint)>>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, GeoPoint)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl V2VBroadcaster for RecordingBroadcaster {
    async fn broadcast(&self, message: &str, location: GeoPoint) -> Result<(), SinkError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| SinkError::rejected("recording", "record poisoned"))?;
        sent.push((message.to_string(), location));
        Ok(())
    }
}
