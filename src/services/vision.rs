use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::debug;

use super::VisionProvider;
use crate::error::ProviderError;
use crate::kernel::{FrameRef, Observation};

/// Returns the same observation for every frame. Stands in for the camera + model.
#[derive(Debug, Clone)]
pub struct MockVision {
    observation: Observation,
}

impl MockVision {
    pub fn new(observation: Observation) -> Self {
        Self { observation }
    }
}

impl Default for MockVision {
    /// Attentive driver with a vehicle nearby.
    fn default() -> Self {
        Self::new(Observation::new(0.3, false, false, true))
    }
}

#[async_trait]
impl VisionProvider for MockVision {
    async fn analyze(&self, frame: FrameRef) -> Result<Observation, ProviderError> {
        debug!(frame = frame.tick, observation = ?self.observation, "frame analyzed");
        Ok(self.observation)
    }
}

/// Cycles through a fixed script of results, one per call.
#[derive(Debug)]
pub struct ScriptedVision {
    script: Vec<Result<Observation, String>>,
    cursor: AtomicUsize,
}

impl ScriptedVision {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self::with_failures(observations.into_iter().map(Ok).collect())
    }

    /// `Err(reason)` entries make that call fail with `ProviderError::Unavailable`.
    pub fn with_failures(script: Vec<Result<Observation, String>>) -> Self {
        Self {
            script,
            cursor: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VisionProvider for ScriptedVision {
    async fn analyze(&self, _frame: FrameRef) -> Result<Observation, ProviderError> {
        if self.script.is_empty() {
            return Err(ProviderError::unavailable("vision", "empty script"));
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.script.len();
        match &self.script[idx] {
            Ok(obs) => Ok(*obs),
            Err(reason) => Err(ProviderError::unavailable("vision", reason.clone())),
        }
    }
}
