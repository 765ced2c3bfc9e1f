use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::TelemetryReader;
use crate::error::ProviderError;
use crate::kernel::TelemetrySample;

/// Simulated OBD-II port: always reports the same plausible sample.
#[derive(Debug, Clone, Default)]
pub struct SimulatedObd {
    sample: TelemetrySample,
}

impl SimulatedObd {
    pub fn with_sample(sample: TelemetrySample) -> Self {
        Self { sample }
    }
}

#[async_trait]
impl TelemetryReader for SimulatedObd {
    async fn read(&self) -> Result<TelemetrySample, ProviderError> {
        Ok(self.sample)
    }
}

/// Cycles through a fixed script of readings.
#[derive(Debug)]
pub struct ScriptedTelemetry {
    script: Vec<Result<TelemetrySample, String>>,
    cursor: AtomicUsize,
}

impl ScriptedTelemetry {
    pub fn new(samples: Vec<TelemetrySample>) -> Self {
        Self::with_failures(samples.into_iter().map(Ok).collect())
    }

    pub fn with_failures(script: Vec<Result<TelemetrySample, String>>) -> Self {
        Self {
            script,
            cursor: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TelemetryReader for ScriptedTelemetry {
    async fn read(&self) -> Result<TelemetrySample, ProviderError> {
        if self.script.is_empty() {
            return Err(ProviderError::unavailable("telemetry", "empty script"));
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.script.len();
        match &self.script[idx] {
            Ok(sample) => Ok(*sample),
            Err(reason) => Err(ProviderError::unavailable("telemetry", reason.clone())),
        }
    }
}
