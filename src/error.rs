use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A telemetry or vision read failed.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} did not answer within {timeout:?}")]
    Timeout { provider: &'static str, timeout: Duration },

    #[error("{provider} unavailable: {reason}")]
    Unavailable { provider: &'static str, reason: String },
}

impl ProviderError {
    pub fn unavailable(provider: &'static str, reason: impl Into<String>) -> Self {
        Self::Unavailable { provider, reason: reason.into() }
    }
}

/// An alert or V2V dispatch failed. Never fatal to the monitor loop.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("{sink} did not accept within {timeout:?}")]
    Timeout { sink: &'static str, timeout: Duration },

    #[error("{sink} rejected dispatch: {reason}")]
    Rejected { sink: &'static str, reason: String },
}

impl SinkError {
    pub fn rejected(sink: &'static str, reason: impl Into<String>) -> Self {
        Self::Rejected { sink, reason: reason.into() }
    }
}

/// The memory store could not be written, or refused a record.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write memory store {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize memory store: {0}")]
    Serialize(#[from] serde_json::Error),

    /// JSON cannot carry NaN or infinity; the record was not appended.
    #[error("refusing to persist non-finite `{field}`")]
    NonFinite { field: &'static str },

    /// The store switched to in-memory-only mode after an earlier failure.
    #[error("memory store is degraded to in-memory only; {unflushed} record(s) not on disk")]
    Degraded { unflushed: usize },
}

/// Invalid weights, thresholds or durations. Fatal at construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("weight `{name}` must be non-negative, got {value}")]
    NegativeWeight { name: &'static str, value: f64 },

    #[error("weight `{name}` must be finite")]
    NonFiniteWeight { name: &'static str },

    #[error("tier threshold `{name}` must lie in [0, 100], got {value}")]
    ThresholdOutOfRange { name: &'static str, value: f64 },

    #[error("tier thresholds must be strictly increasing, got low={low} med={med} high={high}")]
    NonMonotonicThresholds { low: f64, med: f64, high: f64 },

    #[error("`{name}` must be greater than zero")]
    ZeroDuration { name: &'static str },

    #[error("cannot read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Aborts a single tick. The loop logs it and moves on.
#[derive(Debug, Error)]
pub enum TickError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
