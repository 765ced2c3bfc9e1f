//! Pure fusion pipeline: health rules, driver state, risk score, alert tier.
//! Nothing in here performs I/O.

pub mod classifier;
pub mod context;
pub mod health;
pub mod risk;
pub mod signals;
pub mod telemetry;
pub mod tier;
pub mod time;

pub use classifier::{classify, DriverState};
pub use context::{Context, ContextProvider, GeoPoint, WeatherCondition};
pub use health::{analyze, analyze_with, HealthThresholds, IssueCode, IssueSet};
pub use risk::{RiskScorer, RiskWeights, ScoringModel};
pub use signals::{FrameRef, Observation, TelemetrySample};
pub use tier::{tier_for, AlertTier, TierThresholds};
pub use time::Tick;
