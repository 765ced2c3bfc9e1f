//! Risk scoring. Two historical formulas are supported; the weighted one is canonical.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::classifier::DriverState;
use super::context::Context;
use super::signals::Observation;
use crate::error::ConfigError;

pub const MAX_SCORE: f64 = 100.0;

/// Points added by the rule-additive model.
const RULE_BASE: f64 = 20.0;
const RULE_STATE: f64 = 40.0;
const RULE_NEARBY: f64 = 20.0;
const RULE_RAIN: f64 = 20.0;

/// Weights of the continuous model, on a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub drowsy: f64,
    pub phone: f64,
    pub state: f64,
    pub nearby: f64,
    pub weather: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            drowsy: 60.0,
            phone: 20.0,
            state: 40.0,
            nearby: 20.0,
            weather: 20.0,
        }
    }
}

impl RiskWeights {
    /// `(weight_name, value)` pairs, the configuration surface of the scorer.
    pub fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("drowsy", self.drowsy),
            ("phone", self.phone),
            ("state", self.state),
            ("nearby", self.nearby),
            ("weather", self.weather),
        ]
    }

    /// Negative weights would break monotonicity of the score.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.entries() {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteWeight { name });
            }
            if value < 0.0 {
                return Err(ConfigError::NegativeWeight { name, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringModel {
    /// Continuous weighted sum of the signals.
    #[default]
    Weighted,
    /// Legacy discrete rules: base 20, +40 non-nominal state, +20 nearby vehicle, +20 rain.
    RuleAdditive,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RiskScorer {
    pub model: ScoringModel,
    pub weights: RiskWeights,
}

impl RiskScorer {
    pub fn new(model: ScoringModel, weights: RiskWeights) -> Result<Self, ConfigError> {
        weights.validate()?;
        Ok(Self { model, weights })
    }

    /// Pure. Inputs are expected to be clamped already; the result is always in `[0, 100]`.
    pub fn score(&self, obs: &Observation, state: DriverState, ctx: &Context) -> f64 {
        let raw = match self.model {
            ScoringModel::Weighted => self.weighted(obs, state, ctx),
            ScoringModel::RuleAdditive => rule_additive(obs, state, ctx),
        };
        let score = clamp_score(raw);
        debug!(model = ?self.model, raw, score, "risk scored");
        score
    }

    fn weighted(&self, obs: &Observation, state: DriverState, ctx: &Context) -> f64 {
        let w = &self.weights;
        w.drowsy * obs.drowsy_score
            + w.phone * indicator(obs.phone_detected)
            + w.state * indicator(!state.is_nominal())
            + w.nearby * indicator(obs.nearby_vehicle)
            + w.weather * ctx.weather_risk
    }
}

/// Scores with the default weighted model.
pub fn score(obs: &Observation, state: DriverState, ctx: &Context) -> f64 {
    RiskScorer::default().score(obs, state, ctx)
}

fn rule_additive(obs: &Observation, state: DriverState, ctx: &Context) -> f64 {
    RULE_BASE
        + RULE_STATE * indicator(!state.is_nominal())
        + RULE_NEARBY * indicator(obs.nearby_vehicle)
        + RULE_RAIN * indicator(ctx.is_raining())
}

fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

fn clamp_score(raw: f64) -> f64 {
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, MAX_SCORE)
    }
}
