use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Urgency of an alert. Ordered `None < Low < Med < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTier {
    #[default]
    None = 0,
    Low = 1,
    Med = 2,
    High = 3,
}

impl AlertTier {
    pub fn level(&self) -> u8 {
        *self as u8
    }

    pub fn is_alerting(&self) -> bool {
        *self > AlertTier::None
    }
}

impl std::fmt::Display for AlertTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "NONE",
            Self::Low => "LOW",
            Self::Med => "MED",
            Self::High => "HIGH",
        };
        f.write_str(name)
    }
}

/// A score strictly above a threshold reaches that tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub low: f64,
    pub med: f64,
    pub high: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            low: 50.0,
            med: 80.0,
            high: 95.0,
        }
    }
}

impl TierThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("low", self.low), ("med", self.med), ("high", self.high)] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }
        if !(self.low < self.med && self.med < self.high) {
            return Err(ConfigError::NonMonotonicThresholds {
                low: self.low,
                med: self.med,
                high: self.high,
            });
        }
        Ok(())
    }

    pub fn tier_for(&self, score: f64) -> AlertTier {
        if score > self.high {
            AlertTier::High
        } else if score > self.med {
            AlertTier::Med
        } else if score > self.low {
            AlertTier::Low
        } else {
            AlertTier::None
        }
    }
}

/// Default 50 / 80 / 95 policy.
pub fn tier_for(score: f64) -> AlertTier {
    TierThresholds::default().tier_for(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        assert_eq!(tier_for(50.0), AlertTier::None);
        assert_eq!(tier_for(50.01), AlertTier::Low);
        assert_eq!(tier_for(80.0), AlertTier::Low);
        assert_eq!(tier_for(80.01), AlertTier::Med);
        assert_eq!(tier_for(95.0), AlertTier::Med);
        assert_eq!(tier_for(95.01), AlertTier::High);
        assert_eq!(tier_for(0.0), AlertTier::None);
        assert_eq!(tier_for(100.0), AlertTier::High);
    }

    #[test]
    fn monotonic_over_the_range() {
        let mut previous = AlertTier::None;
        for step in 0..=10_000 {
            let tier = tier_for(step as f64 / 100.0);
            assert!(tier >= previous, "tier dropped at {}", step as f64 / 100.0);
            previous = tier;
        }
    }

    #[test]
    fn rejects_non_monotonic_thresholds() {
        let bad = TierThresholds { low: 60.0, med: 50.0, high: 95.0 };
        assert!(matches!(bad.validate(), Err(ConfigError::NonMonotonicThresholds { .. })));
        let equal = TierThresholds { low: 50.0, med: 50.0, high: 95.0 };
        assert!(equal.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        let bad = TierThresholds { high: 120.0, ..TierThresholds::default() };
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::ThresholdOutOfRange { name: "high", .. })
        ));
    }

    #[test]
    fn levels() {
        assert_eq!(AlertTier::High.level(), 3);
        assert!(!AlertTier::None.is_alerting());
        assert!(AlertTier::Low.is_alerting());
    }
}
