use serde::{Deserialize, Serialize};

/// Identifies the camera frame a vision provider should analyze.
/// The monitor hands out one frame reference per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRef {
    pub tick: u64,
}

/// Structured result of per-frame vision analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// 0.0 - 1.0. Values outside the range are clamped at ingest.
    pub drowsy_score: f64,
    pub phone_detected: bool,
    pub lane_departure: bool,
    pub nearby_vehicle: bool,
}

impl Observation {
    pub fn new(
        drowsy_score: f64,
        phone_detected: bool,
        lane_departure: bool,
        nearby_vehicle: bool,
    ) -> Self {
        Self {
            drowsy_score,
            phone_detected,
            lane_departure,
            nearby_vehicle,
        }
        .clamped()
    }

    /// Enforces `drowsy_score ∈ [0, 1]`. NaN collapses to 0.
    pub fn clamped(mut self) -> Self {
        self.drowsy_score = clamp_unit(self.drowsy_score);
        self
    }
}

impl Default for Observation {
    fn default() -> Self {
        Self::new(0.0, false, false, false)
    }
}

/// Point-in-time vehicle sensor reading. Physical plausibility is not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub speed: f64,
    pub rpm: f64,
    pub tire_pressure: f64,
    pub brake_flag: bool,
}

impl Default for TelemetrySample {
    fn default() -> Self {
        Self {
            speed: 60.0,
            rpm: 1500.0,
            tire_pressure: 30.0,
            brake_flag: false,
        }
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drowsy_score_is_clamped_at_ingest() {
        assert_eq!(Observation::new(1.7, false, false, false).drowsy_score, 1.0);
        assert_eq!(Observation::new(-0.2, false, false, false).drowsy_score, 0.0);
        assert_eq!(Observation::new(f64::NAN, false, false, false).drowsy_score, 0.0);
        assert_eq!(Observation::new(0.42, false, false, false).drowsy_score, 0.42);
    }

    #[test]
    fn deserialized_observation_can_be_clamped() {
        let raw: Observation = serde_json::from_str(
            r#"{"drowsy_score": 3.0, "phone_detected": true,
                "lane_departure": false, "nearby_vehicle": false}"#,
        )
        .unwrap();
        assert_eq!(raw.clamped().drowsy_score, 1.0);
    }
}
