use serde::{Deserialize, Serialize};

use super::signals::clamp_unit;

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance (haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.lon - self.lon).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lon)
    }
}

/// Categorical weather, for callers that cannot supply a numeric risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    Cloudy,
    Rain,
    Fog,
    Snow,
}

impl WeatherCondition {
    pub fn risk(&self) -> f64 {
        match self {
            Self::Clear => 0.0,
            Self::Cloudy => 0.1,
            Self::Rain => 1.0,
            Self::Fog => 0.8,
            Self::Snow => 1.0,
        }
    }
}

/// Ambient context for one tick. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub location: GeoPoint,
    /// 0.0 - 1.0
    pub weather_risk: f64,
    pub weather: Option<WeatherCondition>,
}

impl Context {
    pub fn new(location: GeoPoint, weather_risk: f64) -> Self {
        Self {
            location,
            weather_risk: clamp_unit(weather_risk),
            weather: None,
        }
    }

    pub fn with_condition(location: GeoPoint, weather: WeatherCondition) -> Self {
        Self {
            location,
            weather_risk: weather.risk(),
            weather: Some(weather),
        }
    }

    /// Re-applies the range invariant to a context built field by field.
    pub fn clamped(mut self) -> Self {
        self.weather_risk = clamp_unit(self.weather_risk);
        self
    }

    /// Used by the rule-additive scorer. A category wins over the numeric risk.
    pub fn is_raining(&self) -> bool {
        match self.weather {
            Some(condition) => condition == WeatherCondition::Rain,
            None => self.weather_risk >= 0.5,
        }
    }
}

/// Supplies the context for each tick.
pub trait ContextProvider: Send + Sync {
    fn current(&self) -> Context;
}

/// A fixed context is its own provider.
impl ContextProvider for Context {
    fn current(&self) -> Context {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_risk_is_clamped() {
        let ctx = Context::new(GeoPoint::new(12.97, 77.59), 4.0);
        assert_eq!(ctx.weather_risk, 1.0);
        let ctx = Context::new(GeoPoint::default(), -1.0);
        assert_eq!(ctx.weather_risk, 0.0);
    }

    #[test]
    fn rain_detection_prefers_category() {
        let loc = GeoPoint::default();
        assert!(Context::with_condition(loc, WeatherCondition::Rain).is_raining());
        // Fog carries high numeric risk but is not rain.
        assert!(!Context::with_condition(loc, WeatherCondition::Fog).is_raining());
        assert!(Context::new(loc, 0.5).is_raining());
        assert!(!Context::new(loc, 0.49).is_raining());
    }

    #[test]
    fn haversine_distance() {
        let bangalore = GeoPoint::new(12.9716, 77.5946);
        let chennai = GeoPoint::new(13.0827, 80.2707);
        let d = bangalore.distance_km(&chennai);
        assert!((d - 290.0).abs() < 5.0, "got {d}");
        assert_eq!(bangalore.distance_km(&bangalore), 0.0);
    }
}
