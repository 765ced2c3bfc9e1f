use rakshak::kernel::risk::{score, RiskScorer, ScoringModel};
use rakshak::kernel::{
    analyze, classify, tier_for, AlertTier, Context, DriverState, GeoPoint, IssueCode, IssueSet,
    Observation, TelemetrySample, WeatherCondition,
};

fn location() -> GeoPoint {
    GeoPoint::new(12.97, 77.59)
}

#[test]
fn test_drowsy_driver_on_low_tires_reaches_high_tier() {
    let sample = TelemetrySample {
        tire_pressure: 25.0,
        brake_flag: false,
        ..TelemetrySample::default()
    };
    let obs = Observation::new(0.8, false, false, true);
    let ctx = Context::new(location(), 0.5);

    let issues = analyze(&sample);
    assert_eq!(issues, IssueSet::from([IssueCode::LowTirePressure]));

    let state = classify(&obs, &issues);
    assert_eq!(state, DriverState::Drowsy);

    // 60*0.8 + 40 + 20 + 20*0.5 = 118 -> clamped
    let s = score(&obs, state, &ctx);
    assert_eq!(s, 100.0);
    assert_eq!(tier_for(s), AlertTier::High);
}

#[test]
fn test_precedence_with_every_candidate_active() {
    let obs = Observation::new(0.9, true, false, false);
    let issues = IssueSet::from([IssueCode::BrakeWarning]);
    assert_eq!(classify(&obs, &issues), DriverState::MechanicalRisk);
}

#[test]
fn test_attentive_driver_is_nominal() {
    let obs = Observation::new(0.3, false, false, false);
    assert_eq!(classify(&obs, &IssueSet::new()), DriverState::Alert);
}

#[test]
fn test_distracted_driver_in_rain_is_med_tier() {
    let obs = Observation::new(0.1, true, false, false);
    let ctx = Context::with_condition(location(), WeatherCondition::Rain);
    let state = classify(&obs, &IssueSet::new());

    // 6 + 20 + 40 + 0 + 20 = 86
    let s = score(&obs, state, &ctx);
    assert!((s - 86.0).abs() < 1e-9, "got {s}");
    assert_eq!(tier_for(s), AlertTier::Med);
}

#[test]
fn test_models_agree_on_the_legacy_demo() {
    // Nominal driver, nearby vehicle, rain: the rule model gives 60, the weighted one 58.
    let obs = Observation::new(0.3, false, false, true);
    let ctx = Context::with_condition(location(), WeatherCondition::Rain);
    let rules = RiskScorer { model: ScoringModel::RuleAdditive, ..RiskScorer::default() };

    let legacy = rules.score(&obs, DriverState::Alert, &ctx);
    let weighted = RiskScorer::default().score(&obs, DriverState::Alert, &ctx);
    assert_eq!(legacy, 60.0);
    assert!((weighted - 58.0).abs() < 1e-9);
    assert_eq!(tier_for(legacy), tier_for(weighted));
}
