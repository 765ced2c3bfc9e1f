use std::time::Duration;

use async_trait::async_trait;
use rakshak::error::{ConfigError, PersistenceError, ProviderError, SinkError, TickError};
use rakshak::kernel::{
    AlertTier, Context, DriverState, FrameRef, GeoPoint, IssueCode, Observation, RiskWeights,
    TelemetrySample,
};
use rakshak::memory::MemoryStore;
use rakshak::monitor::{ExitReason, MonitorState};
use rakshak::services::{
    AlertSink, MockVision, RecordingAlertSink, RecordingBroadcaster, ScriptedTelemetry,
    SimulatedObd, VisionProvider,
};
use rakshak::{GuardianConfig, GuardianMonitor};
use tempfile::TempDir;

struct FailingSink;

#[async_trait]
impl AlertSink for FailingSink {
    async fn push(
        &self,
        _tier: AlertTier,
        _message: &str,
        _location: GeoPoint,
    ) -> Result<(), SinkError> {
        Err(SinkError::rejected("hmi", "display offline"))
    }
}

struct SlowVision;

#[async_trait]
impl VisionProvider for SlowVision {
    async fn analyze(&self, _frame: FrameRef) -> Result<Observation, ProviderError> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(Observation::default())
    }
}

fn test_config(dir: &TempDir) -> GuardianConfig {
    GuardianConfig {
        memory_path: dir.path().join("memory.json"),
        tick_interval_ms: 5,
        ..GuardianConfig::default()
    }
}

fn junction() -> GeoPoint {
    GeoPoint::new(12.97, 77.59)
}

fn low_tires() -> TelemetrySample {
    TelemetrySample {
        tire_pressure: 25.0,
        brake_flag: false,
        ..TelemetrySample::default()
    }
}

fn drowsy_near_vehicle() -> Observation {
    Observation::new(0.8, false, false, true)
}

#[tokio::test]
async fn test_high_risk_tick_dispatches_once() {
    let dir = tempfile::tempdir().unwrap();
    let sink = RecordingAlertSink::new();
    let radio = RecordingBroadcaster::new();

    let monitor = GuardianMonitor::builder(test_config(&dir))
        .telemetry(SimulatedObd::with_sample(low_tires()))
        .vision(MockVision::new(drowsy_near_vehicle()))
        .context(Context::new(junction(), 0.5))
        .alert_sink(sink.clone())
        .broadcaster(radio.clone())
        .build()
        .unwrap();

    let outcome = monitor.step().await.expect("tick should complete");

    assert!(outcome.issues.contains(&IssueCode::LowTirePressure));
    assert_eq!(outcome.state, DriverState::Drowsy);
    assert_eq!(outcome.score, 100.0);
    assert_eq!(outcome.tier, AlertTier::High);
    assert!(outcome.broadcast);
    assert!(outcome.persistence_error.is_none());

    let pushed = sink.pushed();
    assert_eq!(pushed.len(), 1, "exactly one alert per tick");
    assert_eq!(pushed[0].tier, AlertTier::High);
    assert_eq!(pushed[0].message, "Risk 100.0% detected (DROWSY)");
    assert_eq!(pushed[0].location, junction());
    assert_eq!(radio.sent().len(), 1);

    let memory = monitor.memory();
    let store = memory.lock().await;
    assert_eq!(store.hotspots().len(), 1, "exactly one hotspot per tick");
    assert_eq!(store.hotspots()[0].score, 100.0);

    // The hotspot is on disk as well.
    assert_eq!(MemoryStore::load(store.path()).hotspots().len(), 1);
}

#[tokio::test]
async fn test_nominal_tick_has_no_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let sink = RecordingAlertSink::new();

    let monitor = GuardianMonitor::builder(test_config(&dir))
        .context(Context::new(junction(), 0.0))
        .alert_sink(sink.clone())
        .build()
        .unwrap();

    let outcome = monitor.step().await.unwrap();
    assert_eq!(outcome.state, DriverState::Alert);
    assert_eq!(outcome.tier, AlertTier::None);
    assert!(outcome.alert.is_none());
    assert!(sink.pushed().is_empty());
    assert!(monitor.memory().lock().await.hotspots().is_empty());
}

#[tokio::test]
async fn test_v2v_only_at_configured_tier() {
    let dir = tempfile::tempdir().unwrap();
    let sink = RecordingAlertSink::new();
    let radio = RecordingBroadcaster::new();

    // 6 + 20 + 40 = 66: LOW
    let monitor = GuardianMonitor::builder(test_config(&dir))
        .vision(MockVision::new(Observation::new(0.1, true, false, false)))
        .context(Context::new(junction(), 0.0))
        .alert_sink(sink.clone())
        .broadcaster(radio.clone())
        .build()
        .unwrap();

    let outcome = monitor.step().await.unwrap();
    assert_eq!(outcome.state, DriverState::Distracted);
    assert_eq!(outcome.tier, AlertTier::Low);
    assert_eq!(sink.pushed().len(), 1);
    assert!(!outcome.broadcast);
    assert!(radio.sent().is_empty());
}

#[tokio::test]
async fn test_bounded_run_appends_trip_summary() {
    let dir = tempfile::tempdir().unwrap();
    let sink = RecordingAlertSink::new();

    let monitor = GuardianMonitor::builder(test_config(&dir))
        .telemetry(SimulatedObd::with_sample(low_tires()))
        .vision(MockVision::new(drowsy_near_vehicle()))
        .context(Context::new(junction(), 0.5))
        .alert_sink(sink.clone())
        .build()
        .unwrap();

    assert!(monitor.start(Duration::from_millis(5), Some(3)).unwrap());
    let report = monitor.join().await.expect("run should report");

    assert_eq!(report.ticks, 3);
    assert_eq!(report.exit, ExitReason::MaxTicks);
    assert!(report.trip_persisted);
    assert_eq!(report.trip.alerts, 3);
    assert_eq!(report.trip.high_risk, 3);
    assert_eq!(monitor.state(), MonitorState::Stopped);
    assert_eq!(sink.pushed().len(), 3);

    let reloaded = MemoryStore::load(dir.path().join("memory.json"));
    assert_eq!(reloaded.hotspots().len(), 3);
    let trips = reloaded.trip_summaries();
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].ticks, 3);
    assert_eq!(trips[0].max_score, 100.0);
}

#[tokio::test]
async fn test_start_and_stop_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let monitor = GuardianMonitor::builder(test_config(&dir)).build().unwrap();

    assert_eq!(monitor.state(), MonitorState::Stopped);
    assert!(!monitor.stop(), "stop on a stopped monitor is a no-op");
    assert!(monitor.join().await.is_none());

    assert!(monitor.start(Duration::from_millis(5), None).unwrap());
    assert!(!monitor.start(Duration::from_millis(5), None).unwrap(), "second start is a no-op");
    assert_eq!(monitor.state(), MonitorState::Running);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(monitor.stop());
    let report = monitor.join().await.unwrap();
    assert_eq!(report.exit, ExitReason::Stopped);
    assert_eq!(monitor.state(), MonitorState::Stopped);
    assert!(!monitor.stop());
}

#[tokio::test]
async fn test_no_tick_after_stop() {
    let dir = tempfile::tempdir().unwrap();
    let monitor = GuardianMonitor::builder(test_config(&dir)).build().unwrap();

    monitor.start(Duration::from_millis(2), None).unwrap();
    tokio::time::sleep(Duration::from_millis(25)).await;
    monitor.stop();
    let report = monitor.join().await.unwrap();

    let last = monitor.last_tick().await;
    assert_eq!(last.ordinal, report.ticks);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(monitor.last_tick().await, last, "loop must not tick after stopping");
}

#[tokio::test]
async fn test_provider_failure_does_not_end_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let telemetry = ScriptedTelemetry::with_failures(vec![
        Err("CAN bus timeout".to_string()),
        Ok(TelemetrySample::default()),
    ]);

    let monitor = GuardianMonitor::builder(test_config(&dir))
        .telemetry(telemetry)
        .build()
        .unwrap();

    monitor.start(Duration::from_millis(2), Some(4)).unwrap();
    let report = monitor.join().await.unwrap();

    assert_eq!(report.ticks, 4);
    assert_eq!(report.exit, ExitReason::MaxTicks);
    assert_eq!(report.trip.failed_ticks, 2);
    assert_eq!(monitor.telemetry_snapshot().tick_stats.completed, 2);
}

#[tokio::test]
async fn test_sink_failure_still_records_hotspot() {
    let dir = tempfile::tempdir().unwrap();
    let monitor = GuardianMonitor::builder(test_config(&dir))
        .vision(MockVision::new(drowsy_near_vehicle()))
        .context(Context::new(junction(), 0.5))
        .alert_sink(FailingSink)
        .build()
        .unwrap();

    let outcome = monitor.step().await.unwrap();
    assert!(matches!(outcome.sink_error, Some(SinkError::Rejected { .. })));
    assert!(outcome.alert.is_some());
    assert_eq!(monitor.memory().lock().await.hotspots().len(), 1);
    assert_eq!(monitor.telemetry_snapshot().failure_stats.alert_sink, 1);
}

#[tokio::test]
async fn test_slow_provider_is_a_tick_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = GuardianConfig {
        io_timeout_ms: 20,
        ..test_config(&dir)
    };
    let monitor = GuardianMonitor::builder(config).vision(SlowVision).build().unwrap();

    let err = monitor.step().await.unwrap_err();
    assert!(matches!(
        err,
        TickError::Provider(ProviderError::Timeout { provider: "vision", .. })
    ));
    assert_eq!(monitor.telemetry_snapshot().tick_stats.failed, 1);
}

#[tokio::test]
async fn test_persistence_failure_is_surfaced() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let config = GuardianConfig {
        memory_path: blocker.join("memory.json"),
        ..test_config(&dir)
    };

    let monitor = GuardianMonitor::builder(config)
        .vision(MockVision::new(drowsy_near_vehicle()))
        .context(Context::new(junction(), 0.5))
        .alert_sink(RecordingAlertSink::new())
        .build()
        .unwrap();

    let outcome = monitor.step().await.unwrap();
    assert!(outcome.persistence_error.is_some());
    assert!(outcome.alert.is_some(), "alert is dispatched even when the ledger is not writable");

    let memory = monitor.memory();
    let store = memory.lock().await;
    assert_eq!(store.hotspots().len(), 1);
    assert!(store.is_dirty());
}

#[tokio::test]
async fn test_invalid_configuration_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let config = GuardianConfig {
        weights: RiskWeights { drowsy: -1.0, ..RiskWeights::default() },
        ..test_config(&dir)
    };
    let result = GuardianMonitor::builder(config).build();
    assert!(matches!(result, Err(ConfigError::NegativeWeight { name: "drowsy", .. })));

    let monitor = GuardianMonitor::builder(test_config(&dir)).build().unwrap();
    let err = monitor.start(Duration::ZERO, None).unwrap_err();
    assert!(matches!(err, ConfigError::ZeroDuration { .. }));
    assert_eq!(monitor.state(), MonitorState::Stopped);
}

#[tokio::test]
async fn test_start_while_running_ignores_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let monitor = GuardianMonitor::builder(test_config(&dir)).build().unwrap();

    assert!(monitor.start(Duration::from_millis(5), None).unwrap());
    let again = monitor.start(Duration::ZERO, None);
    assert!(matches!(again, Ok(false)), "running monitor ignores start, got {again:?}");
    assert_eq!(monitor.state(), MonitorState::Running);

    monitor.stop();
    monitor.join().await.unwrap();
}

#[tokio::test]
async fn test_bad_gps_fix_does_not_poison_the_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.json");
    let mut store = MemoryStore::load(&path);
    store.add_hotspot(junction(), 97.0).unwrap();

    let monitor = GuardianMonitor::builder(test_config(&dir))
        .vision(MockVision::new(drowsy_near_vehicle()))
        .context(Context::new(GeoPoint::new(f64::NAN, 77.59), 0.5))
        .alert_sink(RecordingAlertSink::new())
        .memory(store)
        .build()
        .unwrap();

    let outcome = monitor.step().await.unwrap();
    assert!(outcome.alert.is_some());
    assert!(matches!(
        outcome.persistence_error,
        Some(PersistenceError::NonFinite { field: "lat" })
    ));

    let reloaded = MemoryStore::load(&path);
    assert!(!reloaded.recovered());
    assert_eq!(reloaded.hotspots().len(), 1);
}
