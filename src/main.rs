use anyhow::Context as _;
use rakshak::kernel::{Context, GeoPoint, Observation, TelemetrySample};
use rakshak::services::{ScriptedTelemetry, ScriptedVision, TracingAlertSink, TracingBroadcaster};
use rakshak::{GuardianConfig, GuardianMonitor};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    tracing::info!("Rakshak guardian booting...");

    let config = GuardianConfig::resolve().context("invalid guardian configuration")?;
    let tick_interval = config.tick_interval();

    // No camera or OBD port attached: replay a short drive.
    let vision = ScriptedVision::new(vec![
        Observation::new(0.3, false, false, true),
        Observation::new(0.3, false, false, true),
        Observation::new(0.7, false, false, false),
        Observation::new(0.8, false, false, true),
        Observation::new(0.2, true, false, true),
    ]);
    let telemetry = ScriptedTelemetry::new(vec![
        TelemetrySample::default(),
        TelemetrySample::default(),
        TelemetrySample { tire_pressure: 25.0, ..TelemetrySample::default() },
        TelemetrySample { tire_pressure: 25.0, ..TelemetrySample::default() },
        TelemetrySample { brake_flag: true, ..TelemetrySample::default() },
    ]);

    let monitor = GuardianMonitor::builder(config)
        .vision(vision)
        .telemetry(telemetry)
        .context(Context::new(GeoPoint::new(12.97, 77.59), 0.5))
        .alert_sink(TracingAlertSink)
        .broadcaster(TracingBroadcaster)
        .build()
        .context("failed to build guardian monitor")?;

    {
        let memory = monitor.memory();
        let store = memory.lock().await;
        if store.recovered() {
            tracing::info!(status = ?store.load_status(), "memory ledger initialized fresh");
        }
    }

    monitor.start(tick_interval, None)?;
    tracing::info!("Guardian active. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    monitor.stop();

    if let Some(report) = monitor.join().await {
        tracing::info!(
            ticks = report.ticks,
            alerts = report.trip.alerts,
            high_risk = report.trip.high_risk,
            max_score = report.trip.max_score,
            persisted = report.trip_persisted,
            "trip summary"
        );
    }

    Ok(())
}
