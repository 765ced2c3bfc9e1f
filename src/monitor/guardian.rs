use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use super::types::{alert_message, Alert, ExitReason, MonitorState, RunReport, TickOutcome};
use crate::config::GuardianConfig;
use crate::error::{ConfigError, PersistenceError, ProviderError, SinkError, TickError};
use crate::kernel::telemetry::event::{DispatchChannel, TelemetryEvent};
use crate::kernel::telemetry::metrics::TelemetrySnapshot;
use crate::kernel::telemetry::recorder::TelemetryRecorder;
use crate::kernel::{
    analyze_with, classify, Context, ContextProvider, FrameRef, GeoPoint, RiskScorer, Tick,
};
use crate::memory::MemoryStore;
use crate::services::{
    AlertSink, MockVision, SimulatedObd, TelemetryReader, TracingAlertSink, TracingBroadcaster,
    V2VBroadcaster, VisionProvider,
};

/// The supervised guardian loop.
///
/// Lifecycle is `STOPPED -> RUNNING -> STOPPED`. `start` spawns a dedicated task
/// that owns the loop; `stop` signals it through a cancellation token that is
/// checked at every tick boundary. A tick in progress always completes.
pub struct GuardianMonitor {
    core: Arc<TickCore>,
    lifecycle: Arc<StdMutex<Lifecycle>>,
    span: Span,
}

struct Lifecycle {
    state: MonitorState,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<RunReport>>,
}

/// Per-tick pipeline shared between the monitor handle and the loop task.
struct TickCore {
    config: GuardianConfig,
    scorer: RiskScorer,
    telemetry: Arc<dyn TelemetryReader>,
    vision: Arc<dyn VisionProvider>,
    context: Arc<dyn ContextProvider>,
    alerts: Arc<dyn AlertSink>,
    v2v: Arc<dyn V2VBroadcaster>,
    memory: Arc<Mutex<MemoryStore>>,
    /// Held for a whole tick: ticks never interleave.
    clock: Mutex<Tick>,
    recorder: StdMutex<TelemetryRecorder>,
}

pub struct GuardianBuilder {
    config: GuardianConfig,
    telemetry: Arc<dyn TelemetryReader>,
    vision: Arc<dyn VisionProvider>,
    context: Arc<dyn ContextProvider>,
    alerts: Arc<dyn AlertSink>,
    v2v: Arc<dyn V2VBroadcaster>,
    memory: Option<MemoryStore>,
    span: Option<Span>,
}

impl GuardianBuilder {
    pub fn telemetry(mut self, reader: impl TelemetryReader + 'static) -> Self {
        self.telemetry = Arc::new(reader);
        self
    }

    pub fn vision(mut self, provider: impl VisionProvider + 'static) -> Self {
        self.vision = Arc::new(provider);
        self
    }

    pub fn context(mut self, provider: impl ContextProvider + 'static) -> Self {
        self.context = Arc::new(provider);
        self
    }

    pub fn alert_sink(mut self, sink: impl AlertSink + 'static) -> Self {
        self.alerts = Arc::new(sink);
        self
    }

    pub fn broadcaster(mut self, broadcaster: impl V2VBroadcaster + 'static) -> Self {
        self.v2v = Arc::new(broadcaster);
        self
    }

    /// Uses an already loaded store instead of loading `config.memory_path`.
    pub fn memory(mut self, store: MemoryStore) -> Self {
        self.memory = Some(store);
        self
    }

    /// Every log line of this monitor is emitted inside `span`.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Fails on invalid configuration; a monitor with bad weights never exists.
    pub fn build(self) -> Result<GuardianMonitor, ConfigError> {
        self.config.validate()?;
        let scorer = RiskScorer::new(self.config.scoring_model, self.config.weights)?;

        let memory = match self.memory {
            Some(store) => store,
            None => {
                MemoryStore::load_with_policy(&self.config.memory_path, self.config.flush_policy)
            }
        };

        let span = self.span.unwrap_or_else(|| {
            let id = Uuid::new_v4().simple().to_string();
            let short = &id[..8];
            info_span!("guardian", monitor = %short)
        });

        let core = TickCore {
            config: self.config,
            scorer,
            telemetry: self.telemetry,
            vision: self.vision,
            context: self.context,
            alerts: self.alerts,
            v2v: self.v2v,
            memory: Arc::new(Mutex::new(memory)),
            clock: Mutex::new(Tick::new()),
            recorder: StdMutex::new(TelemetryRecorder::new()),
        };

        Ok(GuardianMonitor {
            core: Arc::new(core),
            lifecycle: Arc::new(StdMutex::new(Lifecycle {
                state: MonitorState::Stopped,
                cancel: None,
                task: None,
            })),
            span,
        })
    }
}

impl GuardianMonitor {
    /// Defaults: simulated OBD, mock vision, tracing sinks, a fixed clear-weather context.
    pub fn builder(config: GuardianConfig) -> GuardianBuilder {
        GuardianBuilder {
            config,
            telemetry: Arc::new(SimulatedObd::default()),
            vision: Arc::new(MockVision::default()),
            context: Arc::new(Context::new(GeoPoint::new(12.97, 77.59), 0.2)),
            alerts: Arc::new(TracingAlertSink),
            v2v: Arc::new(TracingBroadcaster),
            memory: None,
            span: None,
        }
    }

    /// Spawns the loop on the current tokio runtime.
    ///
    /// Returns `Ok(false)` without side effects when already running, whatever
    /// the arguments. The interval is only validated for a run that would start.
    pub fn start(
        &self,
        tick_interval: Duration,
        max_ticks: Option<u64>,
    ) -> Result<bool, ConfigError> {
        let mut lifecycle = self.lifecycle();
        if lifecycle.state == MonitorState::Running {
            info!(parent: &self.span, "start ignored: already running");
            return Ok(false);
        }

        if tick_interval.is_zero() {
            return Err(ConfigError::ZeroDuration { name: "tick_interval" });
        }

        self.core.recorder().reset();

        let token = CancellationToken::new();
        let core = Arc::clone(&self.core);
        let lifecycle_ref = Arc::clone(&self.lifecycle);
        let loop_token = token.clone();

        let task = tokio::spawn(
            async move {
                info!(
                    interval_ms = tick_interval.as_millis() as u64,
                    ?max_ticks,
                    "guardian loop started"
                );
                let (ticks, exit) = run_loop(&core, &loop_token, tick_interval, max_ticks).await;
                let report = core.finish_run(ticks, exit).await;

                let mut lifecycle = lock_or_recover(&lifecycle_ref);
                lifecycle.state = MonitorState::Stopped;
                lifecycle.cancel = None;
                info!(ticks, ?exit, "guardian loop stopped");
                report
            }
            .instrument(self.span.clone()),
        );

        lifecycle.state = MonitorState::Running;
        lifecycle.cancel = Some(token);
        lifecycle.task = Some(task);
        Ok(true)
    }

    /// Requests cancellation. Takes effect at the next tick boundary.
    ///
    /// Returns `false` (and does nothing) when the monitor is not running.
    pub fn stop(&self) -> bool {
        let lifecycle = self.lifecycle();
        match (&lifecycle.state, &lifecycle.cancel) {
            (MonitorState::Running, Some(token)) => {
                if !token.is_cancelled() {
                    info!(parent: &self.span, "stop requested");
                    token.cancel();
                }
                true
            }
            _ => {
                debug!(parent: &self.span, "stop ignored: not running");
                false
            }
        }
    }

    /// Waits for the current run to end. `None` if no run was started since the last join.
    pub async fn join(&self) -> Option<RunReport> {
        let task = self.lifecycle().task.take()?;
        match task.await {
            Ok(report) => Some(report),
            Err(e) => {
                error!(parent: &self.span, error = %e, "guardian loop task failed");
                let mut lifecycle = self.lifecycle();
                lifecycle.state = MonitorState::Stopped;
                lifecycle.cancel = None;
                None
            }
        }
    }

    /// Runs exactly one tick on the caller's task.
    pub async fn step(&self) -> Result<TickOutcome, TickError> {
        self.core.run_tick().instrument(self.span.clone()).await
    }

    pub fn state(&self) -> MonitorState {
        self.lifecycle().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == MonitorState::Running
    }

    pub fn config(&self) -> &GuardianConfig {
        &self.core.config
    }

    /// Shared handle to the ledger, e.g. for recording trips from outside the loop.
    pub fn memory(&self) -> Arc<Mutex<MemoryStore>> {
        Arc::clone(&self.core.memory)
    }

    pub fn telemetry_snapshot(&self) -> TelemetrySnapshot {
        self.core.recorder().snapshot()
    }

    /// Ordinal of the most recent tick (0 before the first).
    pub async fn last_tick(&self) -> Tick {
        *self.core.clock.lock().await
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        lock_or_recover(&self.lifecycle)
    }
}

impl Drop for GuardianMonitor {
    fn drop(&mut self) {
        if let Some(token) = self.lifecycle().cancel.as_ref() {
            token.cancel();
        }
    }
}

async fn run_loop(
    core: &TickCore,
    token: &CancellationToken,
    interval: Duration,
    max_ticks: Option<u64>,
) -> (u64, ExitReason) {
    let mut executed = 0u64;
    let budget_spent = |n: u64| max_ticks.is_some_and(|max| n >= max);

    loop {
        if token.is_cancelled() {
            return (executed, ExitReason::Stopped);
        }
        if budget_spent(executed) {
            return (executed, ExitReason::MaxTicks);
        }

        // Failures are logged and recorded inside the tick.
        let _ = core.run_tick().await;
        executed += 1;

        if budget_spent(executed) {
            return (executed, ExitReason::MaxTicks);
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => return (executed, ExitReason::Stopped),
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

impl TickCore {
    async fn run_tick(&self) -> Result<TickOutcome, TickError> {
        let mut clock = self.clock.lock().await;
        *clock = clock.next();
        let tick = *clock;

        let result = self.fuse_and_act(tick).await;
        if let Err(e) = &result {
            warn!(tick = tick.ordinal, error = %e, "tick aborted");
            self.recorder().record(TelemetryEvent::TickFailed { tick });
        }
        result
    }

    async fn fuse_and_act(&self, tick: Tick) -> Result<TickOutcome, TickError> {
        let limit = self.config.io_timeout();

        let sample = bounded_read("telemetry", limit, self.telemetry.read()).await?;
        let frame = FrameRef { tick: tick.ordinal };
        let obs = bounded_read("vision", limit, self.vision.analyze(frame)).await?.clamped();
        let ctx = self.context.current().clamped();

        let issues = analyze_with(&sample, &self.config.health);
        let state = classify(&obs, &issues);
        let score = self.scorer.score(&obs, state, &ctx);
        let tier = self.config.tier_thresholds.tier_for(score);

        let mut outcome = TickOutcome {
            tick,
            issues,
            state,
            score,
            tier,
            alert: None,
            broadcast: false,
            sink_error: None,
            v2v_error: None,
            persistence_error: None,
        };

        if let Some(alert) = Alert::new(tier, alert_message(score, state), ctx.location) {
            let push = self.alerts.push(tier, &alert.message, alert.location);
            if let Err(e) = bounded_dispatch("alert_sink", limit, push).await {
                warn!(tick = tick.ordinal, error = %e, "alert dispatch failed");
                self.record_dispatch_failure(tick, DispatchChannel::AlertSink);
                outcome.sink_error = Some(e);
            }

            if tier >= self.config.v2v_min_tier {
                let broadcast = self.v2v.broadcast(&alert.message, alert.location);
                match bounded_dispatch("v2v", limit, broadcast).await {
                    Ok(()) => outcome.broadcast = true,
                    Err(e) => {
                        warn!(tick = tick.ordinal, error = %e, "v2v broadcast failed");
                        self.record_dispatch_failure(tick, DispatchChannel::V2V);
                        outcome.v2v_error = Some(e);
                    }
                }
            }

            if let Err(e) = self.memory.lock().await.add_hotspot(ctx.location, score) {
                match &e {
                    PersistenceError::NonFinite { .. } => {
                        error!(tick = tick.ordinal, error = %e, "hotspot dropped")
                    }
                    _ => error!(tick = tick.ordinal, error = %e, "hotspot kept in memory only"),
                }
                self.recorder().record(TelemetryEvent::PersistenceFailed { tick });
                outcome.persistence_error = Some(e);
            }

            outcome.alert = Some(alert);
        }

        info!(
            tick = tick.ordinal,
            %state,
            score,
            %tier,
            issues = ?outcome.issues,
            "tick"
        );
        self.recorder().record(TelemetryEvent::TickCompleted { tick, state, tier, score });

        Ok(outcome)
    }

    async fn finish_run(&self, ticks: u64, exit: ExitReason) -> RunReport {
        let trip = self.recorder().aggregate_trip();
        let mut trip_persisted = false;

        if self.config.record_trips {
            match self.memory.lock().await.add_trip_summary(&trip) {
                Ok(()) => trip_persisted = true,
                Err(e) => {
                    error!(error = %e, trip = %trip.trip_id, "trip summary kept in memory only")
                }
            }
        }

        RunReport {
            ticks,
            exit,
            trip,
            trip_persisted,
        }
    }

    fn record_dispatch_failure(&self, tick: Tick, channel: DispatchChannel) {
        self.recorder().record(TelemetryEvent::DispatchFailed { tick, channel });
    }

    fn recorder(&self) -> MutexGuard<'_, TelemetryRecorder> {
        lock_or_recover(&self.recorder)
    }
}

async fn bounded_read<T>(
    provider: &'static str,
    limit: Duration,
    call: impl Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout { provider, timeout: limit }),
    }
}

async fn bounded_dispatch(
    sink: &'static str,
    limit: Duration,
    call: impl Future<Output = Result<(), SinkError>>,
) -> Result<(), SinkError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(SinkError::Timeout { sink, timeout: limit }),
    }
}

/// A panicked holder does not leave the data inconsistent here; keep going.
fn lock_or_recover<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
