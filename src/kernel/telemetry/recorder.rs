use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::event::TelemetryEvent;
use super::metrics::{compute_snapshot, TelemetrySnapshot};
use crate::kernel::tier::AlertTier;
use crate::memory::TripSummary;

const MAX_EVENTS: usize = 10_000;

/// Bounded ring of telemetry events for one run. Oldest events are dropped first.
///
/// Trip totals are folded in as events arrive, so the summary covers the whole
/// run even after the ring has wrapped.
#[derive(Debug)]
pub struct TelemetryRecorder {
    buffer: VecDeque<TelemetryEvent>,
    started_at: DateTime<Utc>,
    totals: TripTotals,
}

#[derive(Debug, Clone, Default)]
struct TripTotals {
    completed: u64,
    failed: u64,
    alerts: u64,
    high_risk: u64,
    max_score: f64,
    score_sum: f64,
    persistence_failures: u64,
}

impl TripTotals {
    fn fold(&mut self, event: &TelemetryEvent) {
        match event {
            TelemetryEvent::TickCompleted { tier, score, .. } => {
                self.completed += 1;
                self.score_sum += score;
                self.max_score = self.max_score.max(*score);
                if tier.is_alerting() {
                    self.alerts += 1;
                }
                if *tier == AlertTier::High {
                    self.high_risk += 1;
                }
            }
            TelemetryEvent::TickFailed { .. } => self.failed += 1,
            TelemetryEvent::PersistenceFailed { .. } => self.persistence_failures += 1,
            TelemetryEvent::DispatchFailed { .. } => {}
        }
    }

    fn mean_score(&self) -> f64 {
        if self.completed == 0 {
            0.0
        } else {
            self.score_sum / self.completed as f64
        }
    }
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(256),
            started_at: Utc::now(),
            totals: TripTotals::default(),
        }
    }

    pub fn record(&mut self, event: TelemetryEvent) {
        self.totals.fold(&event);
        if self.buffer.len() >= MAX_EVENTS {
            self.buffer.pop_front();
        }
        self.buffer.push_back(event);
    }

    /// Statistics over the retained window only.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        compute_snapshot(&self.buffer)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Starts a new session window.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.totals = TripTotals::default();
        self.started_at = Utc::now();
    }

    /// Folds the whole session into a trip summary (called when a run ends).
    pub fn aggregate_trip(&self) -> TripSummary {
        let totals = &self.totals;
        TripSummary {
            trip_id: Uuid::new_v4(),
            started_at: self.started_at,
            ended_at: Utc::now(),
            ticks: totals.completed + totals.failed,
            failed_ticks: totals.failed,
            alerts: totals.alerts,
            high_risk: totals.high_risk,
            max_score: totals.max_score,
            mean_score: totals.mean_score(),
            persistence_failures: totals.persistence_failures,
        }
    }
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}
