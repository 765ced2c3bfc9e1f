use std::collections::VecDeque;

use super::event::{DispatchChannel, TelemetryEvent};
use crate::kernel::classifier::DriverState;
use crate::kernel::tier::AlertTier;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub tick_stats: TickStats,
    pub alert_stats: AlertStats,
    pub state_stats: StateStats,
    pub failure_stats: FailureStats,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickStats {
    pub completed: u64,
    pub failed: u64,
    pub max_score: f64,
    pub avg_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertStats {
    pub alerts: u64,
    pub low: u64,
    pub med: u64,
    pub high_risk: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateStats {
    pub nominal: u64,
    pub drowsy: u64,
    pub distracted: u64,
    pub mechanical_risk: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FailureStats {
    pub alert_sink: u64,
    pub v2v: u64,
    pub persistence: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();
    let mut score_total = 0.0;

    for event in events {
        match event {
            TelemetryEvent::TickCompleted { state, tier, score, .. } => {
                snap.tick_stats.completed += 1;
                score_total += score;
                if *score > snap.tick_stats.max_score {
                    snap.tick_stats.max_score = *score;
                }

                match state {
                    DriverState::Alert => snap.state_stats.nominal += 1,
                    DriverState::Drowsy => snap.state_stats.drowsy += 1,
                    DriverState::Distracted => snap.state_stats.distracted += 1,
                    DriverState::MechanicalRisk => snap.state_stats.mechanical_risk += 1,
                }

                match tier {
                    AlertTier::None => {}
                    AlertTier::Low => snap.alert_stats.low += 1,
                    AlertTier::Med => snap.alert_stats.med += 1,
                    AlertTier::High => snap.alert_stats.high_risk += 1,
                }
                if tier.is_alerting() {
                    snap.alert_stats.alerts += 1;
                }
            }
            TelemetryEvent::TickFailed { .. } => snap.tick_stats.failed += 1,
            TelemetryEvent::DispatchFailed { channel, .. } => match channel {
                DispatchChannel::AlertSink => snap.failure_stats.alert_sink += 1,
                DispatchChannel::V2V => snap.failure_stats.v2v += 1,
            },
            TelemetryEvent::PersistenceFailed { .. } => snap.failure_stats.persistence += 1,
        }
    }

    if snap.tick_stats.completed > 0 {
        snap.tick_stats.avg_score = score_total / snap.tick_stats.completed as f64;
    }

    snap
}
