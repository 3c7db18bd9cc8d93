//! Shared health counters for the /health endpoint.
//! Updated by the prediction orchestrator.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Default)]
pub struct HealthState {
    predictions_served: AtomicU64,
    /// Forecast calls that failed or timed out.
    forecast_failures: AtomicU64,
    /// Strategies that fell back to rule-based advice.
    narrative_fallbacks: AtomicU64,
    /// Unix ns of the last persisted prediction (0 = none).
    last_prediction_at_ns: AtomicU64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub predictions_served: u64,
    pub forecast_failures: u64,
    pub narrative_fallbacks: u64,
    pub last_prediction_at_ns: Option<u64>,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_prediction(&self, at_ns: i64) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        self.last_prediction_at_ns.store(at_ns.max(0) as u64, Ordering::Relaxed);
    }

    pub fn inc_forecast_failures(&self) {
        self.forecast_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_narrative_fallbacks(&self) {
        self.narrative_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let last = self.last_prediction_at_ns.load(Ordering::Relaxed);
        HealthSnapshot {
            status: "ok",
            predictions_served: self.predictions_served.load(Ordering::Relaxed),
            forecast_failures: self.forecast_failures.load(Ordering::Relaxed),
            narrative_fallbacks: self.narrative_fallbacks.load(Ordering::Relaxed),
            last_prediction_at_ns: (last > 0).then_some(last),
        }
    }
}
