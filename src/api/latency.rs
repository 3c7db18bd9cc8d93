//! Forecast round-trip latency histogram, served at /stats/latency.

use std::sync::Mutex;
use std::time::Duration;

use hdrhistogram::Histogram;
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct LatencyReport {
    pub samples: u64,
    pub p50_ms: Option<u64>,
    pub p95_ms: Option<u64>,
    pub p99_ms: Option<u64>,
}

/// Recorded in milliseconds, 1ms to 10min, 3 significant figures.
pub struct ForecastLatency {
    inner: Mutex<Histogram<u64>>,
}

impl ForecastLatency {
    pub fn new() -> Self {
        let histogram = Histogram::new_with_bounds(1, 600_000, 3).expect("valid histogram bounds");
        Self { inner: Mutex::new(histogram) }
    }

    pub fn record(&self, d: Duration) {
        // Sub-millisecond calls land in the 1ms bucket.
        let ms = (d.as_millis().min(600_000) as u64).max(1);
        if let Ok(mut h) = self.inner.lock() {
            let _ = h.record(ms);
        }
    }

    pub fn report(&self) -> LatencyReport {
        let Ok(h) = self.inner.lock() else {
            return LatencyReport { samples: 0, p50_ms: None, p95_ms: None, p99_ms: None };
        };
        let samples = h.len();
        let at = |q: f64| (samples > 0).then(|| h.value_at_quantile(q));
        LatencyReport {
            samples,
            p50_ms: at(0.5),
            p95_ms: at(0.95),
            p99_ms: at(0.99),
        }
    }
}

impl Default for ForecastLatency {
    fn default() -> Self {
        Self::new()
    }
}
