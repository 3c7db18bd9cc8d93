//! Strategy generation: deterministic rule-based advice, an optional generated
//! narrative, and the composer that assembles the final block sequence.

pub mod advisor;
pub mod composer;
pub mod narrative;

pub use advisor::{advise, rel_diff};
pub use composer::compose;
pub use narrative::{Narrative, NarrativeAdvisor, Unavailable};

use crate::features::round2;
use crate::types::{Forecast, PlayerStats};

/// Actual value next to its forecast, both rounded to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricPair {
    pub actual: f64,
    pub predicted: f64,
}

impl MetricPair {
    pub fn new(actual: f64, predicted: f64) -> Self {
        Self { actual: round2(actual), predicted: round2(predicted) }
    }

    pub fn rel_diff(&self) -> f64 {
        rel_diff(self.predicted, self.actual)
    }
}

/// The four headline metrics compared between the stats record and the forecast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub runs: MetricPair,
    pub strike_rate: MetricPair,
    pub wickets: MetricPair,
    pub economy: MetricPair,
}

impl Comparison {
    pub fn new(stats: &PlayerStats, forecast: &Forecast) -> Self {
        Self {
            runs: MetricPair::new(f64::from(stats.raw.runs), forecast.runs),
            strike_rate: MetricPair::new(stats.derived.strike_rate, forecast.strike_rate),
            wickets: MetricPair::new(f64::from(stats.raw.wickets), forecast.wickets),
            economy: MetricPair::new(stats.derived.economy, forecast.economy),
        }
    }
}

/// Render a stat with at most 2 decimals and no trailing zeros: 500 → "500", 104.10 → "104.1".
pub fn fmt_stat(v: f64) -> String {
    let s = format!("{:.2}", round2(v));
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_stat_drops_trailing_zeros() {
        assert_eq!(fmt_stat(500.0), "500");
        assert_eq!(fmt_stat(104.1666), "104.17");
        assert_eq!(fmt_stat(90.10), "90.1");
        assert_eq!(fmt_stat(0.0), "0");
        assert_eq!(fmt_stat(-0.001), "0");
    }

    #[test]
    fn metric_pair_rounds_before_comparing() {
        let pair = MetricPair::new(104.166, 104.174);
        assert_eq!(pair.actual, 104.17);
        assert_eq!(pair.predicted, 104.17);
        assert_eq!(pair.rel_diff(), 0.0);
    }
}
