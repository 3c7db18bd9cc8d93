use crate::types::{DerivedStats, RawStats};

/// Round to 2 decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Derive rate statistics from raw counters. Every division is guarded: a zero
/// denominator yields 0, never NaN or infinity.
pub fn derive(raw: &RawStats) -> DerivedStats {
    let overs = if raw.overs.is_finite() && raw.overs > 0.0 { raw.overs } else { 0.0 };

    let strike_rate = if raw.balls_faced > 0 {
        f64::from(raw.runs) / f64::from(raw.balls_faced) * 100.0
    } else {
        0.0
    };

    let balls_from_overs = if overs > 0.0 { (overs * 6.0).round() as u32 } else { 0 };

    let economy = if overs > 0.0 { f64::from(raw.runs_conceded) / overs } else { 0.0 };

    let bowling_strike_rate = if raw.wickets > 0 {
        f64::from(balls_from_overs) / f64::from(raw.wickets)
    } else {
        0.0
    };

    DerivedStats {
        strike_rate: round2(strike_rate),
        balls_from_overs,
        economy: round2(economy),
        bowling_strike_rate: round2(bowling_strike_rate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strike_rate_rounds_to_two_places() {
        let raw = RawStats { runs: 500, balls_faced: 480, ..Default::default() };
        let d = derive(&raw);
        assert_eq!(d.strike_rate, 104.17);
    }

    #[test]
    fn no_balls_faced_means_zero_strike_rate() {
        let raw = RawStats { runs: 37, balls_faced: 0, ..Default::default() };
        assert_eq!(derive(&raw).strike_rate, 0.0);
    }

    #[test]
    fn no_overs_means_zero_bowling_metrics() {
        let raw = RawStats { overs: 0.0, runs_conceded: 40, wickets: 3, ..Default::default() };
        let d = derive(&raw);
        assert_eq!(d.economy, 0.0);
        assert_eq!(d.balls_from_overs, 0);
        assert_eq!(d.bowling_strike_rate, 0.0);
    }

    #[test]
    fn bowling_metrics_from_decimal_overs() {
        let raw = RawStats { overs: 40.0, runs_conceded: 210, wickets: 8, ..Default::default() };
        let d = derive(&raw);
        assert_eq!(d.balls_from_overs, 240);
        assert_eq!(d.economy, 5.25);
        assert_eq!(d.bowling_strike_rate, 30.0);
    }

    #[test]
    fn overs_are_a_plain_decimal_not_ball_notation() {
        // 10.5 overs is read as 63 balls, not 10 overs + 5 balls (65).
        let raw = RawStats { overs: 10.5, ..Default::default() };
        assert_eq!(derive(&raw).balls_from_overs, 63);
    }

    #[test]
    fn wickets_without_overs_gives_zero_bowling_strike_rate() {
        let raw = RawStats { wickets: 4, ..Default::default() };
        assert_eq!(derive(&raw).bowling_strike_rate, 0.0);
    }

    #[test]
    fn non_finite_overs_treated_as_zero() {
        let raw = RawStats { overs: f64::NAN, runs_conceded: 30, ..Default::default() };
        let d = derive(&raw);
        assert_eq!(d.economy, 0.0);
        assert_eq!(d.balls_from_overs, 0);
    }
}
