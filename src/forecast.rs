use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::types::{Forecast, Format, PlayerStats};

/// Feature vector posted to the per-format forecast model.
/// Field names are the model's training column names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastFeatures {
    pub bat_matches: u32,
    pub bat_innings: u32,
    pub bat_not_out: u32,
    pub bat_runs: u32,
    pub bat_high_score: u32,
    #[serde(rename = "bat_ballsFaced")]
    pub bat_balls_faced: u32,
    pub bat_strike_rate: f64,
    #[serde(rename = "bat_100s")]
    pub bat_hundreds: u32,
    #[serde(rename = "bat_50")]
    pub bat_fifties: u32,
    #[serde(rename = "bat_0s")]
    pub bat_ducks: u32,
    #[serde(rename = "bat_4s")]
    pub bat_fours: u32,
    #[serde(rename = "bat_6s")]
    pub bat_sixes: u32,
    pub bowl_matches: u32,
    pub bowl_innings: u32,
    pub bowl_maidens: u32,
    pub bowl_economy: f64,
    pub bowl_strike_rate: f64,
    pub bowl_wickets: u32,
    pub bowl_balls_from_overs: u32,
}

impl ForecastFeatures {
    pub fn from_stats(stats: &PlayerStats) -> Self {
        let raw = &stats.raw;
        let derived = &stats.derived;
        Self {
            bat_matches: raw.matches,
            bat_innings: raw.innings,
            bat_not_out: raw.not_out,
            bat_runs: raw.runs,
            bat_high_score: raw.high_score,
            bat_balls_faced: raw.balls_faced,
            bat_strike_rate: derived.strike_rate,
            bat_hundreds: raw.hundreds,
            bat_fifties: raw.fifties,
            bat_ducks: raw.ducks,
            bat_fours: raw.fours,
            bat_sixes: raw.sixes,
            // Bowling innings are not tracked separately.
            bowl_matches: raw.matches,
            bowl_innings: raw.innings,
            bowl_maidens: raw.maidens,
            bowl_economy: derived.economy,
            bowl_strike_rate: derived.bowling_strike_rate,
            bowl_wickets: raw.wickets,
            bowl_balls_from_overs: derived.balls_from_overs,
        }
    }
}

/// Alias priority per canonical field. First key holding a numeric value wins.
const RUNS_KEYS: &[&str] = &["runs", "run", "predicted_runs"];
const STRIKE_RATE_KEYS: &[&str] = &["strike_rate", "strikeRate", "sr"];
const WICKETS_KEYS: &[&str] = &["wickets", "wk", "wkts"];
const ECONOMY_KEYS: &[&str] = &["economy", "econ"];
const AVERAGE_KEYS: &[&str] = &["average", "avg"];

/// Coalesce a model response into the canonical field set. Numbers and numeric
/// strings are accepted; anything else falls through to the next alias, then 0.
pub fn normalize_forecast(v: &serde_json::Value) -> Forecast {
    Forecast {
        runs: first_numeric(v, RUNS_KEYS),
        strike_rate: first_numeric(v, STRIKE_RATE_KEYS),
        wickets: first_numeric(v, WICKETS_KEYS),
        economy: first_numeric(v, ECONOMY_KEYS),
        average: first_numeric(v, AVERAGE_KEYS),
    }
}

fn first_numeric(v: &serde_json::Value, keys: &[&str]) -> f64 {
    keys.iter()
        .filter_map(|k| v.get(*k))
        .find_map(|x| {
            x.as_f64()
                .or_else(|| x.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
                .filter(|n| n.is_finite())
        })
        .unwrap_or(0.0)
}

/// Client for the three per-format forecast endpoints. One attempt per call.
#[derive(Debug, Clone)]
pub struct ForecastClient {
    http: reqwest::Client,
    odi_url: String,
    t20_url: String,
    test_url: String,
}

impl ForecastClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.forecast_timeout)
            .build()?;
        Ok(Self {
            http,
            odi_url: cfg.forecast_url(Format::Odi).to_string(),
            t20_url: cfg.forecast_url(Format::T20).to_string(),
            test_url: cfg.forecast_url(Format::Test).to_string(),
        })
    }

    pub fn endpoint(&self, format: Format) -> &str {
        match format {
            Format::Odi => &self.odi_url,
            Format::T20 => &self.t20_url,
            Format::Test => &self.test_url,
        }
    }

    pub async fn forecast(&self, format: Format, features: &ForecastFeatures) -> Result<Forecast> {
        let url = self.endpoint(format);
        debug!(%format, url, "requesting forecast");

        let resp = self
            .http
            .post(url)
            .json(features)
            .send()
            .await
            .map_err(|e| {
                warn!(%format, "forecast transport error: {e}");
                AppError::ForecastService {
                    status: e.status().map(|s| s.as_u16()),
                    body: e.to_string(),
                }
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| AppError::ForecastService {
            status: Some(status.as_u16()),
            body: e.to_string(),
        })?;

        if !status.is_success() {
            warn!(%format, status = status.as_u16(), "forecast service returned error: {body}");
            return Err(AppError::ForecastService { status: Some(status.as_u16()), body });
        }

        let value: serde_json::Value = match serde_json::from_str(&body) {
            Ok(v @ serde_json::Value::Object(_)) => v,
            _ => {
                warn!(%format, "forecast response was not a JSON object: {body}");
                return Err(AppError::ForecastService { status: Some(status.as_u16()), body });
            }
        };

        Ok(normalize_forecast(&value))
    }
}
