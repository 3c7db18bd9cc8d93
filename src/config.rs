use std::time::Duration;

use crate::error::{AppError, Result};
use crate::types::Format;

pub const FORECAST_ODI_URL: &str = "http://127.0.0.1:5000/predict";
pub const FORECAST_TEST_URL: &str = "http://127.0.0.1:5001/predict_test";
pub const FORECAST_T20_URL: &str = "http://127.0.0.1:5002/predict_t20";
pub const NARRATIVE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const NARRATIVE_MODEL: &str = "openai/gpt-4o-mini";

/// Token budget for one generated strategy paragraph.
pub const NARRATIVE_MAX_TOKENS: u32 = 180;

/// Upper bound on one forecast round-trip (seconds).
pub const FORECAST_TIMEOUT_SECS: u64 = 10;

/// Upper bound on one narrative round-trip (seconds). Expiry only drops the narrative.
pub const NARRATIVE_TIMEOUT_SECS: u64 = 8;

/// Below this many matches every strategy carries a low-confidence warning.
/// Applies to all formats, independent of the per-format eligibility minimum.
pub const LOW_CONFIDENCE_MATCHES: u32 = 10;

/// Relative change beyond which a trend message fires (decline below -x, economy rise above +x).
pub const TREND_THRESHOLD: f64 = 0.1;

/// Fallback tips drawn per role branch when no trend message fired.
pub const FALLBACK_TIP_COUNT: usize = 2;

/// Minimum matches on record before a forecast is requested.
pub fn min_matches(format: Format) -> u32 {
    match format {
        Format::Odi => 10,
        Format::T20 => 15,
        Format::Test => 10,
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Per-format forecast endpoints (FORECAST_URL_ODI / _T20 / _TEST)
    pub forecast_odi_url: String,
    pub forecast_t20_url: String,
    pub forecast_test_url: String,
    pub forecast_timeout: Duration,
    pub narrative_url: String,
    /// Bearer credential for the narrative service. `None` disables narratives.
    pub narrative_api_key: Option<String>,
    pub narrative_model: String,
    pub narrative_max_tokens: u32,
    pub narrative_timeout: Duration,
    /// Sent as HTTP-Referer / X-Title to the narrative service.
    pub site_url: String,
    pub site_title: String,
    /// Fixed seed for fallback-tip selection (ADVICE_SEED). Entropy when unset.
    pub advice_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            db_path: "strategist.db".to_string(),
            api_port: 8000,
            forecast_odi_url: FORECAST_ODI_URL.to_string(),
            forecast_t20_url: FORECAST_T20_URL.to_string(),
            forecast_test_url: FORECAST_TEST_URL.to_string(),
            forecast_timeout: Duration::from_secs(FORECAST_TIMEOUT_SECS),
            narrative_url: NARRATIVE_URL.to_string(),
            narrative_api_key: None,
            narrative_model: NARRATIVE_MODEL.to_string(),
            narrative_max_tokens: NARRATIVE_MAX_TOKENS,
            narrative_timeout: Duration::from_secs(NARRATIVE_TIMEOUT_SECS),
            site_url: "https://localhost".to_string(),
            site_title: "CricStat".to_string(),
            advice_seed: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            db_path: std::env::var("DB_PATH").unwrap_or(defaults.db_path),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| defaults.api_port.to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            forecast_odi_url: std::env::var("FORECAST_URL_ODI").unwrap_or(defaults.forecast_odi_url),
            forecast_t20_url: std::env::var("FORECAST_URL_T20").unwrap_or(defaults.forecast_t20_url),
            forecast_test_url: std::env::var("FORECAST_URL_TEST")
                .unwrap_or(defaults.forecast_test_url),
            forecast_timeout: Duration::from_secs(
                std::env::var("FORECAST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(FORECAST_TIMEOUT_SECS),
            ),
            narrative_url: std::env::var("NARRATIVE_URL").unwrap_or(defaults.narrative_url),
            narrative_api_key: std::env::var("NARRATIVE_API_KEY")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            narrative_model: std::env::var("NARRATIVE_MODEL").unwrap_or(defaults.narrative_model),
            narrative_max_tokens: std::env::var("NARRATIVE_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(NARRATIVE_MAX_TOKENS),
            narrative_timeout: Duration::from_secs(
                std::env::var("NARRATIVE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(NARRATIVE_TIMEOUT_SECS),
            ),
            site_url: std::env::var("SITE_URL").unwrap_or(defaults.site_url),
            site_title: std::env::var("SITE_TITLE").unwrap_or(defaults.site_title),
            advice_seed: std::env::var("ADVICE_SEED")
                .ok()
                .and_then(|s| s.parse::<u64>().ok()),
        })
    }

    /// Forecast endpoint for one format.
    pub fn forecast_url(&self, format: Format) -> &str {
        match format {
            Format::Odi => &self.forecast_odi_url,
            Format::T20 => &self.forecast_t20_url,
            Format::Test => &self.forecast_test_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eligibility_minimums_per_format() {
        assert_eq!(min_matches(Format::Odi), 10);
        assert_eq!(min_matches(Format::T20), 15);
        assert_eq!(min_matches(Format::Test), 10);
    }

    #[test]
    fn forecast_url_selects_per_format_endpoint() {
        let cfg = Config::default();
        assert_eq!(cfg.forecast_url(Format::Odi), FORECAST_ODI_URL);
        assert_eq!(cfg.forecast_url(Format::T20), FORECAST_T20_URL);
        assert_eq!(cfg.forecast_url(Format::Test), FORECAST_TEST_URL);
    }

    #[test]
    fn defaults_leave_narrative_disabled() {
        let cfg = Config::default();
        assert!(cfg.narrative_api_key.is_none());
        assert_eq!(cfg.narrative_max_tokens, 180);
        assert!(cfg.advice_seed.is_none());
    }
}
