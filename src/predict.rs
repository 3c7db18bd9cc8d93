use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::api::health::HealthState;
use crate::api::latency::ForecastLatency;
use crate::config::{self, Config};
use crate::db::store;
use crate::error::{AppError, Result};
use crate::forecast::{ForecastClient, ForecastFeatures};
use crate::strategy::{self, Comparison, Narrative, NarrativeAdvisor, Unavailable};
use crate::types::{Forecast, Format, Player, PlayerStats, StrategyBlock, StrategyRecord};

/// Everything one successful prediction request returns.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionOutcome {
    pub player: Player,
    pub stats: PlayerStats,
    pub forecast: Forecast,
    pub strategy: Vec<StrategyBlock>,
    pub record: StrategyRecord,
}

/// Fails with `InsufficientData` when the record is below the format's minimum.
pub fn check_eligibility(stats: &PlayerStats) -> Result<()> {
    let required = config::min_matches(stats.format);
    if stats.raw.matches < required {
        return Err(AppError::InsufficientData { required, matches: stats.raw.matches });
    }
    Ok(())
}

/// Runs the stats → forecast → strategy → persist pipeline for one request.
/// Holds no per-request state; safe to share behind an `Arc`.
pub struct Predictor {
    pool: SqlitePool,
    forecast: ForecastClient,
    narrative: NarrativeAdvisor,
    forecast_timeout: Duration,
    narrative_timeout: Duration,
    advice_seed: Option<u64>,
    health: Arc<HealthState>,
    latency: Arc<ForecastLatency>,
}

impl Predictor {
    pub fn new(
        cfg: &Config,
        pool: SqlitePool,
        health: Arc<HealthState>,
        latency: Arc<ForecastLatency>,
    ) -> Result<Self> {
        Ok(Self {
            pool,
            forecast: ForecastClient::new(cfg)?,
            narrative: NarrativeAdvisor::new(cfg)?,
            forecast_timeout: cfg.forecast_timeout,
            narrative_timeout: cfg.narrative_timeout,
            advice_seed: cfg.advice_seed,
            health,
            latency,
        })
    }

    pub async fn predict(&self, player_id: i64, format: &str) -> Result<PredictionOutcome> {
        let format = Format::parse(format)?;

        let stats = store::get_stats(&self.pool, player_id, format)
            .await?
            .ok_or_else(|| AppError::StatsNotFound { player_id, format: format.to_string() })?;

        check_eligibility(&stats)?;

        let forecast = match self.run_forecast(&stats).await {
            Ok(f) => f,
            Err(e) => {
                self.health.inc_forecast_failures();
                return Err(e);
            }
        };

        let strategy = self.strategize(&stats, &forecast).await;

        let record = store::record_prediction(&self.pool, &stats, &forecast, &strategy).await?;
        self.health.record_prediction(record.created_at);

        info!(
            player_id,
            %format,
            record_id = record.id,
            runs = forecast.runs,
            strike_rate = forecast.strike_rate,
            "prediction stored"
        );

        Ok(PredictionOutcome {
            player: stats.player.clone(),
            stats,
            forecast,
            strategy,
            record,
        })
    }

    async fn run_forecast(&self, stats: &PlayerStats) -> Result<Forecast> {
        let features = ForecastFeatures::from_stats(stats);
        let started = Instant::now();
        let result = tokio::time::timeout(
            self.forecast_timeout,
            self.forecast.forecast(stats.format, &features),
        )
        .await;
        self.latency.record(started.elapsed());

        match result {
            Ok(r) => r,
            Err(_) => {
                warn!(format = %stats.format, "forecast timed out after {:?}", self.forecast_timeout);
                Err(AppError::ForecastService {
                    status: None,
                    body: format!("timed out after {}ms", self.forecast_timeout.as_millis()),
                })
            }
        }
    }

    /// Rule-based advice is always computed; the narrative replaces it only when available.
    async fn strategize(&self, stats: &PlayerStats, forecast: &Forecast) -> Vec<StrategyBlock> {
        let role = stats.player.role;
        let cmp = Comparison::new(stats, forecast);

        let mut rng = match self.advice_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let advice = strategy::advise(&cmp, role, stats.format, &mut rng);

        let narrative = tokio::time::timeout(
            self.narrative_timeout,
            self.narrative.generate(role, stats.format, &cmp),
        )
        .await
        .unwrap_or_else(|_| {
            warn!(%role, format = %stats.format, "narrative timed out, using rule-based advice");
            Narrative::Unavailable(Unavailable::TimedOut(self.narrative_timeout))
        });

        if narrative.text().is_none() {
            self.health.inc_narrative_fallbacks();
        }

        strategy::compose(&cmp, stats.raw.matches, &advice, &narrative)
    }
}
