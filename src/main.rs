mod api;
mod config;
mod db;
mod error;
mod features;
mod forecast;
mod predict;
mod strategy;
mod types;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::latency::ForecastLatency;
use crate::api::routes::{router, ApiState};
use crate::config::Config;
use crate::error::Result;
use crate::predict::Predictor;
use crate::types::Format;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let pool = sqlx::SqlitePool::connect(&format!("sqlite:{}?mode=rwc", cfg.db_path)).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database ready at {}", cfg.db_path);

    // --- Upstream notices ---
    for format in Format::ALL {
        info!(format = %format, url = %cfg.forecast_url(format), "forecast endpoint");
    }
    if cfg.narrative_api_key.is_none() {
        warn!("NARRATIVE_API_KEY not set; strategies will use rule-based advice only");
    } else {
        info!(model = %cfg.narrative_model, "narrative advice enabled");
    }

    // --- Shared state ---
    let health = Arc::new(HealthState::new());
    let latency = Arc::new(ForecastLatency::new());
    let predictor = Arc::new(Predictor::new(&cfg, pool.clone(), Arc::clone(&health), Arc::clone(&latency))?);

    // HTTP API server
    let api_state = ApiState { pool, predictor, health, latency };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
