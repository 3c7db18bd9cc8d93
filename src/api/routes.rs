use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::api::health::{HealthSnapshot, HealthState};
use crate::api::latency::{ForecastLatency, LatencyReport};
use crate::db::store;
use crate::error::AppError;
use crate::predict::{PredictionOutcome, Predictor};
use crate::types::{Format, NewPlayer, Player, PlayerStats, RawStats, StrategyRecord};

#[derive(Clone)]
pub struct ApiState {
    pub pool: sqlx::SqlitePool,
    pub predictor: Arc<Predictor>,
    pub health: Arc<HealthState>,
    pub latency: Arc<ForecastLatency>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/players", get(list_players).post(create_player))
        .route("/api/player-stats", post(upsert_stats))
        .route("/api/player-stats/player/:player_id", get(get_player_stats))
        .route("/api/predictions/:player_id/:format", get(predict))
        .route("/api/predictions/history/:player_id/:format", get(get_history))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_latency))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct StatsInput {
    pub player: i64,
    pub format: String,
    #[serde(flatten)]
    pub raw: RawStats,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn create_player(
    State(state): State<ApiState>,
    body: std::result::Result<Json<NewPlayer>, JsonRejection>,
) -> Result<(StatusCode, Json<Player>), AppError> {
    let Json(mut body) = body?;
    body.name = body.name.trim().to_string();
    if body.name.is_empty() {
        return Err(AppError::InvalidInput("player name must not be empty".to_string()));
    }
    let player = store::create_player(&state.pool, &body).await?;
    info!(player_id = player.id, role = %player.role, "player created");
    Ok((StatusCode::CREATED, Json(player)))
}

async fn list_players(State(state): State<ApiState>) -> Result<Json<Vec<Player>>, AppError> {
    Ok(Json(store::list_players(&state.pool).await?))
}

async fn upsert_stats(
    State(state): State<ApiState>,
    body: std::result::Result<Json<StatsInput>, JsonRejection>,
) -> Result<Json<PlayerStats>, AppError> {
    let Json(body) = body?;
    let format = Format::parse(&body.format)?;
    if !body.raw.overs.is_finite() || body.raw.overs < 0.0 {
        return Err(AppError::InvalidInput("overs must be a non-negative number".to_string()));
    }
    if store::get_player(&state.pool, body.player).await?.is_none() {
        return Err(AppError::PlayerNotFound(body.player));
    }
    let stats = store::upsert_stats(&state.pool, body.player, format, &body.raw).await?;
    Ok(Json(stats))
}

async fn get_player_stats(
    State(state): State<ApiState>,
    Path(player_id): Path<i64>,
) -> Result<Json<Vec<PlayerStats>>, AppError> {
    Ok(Json(store::stats_for_player(&state.pool, player_id).await?))
}

async fn predict(
    State(state): State<ApiState>,
    Path((player_id, format)): Path<(i64, String)>,
) -> Result<Json<PredictionOutcome>, AppError> {
    info!(player_id, format = %format, "predict request");
    Ok(Json(state.predictor.predict(player_id, &format).await?))
}

async fn get_history(
    State(state): State<ApiState>,
    Path((player_id, format)): Path<(i64, String)>,
) -> Result<Json<Vec<StrategyRecord>>, AppError> {
    let format = Format::parse(&format)?;
    Ok(Json(store::history(&state.pool, player_id, format).await?))
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthSnapshot> {
    Json(state.health.snapshot())
}

async fn get_latency(State(state): State<ApiState>) -> Json<LatencyReport> {
    Json(state.latency.report())
}
