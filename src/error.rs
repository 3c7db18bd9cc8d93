use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid format '{0}': expected one of ODI, T20, Test")]
    InvalidFormat(String),

    #[error("Stats not found for player {player_id} ({format}). Please add player stats first.")]
    StatsNotFound { player_id: i64, format: String },

    #[error("Player not found: {0}")]
    PlayerNotFound(i64),

    #[error("Not enough matches. Need at least {required} (have {matches})")]
    InsufficientData { required: u32, matches: u32 },

    /// Upstream forecast call failed. `status` is `None` for transport errors and timeouts.
    #[error("Prediction service error (status {status:?}): {body}")]
    ForecastService { status: Option<u16>, body: String },

    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Malformed request bodies answer with the same JSON error shape as every other failure.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl AppError {
    /// Stable machine-readable kind for API consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidFormat(_) => "invalid_format",
            AppError::StatsNotFound { .. } => "stats_not_found",
            AppError::PlayerNotFound(_) => "player_not_found",
            AppError::InsufficientData { .. } => "insufficient_data",
            AppError::ForecastService { .. } => "forecast_service_error",
            AppError::Persistence(_) => "persistence_error",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Migration(_)
            | AppError::Http(_)
            | AppError::Json(_)
            | AppError::Config(_)
            | AppError::Io(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidFormat(_)
            | AppError::InvalidInput(_)
            | AppError::InsufficientData { .. } => StatusCode::BAD_REQUEST,
            AppError::StatsNotFound { .. } | AppError::PlayerNotFound(_) => StatusCode::NOT_FOUND,
            AppError::ForecastService { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        match self {
            AppError::InsufficientData { required, matches } => {
                body["required"] = serde_json::json!(required);
                body["matches"] = serde_json::json!(matches);
            }
            AppError::ForecastService { status, body: upstream } => {
                body["upstream_status"] = serde_json::json!(status);
                body["error"] = serde_json::json!(upstream);
            }
            _ => {}
        }
        body
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "request failed: {self}");
        }
        (status, Json(self.body())).into_response()
    }
}
