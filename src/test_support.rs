//! Shared fixtures for unit tests: stub HTTP services and in-memory databases.

use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tokio::net::TcpListener;

use crate::features;
use crate::types::{Format, Player, PlayerStats, RawStats, Role};

/// Serve `router` on a random local port; returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Single-connection in-memory SQLite with migrations applied.
/// One connection so every query sees the same database.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

/// Stats record for the reference batsman: 500 runs off 480 balls, no bowling.
pub fn test_stats(role: Role, format: Format, matches: u32) -> PlayerStats {
    let raw = RawStats { matches, innings: matches, runs: 500, balls_faced: 480, ..Default::default() };
    PlayerStats {
        id: 1,
        player: Player { id: 1, name: "Test Player".to_string(), role, age: None, team: None },
        format,
        derived: features::derive(&raw),
        raw,
        last_predicted_at: None,
        updated_at: 0,
    }
}
