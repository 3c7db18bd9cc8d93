use sqlx::SqlitePool;
use tracing::debug;

use super::models::{PlayerRow, PlayerStatsRow, PredictionRow};
use super::now_ns;
use crate::error::{AppError, Result};
use crate::features;
use crate::types::{Forecast, Format, NewPlayer, Player, PlayerStats, RawStats, StrategyBlock, StrategyRecord};

const STATS_SELECT: &str = r#"
    SELECT s.id, s.player_id, p.name AS player_name, p.role AS player_role,
           p.age AS player_age, p.team AS player_team, s.format,
           s.matches, s.innings, s.not_out, s.runs, s.balls_faced, s.high_score,
           s.hundreds, s.fifties, s.ducks, s.fours, s.sixes,
           s.overs, s.runs_conceded, s.wickets, s.maidens,
           s.strike_rate, s.balls_from_overs, s.economy, s.bowling_strike_rate,
           s.last_predicted_at, s.updated_at
    FROM player_stats s
    JOIN players p ON p.id = s.player_id
"#;

pub async fn create_player(pool: &SqlitePool, new: &NewPlayer) -> Result<Player> {
    let id = sqlx::query("INSERT INTO players (name, role, age, team, created_at) VALUES (?, ?, ?, ?, ?)")
        .bind(&new.name)
        .bind(new.role.as_str())
        .bind(new.age.map(i64::from))
        .bind(new.team.as_deref())
        .bind(now_ns())
        .execute(pool)
        .await?
        .last_insert_rowid();
    Ok(Player { id, name: new.name.clone(), role: new.role, age: new.age, team: new.team.clone() })
}

pub async fn get_player(pool: &SqlitePool, id: i64) -> Result<Option<Player>> {
    let row = sqlx::query_as::<_, PlayerRow>("SELECT id, name, role, age, team FROM players WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Player::from))
}

pub async fn list_players(pool: &SqlitePool) -> Result<Vec<Player>> {
    let rows = sqlx::query_as::<_, PlayerRow>("SELECT id, name, role, age, team FROM players ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(Player::from).collect())
}

/// Insert or replace the (player, format) stats record. Derived metrics are
/// recomputed from `raw` on every write so they can never be stale.
pub async fn upsert_stats(
    pool: &SqlitePool,
    player_id: i64,
    format: Format,
    raw: &RawStats,
) -> Result<PlayerStats> {
    let derived = features::derive(raw);

    sqlx::query(
        r#"
        INSERT INTO player_stats (
            player_id, format, matches, innings, not_out, runs, balls_faced, high_score,
            hundreds, fifties, ducks, fours, sixes, overs, runs_conceded, wickets, maidens,
            strike_rate, balls_from_overs, economy, bowling_strike_rate, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(player_id, format) DO UPDATE SET
            matches = excluded.matches,
            innings = excluded.innings,
            not_out = excluded.not_out,
            runs = excluded.runs,
            balls_faced = excluded.balls_faced,
            high_score = excluded.high_score,
            hundreds = excluded.hundreds,
            fifties = excluded.fifties,
            ducks = excluded.ducks,
            fours = excluded.fours,
            sixes = excluded.sixes,
            overs = excluded.overs,
            runs_conceded = excluded.runs_conceded,
            wickets = excluded.wickets,
            maidens = excluded.maidens,
            strike_rate = excluded.strike_rate,
            balls_from_overs = excluded.balls_from_overs,
            economy = excluded.economy,
            bowling_strike_rate = excluded.bowling_strike_rate,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(player_id)
    .bind(format.as_str())
    .bind(i64::from(raw.matches))
    .bind(i64::from(raw.innings))
    .bind(i64::from(raw.not_out))
    .bind(i64::from(raw.runs))
    .bind(i64::from(raw.balls_faced))
    .bind(i64::from(raw.high_score))
    .bind(i64::from(raw.hundreds))
    .bind(i64::from(raw.fifties))
    .bind(i64::from(raw.ducks))
    .bind(i64::from(raw.fours))
    .bind(i64::from(raw.sixes))
    .bind(raw.overs)
    .bind(i64::from(raw.runs_conceded))
    .bind(i64::from(raw.wickets))
    .bind(i64::from(raw.maidens))
    .bind(derived.strike_rate)
    .bind(i64::from(derived.balls_from_overs))
    .bind(derived.economy)
    .bind(derived.bowling_strike_rate)
    .bind(now_ns())
    .execute(pool)
    .await?;

    debug!(player_id, %format, matches = raw.matches, "stats upserted");

    get_stats(pool, player_id, format)
        .await?
        .ok_or(AppError::Persistence(sqlx::Error::RowNotFound))
}

pub async fn get_stats(pool: &SqlitePool, player_id: i64, format: Format) -> Result<Option<PlayerStats>> {
    let sql = format!("{STATS_SELECT} WHERE s.player_id = ? AND s.format = ?");
    let row = sqlx::query_as::<_, PlayerStatsRow>(&sql)
        .bind(player_id)
        .bind(format.as_str())
        .fetch_optional(pool)
        .await?;
    row.map(PlayerStats::try_from).transpose()
}

pub async fn stats_for_player(pool: &SqlitePool, player_id: i64) -> Result<Vec<PlayerStats>> {
    let sql = format!("{STATS_SELECT} WHERE s.player_id = ? ORDER BY s.format");
    let rows = sqlx::query_as::<_, PlayerStatsRow>(&sql)
        .bind(player_id)
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(PlayerStats::try_from).collect()
}

/// Append an immutable strategy record and stamp the stats record's
/// `last_predicted_at`, atomically.
pub async fn record_prediction(
    pool: &SqlitePool,
    stats: &PlayerStats,
    forecast: &Forecast,
    strategy: &[StrategyBlock],
) -> Result<StrategyRecord> {
    let forecast_json = serde_json::to_string(forecast)?;
    let strategy_json = serde_json::to_string(strategy)?;
    let created_at = now_ns();

    let mut tx = pool.begin().await?;

    let id = sqlx::query(
        "INSERT INTO predictions (player_id, format, forecast, strategy, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(stats.player.id)
    .bind(stats.format.as_str())
    .bind(&forecast_json)
    .bind(&strategy_json)
    .bind(created_at)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    sqlx::query("UPDATE player_stats SET last_predicted_at = ? WHERE id = ?")
        .bind(created_at)
        .bind(stats.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(StrategyRecord {
        id,
        player_id: stats.player.id,
        format: stats.format,
        forecast: *forecast,
        strategy: strategy.to_vec(),
        created_at,
    })
}

/// Strategy records for (player, format), newest first.
pub async fn history(pool: &SqlitePool, player_id: i64, format: Format) -> Result<Vec<StrategyRecord>> {
    let rows = sqlx::query_as::<_, PredictionRow>(
        r#"
        SELECT id, player_id, format, forecast, strategy, created_at
        FROM predictions
        WHERE player_id = ? AND format = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(player_id)
    .bind(format.as_str())
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(StrategyRecord::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_pool;
    use crate::types::{AdviceSource, BlockKind, Role};

    #[tokio::test]
    async fn upsert_keeps_one_record_and_recomputes_derived() {
        let pool = memory_pool().await;
        let player = create_player(&pool, &NewPlayer::new("Asha", Role::Batsman)).await.unwrap();

        let first = RawStats { matches: 12, runs: 500, balls_faced: 480, ..Default::default() };
        let stats = upsert_stats(&pool, player.id, Format::Odi, &first).await.unwrap();
        assert_eq!(stats.derived.strike_rate, 104.17);
        assert_eq!(stats.player.name, "Asha");

        let second = RawStats { matches: 13, runs: 600, balls_faced: 500, ..Default::default() };
        let updated = upsert_stats(&pool, player.id, Format::Odi, &second).await.unwrap();
        assert_eq!(updated.id, stats.id);
        assert_eq!(updated.raw.matches, 13);
        assert_eq!(updated.derived.strike_rate, 120.0);

        let all = stats_for_player(&pool, player.id).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn formats_are_separate_records() {
        let pool = memory_pool().await;
        let player = create_player(&pool, &NewPlayer::new("Ravi", Role::AllRounder)).await.unwrap();
        let raw = RawStats { matches: 20, ..Default::default() };
        upsert_stats(&pool, player.id, Format::Odi, &raw).await.unwrap();
        upsert_stats(&pool, player.id, Format::T20, &raw).await.unwrap();

        assert_eq!(stats_for_player(&pool, player.id).await.unwrap().len(), 2);
        assert!(get_stats(&pool, player.id, Format::Test).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn player_profile_reaches_stats_records() {
        let pool = memory_pool().await;
        let new = NewPlayer { age: Some(31), team: Some("Kerala".to_string()), ..NewPlayer::new("Sanju", Role::Batsman) };
        let p = create_player(&pool, &new).await.unwrap();
        assert_eq!(get_player(&pool, p.id).await.unwrap(), Some(p.clone()));

        let raw = RawStats { matches: 12, ..Default::default() };
        let stats = upsert_stats(&pool, p.id, Format::T20, &raw).await.unwrap();
        assert_eq!(stats.player.age, Some(31));
        assert_eq!(stats.player.team.as_deref(), Some("Kerala"));
    }

    #[tokio::test]
    async fn players_round_trip_with_role() {
        let pool = memory_pool().await;
        let p = create_player(&pool, &NewPlayer::new("Meg", Role::Bowler)).await.unwrap();
        assert_eq!(get_player(&pool, p.id).await.unwrap(), Some(p.clone()));
        assert!(get_player(&pool, p.id + 100).await.unwrap().is_none());
        assert_eq!(list_players(&pool).await.unwrap(), vec![p]);
    }

    #[tokio::test]
    async fn prediction_history_is_newest_first_and_stamps_stats() {
        let pool = memory_pool().await;
        let player = create_player(&pool, &NewPlayer::new("Kai", Role::Batsman)).await.unwrap();
        let raw = RawStats { matches: 12, runs: 500, balls_faced: 480, ..Default::default() };
        let stats = upsert_stats(&pool, player.id, Format::Odi, &raw).await.unwrap();
        assert!(stats.last_predicted_at.is_none());

        let block = StrategyBlock {
            kind: BlockKind::Strategy,
            source: Some(AdviceSource::RuleBased),
            text: "Strategy:\n• Hold".to_string(),
        };
        let first = record_prediction(&pool, &stats, &Forecast { runs: 45.0, ..Default::default() }, &[block.clone()])
            .await
            .unwrap();
        let second = record_prediction(&pool, &stats, &Forecast { runs: 60.0, ..Default::default() }, &[block])
            .await
            .unwrap();

        let records = history(&pool, player.id, Format::Odi).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, second.id);
        assert_eq!(records[1].id, first.id);
        assert_eq!(records[1].forecast.runs, 45.0);
        assert_eq!(records[0].strategy[0].source, Some(AdviceSource::RuleBased));

        let stamped = get_stats(&pool, player.id, Format::Odi).await.unwrap().unwrap();
        assert_eq!(stamped.last_predicted_at, Some(second.created_at));
        assert!(history(&pool, player.id, Format::T20).await.unwrap().is_empty());
    }
}
