//! Database row types matching `migrations/0001_init.sql`.
//! Used with `sqlx::query_as` and converted into domain types here.

use crate::error::{AppError, Result};
use crate::types::{
    DerivedStats, Format, Player, PlayerStats, RawStats, Role, StrategyRecord,
};

#[derive(Debug, sqlx::FromRow)]
pub struct PlayerRow {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub age: Option<i64>,
    pub team: Option<String>,
}

impl From<PlayerRow> for Player {
    fn from(r: PlayerRow) -> Self {
        Player {
            id: r.id,
            name: r.name,
            role: Role::from_stored(&r.role),
            age: r.age.map(count),
            team: r.team,
        }
    }
}

/// `player_stats` joined with the owning player's name and role.
#[derive(Debug, sqlx::FromRow)]
pub struct PlayerStatsRow {
    pub id: i64,
    pub player_id: i64,
    pub player_name: String,
    pub player_role: String,
    pub player_age: Option<i64>,
    pub player_team: Option<String>,
    pub format: String,
    pub matches: i64,
    pub innings: i64,
    pub not_out: i64,
    pub runs: i64,
    pub balls_faced: i64,
    pub high_score: i64,
    pub hundreds: i64,
    pub fifties: i64,
    pub ducks: i64,
    pub fours: i64,
    pub sixes: i64,
    pub overs: f64,
    pub runs_conceded: i64,
    pub wickets: i64,
    pub maidens: i64,
    pub strike_rate: f64,
    pub balls_from_overs: i64,
    pub economy: f64,
    pub bowling_strike_rate: f64,
    pub last_predicted_at: Option<i64>,
    pub updated_at: i64,
}

fn count(v: i64) -> u32 {
    v.clamp(0, i64::from(u32::MAX)) as u32
}

fn stored_format(s: &str) -> Result<Format> {
    Format::parse(s).map_err(|_| {
        AppError::Persistence(sqlx::Error::Decode(format!("unknown stored format '{s}'").into()))
    })
}

impl TryFrom<PlayerStatsRow> for PlayerStats {
    type Error = AppError;

    fn try_from(r: PlayerStatsRow) -> Result<Self> {
        Ok(PlayerStats {
            id: r.id,
            player: Player {
                id: r.player_id,
                name: r.player_name,
                role: Role::from_stored(&r.player_role),
                age: r.player_age.map(count),
                team: r.player_team,
            },
            format: stored_format(&r.format)?,
            raw: RawStats {
                matches: count(r.matches),
                innings: count(r.innings),
                not_out: count(r.not_out),
                runs: count(r.runs),
                balls_faced: count(r.balls_faced),
                high_score: count(r.high_score),
                hundreds: count(r.hundreds),
                fifties: count(r.fifties),
                ducks: count(r.ducks),
                fours: count(r.fours),
                sixes: count(r.sixes),
                overs: r.overs,
                runs_conceded: count(r.runs_conceded),
                wickets: count(r.wickets),
                maidens: count(r.maidens),
            },
            derived: DerivedStats {
                strike_rate: r.strike_rate,
                balls_from_overs: count(r.balls_from_overs),
                economy: r.economy,
                bowling_strike_rate: r.bowling_strike_rate,
            },
            last_predicted_at: r.last_predicted_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct PredictionRow {
    pub id: i64,
    pub player_id: i64,
    pub format: String,
    pub forecast: String,
    pub strategy: String,
    pub created_at: i64,
}

impl TryFrom<PredictionRow> for StrategyRecord {
    type Error = AppError;

    fn try_from(r: PredictionRow) -> Result<Self> {
        Ok(StrategyRecord {
            id: r.id,
            player_id: r.player_id,
            format: stored_format(&r.format)?,
            forecast: serde_json::from_str(&r.forecast)?,
            strategy: serde_json::from_str(&r.strategy)?,
            created_at: r.created_at,
        })
    }
}
