use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, Result};

// ---------------------------------------------------------------------------
// Format / Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    #[serde(rename = "ODI")]
    Odi,
    T20,
    Test,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Odi, Format::T20, Format::Test];

    /// Parse a path/body format string. Exactly "ODI", "T20" or "Test"; anything
    /// else (including other casings) is `InvalidFormat`.
    pub fn parse(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| AppError::InvalidFormat(s.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Odi => "ODI",
            Format::T20 => "T20",
            Format::Test => "Test",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Batsman,
    Bowler,
    #[serde(rename = "All-rounder")]
    AllRounder,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Batsman => "Batsman",
            Role::Bowler => "Bowler",
            Role::AllRounder => "All-rounder",
        }
    }

    /// Stored role strings are trusted; anything unrecognised reads as Batsman.
    pub fn from_stored(s: &str) -> Self {
        match s {
            "Bowler" => Role::Bowler,
            "All-rounder" => Role::AllRounder,
            _ => Role::Batsman,
        }
    }

    pub fn bats(&self) -> bool {
        matches!(self, Role::Batsman | Role::AllRounder)
    }

    pub fn bowls(&self) -> bool {
        matches!(self, Role::Bowler | Role::AllRounder)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Players and stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub name: String,
    pub role: Role,
    pub age: Option<u32>,
    pub team: Option<String>,
}

/// Body of a player registration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewPlayer {
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, deserialize_with = "loose_opt_count")]
    pub age: Option<u32>,
    #[serde(default)]
    pub team: Option<String>,
}

impl NewPlayer {
    pub fn new(name: &str, role: Role) -> Self {
        Self { name: name.to_string(), role, age: None, team: None }
    }
}

/// Raw career counters for one player in one format. Missing fields default to 0.
/// Form clients send numbers as strings, so each field also accepts a numeric
/// string, and `""` or `null` reads as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawStats {
    #[serde(deserialize_with = "loose_count")]
    pub matches: u32,
    #[serde(deserialize_with = "loose_count")]
    pub innings: u32,
    #[serde(deserialize_with = "loose_count")]
    pub not_out: u32,
    #[serde(deserialize_with = "loose_count")]
    pub runs: u32,
    #[serde(deserialize_with = "loose_count")]
    pub balls_faced: u32,
    #[serde(deserialize_with = "loose_count")]
    pub high_score: u32,
    #[serde(deserialize_with = "loose_count")]
    pub hundreds: u32,
    #[serde(deserialize_with = "loose_count")]
    pub fifties: u32,
    #[serde(deserialize_with = "loose_count")]
    pub ducks: u32,
    #[serde(deserialize_with = "loose_count")]
    pub fours: u32,
    #[serde(deserialize_with = "loose_count")]
    pub sixes: u32,
    /// Plain decimal overs; `10.3` is 10.3 overs, not 10 overs and 3 balls.
    #[serde(deserialize_with = "loose_decimal")]
    pub overs: f64,
    #[serde(deserialize_with = "loose_count")]
    pub runs_conceded: u32,
    #[serde(deserialize_with = "loose_count")]
    pub wickets: u32,
    #[serde(deserialize_with = "loose_count")]
    pub maidens: u32,
}

/// A number, a numeric string, or blank. `None` for `""` and `null`.
fn loose_number<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f64>, D::Error> {
    let n = match Option::<serde_json::Value>::deserialize(d)? {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(other) => return Err(D::Error::custom(format!("expected a number, got {other}"))),
    };
    match n {
        Some(n) if n.is_finite() && n >= 0.0 => Ok(Some(n)),
        Some(n) => Err(D::Error::custom(format!("expected a non-negative number, got {n}"))),
        None => Err(D::Error::custom("expected a number")),
    }
}

fn whole(n: f64) -> Option<u32> {
    (n.fract() == 0.0 && n <= f64::from(u32::MAX)).then_some(n as u32)
}

fn loose_count<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u32, D::Error> {
    loose_opt_count(d).map(Option::unwrap_or_default)
}

fn loose_opt_count<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<u32>, D::Error> {
    match loose_number(d)? {
        None => Ok(None),
        Some(n) => whole(n)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a whole number, got {n}"))),
    }
}

fn loose_decimal<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f64, D::Error> {
    loose_number(d).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStats {
    pub strike_rate: f64,
    pub balls_from_overs: u32,
    pub economy: f64,
    pub bowling_strike_rate: f64,
}

/// The persisted (player, format) stats record: raw counters plus derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub id: i64,
    pub player: Player,
    pub format: Format,
    #[serde(flatten)]
    pub raw: RawStats,
    #[serde(flatten)]
    pub derived: DerivedStats,
    /// Unix nanoseconds of the last successful prediction, if any.
    pub last_predicted_at: Option<i64>,
    pub updated_at: i64,
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

/// Canonical forecast record after alias normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub runs: f64,
    pub strike_rate: f64,
    pub wickets: f64,
    pub economy: f64,
    pub average: f64,
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Summary,
    Strategy,
    Warning,
}

/// Where a strategy block's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceSource {
    Narrative,
    RuleBased,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyBlock {
    pub kind: BlockKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<AdviceSource>,
    pub text: String,
}

/// One immutable prediction + strategy entry in a player's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecord {
    pub id: i64,
    pub player_id: i64,
    pub format: Format,
    pub forecast: Forecast,
    pub strategy: Vec<StrategyBlock>,
    /// Unix nanoseconds.
    pub created_at: i64,
}
