//! Raw wire types for the PostgREST boundary: serde shapes for rows as the
//! hosted store returns them. These map to the clean domain types in
//! `history.rs` and `client.rs`.
//!
//! Identifiers and scores are coerced defensively: depending on the schema
//! they arrive as JSON strings or numbers, embedded relations arrive as an
//! object, an array, or null.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub type RawRow = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// Coercion helpers
// ---------------------------------------------------------------------------

fn value_to_id(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_id(value).ok_or_else(|| serde::de::Error::custom("expected a string or numeric id"))
}

pub(crate) fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_id(value))
}

/// Score cells may be numbers, numeric strings, or null.
pub fn coerce_score(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub fn coerce_int(value: &Value) -> Option<i64> {
    coerce_score(value)
}

pub fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Pull an identifier out of a raw row, trying the given keys in order.
pub fn coerce_identifier(row: &RawRow, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| row.get(*key).cloned().and_then(value_to_id))
}

/// Human-readable cell for the raw table browser.
pub fn display_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Embedded relations
// ---------------------------------------------------------------------------

/// An embedded PostgREST resource: a to-one join arrives as an object (or
/// null), a to-many join as an array.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(untagged)]
pub enum Relation<T> {
    Many(Vec<T>),
    One(T),
    #[default]
    Empty,
}

impl<T> Relation<T> {
    pub fn take_first(self) -> Option<T> {
        match self {
            Relation::One(row) => Some(row),
            Relation::Many(rows) => rows.into_iter().next(),
            Relation::Empty => None,
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Relation::Many(rows) => rows,
            Relation::One(row) => vec![row],
            Relation::Empty => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Row shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TeamRow {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PersonRow {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// `team_membership` row with the person embedded via `person:person_id`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MembershipRow {
    #[serde(default)]
    pub person: Relation<PersonRow>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LineGameRow {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub home_score: Value,
    #[serde(default)]
    pub away_score: Value,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MatchLineRow {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub line_number: Option<u32>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub winner_team_id: Option<String>,
    #[serde(default)]
    pub home_player1: Relation<PersonRow>,
    #[serde(default)]
    pub home_player2: Relation<PersonRow>,
    #[serde(default)]
    pub away_player1: Relation<PersonRow>,
    #[serde(default)]
    pub away_player2: Relation<PersonRow>,
    #[serde(default)]
    pub line_game: Relation<LineGameRow>,
}

/// One `match` row with the full line → game tree embedded.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MatchHistoryRow {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub match_date: Option<String>,
    #[serde(default)]
    pub match_time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(deserialize_with = "de_id")]
    pub home_team_id: String,
    #[serde(deserialize_with = "de_id")]
    pub away_team_id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub winner_team_id: Option<String>,
    #[serde(default)]
    pub home_team: Relation<TeamRow>,
    #[serde(default)]
    pub away_team: Relation<TeamRow>,
    #[serde(default)]
    pub match_line: Relation<MatchLineRow>,
}

// ---------------------------------------------------------------------------
// Insert payloads (match submission)
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Serialize, Clone, PartialEq)]
pub struct MatchInsert {
    pub home_team_id: String,
    pub away_team_id: String,
    pub match_date: String,
    pub match_time: String,
    pub location: String,
    pub winner_team_id: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct InsertedMatchRow {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
}

#[derive(Debug, serde::Serialize, Clone, PartialEq)]
pub struct LineInsert {
    pub match_id: String,
    pub line_number: u32,
    pub home_player1: String,
    pub home_player2: String,
    pub away_player1: String,
    pub away_player2: String,
    pub winner_team_id: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct InsertedLineRow {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub line_number: u32,
}

#[derive(Debug, serde::Serialize, Clone, PartialEq)]
pub struct GameInsert {
    pub line_id: String,
    pub game_number: u32,
    pub home_score: i64,
    pub away_score: i64,
}
