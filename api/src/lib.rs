pub mod client;
pub mod history;
pub mod rest;
pub mod scoring;
pub mod snapshot;
pub mod tables;

// ---------------------------------------------------------------------------
// Domain types, independent of the PostgREST wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Player {
    pub id: String,
    pub full_name: String,
}

/// One row of the `team_standings` view, coerced leniently because the view is
/// external and individual cells may be missing or the wrong JSON type.
#[derive(Debug, Clone, Default)]
pub struct StandingRecord {
    pub team_id: Option<String>,
    pub team_name: String,
    pub matches_won: Option<i64>,
    pub matches_lost: Option<i64>,
    pub win_percentage: Option<f64>,
    pub total_points: Option<i64>,
}

/// Outcome of a match or line from one team's perspective.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchResult {
    Win,
    Loss,
    #[default]
    Tie,
}

impl MatchResult {
    pub fn label(&self) -> &'static str {
        match self {
            MatchResult::Win => "win",
            MatchResult::Loss => "loss",
            MatchResult::Tie => "tie",
        }
    }
}

/// One persisted match seen from a given team's side. Aggregates are
/// re-derived from line/game rows by `history::normalize_match_history`
/// rather than trusted from the stored match winner alone.
#[derive(Debug, Clone, Default)]
pub struct MatchHistoryEntry {
    pub id: String,
    pub match_date: String,
    pub match_time: Option<String>,
    pub location: Option<String>,
    pub opponent_id: String,
    pub opponent_name: String,
    pub is_home_match: bool,
    /// Lines won by this team / by the opponent.
    pub team_score: u32,
    pub opponent_score: u32,
    pub result: MatchResult,
    /// League points are awarded per game won.
    pub points_earned: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub lines: Vec<LineDetail>,
}

#[derive(Debug, Clone, Default)]
pub struct LineDetail {
    pub id: String,
    pub line_number: u32,
    pub winner_team_id: Option<String>,
    pub result: MatchResult,
    pub home_players: Vec<Player>,
    pub away_players: Vec<Player>,
    pub games: Vec<GameScore>,
}

#[derive(Debug, Clone, Default)]
pub struct GameScore {
    pub id: String,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
}

pub fn format_full_name(first: Option<&str>, last: Option<&str>) -> String {
    let first = first.unwrap_or("").trim();
    let last = last.unwrap_or("").trim();
    match (first.is_empty(), last.is_empty()) {
        (true, true) => "Unknown player".to_string(),
        (false, true) => first.to_string(),
        (true, false) => last.to_string(),
        (false, false) => format!("{first} {last}"),
    }
}
