//! Offline league snapshot: a local JSON rendition of the hosted store in
//! its relational shape. Used as the read-only fallback when no endpoint is
//! configured, or explicitly via `COURTSIDE_SNAPSHOT_JSON`.

use crate::rest::{
    LineGameRow, MatchHistoryRow, MatchLineRow, PersonRow, RawRow, Relation, TeamRow,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::cmp::Ordering;

pub const EMBEDDED_DEMO_JSON: &str = include_str!("../demo_league.json");

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SnapshotMembership {
    #[serde(default)]
    pub id: Option<String>,
    pub team_id: String,
    pub person_id: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SnapshotGame {
    pub id: String,
    pub game_number: u32,
    #[serde(default)]
    pub home_score: Value,
    #[serde(default)]
    pub away_score: Value,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SnapshotLine {
    pub id: String,
    pub line_number: u32,
    #[serde(default)]
    pub home_player1: Option<String>,
    #[serde(default)]
    pub home_player2: Option<String>,
    #[serde(default)]
    pub away_player1: Option<String>,
    #[serde(default)]
    pub away_player2: Option<String>,
    #[serde(default)]
    pub winner_team_id: Option<String>,
    #[serde(default)]
    pub games: Vec<SnapshotGame>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SnapshotMatch {
    pub id: String,
    #[serde(default)]
    pub match_date: Option<String>,
    #[serde(default)]
    pub match_time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub home_team_id: String,
    pub away_team_id: String,
    #[serde(default)]
    pub winner_team_id: Option<String>,
    #[serde(default)]
    pub lines: Vec<SnapshotLine>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LeagueSnapshot {
    #[serde(default)]
    pub teams: Vec<TeamRow>,
    /// Raw person rows so browser-only columns (email, birthday) survive.
    #[serde(default)]
    pub people: Vec<RawRow>,
    #[serde(default)]
    pub memberships: Vec<SnapshotMembership>,
    #[serde(default)]
    pub matches: Vec<SnapshotMatch>,
    /// Pre-aggregated `team_standings` view rows.
    #[serde(default)]
    pub standings: Vec<RawRow>,
}

impl LeagueSnapshot {
    pub fn from_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn embedded_demo() -> Self {
        // The embedded snapshot ships with the binary; a parse failure is a
        // packaging bug, surfaced loudly in debug builds and as an empty
        // league otherwise.
        match Self::from_str(EMBEDDED_DEMO_JSON) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                debug_assert!(false, "embedded demo snapshot invalid: {err}");
                log::error!("embedded demo snapshot invalid: {err}");
                Self::default()
            }
        }
    }

    pub fn teams(&self) -> Vec<TeamRow> {
        let mut teams = self.teams.clone();
        teams.sort_by(|a, b| a.name.cmp(&b.name));
        teams
    }

    fn person(&self, person_id: &str) -> Option<PersonRow> {
        self.people
            .iter()
            .find(|row| row.get("id").map(value_matches_id(person_id)).unwrap_or(false))
            .and_then(|row| serde_json::from_value(Value::Object(row.clone())).ok())
    }

    fn person_relation(&self, person_id: Option<&str>) -> Relation<PersonRow> {
        person_id
            .and_then(|id| self.person(id))
            .map_or(Relation::Empty, Relation::One)
    }

    pub fn roster(&self, team_id: &str) -> Vec<Relation<PersonRow>> {
        let mut memberships: Vec<&SnapshotMembership> = self
            .memberships
            .iter()
            .filter(|m| m.team_id == team_id)
            .collect();
        memberships.sort_by(|a, b| a.person_id.cmp(&b.person_id));
        memberships
            .iter()
            .map(|m| self.person_relation(Some(&m.person_id)))
            .collect()
    }

    fn team_relation(&self, team_id: &str) -> Relation<TeamRow> {
        self.teams
            .iter()
            .find(|t| t.id == team_id)
            .cloned()
            .map_or(Relation::Empty, Relation::One)
    }

    /// Assemble the embedded match → line → game tree for one team, newest
    /// first, the way the hosted store would return it.
    pub fn match_history(&self, team_id: &str) -> Vec<MatchHistoryRow> {
        let mut matches: Vec<&SnapshotMatch> = self
            .matches
            .iter()
            .filter(|m| m.home_team_id == team_id || m.away_team_id == team_id)
            .collect();
        matches.sort_by(|a, b| {
            (b.match_date.as_deref(), b.match_time.as_deref())
                .cmp(&(a.match_date.as_deref(), a.match_time.as_deref()))
        });

        matches
            .into_iter()
            .map(|m| MatchHistoryRow {
                id: m.id.clone(),
                match_date: m.match_date.clone(),
                match_time: m.match_time.clone(),
                location: m.location.clone(),
                home_team_id: m.home_team_id.clone(),
                away_team_id: m.away_team_id.clone(),
                winner_team_id: m.winner_team_id.clone(),
                home_team: self.team_relation(&m.home_team_id),
                away_team: self.team_relation(&m.away_team_id),
                match_line: Relation::Many(m.lines.iter().map(|l| self.line_row(l)).collect()),
            })
            .collect()
    }

    fn line_row(&self, line: &SnapshotLine) -> MatchLineRow {
        MatchLineRow {
            id: line.id.clone(),
            line_number: Some(line.line_number),
            winner_team_id: line.winner_team_id.clone(),
            home_player1: self.person_relation(line.home_player1.as_deref()),
            home_player2: self.person_relation(line.home_player2.as_deref()),
            away_player1: self.person_relation(line.away_player1.as_deref()),
            away_player2: self.person_relation(line.away_player2.as_deref()),
            line_game: Relation::Many(
                line.games
                    .iter()
                    .map(|g| LineGameRow {
                        id: Some(g.id.clone()),
                        home_score: g.home_score.clone(),
                        away_score: g.away_score.clone(),
                    })
                    .collect(),
            ),
        }
    }

    pub fn standings_rows(&self) -> Vec<RawRow> {
        self.standings.clone()
    }

    /// Project raw rows for the table browser out of the snapshot's
    /// relational data.
    pub fn table_rows(&self, table: &str, limit: u32) -> Vec<RawRow> {
        let mut rows: Vec<RawRow> = match table {
            "team" => self
                .teams
                .iter()
                .map(|t| as_row(json!({"id": t.id, "name": t.name, "location": t.location})))
                .collect(),
            "person" => self.people.clone(),
            "team_membership" => self
                .memberships
                .iter()
                .map(|m| {
                    as_row(json!({
                        "id": m.id,
                        "team_id": m.team_id,
                        "person_id": m.person_id,
                        "role": m.role
                    }))
                })
                .collect(),
            "match" => self
                .matches
                .iter()
                .map(|m| {
                    as_row(json!({
                        "id": m.id,
                        "match_date": m.match_date,
                        "match_time": m.match_time,
                        "home_team_id": m.home_team_id,
                        "away_team_id": m.away_team_id,
                        "winner_team_id": m.winner_team_id,
                        "location": m.location
                    }))
                })
                .collect(),
            "match_line" => self
                .matches
                .iter()
                .flat_map(|m| m.lines.iter().map(move |l| (m, l)))
                .map(|(m, l)| {
                    as_row(json!({
                        "id": l.id,
                        "match_id": m.id,
                        "line_number": l.line_number,
                        "home_player1": l.home_player1,
                        "home_player2": l.home_player2,
                        "away_player1": l.away_player1,
                        "away_player2": l.away_player2,
                        "winner_team_id": l.winner_team_id
                    }))
                })
                .collect(),
            "line_game" => self
                .matches
                .iter()
                .flat_map(|m| m.lines.iter())
                .flat_map(|l| l.games.iter().map(move |g| (l, g)))
                .map(|(l, g)| {
                    as_row(json!({
                        "id": g.id,
                        "line_id": l.id,
                        "game_number": g.game_number,
                        "home_score": g.home_score,
                        "away_score": g.away_score
                    }))
                })
                .collect(),
            "team_standings" => self.standings.clone(),
            _ => Vec::new(),
        };

        if let Some(descriptor) = crate::tables::descriptor_for(table) {
            rows.sort_by(|a, b| {
                for order in descriptor.order_by {
                    let cmp = cmp_cells(a.get(order.column), b.get(order.column));
                    let cmp = if order.ascending { cmp } else { cmp.reverse() };
                    if cmp != Ordering::Equal {
                        return cmp;
                    }
                }
                Ordering::Equal
            });
        }
        rows.truncate(limit as usize);
        rows
    }
}

fn as_row(value: Value) -> RawRow {
    match value {
        Value::Object(map) => map,
        _ => RawRow::new(),
    }
}

fn value_matches_id(wanted: &str) -> impl Fn(&Value) -> bool + '_ {
    move |value| match value {
        Value::String(s) => s == wanted,
        Value::Number(n) => n.to_string() == wanted,
        _ => false,
    }
}

fn cmp_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_demo_parses_and_has_a_full_league() {
        let snapshot = LeagueSnapshot::embedded_demo();
        assert!(snapshot.teams.len() >= 2);
        assert!(!snapshot.matches.is_empty());
        assert!(!snapshot.standings.is_empty());

        // Every membership and line slot must point at a known person.
        for membership in &snapshot.memberships {
            assert!(
                snapshot.person(&membership.person_id).is_some(),
                "dangling person {}",
                membership.person_id
            );
        }
    }

    #[test]
    fn history_is_filtered_and_sorted_newest_first() {
        let snapshot = LeagueSnapshot::embedded_demo();
        let team_id = snapshot.teams[0].id.clone();
        let rows = snapshot.match_history(&team_id);
        assert!(!rows.is_empty());
        for pair in rows.windows(2) {
            assert!(pair[0].match_date >= pair[1].match_date);
        }
        for row in &rows {
            assert!(row.home_team_id == team_id || row.away_team_id == team_id);
        }
    }

    #[test]
    fn table_projection_honors_the_limit() {
        let snapshot = LeagueSnapshot::embedded_demo();
        let rows = snapshot.table_rows("line_game", 2);
        assert_eq!(rows.len(), 2);
        assert!(snapshot.table_rows("no_such_table", 10).is_empty());
    }
}
