use crate::rest::{
    GameInsert, InsertedLineRow, InsertedMatchRow, LineInsert, MatchHistoryRow, MatchInsert,
    MembershipRow, RawRow, TeamRow, coerce_float, coerce_identifier, coerce_int, coerce_string,
};
use crate::snapshot::LeagueSnapshot;
use crate::tables::TableDescriptor;
use crate::{Player, StandingRecord, Team, format_full_name};
use reqwest::Client;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const ENV_DB_URL: &str = "COURTSIDE_DB_URL";
pub const ENV_DB_KEY: &str = "COURTSIDE_DB_KEY";
pub const ENV_SNAPSHOT_JSON: &str = "COURTSIDE_SNAPSHOT_JSON";

/// Embedded select for one team's match history: the full match → line → game
/// tree plus both team rows, resolved server-side in a single request.
const MATCH_HISTORY_SELECT: &str = "id,match_date,match_time,location,home_team_id,away_team_id,\
     winner_team_id,home_team:home_team_id(id,name,location),\
     away_team:away_team_id(id,name,location),\
     match_line(id,line_number,winner_team_id,\
     home_player1:home_player1(id,first_name,last_name),\
     home_player2:home_player2(id,first_name,last_name),\
     away_player1:away_player1(id,first_name,last_name),\
     away_player2:away_player2(id,first_name,last_name),\
     line_game(id,home_score,away_score))";

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    NotFound(String),
    ReadOnly(String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::ReadOnly(msg) => write!(f, "Read-only backend: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

/// Where the league data comes from: a hosted PostgREST endpoint, or a local
/// read-only snapshot.
#[derive(Debug, Clone)]
enum Backend {
    Rest { base_url: String, api_key: String },
    Snapshot(LeagueSnapshot),
}

/// League store client.
///
/// Backend selection (`from_env`):
/// 1) `COURTSIDE_SNAPSHOT_JSON`: load a local snapshot file, read-only.
/// 2) `COURTSIDE_DB_URL` + `COURTSIDE_DB_KEY`: hosted PostgREST endpoint.
/// 3) Embedded demo league, the last-resort offline fallback, read-only.
#[derive(Debug, Clone)]
pub struct LeagueDb {
    client: Client,
    backend: Backend,
    timeout: Duration,
}

// ---------------------------------------------------------------------------
// Match submission arguments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SaveGameArgs {
    pub game_number: u32,
    pub home_score: i64,
    pub away_score: i64,
}

#[derive(Debug, Clone, Default)]
pub struct SaveLineArgs {
    pub line_number: u32,
    pub home_player1: String,
    pub home_player2: String,
    pub away_player1: String,
    pub away_player2: String,
    pub winner_team_id: Option<String>,
    pub games: Vec<SaveGameArgs>,
}

#[derive(Debug, Clone, Default)]
pub struct SaveMatchArgs {
    pub home_team_id: String,
    pub away_team_id: String,
    pub match_date: String,
    pub match_time: String,
    pub location: String,
    pub winner_team_id: Option<String>,
    pub lines: Vec<SaveLineArgs>,
}

impl LeagueDb {
    pub fn rest(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            backend: Backend::Rest {
                base_url: base_url.into().trim_end_matches('/').to_owned(),
                api_key: api_key.into(),
            },
            timeout: Duration::from_secs(10),
        }
    }

    pub fn snapshot(snapshot: LeagueSnapshot) -> Self {
        Self {
            client: http_client(),
            backend: Backend::Snapshot(snapshot),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn from_env() -> Self {
        if let Ok(path) = std::env::var(ENV_SNAPSHOT_JSON)
            && !path.trim().is_empty()
        {
            match std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|raw| LeagueSnapshot::from_str(&raw).map_err(|e| e.to_string()))
            {
                Ok(snapshot) => {
                    log::info!("using league snapshot from {path}");
                    return Self::snapshot(snapshot);
                }
                Err(err) => log::warn!("ignoring {ENV_SNAPSHOT_JSON}={path}: {err}"),
            }
        }

        let url = std::env::var(ENV_DB_URL).unwrap_or_default();
        let key = std::env::var(ENV_DB_KEY).unwrap_or_default();
        if !url.trim().is_empty() && !key.trim().is_empty() {
            return Self::rest(url.trim(), key.trim());
        }

        log::info!("no endpoint configured; using embedded demo league (read-only)");
        Self::snapshot(LeagueSnapshot::embedded_demo())
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self.backend, Backend::Snapshot(_))
    }

    /// All teams, ordered by name.
    pub async fn fetch_teams(&self) -> ApiResult<Vec<Team>> {
        let rows = match &self.backend {
            Backend::Snapshot(snapshot) => snapshot.teams(),
            Backend::Rest { .. } => {
                self.get_rows::<TeamRow>(
                    "team",
                    &[("select", "id,name,location"), ("order", "name.asc")],
                )
                .await?
            }
        };
        Ok(rows.into_iter().map(team_from_row).collect())
    }

    /// Players on one team, via the membership table with the person embedded.
    pub async fn fetch_roster(&self, team_id: &str) -> ApiResult<Vec<Player>> {
        let people = match &self.backend {
            Backend::Snapshot(snapshot) => snapshot.roster(team_id),
            Backend::Rest { .. } => {
                let filter = format!("eq.{team_id}");
                let rows = self
                    .get_rows::<MembershipRow>(
                        "team_membership",
                        &[
                            ("select", "person:person_id(id,first_name,last_name)"),
                            ("team_id", &filter),
                        ],
                    )
                    .await?;
                rows.into_iter().map(|row| row.person).collect()
            }
        };

        let mut players: Vec<Player> = people
            .into_iter()
            .filter_map(|relation| relation.take_first())
            .map(|person| Player {
                id: person.id,
                full_name: format_full_name(
                    person.first_name.as_deref(),
                    person.last_name.as_deref(),
                ),
            })
            .collect();
        players.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(players)
    }

    /// Rows of the `team_standings` view, best team first.
    pub async fn fetch_standings(&self) -> ApiResult<Vec<StandingRecord>> {
        let rows = match &self.backend {
            Backend::Snapshot(snapshot) => snapshot.standings_rows(),
            Backend::Rest { .. } => {
                self.get_rows::<RawRow>(
                    "team_standings",
                    &[
                        ("select", "*"),
                        ("order", "total_points.desc"),
                        ("limit", "100"),
                    ],
                )
                .await?
            }
        };

        let mut records: Vec<StandingRecord> = rows.iter().map(standing_from_row).collect();
        records.sort_by(|a, b| b.total_points.unwrap_or(0).cmp(&a.total_points.unwrap_or(0)));
        Ok(records)
    }

    /// Match rows for one team (home or away), newest first, with the full
    /// line → game tree embedded.
    pub async fn fetch_match_history(&self, team_id: &str) -> ApiResult<Vec<MatchHistoryRow>> {
        match &self.backend {
            Backend::Snapshot(snapshot) => Ok(snapshot.match_history(team_id)),
            Backend::Rest { .. } => {
                let side_filter = format!("(home_team_id.eq.{team_id},away_team_id.eq.{team_id})");
                self.get_rows::<MatchHistoryRow>(
                    "match",
                    &[
                        ("select", MATCH_HISTORY_SELECT),
                        ("or", &side_filter),
                        ("order", "match_date.desc,match_time.desc"),
                    ],
                )
                .await
            }
        }
    }

    /// Raw rows for the table browser, per the descriptor's column selection,
    /// ordering, and row cap.
    pub async fn fetch_table_rows(&self, table: &TableDescriptor) -> ApiResult<Vec<RawRow>> {
        match &self.backend {
            Backend::Snapshot(snapshot) => Ok(snapshot.table_rows(table.name, table.limit)),
            Backend::Rest { .. } => {
                let select = table.columns.join(",");
                let order = table
                    .order_by
                    .iter()
                    .map(|o| {
                        format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" })
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                let limit = table.limit.to_string();
                self.get_rows::<RawRow>(
                    table.name,
                    &[("select", &select), ("order", &order), ("limit", &limit)],
                )
                .await
            }
        }
    }

    /// Persist a completed match as a three-step insert chain:
    /// match row first, then its lines, then every game keyed by the
    /// returned line ids. Returns the new match id.
    ///
    /// Known gap: the chain is not transactional. A failure after the first
    /// insert leaves a partial match behind; no compensating delete is issued.
    pub async fn save_match(&self, args: SaveMatchArgs) -> ApiResult<String> {
        if self.is_read_only() {
            return Err(ApiError::ReadOnly(
                "the snapshot backend cannot record matches".into(),
            ));
        }

        let match_rows: Vec<InsertedMatchRow> = self
            .post_rows(
                "match",
                &MatchInsert {
                    home_team_id: args.home_team_id.clone(),
                    away_team_id: args.away_team_id.clone(),
                    match_date: args.match_date.clone(),
                    match_time: args.match_time.clone(),
                    location: args.location.clone(),
                    winner_team_id: args.winner_team_id.clone(),
                },
            )
            .await?;
        let match_id = match_rows
            .into_iter()
            .next()
            .map(|row| row.id)
            .ok_or_else(|| ApiError::Other("match insert returned no row".into()))?;

        let line_payload: Vec<LineInsert> = args
            .lines
            .iter()
            .map(|line| LineInsert {
                match_id: match_id.clone(),
                line_number: line.line_number,
                home_player1: line.home_player1.clone(),
                home_player2: line.home_player2.clone(),
                away_player1: line.away_player1.clone(),
                away_player2: line.away_player2.clone(),
                winner_team_id: line.winner_team_id.clone(),
            })
            .collect();
        let inserted_lines: Vec<InsertedLineRow> =
            self.post_rows("match_line", &line_payload).await?;

        let line_ids: HashMap<u32, String> = inserted_lines
            .into_iter()
            .map(|row| (row.line_number, row.id))
            .collect();

        let mut game_payload: Vec<GameInsert> = Vec::new();
        for line in &args.lines {
            let line_id = line_ids.get(&line.line_number).ok_or_else(|| {
                ApiError::Other(format!(
                    "Line mapping mismatch for line {}",
                    line.line_number
                ))
            })?;
            for game in &line.games {
                game_payload.push(GameInsert {
                    line_id: line_id.clone(),
                    game_number: game.game_number,
                    home_score: game.home_score,
                    away_score: game.away_score,
                });
            }
        }
        if !game_payload.is_empty() {
            let _: Vec<RawRow> = self.post_rows("line_game", &game_payload).await?;
        }

        Ok(match_id)
    }

    // -----------------------------------------------------------------------
    // PostgREST plumbing
    // -----------------------------------------------------------------------

    fn rest_credentials(&self) -> ApiResult<(&str, &str)> {
        match &self.backend {
            Backend::Rest { base_url, api_key } => Ok((base_url, api_key)),
            Backend::Snapshot(_) => Err(ApiError::Other(
                "snapshot backend has no REST endpoint".into(),
            )),
        }
    }

    async fn get_rows<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<Vec<T>> {
        let (base_url, api_key) = self.rest_credentials()?;
        let url = format!("{base_url}/rest/v1/{table}");
        let response = self
            .client
            .get(&url)
            .query(query)
            .header("apikey", api_key)
            .header("Authorization", format!("Bearer {api_key}"))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;

        match response.error_for_status() {
            Ok(res) => res
                .json::<Vec<T>>()
                .await
                .map_err(|e| ApiError::Parsing(e, url)),
            Err(e) => Err(ApiError::Api(e, url)),
        }
    }

    async fn post_rows<B: serde::Serialize + ?Sized, T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> ApiResult<Vec<T>> {
        let (base_url, api_key) = self.rest_credentials()?;
        let url = format!("{base_url}/rest/v1/{table}");
        let response = self
            .client
            .post(&url)
            .header("apikey", api_key)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Prefer", "return=representation")
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;

        match response.error_for_status() {
            Ok(res) => res
                .json::<Vec<T>>()
                .await
                .map_err(|e| ApiError::Parsing(e, url)),
            Err(e) => Err(ApiError::Api(e, url)),
        }
    }
}

fn http_client() -> Client {
    Client::builder()
        .user_agent("courtside/0.1 (terminal league viewer)")
        .build()
        .unwrap_or_default()
}

fn team_from_row(row: TeamRow) -> Team {
    Team {
        name: row.name.unwrap_or_else(|| format!("Team {}", row.id)),
        id: row.id,
        location: row.location,
    }
}

/// The standings view is external; coerce every cell type-tolerantly rather
/// than failing the whole fetch on one odd row.
fn standing_from_row(row: &RawRow) -> StandingRecord {
    StandingRecord {
        team_id: coerce_identifier(row, &["team_id", "id"]),
        team_name: row
            .get("team_name")
            .or_else(|| row.get("name"))
            .and_then(coerce_string)
            .unwrap_or_else(|| "Unknown team".into()),
        matches_won: row.get("matches_won").and_then(coerce_int),
        matches_lost: row.get("matches_lost").and_then(coerce_int),
        win_percentage: row.get("win_percentage").and_then(coerce_float),
        total_points: row.get("total_points").and_then(coerce_int),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rest_db(server: &mockito::ServerGuard) -> LeagueDb {
        LeagueDb::rest(server.url(), "test-key")
    }

    #[tokio::test]
    async fn teams_are_fetched_and_named() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/team")
            .match_query(mockito::Matcher::Any)
            .match_header("apikey", "test-key")
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {"id": 2, "name": "Alpine Rally Club", "location": null},
                    {"id": "t9", "name": null}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let teams = rest_db(&server).fetch_teams().await.unwrap();
        mock.assert_async().await;
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].id, "2");
        assert_eq!(teams[0].name, "Alpine Rally Club");
        assert_eq!(teams[1].name, "Team t9");
    }

    #[tokio::test]
    async fn roster_flattens_memberships_into_sorted_players() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/v1/team_membership")
            .match_query(mockito::Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {"person": {"id": "p2", "first_name": "Zoe", "last_name": "Adler"}},
                    {"person": {"id": "p1", "first_name": "Ada", "last_name": "Kovacs"}},
                    {"person": null}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let players = rest_db(&server).fetch_roster("t1").await.unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].full_name, "Ada Kovacs");
        assert_eq!(players[1].full_name, "Zoe Adler");
    }

    #[tokio::test]
    async fn standings_rows_are_sanitized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/v1/team_standings")
            .match_query(mockito::Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {"team_id": 4, "matches_won": "3", "total_points": 11, "win_percentage": "0.75"},
                    {"team_id": "t1", "team_name": "Harborview Smashers", "total_points": 20}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let standings = rest_db(&server).fetch_standings().await.unwrap();
        assert_eq!(standings.len(), 2);
        // Re-sorted by points even if the server disagrees.
        assert_eq!(standings[0].team_name, "Harborview Smashers");
        assert_eq!(standings[1].team_id.as_deref(), Some("4"));
        assert_eq!(standings[1].team_name, "Unknown team");
        assert_eq!(standings[1].matches_won, Some(3));
        assert_eq!(standings[1].win_percentage, Some(0.75));
    }

    #[tokio::test]
    async fn server_errors_surface_as_api_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/v1/team")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let err = rest_db(&server).fetch_teams().await.unwrap_err();
        assert!(matches!(err, ApiError::Api(_, _)), "got {err}");
    }

    fn one_line_args() -> SaveMatchArgs {
        SaveMatchArgs {
            home_team_id: "t1".into(),
            away_team_id: "t2".into(),
            match_date: "2025-05-01".into(),
            match_time: "19:00".into(),
            location: "Center Court".into(),
            winner_team_id: Some("t1".into()),
            lines: vec![SaveLineArgs {
                line_number: 1,
                home_player1: "p1".into(),
                home_player2: "p2".into(),
                away_player1: "p5".into(),
                away_player2: "p6".into(),
                winner_team_id: Some("t1".into()),
                games: vec![
                    SaveGameArgs { game_number: 1, home_score: 6, away_score: 3 },
                    SaveGameArgs { game_number: 2, home_score: 6, away_score: 4 },
                ],
            }],
        }
    }

    #[tokio::test]
    async fn save_match_chains_match_lines_and_games() {
        let mut server = mockito::Server::new_async().await;
        let match_mock = server
            .mock("POST", "/rest/v1/match")
            .match_header("prefer", "return=representation")
            .with_header("content-type", "application/json")
            .with_body(json!([{"id": "m9"}]).to_string())
            .create_async()
            .await;
        let line_mock = server
            .mock("POST", "/rest/v1/match_line")
            .match_body(mockito::Matcher::PartialJson(json!([
                {"match_id": "m9", "line_number": 1}
            ])))
            .with_header("content-type", "application/json")
            .with_body(json!([{"id": "l7", "line_number": 1}]).to_string())
            .create_async()
            .await;
        let game_mock = server
            .mock("POST", "/rest/v1/line_game")
            .match_body(mockito::Matcher::PartialJson(json!([
                {"line_id": "l7", "game_number": 1, "home_score": 6, "away_score": 3},
                {"line_id": "l7", "game_number": 2, "home_score": 6, "away_score": 4}
            ])))
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let match_id = rest_db(&server).save_match(one_line_args()).await.unwrap();
        assert_eq!(match_id, "m9");
        match_mock.assert_async().await;
        line_mock.assert_async().await;
        game_mock.assert_async().await;
    }

    #[tokio::test]
    async fn save_match_rejects_unmapped_lines() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rest/v1/match")
            .with_header("content-type", "application/json")
            .with_body(json!([{"id": "m9"}]).to_string())
            .create_async()
            .await;
        // Store echoes back a different line_number than the one sent.
        server
            .mock("POST", "/rest/v1/match_line")
            .with_header("content-type", "application/json")
            .with_body(json!([{"id": "l7", "line_number": 4}]).to_string())
            .create_async()
            .await;

        let err = rest_db(&server).save_match(one_line_args()).await.unwrap_err();
        assert!(
            err.to_string().contains("Line mapping mismatch for line 1"),
            "got {err}"
        );
    }

    #[tokio::test]
    async fn snapshot_backend_is_read_only() {
        let db = LeagueDb::snapshot(LeagueSnapshot::embedded_demo());
        assert!(db.is_read_only());

        let teams = db.fetch_teams().await.unwrap();
        assert!(teams.len() >= 2);
        let standings = db.fetch_standings().await.unwrap();
        for pair in standings.windows(2) {
            assert!(pair[0].total_points.unwrap_or(0) >= pair[1].total_points.unwrap_or(0));
        }

        let err = db.save_match(one_line_args()).await.unwrap_err();
        assert!(matches!(err, ApiError::ReadOnly(_)), "got {err}");
    }
}
