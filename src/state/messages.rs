use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use league_api::client::SaveMatchArgs;
use league_api::rest::RawRow;
use league_api::{MatchHistoryEntry, Player, StandingRecord, Team};

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    LoadTeams,
    LoadStandings,
    /// `generation` echoes back in the response so the UI can drop replies
    /// to requests it has since superseded.
    LoadRoster { team_id: String, generation: u64 },
    LoadMatchHistory { team_id: String, generation: u64 },
    LoadTableRows { table: &'static str },
    LoadAutofill,
    SaveMatch { args: SaveMatchArgs },
}

/// Which operation a response (or failure) belongs to. Errors are routed per
/// source: list fetches keep stale data with a warning, submissions unlock
/// the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Teams,
    Standings,
    Roster,
    MatchHistory,
    TableRows,
    Autofill,
    SaveMatch,
}

/// Everything needed to pre-populate the entry form with a plausible match.
#[derive(Debug, Clone)]
pub struct AutofillSetup {
    pub home_team: Team,
    pub away_team: Team,
    pub home_roster: Vec<Player>,
    pub away_roster: Vec<Player>,
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    TeamsLoaded { teams: Vec<Team> },
    StandingsLoaded { standings: Vec<StandingRecord> },
    RosterLoaded { team_id: String, players: Vec<Player>, generation: u64 },
    MatchHistoryLoaded { team_id: String, entries: Vec<MatchHistoryEntry>, generation: u64 },
    TableRowsLoaded { table: &'static str, rows: Vec<RawRow> },
    AutofillReady { setup: AutofillSetup },
    MatchSaved { match_id: String },
    Error { source: RequestKind, message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
}
