use crate::app::MenuItem;
use crate::components::table::TableState;
use crate::state::entry::EntryState;
use league_api::rest::RawRow;
use league_api::tables::{DATABASE_TABLES, TableDescriptor};
use league_api::{MatchHistoryEntry, Player, StandingRecord, Team};

// ---------------------------------------------------------------------------
// Standings state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct StandingsState {
    pub records: Vec<StandingRecord>,
    pub loaded: bool,
    /// A failed refresh keeps the stale rows and shows this instead of
    /// blanking the tab.
    pub warning: Option<String>,
    pub table: TableState,
}

// ---------------------------------------------------------------------------
// Roster state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RosterState {
    /// Index into the shared team list.
    pub team_index: usize,
    pub players: Vec<Player>,
    /// Which team the current `players` belong to. `None` until the first
    /// load finishes.
    pub loaded_team: Option<String>,
    pub warning: Option<String>,
    /// Generation of the most recently dispatched roster fetch. Responses
    /// carrying an older generation are dropped.
    pub generation: u64,
    pub table: TableState,
}

impl RosterState {
    pub fn cycle_team(&mut self, delta: isize, team_count: usize) -> bool {
        if !cycle_index(&mut self.team_index, delta, team_count) {
            return false;
        }
        self.table.reset();
        true
    }
}

// ---------------------------------------------------------------------------
// Match history state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct HistoryState {
    pub team_index: usize,
    pub entries: Vec<MatchHistoryEntry>,
    pub loaded_team: Option<String>,
    pub warning: Option<String>,
    pub generation: u64,
    /// Row expanded to show its line-by-line breakdown, as an index into
    /// `entries`.
    pub expanded: Option<usize>,
    pub table: TableState,
}

impl HistoryState {
    pub fn cycle_team(&mut self, delta: isize, team_count: usize) -> bool {
        if !cycle_index(&mut self.team_index, delta, team_count) {
            return false;
        }
        self.table.reset();
        self.expanded = None;
        true
    }

    /// Toggle the drill-down on the match at `entry_index` (already mapped
    /// back through the sorted view).
    pub fn toggle_expanded(&mut self, entry_index: usize) {
        self.expanded = match self.expanded {
            Some(current) if current == entry_index => None,
            _ => Some(entry_index),
        };
    }
}

fn cycle_index(index: &mut usize, delta: isize, count: usize) -> bool {
    if count == 0 {
        return false;
    }
    let next = (*index as isize + delta).rem_euclid(count as isize) as usize;
    if next == *index {
        return false;
    }
    *index = next;
    true
}

// ---------------------------------------------------------------------------
// Raw tables state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct TablesState {
    /// Index into `DATABASE_TABLES`.
    pub selected: usize,
    pub rows: Vec<RawRow>,
    pub loaded_table: Option<&'static str>,
    pub warning: Option<String>,
    pub table: TableState,
}

impl TablesState {
    pub fn descriptor(&self) -> &'static TableDescriptor {
        &DATABASE_TABLES[self.selected.min(DATABASE_TABLES.len() - 1)]
    }

    pub fn cycle_table(&mut self, delta: isize) -> bool {
        if !cycle_index(&mut self.selected, delta, DATABASE_TABLES.len()) {
            return false;
        }
        self.rows.clear();
        self.table.reset();
        true
    }
}

// ---------------------------------------------------------------------------
// Root app state
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    /// Blocking failures (startup fetches, unexpected request errors). Tab
    /// refresh failures go to the per-view `warning` fields instead.
    pub last_error: Option<String>,
    /// Shared team list, loaded once at startup and reused by the roster,
    /// history, and entry tabs.
    pub teams: Vec<Team>,
    pub teams_loaded: bool,
    pub standings: StandingsState,
    pub roster: RosterState,
    pub history: HistoryState,
    pub tables: TablesState,
    pub entry: EntryState,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            entry: EntryState::new(),
            ..Self::default()
        }
    }

    pub fn team_at(&self, index: usize) -> Option<&Team> {
        self.teams.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: &str) -> Team {
        Team { id: id.into(), name: id.to_uppercase(), location: None }
    }

    #[test]
    fn cycling_teams_wraps_in_both_directions() {
        let mut roster = RosterState::default();
        assert!(roster.cycle_team(-1, 3));
        assert_eq!(roster.team_index, 2);
        assert!(roster.cycle_team(1, 3));
        assert_eq!(roster.team_index, 0);
        assert!(!roster.cycle_team(1, 0), "no teams, no movement");
    }

    #[test]
    fn cycling_a_single_team_is_a_no_op() {
        let mut history = HistoryState::default();
        history.expanded = Some(1);
        assert!(!history.cycle_team(1, 1));
        assert_eq!(history.expanded, Some(1), "no team change, keep the drill-down");
        assert!(history.cycle_team(1, 2));
        assert_eq!(history.expanded, None);
    }

    #[test]
    fn expanded_row_toggles_off_on_reselect() {
        let mut history = HistoryState::default();
        history.toggle_expanded(2);
        assert_eq!(history.expanded, Some(2));
        history.toggle_expanded(2);
        assert_eq!(history.expanded, None);
        history.toggle_expanded(0);
        history.toggle_expanded(1);
        assert_eq!(history.expanded, Some(1));
    }

    #[test]
    fn table_cycling_clears_stale_rows() {
        let mut tables = TablesState::default();
        tables.rows.push(RawRow::new());
        let first = tables.descriptor().name;
        assert!(tables.cycle_table(1));
        assert_ne!(tables.descriptor().name, first);
        assert!(tables.rows.is_empty());
    }

    #[test]
    fn team_lookup_by_index() {
        let mut state = AppState::new();
        state.teams = vec![team("t1"), team("t2")];
        assert_eq!(state.team_at(1).map(|t| t.id.as_str()), Some("t2"));
        assert!(state.team_at(5).is_none());
    }
}
