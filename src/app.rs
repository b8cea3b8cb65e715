use crate::state::app_settings::AppSettings;
use crate::state::app_state::AppState;
use crate::state::messages::{AutofillSetup, NetworkRequest, RequestKind};
use league_api::rest::RawRow;
use league_api::{MatchHistoryEntry, Player, StandingRecord, Team};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Standings,
    Rosters,
    History,
    MatchEntry,
    Tables,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new() -> Self {
        let settings = AppSettings::load();

        let app = Self {
            state: AppState::new(),
            settings,
        };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_teams_loaded(&mut self, teams: Vec<Team>) {
        self.state.last_error = None;
        if let Some(wanted) = self.settings.default_team.as_deref()
            && let Some(idx) = teams.iter().position(|t| t.id == wanted || t.name == wanted)
        {
            self.state.roster.team_index = idx;
            self.state.history.team_index = idx;
        }
        self.state.teams = teams;
        self.state.teams_loaded = true;
    }

    pub fn on_standings_loaded(&mut self, standings: Vec<StandingRecord>) {
        self.state.standings.records = standings;
        self.state.standings.loaded = true;
        self.state.standings.warning = None;
    }

    /// Responses race when the user flips through teams quickly. Only the
    /// response matching the latest dispatched generation is applied.
    pub fn on_roster_loaded(&mut self, team_id: String, players: Vec<Player>, generation: u64) {
        if generation != self.state.roster.generation {
            log::debug!("dropping stale roster response for {team_id} (gen {generation})");
            return;
        }
        self.state.entry.roster_cache.insert(team_id.clone(), players.clone());
        self.state.roster.players = players;
        self.state.roster.loaded_team = Some(team_id);
        self.state.roster.warning = None;
    }

    pub fn on_history_loaded(
        &mut self,
        team_id: String,
        entries: Vec<MatchHistoryEntry>,
        generation: u64,
    ) {
        if generation != self.state.history.generation {
            log::debug!("dropping stale history response for {team_id} (gen {generation})");
            return;
        }
        self.state.history.entries = entries;
        self.state.history.loaded_team = Some(team_id);
        self.state.history.warning = None;
        self.state.history.expanded = None;
    }

    pub fn on_table_rows_loaded(&mut self, table: &'static str, rows: Vec<RawRow>) {
        // The user may have flipped to another table while this was in flight.
        if table != self.state.tables.descriptor().name {
            log::debug!("dropping stale rows for table {table}");
            return;
        }
        self.state.tables.rows = rows;
        self.state.tables.loaded_table = Some(table);
        self.state.tables.warning = None;
    }

    pub fn on_autofill_ready(&mut self, setup: AutofillSetup) {
        self.state.entry.apply_autofill(setup);
    }

    /// A saved match makes the standings and the affected team histories
    /// stale. Returns the follow-up refresh to dispatch.
    pub fn on_match_saved(&mut self, match_id: String) -> NetworkRequest {
        log::info!("match {match_id} saved");
        self.state.entry.on_saved(&match_id);
        self.state.standings.loaded = false;
        self.state.history.loaded_team = None;
        NetworkRequest::LoadStandings
    }

    /// Failures are routed by what was being fetched: list refreshes keep
    /// their stale rows and degrade to a warning, a failed save unlocks the
    /// form, anything else blocks.
    pub fn on_network_error(&mut self, source: RequestKind, message: String) {
        match source {
            RequestKind::Standings => self.state.standings.warning = Some(message),
            RequestKind::Roster => self.state.roster.warning = Some(message),
            RequestKind::MatchHistory => self.state.history.warning = Some(message),
            RequestKind::TableRows => self.state.tables.warning = Some(message),
            RequestKind::SaveMatch => self.state.entry.on_save_failed(message),
            RequestKind::Autofill => {
                self.state.entry.is_autofilling = false;
                self.state.entry.errors = vec![message];
            }
            RequestKind::Teams => self.state.last_error = Some(message),
        }
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    /// Switch tabs, returning the lazy-load request the new tab needs.
    pub fn update_tab(&mut self, next: MenuItem) -> Option<NetworkRequest> {
        if self.state.active_tab == next {
            return None;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
        match next {
            MenuItem::Standings if !self.state.standings.loaded => {
                Some(NetworkRequest::LoadStandings)
            }
            MenuItem::Rosters => self.dispatch_roster_if_stale(),
            MenuItem::History => self.dispatch_history_if_stale(),
            MenuItem::Tables if self.state.tables.loaded_table
                != Some(self.state.tables.descriptor().name) =>
            {
                Some(self.dispatch_table_rows())
            }
            _ => None,
        }
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    // -----------------------------------------------------------------------
    // Fetch dispatch. Each roster/history dispatch bumps the generation so
    // older in-flight responses can be recognized and dropped
    // -----------------------------------------------------------------------

    pub fn dispatch_roster(&mut self) -> Option<NetworkRequest> {
        let team_id = self.state.team_at(self.state.roster.team_index)?.id.clone();
        self.state.roster.generation += 1;
        Some(NetworkRequest::LoadRoster {
            team_id,
            generation: self.state.roster.generation,
        })
    }

    pub fn dispatch_history(&mut self) -> Option<NetworkRequest> {
        let team_id = self.state.team_at(self.state.history.team_index)?.id.clone();
        self.state.history.generation += 1;
        Some(NetworkRequest::LoadMatchHistory {
            team_id,
            generation: self.state.history.generation,
        })
    }

    pub fn dispatch_table_rows(&mut self) -> NetworkRequest {
        NetworkRequest::LoadTableRows {
            table: self.state.tables.descriptor().name,
        }
    }

    fn dispatch_roster_if_stale(&mut self) -> Option<NetworkRequest> {
        let current = self.state.team_at(self.state.roster.team_index)?.id.clone();
        if self.state.roster.loaded_team.as_deref() == Some(current.as_str()) {
            return None;
        }
        self.dispatch_roster()
    }

    fn dispatch_history_if_stale(&mut self) -> Option<NetworkRequest> {
        let current = self.state.team_at(self.state.history.team_index)?.id.clone();
        if self.state.history.loaded_team.as_deref() == Some(current.as_str()) {
            return None;
        }
        self.dispatch_history()
    }

    // -----------------------------------------------------------------------
    // Per-tab navigation
    // -----------------------------------------------------------------------

    pub fn roster_cycle_team(&mut self, delta: isize) -> Option<NetworkRequest> {
        let count = self.state.teams.len();
        if !self.state.roster.cycle_team(delta, count) {
            return None;
        }
        self.dispatch_roster()
    }

    pub fn history_cycle_team(&mut self, delta: isize) -> Option<NetworkRequest> {
        let count = self.state.teams.len();
        if !self.state.history.cycle_team(delta, count) {
            return None;
        }
        self.dispatch_history()
    }

    pub fn tables_cycle(&mut self, delta: isize) -> Option<NetworkRequest> {
        if !self.state.tables.cycle_table(delta) {
            return None;
        }
        Some(self.dispatch_table_rows())
    }

    /// Enter on the history tab toggles the line breakdown for the match
    /// under the cursor. History rows keep their stored newest-first order,
    /// so the cursor indexes `entries` directly.
    pub fn history_toggle_selected(&mut self) {
        let cursor = self.state.history.table.cursor;
        if cursor < self.state.history.entries.len() {
            self.state.history.toggle_expanded(cursor);
        }
    }

    pub fn dismiss_error(&mut self) {
        self.state.last_error = None;
    }

    /// Manual refresh of whatever the active tab shows.
    pub fn refresh_active_tab(&mut self) -> Option<NetworkRequest> {
        match self.state.active_tab {
            MenuItem::Standings => Some(NetworkRequest::LoadStandings),
            MenuItem::Rosters => self.dispatch_roster(),
            MenuItem::History => self.dispatch_history(),
            MenuItem::Tables => Some(self.dispatch_table_rows()),
            MenuItem::MatchEntry | MenuItem::Help => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::messages::NetworkRequest;

    fn app_with_teams(ids: &[&str]) -> App {
        let mut app = App {
            settings: AppSettings::default(),
            state: AppState::new(),
        };
        app.on_teams_loaded(
            ids.iter()
                .map(|id| Team { id: id.to_string(), name: id.to_uppercase(), location: None })
                .collect(),
        );
        app
    }

    fn player(id: &str) -> Player {
        Player { id: id.into(), full_name: id.to_uppercase() }
    }

    #[test]
    fn stale_roster_responses_are_dropped() {
        let mut app = app_with_teams(&["t1", "t2"]);

        let first = app.dispatch_roster();
        assert!(matches!(first, Some(NetworkRequest::LoadRoster { generation: 1, .. })));
        let second = app.roster_cycle_team(1);
        assert!(matches!(second, Some(NetworkRequest::LoadRoster { generation: 2, .. })));

        // The slow first response lands after the second dispatch.
        app.on_roster_loaded("t1".into(), vec![player("old")], 1);
        assert!(app.state.roster.players.is_empty(), "stale response must not apply");
        assert_eq!(app.state.roster.loaded_team, None);

        app.on_roster_loaded("t2".into(), vec![player("new")], 2);
        assert_eq!(app.state.roster.loaded_team.as_deref(), Some("t2"));
        assert_eq!(app.state.roster.players[0].id, "new");
    }

    #[test]
    fn stale_history_responses_are_dropped() {
        let mut app = app_with_teams(&["t1", "t2"]);

        let first = app.dispatch_history();
        assert!(matches!(first, Some(NetworkRequest::LoadMatchHistory { generation: 1, .. })));
        let second = app.history_cycle_team(1);
        assert!(matches!(second, Some(NetworkRequest::LoadMatchHistory { generation: 2, .. })));

        // The slow first response lands after the second dispatch.
        app.on_history_loaded(
            "t1".into(),
            vec![MatchHistoryEntry { id: "old".into(), ..Default::default() }],
            1,
        );
        assert!(app.state.history.entries.is_empty(), "stale response must not apply");
        assert_eq!(app.state.history.loaded_team, None);

        app.on_history_loaded(
            "t2".into(),
            vec![MatchHistoryEntry { id: "new".into(), ..Default::default() }],
            2,
        );
        assert_eq!(app.state.history.loaded_team.as_deref(), Some("t2"));
        assert_eq!(app.state.history.entries[0].id, "new");
    }

    #[test]
    fn switching_to_rosters_loads_once() {
        let mut app = app_with_teams(&["t1"]);

        let request = app.update_tab(MenuItem::Rosters);
        assert!(matches!(request, Some(NetworkRequest::LoadRoster { .. })));
        app.on_roster_loaded("t1".into(), vec![player("p1")], app.state.roster.generation);

        // Leaving and coming back with the same team selected refetches nothing.
        app.update_tab(MenuItem::Standings);
        assert!(app.update_tab(MenuItem::Rosters).is_none());
    }

    #[test]
    fn failed_refresh_keeps_stale_rows_and_warns() {
        let mut app = app_with_teams(&["t1"]);
        app.on_standings_loaded(vec![StandingRecord {
            team_name: "T1".into(),
            ..Default::default()
        }]);

        app.on_network_error(RequestKind::Standings, "connection refused".into());
        assert_eq!(app.state.standings.records.len(), 1, "stale rows survive the failure");
        assert_eq!(app.state.standings.warning.as_deref(), Some("connection refused"));
        assert!(app.state.last_error.is_none(), "refresh failures never block the app");
    }

    #[test]
    fn failed_save_unlocks_the_form() {
        let mut app = app_with_teams(&["t1", "t2"]);
        app.state.entry.is_submitting = true;

        app.on_network_error(RequestKind::SaveMatch, "insert rejected".into());
        assert!(!app.state.entry.is_submitting);
        assert_eq!(app.state.entry.errors, vec!["insert rejected".to_string()]);
    }

    #[test]
    fn saved_match_schedules_a_standings_refresh() {
        let mut app = app_with_teams(&["t1", "t2"]);
        app.state.standings.loaded = true;
        app.state.history.loaded_team = Some("t1".into());
        app.state.entry.is_submitting = true;

        let follow_up = app.on_match_saved("m9".into());
        assert!(matches!(follow_up, NetworkRequest::LoadStandings));
        assert!(!app.state.standings.loaded);
        assert_eq!(app.state.history.loaded_team, None);
        assert!(!app.state.entry.is_submitting);
    }

    #[test]
    fn default_team_preselects_roster_and_history() {
        let mut app = App {
            settings: AppSettings { default_team: Some("t3".into()), ..Default::default() },
            state: AppState::new(),
        };
        app.on_teams_loaded(
            ["t1", "t2", "t3"]
                .iter()
                .map(|id| Team { id: id.to_string(), name: id.to_uppercase(), location: None })
                .collect(),
        );
        assert_eq!(app.state.roster.team_index, 2);
        assert_eq!(app.state.history.team_index, 2);
    }

    #[test]
    fn stale_table_rows_for_another_table_are_dropped() {
        let mut app = app_with_teams(&["t1"]);
        app.update_tab(MenuItem::Tables);
        let before = app.state.tables.descriptor().name;
        app.tables_cycle(1);

        app.on_table_rows_loaded(before, vec![RawRow::new()]);
        assert!(app.state.tables.rows.is_empty(), "rows for the previous table must not apply");
    }
}
