//! Match-entry form state. The scoring derivations themselves live in
//! `league_api::scoring`; this module owns the editable field grid, focus
//! movement, and the translation into a submission payload.

use crate::state::messages::AutofillSetup;
use league_api::client::{SaveGameArgs, SaveLineArgs, SaveMatchArgs};
use league_api::scoring::{
    self, DEFAULT_GAMES_PER_LINE, LineForm, MatchFormView, WinnerSide,
};
use league_api::{Player, Team};
use std::collections::HashMap;

pub const META_FIELDS: usize = 5;

/// Which editable cell the cursor sits on. Meta fields are one row above the
/// line grid; within a line, columns run home pair, away pair, game scores,
/// then the winner override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFocus {
    /// 0=home team, 1=away team, 2=date, 3=time, 4=location
    Meta(usize),
    Line { line: usize, col: usize },
}

impl Default for EntryFocus {
    fn default() -> Self {
        EntryFocus::Meta(0)
    }
}

#[derive(Debug, Default)]
pub struct EntryState {
    pub lines: Vec<LineForm>,
    pub home_team_id: String,
    pub away_team_id: String,
    pub match_date: String,
    pub match_time: String,
    pub location: String,
    pub focus: EntryFocus,
    /// Validation problems from the last submit attempt; cleared on edit.
    pub errors: Vec<String>,
    /// Submit guard: while a save is in flight, further submits are ignored.
    pub is_submitting: bool,
    pub is_autofilling: bool,
    pub roster_cache: HashMap<String, Vec<Player>>,
    pub toast: Option<String>,
}

impl EntryState {
    pub fn new() -> Self {
        Self {
            lines: scoring::initial_lines(),
            match_date: scoring::today_iso(),
            match_time: "19:00".to_string(),
            ..Self::default()
        }
    }

    pub fn derived_match_winner(&self) -> Option<String> {
        scoring::derive_match_winner(&self.lines, &self.home_team_id, &self.away_team_id)
    }

    // -----------------------------------------------------------------------
    // Focus grid
    // -----------------------------------------------------------------------

    fn line_cols(&self, line: usize) -> usize {
        // 4 player slots + home/away score per game + winner override.
        self.lines
            .get(line)
            .map(|l| 4 + l.games.len() * 2 + 1)
            .unwrap_or(1)
    }

    pub fn focus_down(&mut self) {
        self.focus = match self.focus {
            EntryFocus::Meta(_) if !self.lines.is_empty() => EntryFocus::Line { line: 0, col: 0 },
            EntryFocus::Line { line, col } if line + 1 < self.lines.len() => EntryFocus::Line {
                line: line + 1,
                col: col.min(self.line_cols(line + 1) - 1),
            },
            focus => focus,
        };
    }

    pub fn focus_up(&mut self) {
        self.focus = match self.focus {
            EntryFocus::Line { line: 0, .. } => EntryFocus::Meta(0),
            EntryFocus::Line { line, col } => EntryFocus::Line {
                line: line - 1,
                col: col.min(self.line_cols(line - 1) - 1),
            },
            focus => focus,
        };
    }

    pub fn focus_right(&mut self) {
        self.focus = match self.focus {
            EntryFocus::Meta(idx) => EntryFocus::Meta((idx + 1).min(META_FIELDS - 1)),
            EntryFocus::Line { line, col } => EntryFocus::Line {
                line,
                col: (col + 1).min(self.line_cols(line) - 1),
            },
        };
    }

    pub fn focus_left(&mut self) {
        self.focus = match self.focus {
            EntryFocus::Meta(idx) => EntryFocus::Meta(idx.saturating_sub(1)),
            EntryFocus::Line { line, col } => EntryFocus::Line { line, col: col.saturating_sub(1) },
        };
    }

    fn clamp_focus(&mut self) {
        if let EntryFocus::Line { line, col } = self.focus {
            if self.lines.is_empty() {
                self.focus = EntryFocus::Meta(0);
            } else {
                let line = line.min(self.lines.len() - 1);
                self.focus = EntryFocus::Line { line, col: col.min(self.line_cols(line) - 1) };
            }
        }
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Route a typed character into the focused text field, if there is one.
    pub fn input_char(&mut self, c: char) {
        self.errors.clear();
        match self.focus {
            EntryFocus::Meta(2) => self.match_date.push(c),
            EntryFocus::Meta(3) => self.match_time.push(c),
            EntryFocus::Meta(4) => self.location.push(c),
            EntryFocus::Line { line, col } => {
                if let Some((game_idx, is_home)) = score_cell(col)
                    && let Some(form) = self.lines.get_mut(line)
                    && let Some(game) = form.games.get_mut(game_idx)
                {
                    if c.is_ascii_digit() {
                        let cell = if is_home { &mut game.home } else { &mut game.away };
                        cell.push(c);
                    }
                    self.recompute_line(line);
                }
            }
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        self.errors.clear();
        match self.focus {
            EntryFocus::Meta(2) => {
                self.match_date.pop();
            }
            EntryFocus::Meta(3) => {
                self.match_time.pop();
            }
            EntryFocus::Meta(4) => {
                self.location.pop();
            }
            EntryFocus::Line { line, col } => {
                if let Some((game_idx, is_home)) = score_cell(col)
                    && let Some(form) = self.lines.get_mut(line)
                    && let Some(game) = form.games.get_mut(game_idx)
                {
                    let cell = if is_home { &mut game.home } else { &mut game.away };
                    cell.pop();
                    self.recompute_line(line);
                }
            }
            _ => {}
        }
    }

    /// Enter on the focused cell: cycle the team, player, or winner override.
    pub fn activate(&mut self, teams: &[Team]) {
        self.errors.clear();
        match self.focus {
            EntryFocus::Meta(0) => self.cycle_team(true, teams),
            EntryFocus::Meta(1) => self.cycle_team(false, teams),
            EntryFocus::Line { line, col } if col < 4 => self.cycle_player(line, col),
            EntryFocus::Line { line, col } if self.is_winner_col(line, col) => {
                self.cycle_winner_override(line)
            }
            _ => {}
        }
    }

    fn is_winner_col(&self, line: usize, col: usize) -> bool {
        col + 1 == self.line_cols(line)
    }

    /// Switching a team clears that side's player picks everywhere: they
    /// belonged to the old roster.
    fn cycle_team(&mut self, home: bool, teams: &[Team]) {
        if teams.is_empty() {
            return;
        }
        let current = if home { &self.home_team_id } else { &self.away_team_id };
        let next = match teams.iter().position(|t| &t.id == current) {
            Some(idx) => teams[(idx + 1) % teams.len()].id.clone(),
            None => teams[0].id.clone(),
        };
        if home {
            self.home_team_id = next;
        } else {
            self.away_team_id = next;
        }
        for line in &mut self.lines {
            let pair = if home { &mut line.home } else { &mut line.away };
            *pair = Default::default();
        }
        self.recompute_all();
    }

    fn cycle_player(&mut self, line: usize, col: usize) {
        let is_home = col < 2;
        let team_id = if is_home { self.home_team_id.clone() } else { self.away_team_id.clone() };
        let Some(roster) = self.roster_cache.get(&team_id) else {
            self.toast = Some("Roster not loaded yet for that team".into());
            return;
        };
        if roster.is_empty() {
            return;
        }
        let Some(form) = self.lines.get_mut(line) else {
            return;
        };
        let pair = if is_home { &mut form.home } else { &mut form.away };
        let slot = if col % 2 == 0 { &mut pair.player1_id } else { &mut pair.player2_id };
        *slot = match roster.iter().position(|p| &p.id == slot) {
            Some(idx) => roster[(idx + 1) % roster.len()].id.clone(),
            None => roster[0].id.clone(),
        };
    }

    /// Manual winner override for tied or disputed lines:
    /// derived → home → away → none → derived again on the next score edit.
    fn cycle_winner_override(&mut self, line: usize) {
        let (home_id, away_id) = (self.home_team_id.clone(), self.away_team_id.clone());
        if home_id.is_empty() || away_id.is_empty() {
            return;
        }
        if let Some(form) = self.lines.get_mut(line) {
            form.winner_team_id = match form.winner_team_id.as_deref() {
                None => Some(home_id),
                Some(current) if current == home_id => Some(away_id),
                Some(_) => None,
            };
        }
    }

    fn recompute_line(&mut self, line: usize) {
        let (home_id, away_id) = (self.home_team_id.clone(), self.away_team_id.clone());
        if let Some(form) = self.lines.get_mut(line) {
            form.winner_team_id = scoring::determine_winner(form, &home_id, &away_id);
        }
    }

    fn recompute_all(&mut self) {
        for idx in 0..self.lines.len() {
            self.recompute_line(idx);
        }
    }

    // -----------------------------------------------------------------------
    // Line / game structure
    // -----------------------------------------------------------------------

    pub fn add_line(&mut self) {
        self.errors.clear();
        let next = self.lines.len() as u32 + 1;
        self.lines.push(scoring::empty_line(next));
    }

    pub fn remove_focused_line(&mut self) {
        self.errors.clear();
        if let EntryFocus::Line { line, .. } = self.focus {
            self.lines = scoring::remove_line_at(std::mem::take(&mut self.lines), line);
            self.clamp_focus();
        }
    }

    pub fn add_game_to_focused_line(&mut self) {
        self.errors.clear();
        if let EntryFocus::Line { line, .. } = self.focus
            && let Some(form) = self.lines.get_mut(line)
        {
            form.games.push(Default::default());
        }
    }

    pub fn remove_game_from_focused_line(&mut self) {
        self.errors.clear();
        if let EntryFocus::Line { line, .. } = self.focus {
            if let Some(form) = self.lines.get_mut(line) {
                scoring::remove_last_game(form);
            }
            self.recompute_line(line);
            self.clamp_focus();
        }
    }

    // -----------------------------------------------------------------------
    // Autofill / submit
    // -----------------------------------------------------------------------

    pub fn apply_autofill(&mut self, setup: AutofillSetup) {
        self.is_autofilling = false;
        self.errors.clear();
        self.home_team_id = setup.home_team.id.clone();
        self.away_team_id = setup.away_team.id.clone();
        self.match_date = scoring::today_iso();
        if self.match_time.is_empty() {
            self.match_time = "19:00".to_string();
        }
        if self.location.trim().is_empty() {
            self.location = setup
                .home_team
                .location
                .clone()
                .unwrap_or_else(|| setup.home_team.name.clone());
        }

        self.lines = scoring::initial_lines();
        for (idx, form) in self.lines.iter_mut().enumerate() {
            let (h1, h2) = scoring::pick_players_for_line(&setup.home_roster, idx * 2);
            let (a1, a2) = scoring::pick_players_for_line(&setup.away_roster, idx * 2);
            form.home.player1_id = h1;
            form.home.player2_id = h2;
            form.away.player1_id = a1;
            form.away.player2_id = a2;

            // Alternate the scripted winner so the fixture looks contested.
            let side = if idx % 2 == 0 { WinnerSide::Home } else { WinnerSide::Away };
            form.games = scoring::generate_game_scores(DEFAULT_GAMES_PER_LINE, side);
        }
        self.recompute_all();
        self.roster_cache
            .insert(setup.home_team.id, setup.home_roster);
        self.roster_cache
            .insert(setup.away_team.id, setup.away_roster);
        self.toast = Some("Form filled with a generated fixture".into());
    }

    pub fn form_view(&self) -> MatchFormView<'_> {
        MatchFormView {
            lines: &self.lines,
            home_team_id: &self.home_team_id,
            away_team_id: &self.away_team_id,
            match_date: &self.match_date,
            match_time: &self.match_time,
            location: &self.location,
        }
    }

    /// Validate eagerly and build the submission payload. `None` leaves the
    /// problems in `errors` and blocks the save.
    pub fn prepare_submit(&mut self) -> Option<SaveMatchArgs> {
        if self.is_submitting {
            return None;
        }
        let problems = scoring::validate_match_form(&self.form_view());
        if !problems.is_empty() {
            self.errors = problems;
            return None;
        }

        let lines = self
            .lines
            .iter()
            .map(|form| SaveLineArgs {
                line_number: form.line_number,
                home_player1: form.home.player1_id.clone(),
                home_player2: form.home.player2_id.clone(),
                away_player1: form.away.player1_id.clone(),
                away_player2: form.away.player2_id.clone(),
                winner_team_id: form.winner_team_id.clone(),
                games: form
                    .games
                    .iter()
                    .enumerate()
                    .map(|(idx, game)| SaveGameArgs {
                        game_number: idx as u32 + 1,
                        home_score: game.home.trim().parse().unwrap_or(0),
                        away_score: game.away.trim().parse().unwrap_or(0),
                    })
                    .collect(),
            })
            .collect();

        self.is_submitting = true;
        Some(SaveMatchArgs {
            home_team_id: self.home_team_id.clone(),
            away_team_id: self.away_team_id.clone(),
            match_date: self.match_date.clone(),
            match_time: self.match_time.clone(),
            location: self.location.clone(),
            winner_team_id: self.derived_match_winner(),
            lines,
        })
    }

    pub fn on_saved(&mut self, match_id: &str) {
        self.is_submitting = false;
        self.toast = Some(format!("Match recorded ({match_id})"));
        self.lines = scoring::initial_lines();
        self.location.clear();
        self.errors.clear();
        self.focus = EntryFocus::Meta(0);
    }

    pub fn on_save_failed(&mut self, message: String) {
        self.is_submitting = false;
        self.errors = vec![message];
    }
}

/// Map a line column to `(game_index, is_home_score)` when it lands on a
/// score cell.
fn score_cell(col: usize) -> Option<(usize, bool)> {
    let offset = col.checked_sub(4)?;
    Some((offset / 2, offset % 2 == 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teams() -> Vec<Team> {
        vec![
            Team { id: "t1".into(), name: "Harborview".into(), location: None },
            Team { id: "t2".into(), name: "Alpine".into(), location: None },
        ]
    }

    fn players(prefix: &str) -> Vec<Player> {
        (1..=4)
            .map(|n| Player { id: format!("{prefix}{n}"), full_name: format!("{prefix} {n}") })
            .collect()
    }

    fn setup() -> AutofillSetup {
        AutofillSetup {
            home_team: Team { id: "t1".into(), name: "Harborview".into(), location: Some("Harborview Indoor Courts".into()) },
            away_team: Team { id: "t2".into(), name: "Alpine".into(), location: None },
            home_roster: players("h"),
            away_roster: players("a"),
        }
    }

    #[test]
    fn typing_a_score_recomputes_the_line_winner() {
        let mut entry = EntryState::new();
        entry.home_team_id = "t1".into();
        entry.away_team_id = "t2".into();

        // Game 1 score cells are cols 4 (home) and 5 (away).
        entry.focus = EntryFocus::Line { line: 0, col: 4 };
        entry.input_char('6');
        entry.focus = EntryFocus::Line { line: 0, col: 5 };
        entry.input_char('3');
        assert_eq!(entry.lines[0].winner_team_id.as_deref(), Some("t1"));

        // Erasing the home score leaves the game incomplete, so it no longer
        // counts and the line reverts to undecided.
        entry.focus = EntryFocus::Line { line: 0, col: 4 };
        entry.backspace();
        assert_eq!(entry.lines[0].winner_team_id, None);
    }

    #[test]
    fn removing_a_line_renumbers_and_respects_the_floor() {
        let mut entry = EntryState::new();
        assert_eq!(entry.lines.len(), 5);
        entry.focus = EntryFocus::Line { line: 1, col: 0 };
        entry.remove_focused_line();
        assert_eq!(entry.lines.len(), 4);
        let numbers: Vec<u32> = entry.lines.iter().map(|l| l.line_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);

        for _ in 0..10 {
            entry.focus = EntryFocus::Line { line: 0, col: 0 };
            entry.remove_focused_line();
        }
        assert_eq!(entry.lines.len(), 1, "a match keeps at least one line");
    }

    #[test]
    fn autofill_produces_a_form_that_validates_clean() {
        let mut entry = EntryState::new();
        entry.apply_autofill(setup());

        assert_eq!(entry.home_team_id, "t1");
        assert_eq!(entry.location, "Harborview Indoor Courts");
        assert!(scoring::validate_match_form(&entry.form_view()).is_empty());
        // Winner alternates by line parity.
        assert_eq!(entry.lines[0].winner_team_id.as_deref(), Some("t1"));
        assert_eq!(entry.lines[1].winner_team_id.as_deref(), Some("t2"));
        assert!(entry.derived_match_winner().is_some());
    }

    #[test]
    fn submit_is_blocked_while_a_save_is_in_flight() {
        let mut entry = EntryState::new();
        entry.apply_autofill(setup());

        let first = entry.prepare_submit();
        assert!(first.is_some());
        assert!(entry.is_submitting);
        assert!(entry.prepare_submit().is_none(), "second submit must be a no-op");

        entry.on_saved("m42");
        assert!(!entry.is_submitting);
        assert_eq!(entry.toast.as_deref(), Some("Match recorded (m42)"));
        assert_eq!(entry.lines.len(), 5, "form resets to a fresh line grid");
    }

    #[test]
    fn invalid_form_collects_every_problem_eagerly() {
        let mut entry = EntryState::new();
        entry.location.clear();
        assert!(entry.prepare_submit().is_none());
        assert!(entry.errors.iter().any(|e| e == "Select a home team."));
        assert!(entry.errors.iter().any(|e| e == "Select an away team."));
        assert!(entry.errors.iter().any(|e| e.contains("winner missing or tie")));
        assert!(!entry.is_submitting);
    }

    #[test]
    fn switching_a_team_clears_that_sides_player_picks() {
        let mut entry = EntryState::new();
        entry.apply_autofill(setup());
        assert!(entry.lines[0].home.is_complete());

        entry.focus = EntryFocus::Meta(0);
        entry.activate(&teams());
        assert!(!entry.lines[0].home.is_complete());
        assert!(entry.lines[0].away.is_complete(), "away picks survive a home change");
    }

    #[test]
    fn winner_override_cycles_home_away_none() {
        let mut entry = EntryState::new();
        entry.home_team_id = "t1".into();
        entry.away_team_id = "t2".into();
        let winner_col = 4 + entry.lines[0].games.len() * 2;
        entry.focus = EntryFocus::Line { line: 0, col: winner_col };

        entry.activate(&teams());
        assert_eq!(entry.lines[0].winner_team_id.as_deref(), Some("t1"));
        entry.activate(&teams());
        assert_eq!(entry.lines[0].winner_team_id.as_deref(), Some("t2"));
        entry.activate(&teams());
        assert_eq!(entry.lines[0].winner_team_id, None);
    }

    #[test]
    fn tied_game_counts_for_neither_side() {
        let mut entry = EntryState::new();
        entry.home_team_id = "t1".into();
        entry.away_team_id = "t2".into();

        entry.focus = EntryFocus::Line { line: 0, col: 4 };
        entry.input_char('5');
        entry.focus = EntryFocus::Line { line: 0, col: 5 };
        entry.input_char('5');
        assert_eq!(entry.lines[0].winner_team_id, None);
    }
}
