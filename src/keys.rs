use crate::app::{App, MenuItem};
use crate::state::messages::NetworkRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    let mut guard = app.lock().await;
    // Requests produced by tab switches and team cycling are sent after the
    // lock is released.
    let mut pending: Option<NetworkRequest> = None;

    match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        // Ctrl-c quits everywhere, including the entry form.
        (_, Char('c'), KeyModifiers::CONTROL) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // -------------------------------------------------------------------
        // Match-entry form: printable keys are input, so these arms come
        // before the global bindings
        // -------------------------------------------------------------------
        (MenuItem::MatchEntry, KeyCode::Esc, _) => {
            pending = guard.update_tab(MenuItem::Standings);
        }
        (MenuItem::MatchEntry, Char('s'), KeyModifiers::CONTROL) => {
            if let Some(args) = guard.state.entry.prepare_submit() {
                pending = Some(NetworkRequest::SaveMatch { args });
            }
        }
        (MenuItem::MatchEntry, Char('f'), KeyModifiers::CONTROL) => {
            if !guard.state.entry.is_autofilling {
                guard.state.entry.is_autofilling = true;
                pending = Some(NetworkRequest::LoadAutofill);
            }
        }
        (MenuItem::MatchEntry, Char('n'), KeyModifiers::CONTROL) => guard.state.entry.add_line(),
        (MenuItem::MatchEntry, Char('d'), KeyModifiers::CONTROL) => {
            guard.state.entry.remove_focused_line()
        }
        (MenuItem::MatchEntry, Char('g'), KeyModifiers::CONTROL) => {
            guard.state.entry.add_game_to_focused_line()
        }
        (MenuItem::MatchEntry, Char('b'), KeyModifiers::CONTROL) => {
            guard.state.entry.remove_game_from_focused_line()
        }
        (MenuItem::MatchEntry, KeyCode::Tab | KeyCode::Right, _) => {
            guard.state.entry.focus_right()
        }
        (MenuItem::MatchEntry, KeyCode::BackTab | KeyCode::Left, _) => {
            guard.state.entry.focus_left()
        }
        (MenuItem::MatchEntry, KeyCode::Down, _) => guard.state.entry.focus_down(),
        (MenuItem::MatchEntry, KeyCode::Up, _) => guard.state.entry.focus_up(),
        (MenuItem::MatchEntry, KeyCode::Enter, _) => {
            let teams = guard.state.teams.clone();
            guard.state.entry.activate(&teams);
        }
        (MenuItem::MatchEntry, KeyCode::Backspace, _) => guard.state.entry.backspace(),
        (MenuItem::MatchEntry, Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
            guard.state.entry.input_char(c)
        }

        // Quit
        (_, Char('q'), _) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching
        (_, Char('1'), _) => pending = guard.update_tab(MenuItem::Standings),
        (_, Char('2'), _) => pending = guard.update_tab(MenuItem::Rosters),
        (_, Char('3'), _) => pending = guard.update_tab(MenuItem::History),
        (_, Char('4'), _) => pending = guard.update_tab(MenuItem::MatchEntry),
        (_, Char('5'), _) => pending = guard.update_tab(MenuItem::Tables),
        (_, Char('?'), _) => {
            guard.update_tab(MenuItem::Help);
        }
        (MenuItem::Help, KeyCode::Esc, _) => guard.exit_help(),

        // Standings
        (MenuItem::Standings, Char('s'), _) => {
            let columns = crate::draw::standings_columns().len();
            guard.state.standings.table.cycle_sort(columns);
        }
        (MenuItem::Standings, Char(']'), _) => guard.state.standings.table.next_page(),
        (MenuItem::Standings, Char('['), _) => guard.state.standings.table.prev_page(),
        (MenuItem::Standings, Char('j') | KeyCode::Down, _) => {
            guard.state.standings.table.cursor = guard.state.standings.table.cursor.saturating_add(1);
        }
        (MenuItem::Standings, Char('k') | KeyCode::Up, _) => {
            guard.state.standings.table.cursor = guard.state.standings.table.cursor.saturating_sub(1);
        }

        // Rosters
        (MenuItem::Rosters, Char('l') | KeyCode::Right, _) => {
            pending = guard.roster_cycle_team(1);
        }
        (MenuItem::Rosters, Char('h') | KeyCode::Left, _) => {
            pending = guard.roster_cycle_team(-1);
        }
        (MenuItem::Rosters, Char('s'), _) => {
            let columns = crate::draw::roster_columns().len();
            guard.state.roster.table.cycle_sort(columns);
        }
        (MenuItem::Rosters, Char(']'), _) => guard.state.roster.table.next_page(),
        (MenuItem::Rosters, Char('['), _) => guard.state.roster.table.prev_page(),
        (MenuItem::Rosters, Char('j') | KeyCode::Down, _) => {
            guard.state.roster.table.cursor = guard.state.roster.table.cursor.saturating_add(1);
        }
        (MenuItem::Rosters, Char('k') | KeyCode::Up, _) => {
            guard.state.roster.table.cursor = guard.state.roster.table.cursor.saturating_sub(1);
        }

        // Match history
        (MenuItem::History, Char('l') | KeyCode::Right, _) => {
            pending = guard.history_cycle_team(1);
        }
        (MenuItem::History, Char('h') | KeyCode::Left, _) => {
            pending = guard.history_cycle_team(-1);
        }
        (MenuItem::History, Char('j') | KeyCode::Down, _) => {
            let max = guard.state.history.entries.len().saturating_sub(1);
            guard.state.history.table.cursor =
                guard.state.history.table.cursor.saturating_add(1).min(max);
        }
        (MenuItem::History, Char('k') | KeyCode::Up, _) => {
            guard.state.history.table.cursor = guard.state.history.table.cursor.saturating_sub(1);
        }
        (MenuItem::History, KeyCode::Enter, _) => guard.history_toggle_selected(),
        (MenuItem::History, KeyCode::Esc, _) => guard.state.history.expanded = None,

        // Raw tables
        (MenuItem::Tables, Char('l') | KeyCode::Right, _) => {
            pending = guard.tables_cycle(1);
        }
        (MenuItem::Tables, Char('h') | KeyCode::Left, _) => {
            pending = guard.tables_cycle(-1);
        }
        (MenuItem::Tables, Char('s'), _) => {
            let columns = guard.state.tables.descriptor().columns.len();
            guard.state.tables.table.cycle_sort(columns);
        }
        (MenuItem::Tables, Char(']'), _) => guard.state.tables.table.next_page(),
        (MenuItem::Tables, Char('['), _) => guard.state.tables.table.prev_page(),
        (MenuItem::Tables, Char('j') | KeyCode::Down, _) => {
            guard.state.tables.table.cursor = guard.state.tables.table.cursor.saturating_add(1);
        }
        (MenuItem::Tables, Char('k') | KeyCode::Up, _) => {
            guard.state.tables.table.cursor = guard.state.tables.table.cursor.saturating_sub(1);
        }

        // Global
        (_, Char('r'), _) => pending = guard.refresh_active_tab(),
        (_, Char('f'), _) => guard.toggle_full_screen(),
        (_, Char('"'), _) => guard.toggle_show_logs(),
        (_, KeyCode::Esc, _) => guard.dismiss_error(),

        _ => {}
    }

    if let Some(request) = pending {
        drop(guard);
        let _ = network_requests.send(request).await;
    }
}
