use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::components::table::{self, ColumnSpec, DEFAULT_PAGE_SIZE};
use crate::state::app_state::HistoryState;
use crate::state::entry::{EntryFocus, EntryState};
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::ui::layout::LayoutAreas;
use league_api::rest::display_cell;
use league_api::{LineDetail, Player, StandingRecord, Team};
use std::cmp::Ordering;

static TABS: &[&str; 5] = &["Standings", "Rosters", "History", "Match Entry", "Tables"];

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    terminal
        .draw(|f| {
            layout.update(f.area(), app.settings.full_screen);

            if !app.settings.full_screen {
                draw_tabs(f, layout.tab_bar, app);
            }

            match app.state.active_tab {
                MenuItem::Standings => draw_standings(f, layout.main, app),
                MenuItem::Rosters => draw_rosters(f, layout.main, app),
                MenuItem::History => draw_history(f, layout.main, app),
                MenuItem::MatchEntry => draw_match_entry(f, layout.main, app),
                MenuItem::Tables => draw_tables(f, layout.main, app),
                MenuItem::Help => draw_help(f, layout.main),
            }

            draw_status(f, layout.status, app);

            if let Some(message) = app.state.last_error.clone() {
                draw_error_panel(f, f.area(), &message);
            }
            if app.state.show_logs {
                draw_logs_overlay(f, f.area());
            }

            draw_loading_spinner(f, f.area(), app, loading);
        })
        .unwrap();
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Standings => 0,
        MenuItem::Rosters => 1,
        MenuItem::History => 2,
        MenuItem::MatchEntry => 3,
        MenuItem::Tables => 4,
        MenuItem::Help => 0,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

// ---------------------------------------------------------------------------
// Column definitions, shared with the key handler for sort cycling
// ---------------------------------------------------------------------------

pub fn standings_columns() -> Vec<ColumnSpec<StandingRecord>> {
    vec![
        ColumnSpec {
            header: "Team",
            accessor: |r| r.team_name.clone(),
            sort_by: Some(|a, b| a.team_name.cmp(&b.team_name)),
            width: 24,
        },
        ColumnSpec {
            header: "W",
            accessor: |r| fmt_count(r.matches_won),
            sort_by: Some(|a, b| a.matches_won.cmp(&b.matches_won)),
            width: 5,
        },
        ColumnSpec {
            header: "L",
            accessor: |r| fmt_count(r.matches_lost),
            sort_by: Some(|a, b| a.matches_lost.cmp(&b.matches_lost)),
            width: 5,
        },
        ColumnSpec {
            header: "Win %",
            accessor: |r| {
                r.win_percentage
                    .map(|p| format!("{p:.3}"))
                    .unwrap_or_else(|| "--".to_string())
            },
            sort_by: Some(|a, b| {
                a.win_percentage
                    .partial_cmp(&b.win_percentage)
                    .unwrap_or(Ordering::Equal)
            }),
            width: 8,
        },
        ColumnSpec {
            header: "Points",
            accessor: |r| fmt_count(r.total_points),
            sort_by: Some(|a, b| a.total_points.cmp(&b.total_points)),
            width: 8,
        },
    ]
}

pub fn roster_columns() -> Vec<ColumnSpec<Player>> {
    vec![
        ColumnSpec {
            header: "Player",
            accessor: |p| p.full_name.clone(),
            sort_by: Some(|a, b| a.full_name.cmp(&b.full_name)),
            width: 28,
        },
        ColumnSpec {
            header: "Id",
            accessor: |p| p.id.clone(),
            sort_by: Some(|a, b| a.id.cmp(&b.id)),
            width: 14,
        },
    ]
}

fn fmt_count(v: Option<i64>) -> String {
    v.map(|n| n.to_string()).unwrap_or_else(|| "--".to_string())
}

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

fn draw_standings(f: &mut Frame, area: Rect, app: &mut App) {
    let block = default_border(Color::White).title(" Standings ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if !app.state.standings.loaded && app.state.standings.records.is_empty() {
        draw_loading_message(f, inner, app, "Loading standings...");
        return;
    }

    let columns = standings_columns();
    let resolved = table::resolve(
        &app.state.standings.records,
        &columns,
        &mut app.state.standings.table,
        DEFAULT_PAGE_SIZE,
    );
    table::render(f, inner, &resolved, true);
}

// ---------------------------------------------------------------------------
// Rosters
// ---------------------------------------------------------------------------

fn draw_rosters(f: &mut Frame, area: Rect, app: &mut App) {
    let team_name = app
        .state
        .team_at(app.state.roster.team_index)
        .map(|t| t.name.clone())
        .unwrap_or_else(|| "(no teams)".to_string());
    let block = default_border(Color::White).title(format!(" Roster: {team_name} "));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if !app.state.teams_loaded {
        draw_loading_message(f, inner, app, "Loading teams...");
        return;
    }

    let [header, content] =
        Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(inner);
    f.render_widget(
        Paragraph::new("Keys: h/l=team  j/k=move  s=sort  [/]=page  r=refresh")
            .style(Style::default().fg(Color::DarkGray)),
        header,
    );

    if app.state.roster.loaded_team.is_none() {
        draw_loading_message(f, content, app, "Loading roster...");
        return;
    }

    let columns = roster_columns();
    let resolved = table::resolve(
        &app.state.roster.players,
        &columns,
        &mut app.state.roster.table,
        DEFAULT_PAGE_SIZE,
    );
    table::render(f, content, &resolved, true);
}

// ---------------------------------------------------------------------------
// Match history
// ---------------------------------------------------------------------------

fn draw_history(f: &mut Frame, area: Rect, app: &App) {
    let team_name = app
        .state
        .team_at(app.state.history.team_index)
        .map(|t| t.name.clone())
        .unwrap_or_else(|| "(no teams)".to_string());
    let block = default_border(Color::White).title(format!(" Match History: {team_name} "));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if !app.state.teams_loaded || app.state.history.loaded_team.is_none() {
        draw_loading_message(f, inner, app, "Loading match history...");
        return;
    }

    let history = &app.state.history;
    if history.entries.is_empty() {
        f.render_widget(
            Paragraph::new("No matches recorded for this team yet")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let [header, content] =
        Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(inner);
    f.render_widget(
        Paragraph::new("Keys: h/l=team  j/k=move  Enter=line details  r=refresh")
            .style(Style::default().fg(Color::DarkGray)),
        header,
    );

    let lines = history_lines(history, content.width);
    // Scroll so the cursor's row stays visible.
    let cursor_row = lines
        .iter()
        .position(|(entry, _)| *entry == Some(history.table.cursor))
        .unwrap_or(0);
    let visible = content.height as usize;
    let start = cursor_row.saturating_sub(visible.saturating_sub(1) / 2).min(
        lines.len().saturating_sub(visible),
    );
    let window: Vec<Line> = lines
        .into_iter()
        .skip(start)
        .take(visible)
        .map(|(_, line)| line)
        .collect();
    f.render_widget(Paragraph::new(window), content);
}

/// Build the full history list with inline line breakdowns, tagging each
/// rendered row with the entry index it belongs to.
fn history_lines(history: &HistoryState, width: u16) -> Vec<(Option<usize>, Line<'static>)> {
    let mut out = Vec::new();
    for (idx, entry) in history.entries.iter().enumerate() {
        let selected = idx == history.table.cursor;
        let marker = if Some(idx) == history.expanded { "▾" } else { "▸" };
        let venue = if entry.is_home_match { "vs" } else { "at" };
        let summary = format!(
            "{marker} {} {}  {venue} {}  {} {}-{}  games {}-{}  +{} pts",
            entry.match_date,
            entry.match_time.as_deref().unwrap_or("--:--"),
            entry.opponent_name,
            entry.result.label(),
            entry.team_score,
            entry.opponent_score,
            entry.games_won,
            entry.games_lost,
            entry.points_earned,
        );
        let clipped: String = summary.chars().take(width.max(8) as usize).collect();
        let style = if selected {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            match entry.result {
                league_api::MatchResult::Win => Style::default().fg(Color::Green),
                league_api::MatchResult::Loss => Style::default().fg(Color::Red),
                league_api::MatchResult::Tie => Style::default().fg(Color::White),
            }
        };
        out.push((Some(idx), Line::from(Span::styled(clipped, style))));

        if Some(idx) == history.expanded {
            if let Some(location) = entry.location.as_deref() {
                out.push((
                    None,
                    Line::from(Span::styled(
                        format!("    at {location}"),
                        Style::default().fg(Color::DarkGray),
                    )),
                ));
            }
            for line in &entry.lines {
                out.push((None, line_detail_row(line)));
            }
        }
    }
    out
}

fn line_detail_row(line: &LineDetail) -> Line<'static> {
    let games: Vec<String> = line
        .games
        .iter()
        .map(|g| {
            format!(
                "{}-{}",
                g.home_score.map(|s| s.to_string()).unwrap_or_else(|| "?".into()),
                g.away_score.map(|s| s.to_string()).unwrap_or_else(|| "?".into()),
            )
        })
        .collect();
    let text = format!(
        "    L{}  {} v {}  [{}]  {}",
        line.line_number,
        pair_label(&line.home_players),
        pair_label(&line.away_players),
        games.join(" "),
        line.result.label(),
    );
    Line::from(Span::styled(text, Style::default().fg(Color::Gray)))
}

fn pair_label(players: &[Player]) -> String {
    if players.is_empty() {
        return "(unset)".to_string();
    }
    players
        .iter()
        .map(|p| p.full_name.as_str())
        .collect::<Vec<_>>()
        .join(" / ")
}

// ---------------------------------------------------------------------------
// Match entry form
// ---------------------------------------------------------------------------

fn draw_match_entry(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Match Entry ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if !app.state.teams_loaded {
        draw_loading_message(f, inner, app, "Loading teams...");
        return;
    }

    let entry = &app.state.entry;
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        "Keys: Tab/arrows=move  Enter=cycle value  Ctrl-f=autofill  Ctrl-s=save  \
         Ctrl-n/Ctrl-d=add/remove line  Ctrl-g/Ctrl-b=add/remove game  Esc=back",
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(""));

    lines.push(meta_row(
        entry,
        &app.state.teams,
        &[(0, "Home"), (1, "Away")],
    ));
    lines.push(meta_row(entry, &app.state.teams, &[(2, "Date"), (3, "Time"), (4, "Location")]));
    lines.push(Line::from(""));

    for (idx, form) in entry.lines.iter().enumerate() {
        lines.push(line_row(entry, idx, form));
    }
    lines.push(Line::from(""));

    let winner = entry
        .derived_match_winner()
        .map(|id| team_label(&app.state.teams, &id))
        .unwrap_or_else(|| "tie / undecided".to_string());
    lines.push(Line::from(vec![
        Span::styled("Match winner: ", Style::default().fg(Color::Gray)),
        Span::styled(winner, Style::default().fg(Color::Cyan)),
    ]));

    if entry.is_submitting {
        lines.push(Line::from(Span::styled(
            "Saving...",
            Style::default().fg(Color::Yellow),
        )));
    }
    if entry.is_autofilling {
        lines.push(Line::from(Span::styled(
            "Generating fixture...",
            Style::default().fg(Color::Yellow),
        )));
    }
    for problem in &entry.errors {
        lines.push(Line::from(Span::styled(
            problem.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    f.render_widget(Paragraph::new(lines), inner);
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    }
}

fn meta_row(entry: &EntryState, teams: &[Team], fields: &[(usize, &'static str)]) -> Line<'static> {
    let mut spans = Vec::new();
    for (field, label) in fields {
        let value = match field {
            0 => team_or_placeholder(teams, &entry.home_team_id),
            1 => team_or_placeholder(teams, &entry.away_team_id),
            2 => text_or_placeholder(&entry.match_date),
            3 => text_or_placeholder(&entry.match_time),
            _ => text_or_placeholder(&entry.location),
        };
        spans.push(Span::styled(
            format!("{label}: "),
            Style::default().fg(Color::Gray),
        ));
        spans.push(Span::styled(
            value,
            focus_style(entry.focus == EntryFocus::Meta(*field)),
        ));
        spans.push(Span::raw("   "));
    }
    Line::from(spans)
}

fn line_row(entry: &EntryState, line_idx: usize, form: &league_api::scoring::LineForm) -> Line<'static> {
    let focused_col = match entry.focus {
        EntryFocus::Line { line, col } if line == line_idx => Some(col),
        _ => None,
    };
    let mut spans = vec![Span::styled(
        format!("L{}  ", form.line_number),
        Style::default().fg(Color::Gray),
    )];

    let slots = [
        (&entry.home_team_id, &form.home.player1_id),
        (&entry.home_team_id, &form.home.player2_id),
        (&entry.away_team_id, &form.away.player1_id),
        (&entry.away_team_id, &form.away.player2_id),
    ];
    for (col, (team_id, player_id)) in slots.into_iter().enumerate() {
        if col == 2 {
            spans.push(Span::styled(" v ", Style::default().fg(Color::Gray)));
        }
        spans.push(Span::styled(
            player_label(entry, team_id, player_id),
            focus_style(focused_col == Some(col)),
        ));
        spans.push(Span::raw(" "));
    }

    for (game_idx, game) in form.games.iter().enumerate() {
        spans.push(Span::styled(
            format!(" G{}:", game_idx + 1),
            Style::default().fg(Color::Gray),
        ));
        spans.push(Span::styled(
            score_text(&game.home),
            focus_style(focused_col == Some(4 + game_idx * 2)),
        ));
        spans.push(Span::raw("-"));
        spans.push(Span::styled(
            score_text(&game.away),
            focus_style(focused_col == Some(5 + game_idx * 2)),
        ));
    }

    let winner = if form.winner_team_id.as_deref() == Some(entry.home_team_id.as_str())
        && !entry.home_team_id.is_empty()
    {
        "W:Home"
    } else if form.winner_team_id.is_some() {
        "W:Away"
    } else {
        "W:-"
    };
    let winner_col = 4 + form.games.len() * 2;
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        winner.to_string(),
        focus_style(focused_col == Some(winner_col)),
    ));

    Line::from(spans)
}

fn player_label(entry: &EntryState, team_id: &str, player_id: &str) -> String {
    if player_id.is_empty() {
        return "(pick)".to_string();
    }
    entry
        .roster_cache
        .get(team_id)
        .and_then(|roster| roster.iter().find(|p| p.id == player_id))
        .map(|p| p.full_name.clone())
        .unwrap_or_else(|| player_id.to_string())
}

fn team_label(teams: &[Team], team_id: &str) -> String {
    teams
        .iter()
        .find(|t| t.id == team_id)
        .map(|t| t.name.clone())
        .unwrap_or_else(|| team_id.to_string())
}

fn team_or_placeholder(teams: &[Team], team_id: &str) -> String {
    if team_id.is_empty() {
        "(pick)".to_string()
    } else {
        team_label(teams, team_id)
    }
}

fn text_or_placeholder(value: &str) -> String {
    if value.is_empty() {
        "____".to_string()
    } else {
        value.to_string()
    }
}

fn score_text(value: &str) -> String {
    if value.is_empty() {
        "_".to_string()
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Raw tables
// ---------------------------------------------------------------------------

fn draw_tables(f: &mut Frame, area: Rect, app: &mut App) {
    let descriptor = app.state.tables.descriptor();
    let block = default_border(Color::White).title(format!(" Table: {} ", descriptor.label));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [header, content] =
        Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(inner);
    f.render_widget(
        Paragraph::new(format!(
            "{}  |  h/l=table  s=sort  [/]=page  r=refresh",
            descriptor.description
        ))
        .style(Style::default().fg(Color::DarkGray)),
        header,
    );

    if app.state.tables.loaded_table.is_none() {
        draw_loading_message(f, content, app, "Loading rows...");
        return;
    }

    let headers: Vec<String> = descriptor.columns.iter().map(|c| c.to_string()).collect();
    let rows: Vec<Vec<String>> = app
        .state
        .tables
        .rows
        .iter()
        .map(|row| {
            descriptor
                .columns
                .iter()
                .map(|col| row.get(*col).map(display_cell).unwrap_or_default())
                .collect()
        })
        .collect();
    let resolved =
        table::resolve_rows(&headers, &rows, &mut app.state.tables.table, DEFAULT_PAGE_SIZE);
    table::render(f, content, &resolved, true);
}

// ---------------------------------------------------------------------------
// Help / overlays
// ---------------------------------------------------------------------------

fn draw_help(f: &mut Frame, area: Rect) {
    let block = default_border(Color::White).title(" Help ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines = vec![
        Line::from("Tabs:    1=Standings  2=Rosters  3=History  4=Match Entry  5=Tables"),
        Line::from(""),
        Line::from("Lists:   j/k move   s cycle sort   [ / ] page   r refresh"),
        Line::from("Teams:   h/l switch team (Rosters, History) or table (Tables)"),
        Line::from("History: Enter toggles the per-line breakdown"),
        Line::from(""),
        Line::from("Entry:   Tab/arrows move   Enter cycles team/player/winner"),
        Line::from("         Ctrl-f autofill   Ctrl-s save   Ctrl-n/Ctrl-d lines   Ctrl-g/Ctrl-b games"),
        Line::from(""),
        Line::from("Global:  f full screen   \" logs   q or Ctrl-c quit   Esc back/dismiss"),
    ];
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    if area.height == 0 {
        return;
    }
    let warning = match app.state.active_tab {
        MenuItem::Standings => app.state.standings.warning.as_deref(),
        MenuItem::Rosters => app.state.roster.warning.as_deref(),
        MenuItem::History => app.state.history.warning.as_deref(),
        MenuItem::Tables => app.state.tables.warning.as_deref(),
        MenuItem::MatchEntry | MenuItem::Help => None,
    };

    let (text, style) = if let Some(warning) = warning {
        (
            format!("refresh failed, showing stale data: {warning}  (r to retry)"),
            Style::default().fg(Color::Yellow),
        )
    } else if app.state.active_tab == MenuItem::MatchEntry
        && let Some(toast) = app.state.entry.toast.as_deref()
    {
        (toast.to_string(), Style::default().fg(Color::Green))
    } else {
        (
            "1-5=tabs  ?=help  q=quit".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    };
    f.render_widget(Paragraph::new(text).style(style), area);
}

fn draw_loading_message(f: &mut Frame, area: Rect, app: &App, msg: &str) {
    let text = if let Some(err) = app.state.last_error.as_deref() {
        format!("{msg}\n{err}")
    } else {
        msg.to_string()
    };
    f.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        area,
    );
}

fn draw_error_panel(f: &mut Frame, area: Rect, message: &str) {
    let popup = centered_rect(area, 60, 30);
    f.render_widget(Clear, popup);
    let block = default_border(Color::Red).title(" Error ");
    let inner = block.inner(popup);
    f.render_widget(block, popup);
    f.render_widget(
        Paragraph::new(format!("{message}\n\nEsc=dismiss  r=retry"))
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center)
            .wrap(tui::widgets::Wrap { trim: true }),
        inner,
    );
}

fn draw_logs_overlay(f: &mut Frame, area: Rect) {
    let popup = centered_rect(area, 80, 60);
    f.render_widget(Clear, popup);
    let widget = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::White));
    f.render_widget(widget, popup);
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [_, mid, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(mid);
    center
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}
