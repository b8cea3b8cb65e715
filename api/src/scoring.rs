//! Pure scoring model for the match-entry form. No I/O: every function here
//! is a total, synchronous derivation over in-memory line/game state, re-run
//! on each edit rather than kept incrementally.

use crate::Player;
use std::cmp::Ordering;

pub const DEFAULT_LINE_COUNT: usize = 5;
pub const DEFAULT_GAMES_PER_LINE: usize = 3;
pub const MIN_GAMES_PER_LINE: usize = 1;

/// Scores are entered as free text and coerced on every derivation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameForm {
    pub home: String,
    pub away: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairSlots {
    pub player1_id: String,
    pub player2_id: String,
}

impl PairSlots {
    pub fn is_complete(&self) -> bool {
        !self.player1_id.is_empty() && !self.player2_id.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineForm {
    /// 1-based, contiguous within the match; reassigned on removal.
    pub line_number: u32,
    pub home: PairSlots,
    pub away: PairSlots,
    pub games: Vec<GameForm>,
    /// Derived on every score edit, or set explicitly to break a tie.
    pub winner_team_id: Option<String>,
}

pub fn empty_line(line_number: u32) -> LineForm {
    LineForm {
        line_number,
        games: vec![GameForm::default(); DEFAULT_GAMES_PER_LINE],
        ..LineForm::default()
    }
}

pub fn initial_lines() -> Vec<LineForm> {
    (1..=DEFAULT_LINE_COUNT as u32).map(empty_line).collect()
}

fn parse_score(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Derive a line's winner by strict game-count majority. Games with a
/// missing, non-numeric, or tied score do not count for either side. With
/// an unselected home or away team there is nothing to attribute wins to,
/// so the result is always `None`.
pub fn determine_winner(
    line: &LineForm,
    home_team_id: &str,
    away_team_id: &str,
) -> Option<String> {
    if home_team_id.is_empty() || away_team_id.is_empty() {
        return None;
    }

    let mut home_wins = 0u32;
    let mut away_wins = 0u32;
    for game in &line.games {
        let (Some(home), Some(away)) = (parse_score(&game.home), parse_score(&game.away)) else {
            continue;
        };
        match home.cmp(&away) {
            Ordering::Greater => home_wins += 1,
            Ordering::Less => away_wins += 1,
            Ordering::Equal => {}
        }
    }

    match home_wins.cmp(&away_wins) {
        Ordering::Greater => Some(home_team_id.to_string()),
        Ordering::Less => Some(away_team_id.to_string()),
        Ordering::Equal => None,
    }
}

/// Derive the match winner by strict line-count majority over the lines'
/// (derived or overridden) winners. Equal counts yield `None`.
pub fn derive_match_winner(
    lines: &[LineForm],
    home_team_id: &str,
    away_team_id: &str,
) -> Option<String> {
    if home_team_id.is_empty() || away_team_id.is_empty() {
        return None;
    }

    let home_lines = lines
        .iter()
        .filter(|l| l.winner_team_id.as_deref() == Some(home_team_id))
        .count();
    let away_lines = lines
        .iter()
        .filter(|l| l.winner_team_id.as_deref() == Some(away_team_id))
        .count();

    match home_lines.cmp(&away_lines) {
        Ordering::Greater => Some(home_team_id.to_string()),
        Ordering::Less => Some(away_team_id.to_string()),
        Ordering::Equal => None,
    }
}

/// Reassign `line_number` to `1..=N` in current array order, leaving every
/// other field untouched.
pub fn renumber_lines(mut lines: Vec<LineForm>) -> Vec<LineForm> {
    for (idx, line) in lines.iter_mut().enumerate() {
        line.line_number = idx as u32 + 1;
    }
    lines
}

/// Remove the line at `idx` and renumber. A match keeps at least one line;
/// at the floor (or with an out-of-range index) this is a no-op.
pub fn remove_line_at(lines: Vec<LineForm>, idx: usize) -> Vec<LineForm> {
    if lines.len() <= 1 || idx >= lines.len() {
        return lines;
    }
    let mut lines = lines;
    lines.remove(idx);
    renumber_lines(lines)
}

/// Drop the last game of a line, keeping at least `MIN_GAMES_PER_LINE`.
pub fn remove_last_game(line: &mut LineForm) -> bool {
    if line.games.len() <= MIN_GAMES_PER_LINE {
        return false;
    }
    line.games.pop();
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinnerSide {
    Home,
    Away,
}

/// Synthesize a plausible best-of-N score sequence for the autofill flow:
/// the designated winner takes `floor(N/2) + 1` games at 6, the loser's
/// score varies deterministically with the game index but stays valid.
pub fn generate_game_scores(games_count: usize, winner: WinnerSide) -> Vec<GameForm> {
    let count = games_count.max(MIN_GAMES_PER_LINE);
    let wins_needed = count / 2 + 1;
    let mut winner_wins = 0;

    (0..count)
        .map(|idx| {
            let winner_takes_game = winner_wins < wins_needed;
            if winner_takes_game {
                winner_wins += 1;
            }
            let winning = 6i64;
            let losing = (winning - (2 + ((idx as i64 + 1) % 3))).max(0);

            let (home, away) = match (winner, winner_takes_game) {
                (WinnerSide::Home, true) | (WinnerSide::Away, false) => (winning, losing),
                (WinnerSide::Home, false) | (WinnerSide::Away, true) => (losing, winning),
            };
            GameForm {
                home: home.to_string(),
                away: away.to_string(),
            }
        })
        .collect()
}

/// Rotate a doubles pair out of a roster. A one-player roster pairs the
/// player with themselves, matching the original demo behavior.
pub fn pick_players_for_line(roster: &[Player], offset: usize) -> (String, String) {
    match roster.len() {
        0 => (String::new(), String::new()),
        1 => (roster[0].id.clone(), roster[0].id.clone()),
        len => (
            roster[offset % len].id.clone(),
            roster[(offset + 1) % len].id.clone(),
        ),
    }
}

pub fn today_iso() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Borrowed view of the whole form, for validation and submission.
#[derive(Debug, Clone, Copy)]
pub struct MatchFormView<'a> {
    pub lines: &'a [LineForm],
    pub home_team_id: &'a str,
    pub away_team_id: &'a str,
    pub match_date: &'a str,
    pub match_time: &'a str,
    pub location: &'a str,
}

/// Collect every field-level problem eagerly; submission is blocked until
/// the returned list is empty.
pub fn validate_match_form(form: &MatchFormView) -> Vec<String> {
    let mut errors = Vec::new();

    if form.home_team_id.is_empty() {
        errors.push("Select a home team.".to_string());
    }
    if form.away_team_id.is_empty() {
        errors.push("Select an away team.".to_string());
    }
    if !form.home_team_id.is_empty() && form.home_team_id == form.away_team_id {
        errors.push("Home and away teams must be different.".to_string());
    }
    if form.match_date.is_empty() {
        errors.push("Provide a match date.".to_string());
    }
    if form.match_time.is_empty() {
        errors.push("Provide a start time.".to_string());
    }
    if form.location.trim().is_empty() {
        errors.push("Enter the match location.".to_string());
    }

    for line in form.lines {
        if !line.away.is_complete() {
            errors.push(format!("Line {}: select both away players.", line.line_number));
        }
        if !line.home.is_complete() {
            errors.push(format!("Line {}: select both home players.", line.line_number));
        }
        for (idx, game) in line.games.iter().enumerate() {
            if game.home.is_empty() || game.away.is_empty() {
                errors.push(format!(
                    "Line {}: enter scores for Game {}.",
                    line.line_number,
                    idx + 1
                ));
            }
        }
        if line.winner_team_id.is_none() {
            errors.push(format!(
                "Line {}: winner missing or tie detected.",
                line.line_number
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_with_games(games: &[(&str, &str)]) -> LineForm {
        LineForm {
            line_number: 1,
            games: games
                .iter()
                .map(|(h, a)| GameForm {
                    home: h.to_string(),
                    away: a.to_string(),
                })
                .collect(),
            ..LineForm::default()
        }
    }

    #[test]
    fn winner_goes_to_strict_game_majority() {
        // 6-2, 3-6, 6-4: home takes it two games to one.
        let line = line_with_games(&[("6", "2"), ("3", "6"), ("6", "4")]);
        assert_eq!(determine_winner(&line, "H", "A").as_deref(), Some("H"));
    }

    #[test]
    fn tied_single_game_yields_no_winner() {
        let line = line_with_games(&[("6", "6")]);
        assert_eq!(determine_winner(&line, "H", "A"), None);
    }

    #[test]
    fn equal_game_counts_yield_no_winner() {
        let line = line_with_games(&[("6", "2"), ("2", "6")]);
        assert_eq!(determine_winner(&line, "H", "A"), None);
    }

    #[test]
    fn blank_and_junk_scores_are_ignored() {
        let line = line_with_games(&[("", ""), ("six", "4"), ("6", "3")]);
        assert_eq!(determine_winner(&line, "H", "A").as_deref(), Some("H"));
    }

    #[test]
    fn no_winner_without_both_teams_selected() {
        let line = line_with_games(&[("6", "0")]);
        assert_eq!(determine_winner(&line, "", "A"), None);
        assert_eq!(determine_winner(&line, "H", ""), None);
    }

    #[test]
    fn match_winner_needs_strict_line_majority() {
        let mut lines = vec![empty_line(1), empty_line(2), empty_line(3)];
        lines[0].winner_team_id = Some("H".into());
        lines[1].winner_team_id = Some("H".into());
        lines[2].winner_team_id = Some("A".into());
        assert_eq!(derive_match_winner(&lines, "H", "A").as_deref(), Some("H"));

        lines[1].winner_team_id = Some("A".into());
        lines[2].winner_team_id = None;
        assert_eq!(derive_match_winner(&lines, "H", "A"), None);
    }

    #[test]
    fn renumbering_is_contiguous_and_order_preserving() {
        let mut lines = vec![empty_line(4), empty_line(9), empty_line(2)];
        lines[1].home.player1_id = "marker".into();
        let renumbered = renumber_lines(lines);
        let numbers: Vec<u32> = renumbered.iter().map(|l| l.line_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(renumbered[1].home.player1_id, "marker");
    }

    #[test]
    fn removing_middle_line_renumbers_remainder() {
        let lines = vec![empty_line(1), empty_line(2), empty_line(3)];
        let remaining = remove_line_at(lines, 1);
        let numbers: Vec<u32> = remaining.iter().map(|l| l.line_number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn last_line_and_last_game_cannot_be_removed() {
        let lines = vec![empty_line(1)];
        assert_eq!(remove_line_at(lines.clone(), 0).len(), 1);

        let mut line = empty_line(1);
        line.games = vec![GameForm::default()];
        assert!(!remove_last_game(&mut line));
        assert_eq!(line.games.len(), 1);
    }

    #[test]
    fn generated_scores_give_the_designated_side_the_majority() {
        for count in [1, 3, 5] {
            let games = generate_game_scores(count, WinnerSide::Away);
            assert_eq!(games.len(), count);
            let line = LineForm {
                line_number: 1,
                games,
                ..LineForm::default()
            };
            assert_eq!(determine_winner(&line, "H", "A").as_deref(), Some("A"));
        }
    }

    #[test]
    fn generated_scores_never_go_negative() {
        for game in generate_game_scores(7, WinnerSide::Home) {
            assert!(game.home.parse::<i64>().unwrap() >= 0);
            assert!(game.away.parse::<i64>().unwrap() >= 0);
        }
    }

    #[test]
    fn player_rotation_wraps_and_handles_tiny_rosters() {
        let roster: Vec<Player> = ["p1", "p2", "p3"]
            .iter()
            .map(|id| Player {
                id: id.to_string(),
                full_name: id.to_string(),
            })
            .collect();
        assert_eq!(pick_players_for_line(&roster, 0), ("p1".into(), "p2".into()));
        assert_eq!(pick_players_for_line(&roster, 2), ("p3".into(), "p1".into()));
        assert_eq!(pick_players_for_line(&roster[..1], 4), ("p1".into(), "p1".into()));
        assert_eq!(pick_players_for_line(&[], 0), (String::new(), String::new()));
    }

    #[test]
    fn validation_collects_every_problem_eagerly() {
        let mut line = empty_line(1);
        line.games[0] = GameForm {
            home: "6".into(),
            away: "3".into(),
        };
        let lines = vec![line];
        let errors = validate_match_form(&MatchFormView {
            lines: &lines,
            home_team_id: "t1",
            away_team_id: "t1",
            match_date: "",
            match_time: "19:00",
            location: "  ",
        });

        assert!(errors.contains(&"Home and away teams must be different.".to_string()));
        assert!(errors.contains(&"Provide a match date.".to_string()));
        assert!(errors.contains(&"Enter the match location.".to_string()));
        assert!(errors.contains(&"Line 1: select both home players.".to_string()));
        assert!(errors.contains(&"Line 1: select both away players.".to_string()));
        assert!(errors.contains(&"Line 1: enter scores for Game 2.".to_string()));
        assert!(errors.contains(&"Line 1: winner missing or tie detected.".to_string()));
    }

    #[test]
    fn complete_form_passes_validation() {
        let mut line = empty_line(1);
        line.home = PairSlots {
            player1_id: "p1".into(),
            player2_id: "p2".into(),
        };
        line.away = PairSlots {
            player1_id: "p3".into(),
            player2_id: "p4".into(),
        };
        line.games = generate_game_scores(3, WinnerSide::Home);
        line.winner_team_id = determine_winner(&line, "t1", "t2");
        let lines = vec![line];

        let errors = validate_match_form(&MatchFormView {
            lines: &lines,
            home_team_id: "t1",
            away_team_id: "t2",
            match_date: "2025-04-12",
            match_time: "19:00",
            location: "Center Courts",
        });
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }
}
