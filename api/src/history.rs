//! Read-side normalization: rebuild per-team match aggregates from raw
//! persisted rows. The stored match winner is not trusted on its own: line
//! wins come from the stored line winners, game tallies are re-derived from
//! the actual scores, and the match result falls back to score comparison
//! when no winner was declared for either side.

use crate::rest::{LineGameRow, MatchHistoryRow, MatchLineRow, PersonRow, coerce_score};
use crate::{GameScore, LineDetail, MatchHistoryEntry, MatchResult, Player, format_full_name};

pub fn normalize_match_history(rows: Vec<MatchHistoryRow>, team_id: &str) -> Vec<MatchHistoryEntry> {
    rows.into_iter()
        .filter_map(|row| normalize_row(row, team_id))
        .collect()
}

fn normalize_row(row: MatchHistoryRow, team_id: &str) -> Option<MatchHistoryEntry> {
    let home_team = row.home_team.take_first()?;
    let away_team = row.away_team.take_first()?;

    let is_home_match = row.home_team_id == team_id;
    let opponent = if is_home_match { away_team } else { home_team };
    let opponent_id = opponent.id.clone();

    let line_rows = row.match_line.into_vec();
    let lines = build_line_details(&line_rows, team_id, &opponent_id);

    let team_score = count_lines_won(&line_rows, team_id);
    let opponent_score = count_lines_won(&line_rows, &opponent_id);
    let games_won = count_games_won(&line_rows, team_id, &row.home_team_id, &row.away_team_id);
    let games_lost = count_games_won(&line_rows, &opponent_id, &row.home_team_id, &row.away_team_id);

    let result = determine_result(
        row.winner_team_id.as_deref(),
        team_score,
        opponent_score,
        team_id,
        &opponent_id,
    );

    Some(MatchHistoryEntry {
        id: row.id,
        match_date: row.match_date.unwrap_or_default(),
        match_time: row.match_time,
        location: row.location,
        opponent_name: opponent.name.unwrap_or_else(|| "Unknown opponent".to_string()),
        opponent_id,
        is_home_match,
        team_score,
        opponent_score,
        result,
        points_earned: games_won,
        games_won,
        games_lost,
        lines,
    })
}

/// Match result, declared winner first, score comparison as fallback.
fn determine_result(
    declared_winner_id: Option<&str>,
    team_score: u32,
    opponent_score: u32,
    team_id: &str,
    opponent_id: &str,
) -> MatchResult {
    if declared_winner_id == Some(team_id) {
        return MatchResult::Win;
    }
    if declared_winner_id == Some(opponent_id) {
        return MatchResult::Loss;
    }
    if team_score == opponent_score {
        return MatchResult::Tie;
    }
    if team_score > opponent_score {
        MatchResult::Win
    } else {
        MatchResult::Loss
    }
}

fn count_lines_won(lines: &[MatchLineRow], team_id: &str) -> u32 {
    lines
        .iter()
        .filter(|line| line.winner_team_id.as_deref() == Some(team_id))
        .count() as u32
}

/// Tally games won by `team_id` across all lines, straight from the scores.
/// Games with a missing or tied score count for neither side; a team that
/// played in neither slot of the match wins nothing.
fn count_games_won(
    lines: &[MatchLineRow],
    team_id: &str,
    home_team_id: &str,
    away_team_id: &str,
) -> u32 {
    let is_home_team = team_id == home_team_id;
    let is_away_team = team_id == away_team_id;
    if !is_home_team && !is_away_team {
        return 0;
    }

    lines
        .iter()
        .flat_map(|line| line.line_game.clone().into_vec())
        .filter(|game| {
            let (Some(home), Some(away)) =
                (coerce_score(&game.home_score), coerce_score(&game.away_score))
            else {
                return false;
            };
            if home == away {
                return false;
            }
            if is_home_team { home > away } else { away > home }
        })
        .count() as u32
}

fn line_result_for_team(
    winner_team_id: Option<&str>,
    team_id: &str,
    opponent_id: &str,
) -> MatchResult {
    match winner_team_id {
        Some(id) if id == team_id => MatchResult::Win,
        Some(id) if id == opponent_id => MatchResult::Loss,
        _ => MatchResult::Tie,
    }
}

fn player_pair(first: Option<PersonRow>, second: Option<PersonRow>) -> Vec<Player> {
    [first, second]
        .into_iter()
        .flatten()
        .map(|person| Player {
            full_name: format_full_name(person.first_name.as_deref(), person.last_name.as_deref()),
            id: person.id,
        })
        .collect()
}

fn build_line_details(lines: &[MatchLineRow], team_id: &str, opponent_id: &str) -> Vec<LineDetail> {
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let games: Vec<GameScore> = line
                .line_game
                .clone()
                .into_vec()
                .into_iter()
                .enumerate()
                .map(|(game_index, game)| map_game(game, &line.id, game_index))
                .collect();

            LineDetail {
                id: line.id.clone(),
                line_number: line.line_number.unwrap_or(index as u32 + 1),
                winner_team_id: line.winner_team_id.clone(),
                result: line_result_for_team(line.winner_team_id.as_deref(), team_id, opponent_id),
                home_players: player_pair(
                    line.home_player1.clone().take_first(),
                    line.home_player2.clone().take_first(),
                ),
                away_players: player_pair(
                    line.away_player1.clone().take_first(),
                    line.away_player2.clone().take_first(),
                ),
                games,
            }
        })
        .collect()
}

fn map_game(game: LineGameRow, line_id: &str, game_index: usize) -> GameScore {
    GameScore {
        id: game.id.unwrap_or_else(|| format!("{line_id}-{game_index}")),
        home_score: coerce_score(&game.home_score),
        away_score: coerce_score(&game.away_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn history_row(value: serde_json::Value) -> MatchHistoryRow {
        serde_json::from_value(value).expect("row should deserialize")
    }

    fn sample_row() -> MatchHistoryRow {
        history_row(json!({
            "id": "m1",
            "match_date": "2025-04-12",
            "match_time": "19:00",
            "location": "Center Courts",
            "home_team_id": "H",
            "away_team_id": "A",
            "winner_team_id": null,
            "home_team": {"id": "H", "name": "Harbor"},
            "away_team": {"id": "A", "name": "Alpine"},
            "match_line": [
                {
                    "id": "l1",
                    "line_number": 1,
                    "winner_team_id": "H",
                    "line_game": [
                        {"id": "g1", "home_score": 6, "away_score": 2},
                        {"id": "g2", "home_score": 3, "away_score": 6},
                        {"id": "g3", "home_score": 6, "away_score": 4}
                    ]
                },
                {
                    "id": "l2",
                    "line_number": 2,
                    "winner_team_id": "A",
                    "line_game": [
                        {"id": "g4", "home_score": "1", "away_score": "6"},
                        {"id": "g5", "home_score": 2, "away_score": 6}
                    ]
                }
            ]
        }))
    }

    #[test]
    fn aggregates_are_rederived_from_scores() {
        let entries = normalize_match_history(vec![sample_row()], "H");
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];

        assert!(entry.is_home_match);
        assert_eq!(entry.opponent_name, "Alpine");
        assert_eq!(entry.team_score, 1);
        assert_eq!(entry.opponent_score, 1);
        // Home won games g1 and g3; string scores in line 2 still count.
        assert_eq!(entry.games_won, 2);
        assert_eq!(entry.games_lost, 3);
        assert_eq!(entry.points_earned, 2);
        // No declared winner and lines split 1-1: a tie.
        assert_eq!(entry.result, MatchResult::Tie);
    }

    #[test]
    fn declared_winner_takes_precedence_over_scores() {
        let mut row = sample_row();
        row.winner_team_id = Some("A".into());
        let entries = normalize_match_history(vec![row], "H");
        assert_eq!(entries[0].result, MatchResult::Loss);
    }

    #[test]
    fn score_comparison_breaks_missing_declarations() {
        let mut row = sample_row();
        // Flip line 2 to home so the home side leads 2-0 on lines.
        let mut lines = row.match_line.clone().into_vec();
        lines[1].winner_team_id = Some("H".into());
        row.match_line = crate::rest::Relation::Many(lines);
        let entries = normalize_match_history(vec![row], "H");
        assert_eq!(entries[0].result, MatchResult::Win);

        let entries = normalize_match_history(vec![sample_row()], "A");
        assert_eq!(entries[0].result, MatchResult::Tie);
    }

    #[test]
    fn away_perspective_mirrors_home() {
        let entries = normalize_match_history(vec![sample_row()], "A");
        let entry = &entries[0];
        assert!(!entry.is_home_match);
        assert_eq!(entry.opponent_name, "Harbor");
        assert_eq!(entry.games_won, 3);
        assert_eq!(entry.games_lost, 2);
    }

    #[test]
    fn rows_missing_either_team_are_dropped() {
        let row = history_row(json!({
            "id": "m2",
            "home_team_id": "H",
            "away_team_id": "A",
            "home_team": null,
            "away_team": {"id": "A", "name": "Alpine"}
        }));
        assert!(normalize_match_history(vec![row], "H").is_empty());
    }

    #[test]
    fn line_numbers_fall_back_to_position() {
        let row = history_row(json!({
            "id": "m3",
            "home_team_id": "H",
            "away_team_id": "A",
            "home_team": {"id": "H", "name": "Harbor"},
            "away_team": {"id": "A", "name": "Alpine"},
            "match_line": [{"id": "l9", "line_number": null}]
        }));
        let entries = normalize_match_history(vec![row], "H");
        assert_eq!(entries[0].lines[0].line_number, 1);
        assert_eq!(entries[0].lines[0].result, MatchResult::Tie);
    }

    #[test]
    fn tied_and_unparsable_games_count_for_neither_side() {
        let row = history_row(json!({
            "id": "m4",
            "home_team_id": "H",
            "away_team_id": "A",
            "home_team": {"id": "H", "name": "Harbor"},
            "away_team": {"id": "A", "name": "Alpine"},
            "match_line": [{
                "id": "l1",
                "line_number": 1,
                "line_game": [
                    {"id": "g1", "home_score": 6, "away_score": 6},
                    {"id": "g2", "home_score": "n/a", "away_score": 4},
                    {"id": "g3", "home_score": 6, "away_score": 0}
                ]
            }]
        }));
        let entries = normalize_match_history(vec![row], "H");
        assert_eq!(entries[0].games_won, 1);
        assert_eq!(entries[0].games_lost, 0);
    }
}
