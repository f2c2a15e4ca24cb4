//! Plain-text rendering.

use crate::journal::JournalView;
use medot_core::{
    game::{GameState, Player, Slot},
    listing::{GameRow, JournalEntry, LeaderBoardRow, LogEntry},
    replay::{Replay, Snapshot},
    view::{BoardView, Cell},
};
use std::fmt::Write;

fn cell_text(cell: &Cell) -> String {
    let mark = match &cell.occupant {
        None => '.',
        Some((Some(Slot::Player1), _)) => '1',
        Some((Some(Slot::Player2), _)) => '2',
        Some((None, _)) => '?',
    };
    let (left, right) = if cell.is_last_move {
        ('[', ']')
    } else if cell.is_scoring {
        ('*', '*')
    } else {
        (' ', ' ')
    };
    format!("{left}{mark}{right}")
}

/// Renders a board as a grid, marking the last move with brackets and
/// squares of scoring lines with asterisks.
#[must_use]
pub fn board(view: &BoardView) -> String {
    let mut out = String::from("  ");
    for col in 1..=view.size() {
        _ = write!(out, "{col:^3}");
    }
    out.push('\n');

    for row in view.rows() {
        if let Some(first) = row.first() {
            out.push(first.square.row_letter());
            out.push(' ');
        }
        for cell in row {
            out.push_str(&cell_text(cell));
        }
        out.push('\n');
    }
    out
}

/// Renders the running totals of the players in a snapshot.
#[must_use]
pub fn standings(replay: &Replay, snapshot: &Snapshot) -> String {
    let mut out = String::new();
    for (slot, meta) in replay.players().iter() {
        let stats = snapshot.stats_of(&meta.id);
        _ = writeln!(
            out,
            "{} {} ({}, {}): {} moves, {} points",
            slot_mark(slot),
            meta.name,
            meta.id,
            meta.kind,
            stats.moves,
            stats.score,
        );
    }
    out
}

fn slot_mark(slot: Slot) -> char {
    match slot {
        Slot::Player1 => '1',
        Slot::Player2 => '2',
    }
}

/// Renders a full replay frame: status line, board, standings and details.
#[must_use]
pub fn frame(replay: &Replay, snapshot: &Snapshot) -> String {
    format!(
        "{}\n{}{}{}\n",
        replay.status_line(snapshot),
        board(&BoardView::new(replay, snapshot)),
        standings(replay, snapshot),
        replay.move_details(snapshot),
    )
}

/// Renders a summary of a game state.
#[must_use]
pub fn game_summary(state: &GameState) -> String {
    let mut out = format!(
        "{} [{}] level {} ({}x{})\n",
        state.game_id,
        state.status,
        state.board.level,
        state.board.level.size(),
        state.board.level.size(),
    );
    for slot in Slot::VALUES {
        let status = state.status_of(slot);
        let winner = if status.is_winner { " (winner)" } else { "" };
        _ = writeln!(
            out,
            "{} {}: {} moves, {} points{winner}",
            slot_mark(slot),
            status.player.name,
            status.moves,
            status.score,
        );
    }
    if let Some(id) = state.current_player_id() {
        _ = writeln!(out, "To move: {id}");
    }
    if state.status.is_finished() {
        _ = writeln!(out, "Duration: {}", state.duration_display());
    }
    out
}

/// Renders the leaderboard, ranked from the given offset.
#[must_use]
pub fn leader_board(rows: &[LeaderBoardRow], offset: u32) -> String {
    if rows.is_empty() {
        return "No players ranked yet.\n".into();
    }
    let mut out = format!(
        "{:>4}  {:<24} {:>6} {:>6} {:>6} {:>6}\n",
        "#", "Player", "Played", "Won", "Lost", "Drawn"
    );
    for (i, row) in rows.iter().enumerate() {
        _ = writeln!(
            out,
            "{:>4}  {:<24} {:>6} {:>6} {:>6} {:>6}",
            offset as usize + i + 1,
            row.player_id,
            row.games_played,
            row.games_won,
            row.games_lost,
            row.games_draw,
        );
    }
    out
}

/// Renders a game listing, with outcomes from a player's perspective if given.
#[must_use]
pub fn games(rows: &[GameRow], player_id: Option<&str>) -> String {
    if rows.is_empty() {
        return "No games found.\n".into();
    }
    let mut out = String::new();
    for row in rows {
        let result = match player_id {
            Some(id) => row.outcome_for(id).to_string(),
            None => row.status.to_string(),
        };
        let created = row
            .created_at
            .map_or_else(String::new, |t| t.format("%Y-%m-%d %H:%M").to_string());
        _ = writeln!(
            out,
            "{}  {created:<16}  {:<6} {} ({}) vs {} ({})  {result}",
            row.game_id,
            row.level,
            row.player1_name,
            row.player1_score,
            row.player2_name,
            row.player2_score,
        );
    }
    out
}

/// Renders a player list.
#[must_use]
pub fn players(players: &[Player]) -> String {
    if players.is_empty() {
        return "No players found.\n".into();
    }
    let mut out = String::new();
    for player in players {
        _ = write!(out, "{:<24} {:<6} {}", player.id, player.kind, player.name);
        if let Some(model) = &player.model {
            _ = write!(out, " [{model}]");
        }
        out.push('\n');
    }
    out
}

/// Renders action log entries.
#[must_use]
pub fn log_entries(entries: &[LogEntry]) -> String {
    if entries.is_empty() {
        return "No log entries.\n".into();
    }
    let mut out = String::new();
    for entry in entries {
        let time = entry
            .time
            .map_or_else(String::new, |t| t.format("%H:%M:%S").to_string());
        let first_line = entry.message.lines().next().unwrap_or_default();
        _ = writeln!(
            out,
            "{time:<8}  {:<16} {:<14} {first_line}",
            format!("{:?}", entry.kind),
            entry.player_id,
        );
    }
    out
}

/// Renders a journal entry, listing the lines changed since the previous one.
#[must_use]
pub fn journal(view: &JournalView) -> String {
    let JournalEntry {
        agent_id,
        sequence_id,
        instructions,
        updated_at,
        ..
    } = &view.current;
    let mut out = format!("{agent_id} #{sequence_id}");
    if let Some(t) = updated_at {
        _ = write!(out, " ({})", t.format("%Y-%m-%d %H:%M:%S"));
    }
    out.push('\n');

    let previous: Vec<&str> = view
        .previous
        .as_ref()
        .map(|p| p.instructions.lines().collect())
        .unwrap_or_default();
    for line in instructions.lines() {
        let mark = if view.previous.is_some() && !previous.contains(&line) {
            '+'
        } else {
            ' '
        };
        _ = writeln!(out, "{mark} {line}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use medot_core::game::{Move, PlayerStatus, ScoringKind, ScoringLine};

    fn sq(s: &str) -> medot_core::board::Square {
        s.parse().unwrap()
    }

    fn replay() -> Replay {
        let status = |id: &str| PlayerStatus {
            player: Player {
                id: id.into(),
                name: id.to_uppercase(),
                ..Default::default()
            },
            ..Default::default()
        };
        let game = GameState {
            game_id: "g".into(),
            player1_status: status("p1"),
            player2_status: status("p2"),
            ..Default::default()
        };
        let moves = vec![
            Move::new(sq("A1"), "p1"),
            Move {
                move_score: 2,
                scoring_lines: vec![ScoringLine {
                    kind: ScoringKind::Adjacent,
                    score: Some(2),
                    move_square_id: Some(sq("A2")),
                    scoring_square_ids: vec![sq("B1"), sq("A2")],
                }],
                ..Move::new(sq("A2"), "p2")
            },
        ];
        Replay::new(game, moves)
    }

    #[test]
    fn board_grid() {
        let replay = replay();
        let text = board(&BoardView::new(&replay, &replay.snapshot()));
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "   1  2  3  4  5 ");
        assert_eq!(lines[1], "A  1 [2] .  .  . ");
        assert_eq!(lines[2], "B *.* .  .  .  . ");
        assert_eq!(lines[5], "E  .  .  .  .  . ");
    }

    #[test]
    fn frame_text() {
        let replay = replay();
        let text = frame(&replay, &replay.build_snapshot(1));
        assert!(text.starts_with("Move 1 / 2 – P1 (A1)\n"));
        assert!(text.contains("1 P1 (p1, human): 1 moves, 0 points\n"));
        assert!(text.contains("2 P2 (p2, human): 0 moves, 0 points\n"));
        assert!(text.ends_with("Points this move: 0 • Scoring squares: None.\n"));
    }

    #[test]
    fn journal_diff() {
        let entry = |seq, text: &str| JournalEntry {
            agent_id: "bot".into(),
            sequence_id: seq,
            instructions: text.into(),
            ..Default::default()
        };
        let view = JournalView {
            current: entry(2, "keep\nnew"),
            previous: Some(entry(1, "keep\nold")),
        };
        assert_eq!(journal(&view), "bot #2\n  keep\n+ new\n");

        let view = JournalView {
            current: entry(1, "first"),
            previous: None,
        };
        assert_eq!(journal(&view), "bot #1\n  first\n");
    }

    #[test]
    fn empty_listings() {
        assert_eq!(leader_board(&[], 0), "No players ranked yet.\n");
        assert_eq!(games(&[], None), "No games found.\n");
        assert_eq!(log_entries(&[]), "No log entries.\n");
    }
}
