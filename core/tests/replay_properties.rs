#![allow(missing_docs)]

use medot_core::{
    board::{Level, Square},
    game::{BoardInfo, GameState, Move, Player, PlayerStatus, ScoringKind, ScoringLine},
    replay::Replay,
};
use rand::{prelude::*, rngs::ThreadRng};
use std::collections::HashSet;

const PLAYERS: [&str; 2] = ["p1", "p2"];

fn random_moves(rng: &mut ThreadRng, level: Level) -> Vec<Move> {
    let mut squares: Vec<Square> = level.squares().collect();
    squares.shuffle(&mut *rng);
    let len = rng.random_range(0..=squares.len());

    squares[..len]
        .iter()
        .enumerate()
        .map(|(i, &square)| {
            let mut mov = Move::new(square, PLAYERS[i % 2]);
            mov.think_ms = rng.random_bool(0.5).then(|| rng.random_range(0..200_000));
            if rng.random_bool(0.3) {
                let score = rng.random_range(1..5);
                mov.move_score = score;
                mov.scoring_lines.push(ScoringLine {
                    kind: ScoringKind::Vertical,
                    score: Some(score),
                    move_square_id: Some(square),
                    scoring_square_ids: vec![square, Square::new(square.row / 2, square.col)],
                });
            }
            mov
        })
        .collect()
}

/// Builds a game state whose standings agree with the moves.
fn game_for(level: Level, moves: &[Move]) -> GameState {
    let status = |id: &str| PlayerStatus {
        player: Player {
            id: id.into(),
            name: id.to_uppercase(),
            ..Default::default()
        },
        moves: moves.iter().filter(|m| m.player_id == id).count() as u32,
        score: moves
            .iter()
            .filter(|m| m.player_id == id)
            .map(|m| m.move_score)
            .sum(),
        is_winner: false,
    };
    GameState {
        game_id: "random".into(),
        board: BoardInfo { level },
        player1_status: status(PLAYERS[0]),
        player2_status: status(PLAYERS[1]),
        ..Default::default()
    }
}

fn random_replay(rng: &mut ThreadRng) -> Replay {
    let level = Level::from_repr(rng.random_range(0..3)).unwrap();
    let moves = random_moves(rng, level);
    Replay::new(game_for(level, &moves), moves)
}

#[test]
fn snapshots_do_not_depend_on_path() {
    let mut rng = rand::rng();

    for _ in 0..100 {
        let mut replay = random_replay(&mut rng);
        let total = replay.total_moves();
        let direct: Vec<_> = (0..=total).map(|i| replay.build_snapshot(i)).collect();

        replay.step_first();
        for expected in &direct {
            assert_eq!(&replay.snapshot(), expected);
            replay.step_next();
        }
        for expected in direct.iter().rev() {
            assert_eq!(&replay.snapshot(), expected);
            replay.step_prev();
        }
        for _ in 0..20 {
            let i = rng.random_range(-3..total as i64 + 3) as isize;
            replay.set_index(i);
            let index = replay.move_index();
            assert_eq!(index as isize, i.clamp(0, total as isize));
            assert_eq!(replay.snapshot(), direct[index]);
        }
    }
}

#[test]
fn replay_agrees_with_standings() {
    let mut rng = rand::rng();

    for _ in 0..100 {
        let replay = random_replay(&mut rng);
        assert_eq!(replay.cross_check(), Ok(()));
    }
}

#[test]
fn snapshot_totals() {
    let mut rng = rand::rng();

    for _ in 0..100 {
        let replay = random_replay(&mut rng);
        let moves = replay.moves();

        for i in 0..=moves.len() {
            let snapshot = replay.build_snapshot(i);
            let distinct: HashSet<_> = moves[..i].iter().map(|m| m.square_id).collect();
            assert_eq!(snapshot.occupancy.len(), distinct.len());

            let total_moves: u32 = snapshot.per_player.values().map(|s| s.moves).sum();
            assert_eq!(total_moves as usize, i);
            let total_score: i32 = snapshot.per_player.values().map(|s| s.score).sum();
            assert_eq!(total_score, moves[..i].iter().map(|m| m.move_score).sum::<i32>());

            for player in PLAYERS {
                let stats = snapshot.stats_of(player);
                let own = moves[..i].iter().filter(|m| m.player_id == player);
                assert_eq!(stats.moves as usize, own.clone().count());
                assert_eq!(stats.score, own.map(|m| m.move_score).sum::<i32>());
            }

            match &snapshot.current_move {
                Some(mov) => {
                    assert_eq!(mov, &moves[i - 1]);
                    assert!(snapshot.scoring_squares.contains(&mov.square_id));
                    let line_squares = mov
                        .scoring_lines
                        .iter()
                        .flat_map(|line| &line.scoring_square_ids);
                    for square in line_squares {
                        assert!(snapshot.scoring_squares.contains(square));
                    }
                }
                None => {
                    assert_eq!(i, 0);
                    assert!(snapshot.scoring_squares.is_empty());
                }
            }
        }
    }
}
