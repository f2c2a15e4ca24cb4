//! Replay of a game's move history.
//!
//! A [`Replay`] holds a game record and a move index. Every [`Snapshot`] is
//! rebuilt from the start of the history, so stepping forward and backward
//! always agree with each other.


use crate::{
    board::{Level, Square},
    game::{GameState, Move, PlayerKind, Slot, Slots, format_think_time},
};
use std::collections::{BTreeSet, HashMap};

/// Display information of a player, derived once when a game is loaded.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PlayerMeta {
    /// The player ID.
    pub id: String,
    /// The display name.
    pub name: String,
    /// The player kind.
    pub kind: PlayerKind,
}

/// Running totals of a player.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PlayerStats {
    /// Moves made so far.
    pub moves: u32,
    /// Points earned so far.
    pub score: i32,
}

/// The move occupying a square.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Occupant {
    /// The player who made the move.
    pub player_id: String,
    /// The 1-based position of the move in the game.
    pub game_move: usize,
    /// The 1-based position of the move among the player's moves.
    pub player_move: u32,
    /// The formatted think time, empty if unknown.
    pub think_time: String,
    /// The points earned by the move.
    pub move_score: i32,
}

/// The board and statistics after a prefix of the move history.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Snapshot {
    /// The number of moves in the history.
    pub total_moves: usize,
    /// The number of moves applied.
    pub index: usize,
    /// Occupied squares.
    pub occupancy: HashMap<Square, Occupant>,
    /// Running totals by player ID.
    pub per_player: HashMap<String, PlayerStats>,
    /// The last applied move.
    pub current_move: Option<Move>,
    /// Squares of the scoring lines earned by the last applied move.
    pub scoring_squares: BTreeSet<Square>,
}

impl Snapshot {
    /// Returns the running totals of a player, zero if the player is unknown.
    #[must_use]
    pub fn stats_of(&self, player_id: &str) -> PlayerStats {
        self.per_player.get(player_id).copied().unwrap_or_default()
    }

    /// Returns the move occupying a square (if any).
    #[must_use]
    pub fn occupant(&self, square: Square) -> Option<&Occupant> {
        self.occupancy.get(&square)
    }

    /// Tests if the square was played by the last applied move.
    #[must_use]
    pub fn is_current(&self, square: Square) -> bool {
        self.current_move
            .as_ref()
            .is_some_and(|mov| mov.square_id == square)
    }
}

/// A navigation step through the move history.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    /// To the start of the game.
    First,
    /// One move back.
    Prev,
    /// One move forward.
    Next,
    /// To the end of the history.
    Last,
}

impl Step {
    /// Maps a key name to a step.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "ArrowLeft" => Self::Prev,
            "ArrowRight" => Self::Next,
            "," | "<" => Self::First,
            "." | ">" => Self::Last,
            _ => return None,
        })
    }
}

/// Whether each navigation step is available.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Controls {
    /// Whether `First` is enabled.
    pub first: bool,
    /// Whether `Prev` is enabled.
    pub prev: bool,
    /// Whether `Next` is enabled.
    pub next: bool,
    /// Whether `Last` is enabled.
    pub last: bool,
}

impl Controls {
    /// Tests if the given step is enabled.
    #[must_use]
    pub fn is_enabled(self, step: Step) -> bool {
        match step {
            Step::First => self.first,
            Step::Prev => self.prev,
            Step::Next => self.next,
            Step::Last => self.last,
        }
    }
}

/// A disagreement between a replay and the reported game state.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[remain::sorted]
pub enum CrossCheckError {
    /// Replayed move counts disagree.
    #[error("player {player_id} made {replayed} moves in replay but {reported} in game state")]
    Moves {
        /// The player ID.
        player_id: String,
        /// The replayed count.
        replayed: u32,
        /// The reported count.
        reported: u32,
    },
    /// Replayed scores disagree.
    #[error("player {player_id} scored {replayed} in replay but {reported} in game state")]
    Score {
        /// The player ID.
        player_id: String,
        /// The replayed score.
        replayed: i32,
        /// The reported score.
        reported: i32,
    },
}

/// A game loaded for replay, with a current move index.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Replay {
    game: GameState,
    moves: Vec<Move>,
    players: Slots<PlayerMeta>,
    index: usize,
}

impl Replay {
    /// Creates a replay positioned after the last move.
    #[must_use]
    pub fn new(game: GameState, moves: Vec<Move>) -> Self {
        let players = Slots(Slot::VALUES.map(|slot| {
            let player = &game.status_of(slot).player;
            PlayerMeta {
                id: player.id.clone(),
                name: player.name.clone(),
                kind: player.kind,
            }
        }));
        Self {
            index: moves.len(),
            game,
            moves,
            players,
        }
    }

    /// Returns the game state the replay was loaded with.
    #[must_use]
    pub fn game(&self) -> &GameState {
        &self.game
    }

    /// Returns the board level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.game.board.level
    }

    /// Returns a slice of all moves.
    #[must_use]
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Returns the players by slot.
    #[must_use]
    pub fn players(&self) -> &Slots<PlayerMeta> {
        &self.players
    }

    /// Returns the slot and display information of a player (if known).
    #[must_use]
    pub fn player(&self, player_id: &str) -> Option<(Slot, &PlayerMeta)> {
        self.players.iter().find(|(_, meta)| meta.id == player_id)
    }

    /// Returns the display name of a player, falling back to the ID.
    #[must_use]
    pub fn player_name<'a>(&'a self, player_id: &'a str) -> &'a str {
        self.player(player_id)
            .map_or(player_id, |(_, meta)| meta.name.as_str())
    }

    /// Returns the number of moves in the history.
    #[must_use]
    pub fn total_moves(&self) -> usize {
        self.moves.len()
    }

    /// Returns the current move index.
    #[must_use]
    pub fn move_index(&self) -> usize {
        self.index
    }

    /// Tests if there is any move in the past.
    #[must_use]
    pub fn has_past(&self) -> bool {
        self.index > 0
    }

    /// Tests if there is any move in the future.
    #[must_use]
    pub fn has_future(&self) -> bool {
        self.index < self.moves.len()
    }

    /// Sets the move index, clamped into `0..=total_moves`.
    ///
    /// Returns whether the index changed.
    pub fn set_index(&mut self, index: isize) -> bool {
        let total = self.moves.len();
        let clamped = usize::try_from(index).map_or(0, |i| i.min(total));
        let changed = clamped != self.index;
        self.index = clamped;
        changed
    }

    /// Takes a navigation step, returning whether the index changed.
    pub fn step(&mut self, step: Step) -> bool {
        let index = self.index as isize;
        match step {
            Step::First => self.set_index(0),
            Step::Prev => self.set_index(index - 1),
            Step::Next => self.set_index(index + 1),
            Step::Last => self.set_index(self.moves.len() as isize),
        }
    }

    /// Jumps to the start of the game.
    pub fn step_first(&mut self) -> bool {
        self.step(Step::First)
    }

    /// Steps one move back.
    pub fn step_prev(&mut self) -> bool {
        self.step(Step::Prev)
    }

    /// Steps one move forward.
    pub fn step_next(&mut self) -> bool {
        self.step(Step::Next)
    }

    /// Jumps to the end of the history.
    pub fn step_last(&mut self) -> bool {
        self.step(Step::Last)
    }

    /// Returns which navigation steps are available.
    #[must_use]
    pub fn controls(&self) -> Controls {
        if self.moves.is_empty() {
            return Controls::default();
        }
        Controls {
            first: self.has_past(),
            prev: self.has_past(),
            next: self.has_future(),
            last: self.has_future(),
        }
    }

    /// Builds the snapshot at the current move index.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.build_snapshot(self.index)
    }

    /// Builds the snapshot after the first `index` moves, clamped to the
    /// history length.
    #[must_use]
    pub fn build_snapshot(&self, index: usize) -> Snapshot {
        let index = index.min(self.moves.len());

        let mut per_player: HashMap<String, PlayerStats> = self
            .players
            .iter()
            .map(|(_, meta)| (meta.id.clone(), PlayerStats::default()))
            .collect();
        let mut occupancy = HashMap::new();

        for (i, mov) in self.moves[..index].iter().enumerate() {
            let stats = per_player.entry(mov.player_id.clone()).or_default();
            stats.moves += 1;
            stats.score += mov.move_score;

            occupancy.insert(
                mov.square_id,
                Occupant {
                    player_id: mov.player_id.clone(),
                    game_move: i + 1,
                    player_move: stats.moves,
                    think_time: format_think_time(mov.think_ms),
                    move_score: mov.move_score,
                },
            );
        }

        let current_move = index.checked_sub(1).map(|i| self.moves[i].clone());
        let scoring_squares = current_move
            .as_ref()
            .map(scoring_squares)
            .unwrap_or_default();

        Snapshot {
            total_moves: self.moves.len(),
            index,
            occupancy,
            per_player,
            current_move,
            scoring_squares,
        }
    }

    /// Checks the final replayed totals against the reported player standings.
    ///
    /// # Errors
    ///
    /// Returns the first disagreement found.
    pub fn cross_check(&self) -> Result<(), CrossCheckError> {
        let snapshot = self.build_snapshot(self.moves.len());
        for slot in Slot::VALUES {
            let status = self.game.status_of(slot);
            let player_id = &status.player.id;
            let stats = snapshot.stats_of(player_id);

            if stats.moves != status.moves {
                return Err(CrossCheckError::Moves {
                    player_id: player_id.clone(),
                    replayed: stats.moves,
                    reported: status.moves,
                });
            }
            if stats.score != status.score {
                return Err(CrossCheckError::Score {
                    player_id: player_id.clone(),
                    replayed: stats.score,
                    reported: status.score,
                });
            }
        }
        Ok(())
    }

    /// Describes the position of a snapshot in one line.
    #[must_use]
    pub fn status_line(&self, snapshot: &Snapshot) -> String {
        let total = snapshot.total_moves;
        match &snapshot.current_move {
            _ if total == 0 => "No moves recorded".into(),
            None => format!("Move 0 / {total} (start)"),
            Some(mov) => format!(
                "Move {} / {total} – {} ({})",
                snapshot.index,
                self.player_name(&mov.player_id),
                mov.square_id
            ),
        }
    }

    /// Describes the last applied move of a snapshot.
    #[must_use]
    pub fn move_details(&self, snapshot: &Snapshot) -> String {
        if snapshot.total_moves == 0 {
            return "No moves were recorded for this game.".into();
        }
        let Some(mov) = &snapshot.current_move else {
            return "Game start. Step through the moves to review the game.".into();
        };

        let think_time = mov.think_time_display();
        let after = if think_time.is_empty() {
            String::new()
        } else {
            format!(" after {think_time}")
        };

        format!(
            "Move {}: {} played {}{after}.\nPoints this move: {} • Scoring squares: {}.",
            snapshot.index,
            self.player_name(&mov.player_id),
            mov.square_id,
            mov.move_score,
            mov.scoring_display(),
        )
    }
}

/// Collects the squares of a move's scoring lines, including its own
/// square if it earned any line.
fn scoring_squares(mov: &Move) -> BTreeSet<Square> {
    let mut squares: BTreeSet<_> = mov
        .scoring_lines
        .iter()
        .flat_map(|line| line.scoring_square_ids.iter().copied())
        .collect();
    squares.insert(mov.square_id);
    squares
}
