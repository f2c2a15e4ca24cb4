//! Board rendering model.
//!
//! Maps a [`Snapshot`] onto the squares of a board, with the style classes
//! each square carries.

use crate::{
    board::{Level, Square},
    game::Slot,
    replay::{Occupant, Replay, Snapshot},
};

/// A square of a rendered board.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cell {
    /// The square.
    pub square: Square,
    /// The move occupying the square and the slot of its player.
    ///
    /// The slot is `None` for a player not in the game.
    pub occupant: Option<(Option<Slot>, Occupant)>,
    /// Whether the square was played by the last applied move.
    pub is_last_move: bool,
    /// Whether the square is part of a line scored by the last applied move.
    pub is_scoring: bool,
}

impl Cell {
    /// Returns the style classes of the cell, starting with `square`.
    #[must_use]
    pub fn classes(&self) -> Vec<&'static str> {
        let mut classes = vec!["square"];
        if let Some((Some(slot), _)) = &self.occupant {
            classes.push(slot.css_class());
        }
        if self.is_last_move {
            classes.push("last-move");
        }
        if self.is_scoring {
            classes.push("scoring-square");
        }
        classes
    }

    /// Returns the hover title of an occupied cell.
    #[must_use]
    pub fn title(&self, replay: &Replay) -> Option<String> {
        let (_, occupant) = self.occupant.as_ref()?;
        let mut title = format!(
            "{} • move {} (player move {})",
            replay.player_name(&occupant.player_id),
            occupant.game_move,
            occupant.player_move,
        );
        if !occupant.think_time.is_empty() {
            title.push_str(&format!(" • {}", occupant.think_time));
        }
        if occupant.move_score != 0 {
            title.push_str(&format!(" • +{}", occupant.move_score));
        }
        Some(title)
    }
}

/// A board rendered at some point of a replay.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BoardView {
    level: Level,
    cells: Vec<Cell>,
}

impl BoardView {
    /// Renders the board of a replay at a snapshot.
    #[must_use]
    pub fn new(replay: &Replay, snapshot: &Snapshot) -> Self {
        let level = replay.level();
        let cells = level
            .squares()
            .map(|square| Cell {
                square,
                occupant: snapshot.occupant(square).map(|occupant| {
                    let slot = replay.player(&occupant.player_id).map(|(slot, _)| slot);
                    (slot, occupant.clone())
                }),
                is_last_move: snapshot.is_current(square),
                is_scoring: snapshot.scoring_squares.contains(&square),
            })
            .collect();
        Self { level, cells }
    }

    /// Returns the side length of the board.
    #[must_use]
    pub fn size(&self) -> u8 {
        self.level.size()
    }

    /// Returns the cells, row by row.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Returns an iterator of rows of cells.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.size().into())
    }

    /// Returns the cell at the given square, if on the board.
    #[must_use]
    pub fn cell(&self, square: Square) -> Option<&Cell> {
        if !self.level.contains(square) {
            return None;
        }
        let size = usize::from(self.size());
        self.cells
            .get(usize::from(square.row) * size + usize::from(square.col))
    }
}
