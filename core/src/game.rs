//! Game state and move history as reported by the game service.

use crate::board::{Level, Square};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    fmt,
    ops::Index,
};

/// Deserializes `null` as the default value.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

/// The status of a game.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// The game does not exist.
    #[default]
    Empty,
    /// The game is being played.
    InProgress,
    /// A player won the game.
    WonByPlayer,
    /// The game ended in a draw.
    Draw,
    /// The game was canceled before it ended.
    Canceled,
}

impl GameStatus {
    /// Tests if the game has ended, in any way.
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Self::WonByPlayer | Self::Draw | Self::Canceled)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empty => "Empty",
            Self::InProgress => "In Progress",
            Self::WonByPlayer => "Game Over",
            Self::Draw => "Draw",
            Self::Canceled => "Canceled",
        })
    }
}

/// Whether a player is a human or an AI agent.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    /// A human player.
    #[default]
    Human,
    /// An AI agent player.
    Agent,
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Human => "human",
            Self::Agent => "agent",
        })
    }
}

/// A player identity.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    /// The player ID.
    pub id: String,
    /// The player kind.
    #[serde(rename = "type")]
    pub kind: PlayerKind,
    /// The display name.
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    /// The model name, for agent players.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// A player's standing in a game.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatus {
    /// The player.
    pub player: Player,
    /// The number of moves made.
    #[serde(default)]
    pub moves: u32,
    /// The total score.
    #[serde(default)]
    pub score: i32,
    /// Whether the player won the game.
    #[serde(default)]
    pub is_winner: bool,
}

/// One of the two player slots of a game.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Slot {
    /// The first player.
    Player1 = 0,
    /// The second player.
    Player2 = 1,
}

impl Slot {
    /// Both slots, in order.
    pub const VALUES: [Self; 2] = [Self::Player1, Self::Player2];

    /// Returns the style class of squares owned by this slot.
    #[must_use]
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Player1 => "player1",
            Self::Player2 => "player2",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Player1 => "player 1",
            Self::Player2 => "player 2",
        })
    }
}

/// A value for each player slot.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Slots<T>(pub [T; 2]);

impl<T> Slots<T> {
    /// Returns an iterator of slots and their values.
    pub fn iter(&self) -> impl Iterator<Item = (Slot, &T)> {
        Slot::VALUES.into_iter().zip(&self.0)
    }
}

impl<T> Index<Slot> for Slots<T> {
    type Output = T;

    fn index(&self, slot: Slot) -> &T {
        &self.0[slot as usize]
    }
}


/// Board information of a game.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct BoardInfo {
    /// The board level.
    pub level: Level,
}

/// The authoritative state of a game.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// The game ID.
    pub game_id: String,
    /// When the game was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// The game status.
    #[serde(default)]
    pub status: GameStatus,
    /// The board.
    #[serde(default)]
    pub board: BoardInfo,
    /// The first player's standing.
    #[serde(default, deserialize_with = "nullable")]
    pub player1_status: PlayerStatus,
    /// The second player's standing.
    #[serde(default, deserialize_with = "nullable")]
    pub player2_status: PlayerStatus,
    /// The player to move, if the game is in progress.
    #[serde(default)]
    pub current_player: Option<PlayerStatus>,
    /// When the game finished.
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl GameState {
    /// Returns the standing of the player in the given slot.
    #[must_use]
    pub fn status_of(&self, slot: Slot) -> &PlayerStatus {
        match slot {
            Slot::Player1 => &self.player1_status,
            Slot::Player2 => &self.player2_status,
        }
    }

    /// Returns the slot of the player with the given ID.
    #[must_use]
    pub fn slot_of(&self, player_id: &str) -> Option<Slot> {
        Slot::VALUES
            .into_iter()
            .find(|&slot| self.status_of(slot).player.id == player_id)
    }

    /// Returns the ID of the player to move, if any.
    #[must_use]
    pub fn current_player_id(&self) -> Option<&str> {
        self.current_player.as_ref().map(|s| s.player.id.as_str())
    }

    /// Formats the game duration as `<minutes>m <seconds>s`,
    /// or `Unknown` if the game has not finished.
    #[must_use]
    pub fn duration_display(&self) -> String {
        match (self.created_at, self.finished_at) {
            (Some(start), Some(end)) => {
                let ms = (end - start).num_milliseconds().max(0);
                format!("{}m {}s", ms / 60_000, ms % 60_000 / 1000)
            }
            _ => "Unknown".into(),
        }
    }
}

/// The kind of a scoring line.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ScoringKind {
    /// A horizontal line.
    Horizontal,
    /// A vertical line.
    Vertical,
    /// A diagonal line.
    Diagonal,
    /// A cluster of adjacent squares.
    Adjacent,
    /// A path from the top edge to the bottom edge.
    TopToBottom,
    /// A path from the left edge to the right edge.
    LeftToRight,
    /// A kind unknown to this client, kept by name.
    Other(String),
}

impl ScoringKind {
    /// Returns the short label used in move details.
    #[must_use]
    pub fn prefix(&self) -> String {
        match self {
            Self::Horizontal => "H".into(),
            Self::Vertical => "V".into(),
            Self::Diagonal => "D".into(),
            Self::Adjacent => "A".into(),
            Self::TopToBottom => "T2B".into(),
            Self::LeftToRight => "L2R".into(),
            Self::Other(name) => name.chars().take(1).flat_map(char::to_uppercase).collect(),
        }
    }

    fn as_str(&self) -> &str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
            Self::Diagonal => "diagonal",
            Self::Adjacent => "adjacent",
            Self::TopToBottom => "topToBottom",
            Self::LeftToRight => "leftToRight",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for ScoringKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "horizontal" => Self::Horizontal,
            "vertical" => Self::Vertical,
            "diagonal" => Self::Diagonal,
            "adjacent" => Self::Adjacent,
            "topToBottom" => Self::TopToBottom,
            "leftToRight" => Self::LeftToRight,
            _ => Self::Other(s),
        }
    }
}

impl From<ScoringKind> for String {
    fn from(kind: ScoringKind) -> Self {
        match kind {
            ScoringKind::Other(name) => name,
            kind => kind.as_str().into(),
        }
    }
}

impl fmt::Display for ScoringKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ScoringKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ScoringKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// A scoring line earned by a move.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringLine {
    /// The kind of the line.
    #[serde(rename = "type")]
    pub kind: ScoringKind,
    /// The points earned by this line.
    #[serde(default)]
    pub score: Option<i32>,
    /// The square of the move that completed the line.
    #[serde(default)]
    pub move_square_id: Option<Square>,
    /// The squares composing the line.
    #[serde(default, deserialize_with = "nullable")]
    pub scoring_square_ids: Vec<Square>,
}

impl fmt::Display for ScoringLine {
    /// Formats the line as `<score>|<prefix>-<squares>`, omitting empty parts.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let squares = self
            .scoring_square_ids
            .iter()
            .map(Square::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let prefix = self.kind.prefix();

        let body = match (prefix.is_empty(), squares.is_empty()) {
            (false, false) => format!("{prefix}-{squares}"),
            (false, true) => prefix,
            (true, _) => squares,
        };

        match self.score {
            Some(score) if body.is_empty() => write!(f, "{score}"),
            Some(score) => write!(f, "{score}|{body}"),
            None => f.write_str(&body),
        }
    }
}

/// A move in a game's history.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    /// The square played.
    pub square_id: Square,
    /// The player who made the move.
    pub player_id: String,
    /// The points earned by the move.
    #[serde(default, deserialize_with = "nullable")]
    pub move_score: i32,
    /// The time spent before the move, in milliseconds.
    #[serde(default)]
    pub think_ms: Option<u64>,
    /// The scoring lines earned by the move.
    #[serde(rename = "scoringMoves", default, deserialize_with = "nullable")]
    pub scoring_lines: Vec<ScoringLine>,
}

impl Move {
    /// Creates a non-scoring move.
    #[must_use]
    pub fn new(square_id: Square, player_id: impl Into<String>) -> Self {
        Self {
            square_id,
            player_id: player_id.into(),
            move_score: 0,
            think_ms: None,
            scoring_lines: vec![],
        }
    }

    /// Formats the think time of the move.
    #[must_use]
    pub fn think_time_display(&self) -> String {
        format_think_time(self.think_ms)
    }

    /// Formats the scoring lines of the move, or `"None"` if there are none.
    #[must_use]
    pub fn scoring_display(&self) -> String {
        match self.scoring_lines.as_slice() {
            [] => "None".into(),
            [line] => line.to_string(),
            lines => lines
                .iter()
                .map(|line| format!("({line})"))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Formats a think time as `<s>s` below a minute and `<m>m<s>s` otherwise.
///
/// Returns an empty string for a missing or zero think time.
#[must_use]
pub fn format_think_time(think_ms: Option<u64>) -> String {
    match think_ms {
        None | Some(0) => String::new(),
        Some(ms) if ms < 60_000 => format!("{}s", ms / 1000),
        Some(ms) => format!("{}m{}s", ms / 60_000, ms % 60_000 / 1000),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn think_time() {
        assert_eq!(format_think_time(None), "");
        assert_eq!(format_think_time(Some(0)), "");
        assert_eq!(format_think_time(Some(999)), "0s");
        assert_eq!(format_think_time(Some(12_345)), "12s");
        assert_eq!(format_think_time(Some(59_999)), "59s");
        assert_eq!(format_think_time(Some(60_000)), "1m0s");
        assert_eq!(format_think_time(Some(125_500)), "2m5s");
    }

    #[test]
    fn decode_move() {
        let json = r#"{
            "squareId": "C4",
            "playerId": "p2",
            "thinkMs": 1500,
            "moveScore": 3,
            "scoringMoves": [
                {"moveSquareId": "C4", "type": "horizontal", "score": 3, "scoringSquareIds": ["C3", "C4"]},
                {"type": "spiral", "scoringSquareIds": null}
            ]
        }"#;
        let mov: Move = serde_json::from_str(json).unwrap();
        assert_eq!(mov.square_id, Square::new(2, 3));
        assert_eq!(mov.move_score, 3);
        assert_eq!(mov.think_time_display(), "1s");
        assert_eq!(mov.scoring_lines[0].kind, ScoringKind::Horizontal);
        assert_eq!(mov.scoring_lines[1].kind, ScoringKind::Other("spiral".into()));
        assert!(mov.scoring_lines[1].scoring_square_ids.is_empty());

        let bare: Move =
            serde_json::from_str(r#"{"squareId": "A1", "playerId": "p1", "moveScore": null}"#)
                .unwrap();
        assert_eq!(bare, Move::new(Square::new(0, 0), "p1"));

        assert!(serde_json::from_str::<Move>(r#"{"squareId": "a1", "playerId": "p1"}"#).is_err());
    }

    #[test]
    fn scoring_display() {
        let line = |kind: &str, score, squares: &[&str]| ScoringLine {
            kind: ScoringKind::from(kind.to_owned()),
            score,
            move_square_id: None,
            scoring_square_ids: squares.iter().map(|s| s.parse().unwrap()).collect(),
        };

        let mut mov = Move::new(Square::new(2, 3), "p2");
        assert_eq!(mov.scoring_display(), "None");

        mov.scoring_lines.push(line("horizontal", Some(3), &["C3", "C4"]));
        assert_eq!(mov.scoring_display(), "3|H-C3, C4");

        mov.scoring_lines.push(line("topToBottom", None, &[]));
        mov.scoring_lines.push(line("zigzag", Some(1), &["A1"]));
        assert_eq!(mov.scoring_display(), "(3|H-C3, C4), (T2B), (1|Z-A1)");

        assert_eq!(line("", Some(2), &[]).to_string(), "2");
        assert_eq!(line("", None, &["B2"]).to_string(), "B2");
    }

    #[test]
    fn decode_game_state() {
        let json = r#"{
            "gameId": "game-1",
            "createdAt": "2025-01-01T00:00:00Z",
            "finishedAt": "2025-01-01T00:03:07.500Z",
            "status": "won_by_player",
            "board": {"level": "two", "dots": []},
            "player1Status": {"player": {"id": "p1", "type": "human", "name": "Ann"}, "moves": 3, "score": 4, "isWinner": true},
            "player2Status": {"player": {"id": "p2", "type": "agent", "name": "Bot", "model": "m"}, "moves": 3, "score": 1, "isWinner": false},
            "currentPlayer": null
        }"#;
        let state: GameState = serde_json::from_str(json).unwrap();
        assert_eq!(state.board.level, Level::Two);
        assert_eq!(state.status, GameStatus::WonByPlayer);
        assert!(state.status.is_finished());
        assert_eq!(state.slot_of("p2"), Some(Slot::Player2));
        assert_eq!(state.slot_of("p3"), None);
        assert!(state.status_of(Slot::Player1).is_winner);
        assert!(!state.status_of(Slot::Player2).is_winner);
        assert_eq!(state.current_player_id(), None);
        assert_eq!(state.duration_display(), "3m 7s");
        assert_eq!(state.status_of(Slot::Player2).player.kind, PlayerKind::Agent);
    }
}
