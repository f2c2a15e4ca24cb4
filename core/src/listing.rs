//! Rows of the leaderboard, game listings, action logs and agent journals.

use crate::{
    board::Level,
    game::{GameStatus, nullable},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A leaderboard row.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderBoardRow {
    /// The player ID.
    pub player_id: String,
    /// Games played.
    #[serde(default)]
    pub games_played: u32,
    /// Games won.
    #[serde(default)]
    pub games_won: u32,
    /// Games lost.
    #[serde(default)]
    pub games_lost: u32,
    /// Games drawn.
    #[serde(default)]
    pub games_draw: u32,
}

/// A game listing row.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRow {
    /// The game ID.
    pub game_id: String,
    /// When the game was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// When the game was last updated.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// The game status.
    #[serde(default)]
    pub status: GameStatus,
    /// The board level.
    #[serde(default)]
    pub level: Level,
    /// The first player's ID.
    #[serde(default, deserialize_with = "nullable")]
    pub player1_id: String,
    /// The first player's name.
    #[serde(default, deserialize_with = "nullable")]
    pub player1_name: String,
    /// The first player's move count.
    #[serde(default)]
    pub player1_moves: u32,
    /// The first player's score.
    #[serde(default)]
    pub player1_score: i32,
    /// The second player's ID.
    #[serde(default, deserialize_with = "nullable")]
    pub player2_id: String,
    /// The second player's name.
    #[serde(default, deserialize_with = "nullable")]
    pub player2_name: String,
    /// The second player's move count.
    #[serde(default)]
    pub player2_moves: u32,
    /// The second player's score.
    #[serde(default)]
    pub player2_score: i32,
    /// The winner's ID, if the game was won.
    #[serde(default)]
    pub winner_id: Option<String>,
}

/// The result of a game from one player's perspective.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The player won.
    Win,
    /// The player lost.
    Loss,
    /// The game was drawn.
    Draw,
    /// The game was canceled.
    Canceled,
    /// The game is still being played.
    InProgress,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Win => "Win",
            Self::Loss => "Loss",
            Self::Draw => "Draw",
            Self::Canceled => "Canceled",
            Self::InProgress => "In Progress",
        })
    }
}

impl GameRow {
    /// Returns the outcome of the game for the given player.
    ///
    /// Without a recorded winner, the higher score wins and a tie goes to
    /// the second player.
    #[must_use]
    pub fn outcome_for(&self, player_id: &str) -> Outcome {
        match self.status {
            GameStatus::WonByPlayer => {
                let winner = self.winner_id.as_deref().unwrap_or(
                    if self.player1_score > self.player2_score {
                        self.player1_id.as_str()
                    } else {
                        self.player2_id.as_str()
                    },
                );
                if winner == player_id {
                    Outcome::Win
                } else {
                    Outcome::Loss
                }
            }
            GameStatus::Draw => Outcome::Draw,
            GameStatus::Canceled => Outcome::Canceled,
            GameStatus::Empty | GameStatus::InProgress => Outcome::InProgress,
        }
    }
}

/// The kind of an action log entry.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum LogKind {
    #[default]
    Empty,
    GameCreated,
    MakeMove,
    ToolCall,
    ModelPrompt,
    ModelResponse,
    ForfeitMove,
    GuardrailEvent,
    GameFinished,
    GameCanceled,
    /// A kind unknown to this client.
    #[serde(other)]
    Unknown,
}

/// An action log entry.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// The entry ID.
    pub id: String,
    /// The entry kind.
    #[serde(rename = "type", default)]
    pub kind: LogKind,
    /// When the action happened.
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    /// The acting player, reported as either `playerId` or `agentId`.
    #[serde(default, alias = "agentId", deserialize_with = "nullable")]
    pub player_id: String,
    /// The game ID.
    #[serde(default, deserialize_with = "nullable")]
    pub game_id: String,
    /// The log message.
    #[serde(default, deserialize_with = "nullable")]
    pub message: String,
}

/// A page of action log entries.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogPage {
    /// The entries, newest first.
    #[serde(default, deserialize_with = "nullable")]
    pub logs: Vec<LogEntry>,
    /// Whether more entries follow this page.
    #[serde(default)]
    pub has_more: bool,
}

/// A versioned entry of an agent's playbook or role journal.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    /// The journal ID, `<agentId>:<sequenceId>`.
    #[serde(default, deserialize_with = "nullable")]
    pub journal_id: String,
    /// The agent ID.
    pub agent_id: String,
    /// The sequence number, increasing with each revision.
    pub sequence_id: i64,
    /// The instruction text, or the system prompt of a role journal.
    #[serde(default, alias = "systemPrompt", deserialize_with = "nullable")]
    pub instructions: String,
    /// When the entry was written.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: GameStatus, scores: (i32, i32), winner_id: Option<&str>) -> GameRow {
        GameRow {
            game_id: "g".into(),
            status,
            player1_id: "p1".into(),
            player1_score: scores.0,
            player2_id: "p2".into(),
            player2_score: scores.1,
            winner_id: winner_id.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn outcomes() {
        let won = row(GameStatus::WonByPlayer, (5, 2), None);
        assert_eq!(won.outcome_for("p1"), Outcome::Win);
        assert_eq!(won.outcome_for("p2"), Outcome::Loss);

        let tied = row(GameStatus::WonByPlayer, (2, 2), None);
        assert_eq!(tied.outcome_for("p2"), Outcome::Win);

        let recorded = row(GameStatus::WonByPlayer, (5, 2), Some("p2"));
        assert_eq!(recorded.outcome_for("p2"), Outcome::Win);

        assert_eq!(row(GameStatus::Draw, (1, 1), None).outcome_for("p1"), Outcome::Draw);
        assert_eq!(
            row(GameStatus::Canceled, (0, 0), None).outcome_for("p1"),
            Outcome::Canceled
        );
        assert_eq!(
            row(GameStatus::InProgress, (0, 0), None).outcome_for("p1"),
            Outcome::InProgress
        );
    }

    #[test]
    fn decode_log_entry() {
        let json = r#"{"id": "l1", "type": "model_prompt", "time": "2025-01-01T00:00:00Z",
            "agentId": "bot", "gameId": "g", "message": "hi"}"#;
        let entry: LogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.kind, LogKind::ModelPrompt);
        assert_eq!(entry.player_id, "bot");

        let entry: LogEntry = serde_json::from_str(r#"{"id": "l2", "type": "brand_new"}"#).unwrap();
        assert_eq!(entry.kind, LogKind::Unknown);
        assert!(entry.message.is_empty());

        let page: LogPage = serde_json::from_str(r#"{"logs": null}"#).unwrap();
        assert!(page.logs.is_empty());
        assert!(!page.has_more);
    }

    #[test]
    fn decode_role_journal_entry() {
        let json = r#"{"agentId": "bot", "sequenceId": 4, "systemPrompt": "Play safe."}"#;
        let entry: JournalEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.sequence_id, 4);
        assert_eq!(entry.instructions, "Play safe.");
    }
}
