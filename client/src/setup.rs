//! Validation of players and new games.

use crate::service::CreateGame;
use chrono::{DateTime, SecondsFormat, Utc};
use medot_core::{
    board::Level,
    game::{Player, PlayerKind, Slot},
};

/// An invalid player.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[remain::sorted]
pub enum PlayerError {
    /// The ID is blank.
    #[error("player ID is required")]
    MissingId,
    /// An agent player has no model.
    #[error("an agent player needs a model")]
    MissingModel,
    /// The name is blank.
    #[error("player name is required")]
    MissingName,
}

/// An invalid game setup.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[remain::sorted]
pub enum SetupError {
    /// Both players have the same ID.
    #[error("both players have ID {0:?}")]
    DuplicateId(String),
    /// A player is invalid.
    #[error("{slot}: {source}")]
    Player {
        /// The slot of the player.
        slot: Slot,
        /// The problem with the player.
        #[source]
        source: PlayerError,
    },
}

/// Checks a player, returning it with surrounding whitespace trimmed.
///
/// Human players never carry a model.
///
/// # Errors
///
/// Returns `Err` if the ID or name is blank, or an agent has no model.
pub fn validate_player(player: Player) -> Result<Player, PlayerError> {
    let id = player.id.trim();
    let name = player.name.trim();
    if id.is_empty() {
        return Err(PlayerError::MissingId);
    }
    if name.is_empty() {
        return Err(PlayerError::MissingName);
    }

    let model = match player.kind {
        PlayerKind::Human => None,
        PlayerKind::Agent => match player.model.as_deref().map(str::trim) {
            Some(model) if !model.is_empty() => Some(model.to_owned()),
            _ => return Err(PlayerError::MissingModel),
        },
    };

    Ok(Player {
        id: id.into(),
        kind: player.kind,
        name: name.into(),
        model,
    })
}

/// Returns the default ID of a game created at the given time.
#[must_use]
pub fn default_game_id(now: DateTime<Utc>) -> String {
    format!("game-{}", now.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl CreateGame {
    /// Validates a game setup, with an ID derived from the current time.
    ///
    /// # Errors
    ///
    /// Returns `Err` if either player is invalid or both have the same ID.
    pub fn new(player1: Player, player2: Player, level: Level) -> Result<Self, SetupError> {
        Self::with_id(default_game_id(Utc::now()), player1, player2, level)
    }

    /// Validates a game setup with the given ID.
    ///
    /// # Errors
    ///
    /// Returns `Err` if either player is invalid or both have the same ID.
    pub fn with_id(
        game_id: String,
        player1: Player,
        player2: Player,
        level: Level,
    ) -> Result<Self, SetupError> {
        let check = |slot, player| {
            validate_player(player).map_err(|source| SetupError::Player { slot, source })
        };
        let player1 = check(Slot::Player1, player1)?;
        let player2 = check(Slot::Player2, player2)?;
        if player1.id == player2.id {
            return Err(SetupError::DuplicateId(player1.id));
        }

        Ok(Self {
            game_id,
            player1,
            player2,
            level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn human(id: &str, name: &str) -> Player {
        Player {
            id: id.into(),
            kind: PlayerKind::Human,
            name: name.into(),
            model: Some("ignored".into()),
        }
    }

    fn agent(id: &str, model: Option<&str>) -> Player {
        Player {
            id: id.into(),
            kind: PlayerKind::Agent,
            name: id.to_uppercase(),
            model: model.map(Into::into),
        }
    }

    #[test]
    fn players() {
        let player = validate_player(human("  ann ", " Ann")).unwrap();
        assert_eq!(player.id, "ann");
        assert_eq!(player.name, "Ann");
        assert_eq!(player.model, None);

        assert_eq!(validate_player(human(" ", "Ann")), Err(PlayerError::MissingId));
        assert_eq!(validate_player(human("ann", "")), Err(PlayerError::MissingName));
        assert_eq!(
            validate_player(agent("bot", None)),
            Err(PlayerError::MissingModel)
        );
        assert_eq!(
            validate_player(agent("bot", Some("  "))),
            Err(PlayerError::MissingModel)
        );
        assert_eq!(
            validate_player(agent("bot", Some("gpt"))).unwrap().model.as_deref(),
            Some("gpt")
        );
    }

    #[test]
    fn games() {
        let game = CreateGame::with_id(
            "g".into(),
            human("ann", "Ann"),
            agent("bot", Some("gpt")),
            Level::Three,
        )
        .unwrap();
        assert_eq!(
            serde_json::to_value(&game).unwrap(),
            serde_json::json!({
                "gameId": "g",
                "player1": {"id": "ann", "type": "human", "name": "Ann"},
                "player2": {"id": "bot", "type": "agent", "name": "BOT", "model": "gpt"},
                "level": "three",
            })
        );

        assert_eq!(
            CreateGame::new(human("ann", "Ann"), human(" ann", "Other"), Level::One),
            Err(SetupError::DuplicateId("ann".into()))
        );
        assert_eq!(
            CreateGame::new(human("ann", "Ann"), agent("bot", None), Level::One),
            Err(SetupError::Player {
                slot: Slot::Player2,
                source: PlayerError::MissingModel,
            })
        );
        assert_eq!(
            CreateGame::new(human("ann", "Ann"), agent("bot", None), Level::One)
                .unwrap_err()
                .to_string(),
            "player 2: an agent player needs a model"
        );
    }

    #[test]
    fn game_ids() {
        let now = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(default_game_id(now), "game-2025-03-04T05:06:07.000Z");
        assert!(CreateGame::new(human("a", "A"), human("b", "B"), Level::One)
            .unwrap()
            .game_id
            .starts_with("game-"));
    }
}
