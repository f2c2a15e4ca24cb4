//! Typed client for the game service.

use crate::{
    Error,
    stream::{self, NotificationStream},
};
use medot_core::{
    board::{Level, Square},
    game::{GameState, Move, Player},
    listing::{GameRow, JournalEntry, LeaderBoardRow, LogEntry, LogPage},
    replay::Replay,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use url::Url;

/// The default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A window into a listing.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Page {
    /// The maximum number of rows.
    pub limit: u32,
    /// The number of rows to skip.
    pub offset: u32,
}

impl Page {
    /// Returns the first page of the given size.
    #[must_use]
    pub fn first(limit: u32) -> Self {
        Self { limit, offset: 0 }
    }
}

/// The direction to walk an agent's journal in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JournalDirection {
    /// Towards older entries.
    Down,
    /// Towards newer entries.
    Up,
}

/// The journal of an agent.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum JournalKind {
    /// Revisions of the agent's playbook instructions.
    #[default]
    Playbook,
    /// Revisions of the agent's role, i.e. its system prompt.
    AgentRole,
}

impl JournalKind {
    fn service_path(self) -> &'static str {
        match self {
            Self::Playbook => "playbook",
            Self::AgentRole => "agent-role",
        }
    }
}

/// The request body of `create-game`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGame {
    /// The new game's ID.
    pub game_id: String,
    /// The first player.
    pub player1: Player,
    /// The second player.
    pub player2: Player,
    /// The board level.
    pub level: Level,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GameIdBody<'a> {
    game_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MakeMoveBody<'a> {
    game_id: &'a str,
    player_id: &'a str,
    square_id: Square,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerPageBody<'a> {
    player_id: &'a str,
    #[serde(flatten)]
    page: Page,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GamePageBody<'a> {
    game_id: &'a str,
    #[serde(flatten)]
    page: Page,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JournalBody<'a> {
    agent_id: &'a str,
    sequence_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameStateBody {
    game_state: GameState,
}

#[derive(Deserialize)]
struct MovesBody {
    moves: Option<Vec<Move>>,
}

#[derive(Deserialize)]
struct GamesBody {
    games: Option<Vec<GameRow>>,
}

#[derive(Deserialize)]
struct PlayersBody {
    players: Option<Vec<Player>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeaderBoardBody {
    player_games: Option<Vec<LeaderBoardRow>>,
}

#[derive(Deserialize)]
struct JournalsBody {
    journals: Option<Vec<JournalEntry>>,
}

/// Parses a base URL, assuming `http` when no scheme is given.
///
/// # Errors
///
/// Returns `Err` if the URL is invalid or cannot have paths appended.
pub fn parse_base_url(raw: &str) -> Result<Url, Error> {
    let url = match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url,
        _ => Url::parse(&format!("http://{raw}"))?,
    };
    if url.cannot_be_a_base() {
        return Err(Error::BaseUrl(url));
    }
    Ok(url)
}

/// A client of the game service.
#[derive(Clone, Debug)]
pub struct GameService {
    client: Client,
    base: Url,
    timeout: Duration,
}

impl GameService {
    /// Creates a client for the service at the given base URL.
    ///
    /// The timeout applies to every request except event streams.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the base URL is invalid.
    pub fn new(base: &str, timeout: Duration) -> Result<Self, Error> {
        Ok(Self::with_client(Client::new(), parse_base_url(base)?, timeout))
    }

    /// Creates a client sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(client: Client, base: Url, timeout: Duration) -> Self {
        Self {
            client,
            base,
            timeout,
        }
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &[&str]) -> Result<Url, Error> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| Error::BaseUrl(self.base.clone()))?
            .pop_if_empty()
            .extend(path);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, Error> {
        tracing::debug!(endpoint, "sending request");
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| http_error(endpoint, source))?;
        let bytes = check_status(endpoint, response)
            .await?
            .bytes()
            .await
            .map_err(|source| http_error(endpoint, source))?;
        serde_json::from_slice(&bytes).map_err(|source| Error::Decode {
            endpoint: endpoint.into(),
            source,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T, Error> {
        let endpoint = path.join("/");
        let url = self.url(path)?;
        self.send(&endpoint, self.client.get(url)).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &[&str],
        body: &B,
    ) -> Result<T, Error> {
        let endpoint = path.join("/");
        let url = self.url(path)?;
        self.send(&endpoint, self.client.post(url).json(body)).await
    }

    /// Fetches the state of a game.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request fails.
    pub async fn game_state(&self, game_id: &str) -> Result<GameState, Error> {
        let body: GameStateBody = self.get(&["game", "get-state", game_id]).await?;
        Ok(body.game_state)
    }

    /// Fetches the move history of a game.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request fails.
    pub async fn move_history(&self, game_id: &str) -> Result<Vec<Move>, Error> {
        let body: MovesBody = self
            .get(&["game", "get-game-move-history", game_id])
            .await?;
        Ok(body.moves.unwrap_or_default())
    }

    /// Fetches the state and move history of a game concurrently,
    /// returning a replay positioned after the last move.
    ///
    /// # Errors
    ///
    /// Returns `Err` if either request fails.
    pub async fn load_replay(&self, game_id: &str) -> Result<Replay, Error> {
        let (state, moves) = tokio::try_join!(self.game_state(game_id), self.move_history(game_id))?;
        let replay = Replay::new(state, moves);
        if let Err(err) = replay.cross_check() {
            tracing::warn!(game_id, "replay disagrees with game state: {err}");
        }
        Ok(replay)
    }

    /// Creates a game.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request fails.
    pub async fn create_game(&self, request: &CreateGame) -> Result<GameState, Error> {
        let body: GameStateBody = self.post(&["game", "create-game"], request).await?;
        Ok(body.game_state)
    }

    /// Makes a move in a game.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request fails.
    pub async fn make_move(
        &self,
        game_id: &str,
        player_id: &str,
        square_id: Square,
    ) -> Result<GameState, Error> {
        let request = MakeMoveBody {
            game_id,
            player_id,
            square_id,
        };
        let body: GameStateBody = self.post(&["game", "make-move"], &request).await?;
        Ok(body.game_state)
    }

    /// Cancels a game.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request fails.
    pub async fn cancel_game(&self, game_id: &str) -> Result<GameState, Error> {
        let body: GameStateBody = self
            .post(&["game", "cancel-game"], &GameIdBody { game_id })
            .await?;
        Ok(body.game_state)
    }

    /// Subscribes to move notifications of a game.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the stream cannot be opened.
    pub async fn move_stream(&self, game_id: &str) -> Result<NotificationStream, Error> {
        let path = ["game", "get-move-stream-by-game-id", game_id];
        let endpoint = path.join("/");
        let url = self.url(&path)?;
        tracing::debug!(%endpoint, "opening event stream");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|source| http_error(&endpoint, source))?;
        let response = check_status(&endpoint, response).await?;
        Ok(stream::notifications(endpoint, response.bytes_stream()))
    }

    /// Fetches the most recent games.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request fails.
    pub async fn recent_games(&self, page: Page) -> Result<Vec<GameRow>, Error> {
        let body: GamesBody = self.post(&["game", "get-recent-games"], &page).await?;
        Ok(body.games.unwrap_or_default())
    }

    /// Fetches the games of a player.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request fails.
    pub async fn games_by_player(&self, player_id: &str, page: Page) -> Result<Vec<GameRow>, Error> {
        let body: GamesBody = self
            .post(
                &["game", "get-games-by-player-id-paged"],
                &PlayerPageBody { player_id, page },
            )
            .await?;
        Ok(body.games.unwrap_or_default())
    }

    /// Fetches all players.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request fails.
    pub async fn players(&self) -> Result<Vec<Player>, Error> {
        let body: PlayersBody = self.get(&["player", "get-players"]).await?;
        Ok(body.players.unwrap_or_default())
    }

    /// Fetches a player.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request fails.
    pub async fn player(&self, id: &str) -> Result<Player, Error> {
        self.get(&["player", "get-player", id]).await
    }

    /// Creates a player.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request fails.
    pub async fn create_player(&self, player: &Player) -> Result<(), Error> {
        let path = ["player", "create-player"];
        let endpoint = path.join("/");
        let url = self.url(&path)?;
        tracing::debug!(%endpoint, "sending request");

        let response = self
            .client
            .post(url)
            .json(player)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| http_error(&endpoint, source))?;
        check_status(&endpoint, response).await?;
        Ok(())
    }

    /// Fetches the models available to agent players.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request fails.
    pub async fn agent_models(&self) -> Result<Vec<String>, Error> {
        let models: Option<Vec<String>> = self.get(&["game", "get-all-ai-agent-models"]).await?;
        Ok(models.unwrap_or_default())
    }

    /// Fetches the leaderboard.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request fails.
    pub async fn leader_board(&self, page: Page) -> Result<Vec<LeaderBoardRow>, Error> {
        let body: LeaderBoardBody = self
            .post(&["player-games", "get-leader-board"], &page)
            .await?;
        Ok(body.player_games.unwrap_or_default())
    }

    /// Fetches a page of a game's action log.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request fails.
    pub async fn logs_by_game(&self, game_id: &str, page: Page) -> Result<LogPage, Error> {
        self.post(
            &["game-action-log", "get-logs-by-game"],
            &GamePageBody { game_id, page },
        )
        .await
    }

    /// Fetches an action log entry.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request fails.
    pub async fn log(&self, id: &str) -> Result<LogEntry, Error> {
        self.get(&["game-action-log", "get-log-by-id", id]).await
    }

    /// Fetches the journal entry next to `sequence_id` in the given direction.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request fails.
    pub async fn journal_step(
        &self,
        kind: JournalKind,
        direction: JournalDirection,
        agent_id: &str,
        sequence_id: i64,
    ) -> Result<Option<JournalEntry>, Error> {
        let endpoint = match direction {
            JournalDirection::Down => "get-journal-by-agent-id-down",
            JournalDirection::Up => "get-journal-by-agent-id-up",
        };
        self.journal(kind, endpoint, agent_id, sequence_id).await
    }

    /// Fetches the journal entry with exactly `sequence_id`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request fails.
    pub async fn journal_at(
        &self,
        kind: JournalKind,
        agent_id: &str,
        sequence_id: i64,
    ) -> Result<Option<JournalEntry>, Error> {
        self.journal(
            kind,
            "get-journal-by-agent-id-and-sequence",
            agent_id,
            sequence_id,
        )
        .await
    }

    async fn journal(
        &self,
        kind: JournalKind,
        endpoint: &str,
        agent_id: &str,
        sequence_id: i64,
    ) -> Result<Option<JournalEntry>, Error> {
        let body: JournalsBody = self
            .post(
                &[kind.service_path(), endpoint],
                &JournalBody {
                    agent_id,
                    sequence_id,
                },
            )
            .await?;
        Ok(body.journals.unwrap_or_default().into_iter().next())
    }
}

fn http_error(endpoint: &str, source: reqwest::Error) -> Error {
    tracing::warn!(endpoint, "request failed: {source}");
    Error::Http {
        endpoint: endpoint.into(),
        source,
    }
}

async fn check_status(endpoint: &str, response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(endpoint, %status, "request rejected");
    Err(Error::Status {
        endpoint: endpoint.into(),
        status,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_urls() {
        let url = parse_base_url("localhost:9000").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/");

        let url = parse_base_url("https://example.com/api").unwrap();
        assert_eq!(url.as_str(), "https://example.com/api");

        assert!(matches!(parse_base_url(""), Err(Error::Url(_))));
    }

    #[test]
    fn endpoint_urls() {
        let service = GameService::new("http://localhost:9000", DEFAULT_TIMEOUT).unwrap();
        let url = service
            .url(&["game", "get-state", "game-2025-01-01T00:00:00.000Z"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9000/game/get-state/game-2025-01-01T00:00:00.000Z"
        );

        let service = GameService::new("http://host/api/", DEFAULT_TIMEOUT).unwrap();
        let url = service.url(&["game", "get-state", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://host/api/game/get-state/a%20b%2Fc");
    }

    #[test]
    fn journal_urls() {
        let service = GameService::new("http://localhost:9000", DEFAULT_TIMEOUT).unwrap();
        let url = |kind: JournalKind| {
            service
                .url(&[kind.service_path(), "get-journal-by-agent-id-up"])
                .unwrap()
        };
        assert_eq!(
            url(JournalKind::Playbook).as_str(),
            "http://localhost:9000/playbook/get-journal-by-agent-id-up"
        );
        assert_eq!(
            url(JournalKind::AgentRole).as_str(),
            "http://localhost:9000/agent-role/get-journal-by-agent-id-up"
        );
    }

    #[test]
    fn request_bodies() {
        let body = PlayerPageBody {
            player_id: "p1",
            page: Page {
                limit: 10,
                offset: 20,
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"playerId": "p1", "limit": 10, "offset": 20})
        );

        let body = MakeMoveBody {
            game_id: "g",
            player_id: "p1",
            square_id: Square::new(2, 3),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"gameId": "g", "playerId": "p1", "squareId": "C4"})
        );
    }
}
