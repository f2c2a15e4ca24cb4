//! Following a game as it is played.

use crate::{Error, service::GameService};
use futures_util::StreamExt;
use medot_core::game::{GameState, GameStatus};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// The state of a followed game after a notification.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LiveUpdate {
    /// The authoritative game state.
    pub state: GameState,
    /// The message of a forfeited move, if the notification reported one.
    pub forfeit_message: Option<String>,
}

/// Follows a game, publishing a freshly fetched state on every notification.
///
/// Notifications are only a signal to re-fetch, so missed or duplicated
/// ones are harmless. Returns when `cancel` is triggered, the stream ends,
/// the game is no longer in progress, or `updates` is closed.
///
/// # Errors
///
/// Returns `Err` if the stream cannot be opened or a fetch fails.
pub async fn follow(
    service: &GameService,
    game_id: &str,
    updates: mpsc::Sender<LiveUpdate>,
    cancel: CancellationToken,
) -> Result<(), Error> {
    let mut stream = tokio::select! {
        () = cancel.cancelled() => return Ok(()),
        res = service.move_stream(game_id) => res?,
    };
    tracing::info!(game_id, "following game");

    loop {
        let item = tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!(game_id, "stopped following game");
                return Ok(());
            }
            item = stream.next() => item,
        };
        let Some(item) = item else {
            tracing::debug!(game_id, "move stream ended");
            return Ok(());
        };

        let notification = match item {
            Ok(notification) => notification,
            Err(err @ Error::Decode { .. }) => {
                tracing::warn!(game_id, "ignoring notification: {err}");
                continue;
            }
            Err(err) => return Err(err),
        };

        let state = tokio::select! {
            () = cancel.cancelled() => return Ok(()),
            res = service.game_state(game_id) => res?,
        };
        let in_progress = state.status == GameStatus::InProgress;
        let update = LiveUpdate {
            state,
            forfeit_message: notification
                .is_forfeit()
                .then(|| notification.message.unwrap_or_default()),
        };

        if updates.send(update).await.is_err() {
            return Ok(());
        }
        if !in_progress {
            tracing::info!(game_id, "game is over");
            return Ok(());
        }
    }
}
