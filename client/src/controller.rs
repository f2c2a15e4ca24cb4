//! Replay controller.
//!
//! Owns the replay being viewed and serializes every change to it through a
//! single task. Loads run concurrently, but only the result of the latest one
//! is ever applied.

use crate::{Error, macros::exec, service::GameService};
use medot_core::{
    replay::{Controls, Replay, Snapshot, Step},
    view::BoardView,
};
use std::{future::Future, sync::Arc};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinSet,
};

const CHANNEL_CAPACITY: usize = 16;

/// A source of replays.
pub trait ReplaySource: Send + Sync + 'static {
    /// Loads the replay of a game.
    fn load_replay(&self, game_id: &str) -> impl Future<Output = Result<Replay, Error>> + Send;
}

impl ReplaySource for GameService {
    fn load_replay(&self, game_id: &str) -> impl Future<Output = Result<Replay, Error>> + Send {
        GameService::load_replay(self, game_id)
    }
}

/// The loaded replay at its current position.
#[derive(Clone, Debug)]
pub struct Frame {
    replay: Replay,
    snapshot: Snapshot,
}

impl Frame {
    fn new(replay: &Replay) -> Self {
        Self {
            snapshot: replay.snapshot(),
            replay: replay.clone(),
        }
    }

    /// Returns the replay.
    pub fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Returns the snapshot at the current position.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Returns the navigation controls.
    pub fn controls(&self) -> Controls {
        self.replay.controls()
    }

    /// Renders the board.
    pub fn board(&self) -> BoardView {
        BoardView::new(&self.replay, &self.snapshot)
    }

    /// Describes the current position in one line.
    pub fn status_line(&self) -> String {
        self.replay.status_line(&self.snapshot)
    }

    /// Describes the current move.
    pub fn move_details(&self) -> String {
        self.replay.move_details(&self.snapshot)
    }
}

/// The result of a load that did not fail.
#[derive(Clone, Debug)]
pub enum LoadOutcome {
    /// The replay was loaded and is now current.
    Applied(Frame),
    /// A later load was requested before this one finished,
    /// so its result was discarded.
    Stale,
}

enum Navigation {
    Current,
    Index(isize),
    Step(Step),
}

enum Command {
    Load(oneshot::Sender<Result<LoadOutcome, Error>>, String),
    Navigate(oneshot::Sender<Option<Frame>>, Navigation),
}

type LoadResult = (
    u64,
    String,
    Result<Replay, Error>,
    oneshot::Sender<Result<LoadOutcome, Error>>,
);

/// Creates a replay controller loading from the given source.
///
/// Returns a command handle to it and a future to run it.
/// The future completes when all handles are dropped.
pub fn create<S: ReplaySource>(source: S) -> (ReplayController, impl Future<Output = ()>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_CAPACITY);
    (ReplayController { cmd_tx }, control(Arc::new(source), cmd_rx))
}

/// A command handle to a replay controller.
#[derive(Clone)]
pub struct ReplayController {
    cmd_tx: mpsc::Sender<Command>,
}

impl ReplayController {
    /// Loads a game, replacing the current replay if this is still the
    /// latest load when it finishes.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the latest load failed, leaving the current replay
    /// untouched.
    pub async fn load(&self, game_id: impl Into<String>) -> Result<LoadOutcome, Error> {
        exec!(self.cmd_tx, Command::Load, game_id.into())
    }

    /// Returns the current frame, or `None` if nothing is loaded.
    pub async fn current(&self) -> Option<Frame> {
        exec!(self.cmd_tx, Command::Navigate, Navigation::Current)
    }

    /// Moves to the given index, clamped into the history.
    pub async fn set_index(&self, index: isize) -> Option<Frame> {
        exec!(self.cmd_tx, Command::Navigate, Navigation::Index(index))
    }

    /// Takes a navigation step.
    pub async fn step(&self, step: Step) -> Option<Frame> {
        exec!(self.cmd_tx, Command::Navigate, Navigation::Step(step))
    }

    /// Handles a key press, ignoring keys without a binding.
    pub async fn press_key(&self, key: &str) -> Option<Frame> {
        match Step::from_key(key) {
            Some(step) => self.step(step).await,
            None => self.current().await,
        }
    }
}

async fn control<S: ReplaySource>(source: Arc<S>, mut cmd_rx: mpsc::Receiver<Command>) {
    tracing::debug!("replay controller started");

    let mut replay: Option<Replay> = None;
    let mut latest_token = 0;
    let mut loads: JoinSet<LoadResult> = JoinSet::new();

    loop {
        tokio::select! {
            opt = cmd_rx.recv() => {
                let Some(cmd) = opt else {
                    // All handles are dropped.
                    break;
                };
                match cmd {
                    Command::Load(resp_tx, game_id) => {
                        latest_token += 1;
                        let token = latest_token;
                        tracing::debug!(token, %game_id, "loading replay");

                        let source = source.clone();
                        loads.spawn(async move {
                            let res = source.load_replay(&game_id).await;
                            (token, game_id, res, resp_tx)
                        });
                    }
                    Command::Navigate(resp_tx, nav) => {
                        let frame = replay.as_mut().map(|replay| {
                            match nav {
                                Navigation::Current => {}
                                Navigation::Index(index) => _ = replay.set_index(index),
                                Navigation::Step(step) => _ = replay.step(step),
                            }
                            Frame::new(replay)
                        });
                        _ = resp_tx.send(frame);
                    }
                }
            }
            Some(res) = loads.join_next() => {
                let (token, game_id, res, resp_tx) = match res {
                    Ok(output) => output,
                    Err(err) => {
                        tracing::error!("load task panicked: {err}");
                        continue;
                    }
                };

                let outcome = if token != latest_token {
                    tracing::debug!(token, latest_token, %game_id, "discarding stale replay");
                    Ok(LoadOutcome::Stale)
                } else {
                    match res {
                        Ok(loaded) => {
                            tracing::info!(%game_id, moves = loaded.total_moves(), "replay loaded");
                            let frame = Frame::new(&loaded);
                            replay = Some(loaded);
                            Ok(LoadOutcome::Applied(frame))
                        }
                        Err(err) => {
                            tracing::warn!(%game_id, "failed to load replay: {err}");
                            Err(err)
                        }
                    }
                };
                _ = resp_tx.send(outcome);
            }
        }
    }

    tracing::debug!("replay controller stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use medot_core::{
        board::Square,
        game::{GameState, Move},
    };
    use std::{collections::HashMap, sync::Mutex};

    /// Serves replays held back until released by the test.
    #[derive(Default)]
    struct GatedSource {
        gates: Mutex<HashMap<String, oneshot::Receiver<Result<Replay, Error>>>>,
    }

    impl GatedSource {
        fn gate(&self, game_id: &str) -> oneshot::Sender<Result<Replay, Error>> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(game_id.into(), rx);
            tx
        }

        async fn until_started(&self, game_id: &str) {
            while self.gates.lock().unwrap().contains_key(game_id) {
                tokio::task::yield_now().await;
            }
        }
    }

    impl ReplaySource for Arc<GatedSource> {
        async fn load_replay(&self, game_id: &str) -> Result<Replay, Error> {
            let rx = self.gates.lock().unwrap().remove(game_id).unwrap();
            rx.await.unwrap()
        }
    }

    fn replay(game_id: &str, moves: usize) -> Replay {
        let game = GameState {
            game_id: game_id.into(),
            ..Default::default()
        };
        let moves = (0..moves)
            .map(|i| Move::new(Square::new(0, i as u8), "p1"))
            .collect();
        Replay::new(game, moves)
    }

    fn status_error() -> Error {
        Error::Status {
            endpoint: "game/get-state/x".into(),
            status: reqwest::StatusCode::NOT_FOUND,
            body: String::new(),
        }
    }

    #[tokio::test]
    async fn navigation_before_load_is_noop() {
        let (controller, fut) = create(Arc::new(GatedSource::default()));
        tokio::spawn(fut);

        assert!(controller.current().await.is_none());
        assert!(controller.step(Step::Prev).await.is_none());
        assert!(controller.set_index(3).await.is_none());
    }

    #[tokio::test]
    async fn slow_earlier_load_is_discarded() {
        let source = Arc::new(GatedSource::default());
        let gate_a = source.gate("a");
        let gate_b = source.gate("b");
        let (controller, fut) = create(source.clone());
        tokio::spawn(fut);

        let load = |game_id: &'static str| {
            let controller = controller.clone();
            tokio::spawn(async move { controller.load(game_id).await })
        };
        let load_a = load("a");
        source.until_started("a").await;
        let load_b = load("b");
        source.until_started("b").await;

        gate_b.send(Ok(replay("b", 2))).unwrap();
        let outcome = load_b.await.unwrap().unwrap();
        assert!(matches!(outcome, LoadOutcome::Applied(_)));

        gate_a.send(Ok(replay("a", 5))).unwrap();
        let outcome = load_a.await.unwrap().unwrap();
        assert!(matches!(outcome, LoadOutcome::Stale));

        let frame = controller.current().await.unwrap();
        assert_eq!(frame.replay().game().game_id, "b");
        assert_eq!(frame.snapshot().index, 2);
    }

    #[tokio::test]
    async fn failed_load_keeps_state() {
        let source = Arc::new(GatedSource::default());
        let gate_a = source.gate("a");
        let gate_b = source.gate("b");
        let (controller, fut) = create(source);
        tokio::spawn(fut);

        gate_a.send(Ok(replay("a", 3))).unwrap();
        controller.load("a").await.unwrap();
        controller.step(Step::First).await.unwrap();

        gate_b.send(Err(status_error())).unwrap();
        assert!(matches!(
            controller.load("b").await,
            Err(Error::Status { .. })
        ));

        let frame = controller.current().await.unwrap();
        assert_eq!(frame.replay().game().game_id, "a");
        assert_eq!(frame.snapshot().index, 0);
    }

    #[tokio::test]
    async fn navigation() {
        let source = Arc::new(GatedSource::default());
        source.gate("a").send(Ok(replay("a", 3))).unwrap();
        let (controller, fut) = create(source);
        tokio::spawn(fut);

        let LoadOutcome::Applied(frame) = controller.load("a").await.unwrap() else {
            panic!("load should be applied");
        };
        assert_eq!(frame.snapshot().index, 3);
        assert_eq!(frame.status_line(), "Move 3 / 3 – p1 (A3)");

        let frame = controller.set_index(-5).await.unwrap();
        assert_eq!(frame.snapshot().index, 0);
        assert!(!frame.controls().prev);
        assert!(frame.board().cells().iter().all(|cell| cell.occupant.is_none()));

        let frame = controller.press_key("ArrowRight").await.unwrap();
        assert_eq!(frame.snapshot().index, 1);
        let frame = controller.press_key("q").await.unwrap();
        assert_eq!(frame.snapshot().index, 1);
        let frame = controller.press_key(">").await.unwrap();
        assert_eq!(frame.snapshot().index, 3);
        assert!(!frame.controls().next);
    }
}
