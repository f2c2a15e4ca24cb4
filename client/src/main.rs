#![allow(missing_docs)]

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use medot_client::{
    controller::{self, LoadOutcome},
    journal::{JournalCursor, LOG_PAGE_SIZE, LogPager},
    live::{self, LiveUpdate},
    render,
    service::{CreateGame, GameService, JournalKind, Page},
    setup,
};
use medot_core::{
    board::{Level, Square},
    game::{GameStatus, Player, PlayerKind},
    replay::Step,
};
use std::{io, time::Duration};
use tokio::{signal, sync::mpsc};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// The command-line client for Me-Dot-U-Dot
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Talk to the game service at the given base URL
    #[arg(long, env = "MEDOT_URL", default_value = "http://localhost:9000")]
    url: String,

    /// Give up on a request after the given number of seconds
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the leaderboard
    Leaderboard {
        #[command(flatten)]
        page: PageArgs,
    },
    /// List the games of a player
    Games {
        player_id: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// List the most recent games
    Recent {
        #[command(flatten)]
        page: PageArgs,
    },
    /// List all players
    Players,
    /// List the models available to agent players
    Models,
    /// Replay a game move by move
    Replay {
        game_id: String,
        /// Show the position after the given number of moves
        #[arg(long, allow_hyphen_values = true)]
        index: Option<isize>,
        /// Show every position from the empty board on
        #[arg(long, conflicts_with = "index")]
        all: bool,
    },
    /// Follow a game as it is played
    Watch { game_id: String },
    /// Register a player, as an agent if a model is given
    CreatePlayer {
        id: String,
        name: String,
        #[arg(long)]
        model: Option<String>,
    },
    /// Start a game between two registered players
    CreateGame {
        player1: String,
        player2: String,
        #[arg(long, default_value_t = Level::One)]
        level: Level,
        /// Use the given game ID instead of one derived from the time
        #[arg(long)]
        game_id: Option<String>,
    },
    /// Make a move
    Move {
        game_id: String,
        player_id: String,
        square: Square,
    },
    /// Cancel a game
    Cancel { game_id: String },
    /// Show the action log of a game
    Logs {
        game_id: String,
        /// Show up to the given number of pages
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show the journal of an agent, newest first
    Journal {
        agent_id: String,
        /// Show up to the given number of entries
        #[arg(long, default_value_t = 1)]
        entries: u32,
        /// Show the role journal instead of the playbook journal
        #[arg(long)]
        role: bool,
    },
}

#[derive(Debug, clap::Args)]
struct PageArgs {
    /// Show at most the given number of rows
    #[arg(long, default_value_t = 20)]
    limit: u32,
    /// Skip the given number of rows
    #[arg(long, default_value_t = 0)]
    offset: u32,
}

impl From<PageArgs> for Page {
    fn from(args: PageArgs) -> Self {
        Self {
            limit: args.limit,
            offset: args.offset,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=info,medot_client=info", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let service = GameService::new(&args.url, Duration::from_secs(args.timeout_secs))
        .with_context(|| format!("invalid service URL {}", args.url))?;
    tracing::debug!("using game service at {}", service.base_url());

    match args.command {
        Command::Leaderboard { page } => {
            let page = Page::from(page);
            let rows = service
                .leader_board(page)
                .await
                .context("Unable to load the leaderboard")?;
            print!("{}", render::leader_board(&rows, page.offset));
        }
        Command::Games { player_id, page } => {
            let rows = service
                .games_by_player(&player_id, page.into())
                .await
                .with_context(|| format!("Unable to load the games of {player_id}"))?;
            print!("{}", render::games(&rows, Some(&player_id)));
        }
        Command::Recent { page } => {
            let rows = service
                .recent_games(page.into())
                .await
                .context("Unable to load recent games")?;
            print!("{}", render::games(&rows, None));
        }
        Command::Players => {
            let players = service.players().await.context("Unable to load players")?;
            print!("{}", render::players(&players));
        }
        Command::Models => {
            let models = service
                .agent_models()
                .await
                .context("Unable to load agent models")?;
            for model in models {
                println!("{model}");
            }
        }
        Command::Replay {
            game_id,
            index,
            all,
        } => replay(service, game_id, index, all).await?,
        Command::Watch { game_id } => watch(service, game_id).await?,
        Command::CreatePlayer { id, name, model } => {
            let kind = if model.is_some() {
                PlayerKind::Agent
            } else {
                PlayerKind::Human
            };
            let player = setup::validate_player(Player {
                id,
                kind,
                name,
                model,
            })?;
            service
                .create_player(&player)
                .await
                .with_context(|| format!("Unable to create player {}", player.id))?;
            println!("Created player {}.", player.id);
        }
        Command::CreateGame {
            player1,
            player2,
            level,
            game_id,
        } => {
            let (player1, player2) =
                tokio::try_join!(service.player(&player1), service.player(&player2))
                    .context("Unable to load the players")?;
            let request = match game_id {
                Some(game_id) => CreateGame::with_id(game_id, player1, player2, level)?,
                None => CreateGame::new(player1, player2, level)?,
            };
            let state = service
                .create_game(&request)
                .await
                .with_context(|| format!("Unable to create game {}", request.game_id))?;
            print!("{}", render::game_summary(&state));
        }
        Command::Move {
            game_id,
            player_id,
            square,
        } => {
            let state = service
                .make_move(&game_id, &player_id, square)
                .await
                .with_context(|| format!("Unable to play {square} in game {game_id}"))?;
            print!("{}", render::game_summary(&state));
        }
        Command::Cancel { game_id } => {
            let state = service
                .cancel_game(&game_id)
                .await
                .with_context(|| format!("Unable to cancel game {game_id}"))?;
            print!("{}", render::game_summary(&state));
        }
        Command::Logs { game_id, pages } => {
            let mut pager = LogPager::new(&service, game_id.as_str(), LOG_PAGE_SIZE);
            let mut page = Some(pager.load().await);
            for _ in 0..pages {
                let Some(res) = page else { break };
                let logs = res.with_context(|| format!("Unable to load the log of {game_id}"))?;
                print!("{}", render::log_entries(&logs.logs));
                page = pager.next_page().await.transpose();
            }
        }
        Command::Journal {
            agent_id,
            entries,
            role,
        } => {
            let kind = if role {
                JournalKind::AgentRole
            } else {
                JournalKind::Playbook
            };
            let mut cursor = JournalCursor::new(&service, kind, agent_id.as_str());
            let context = || format!("Unable to load the journal of {agent_id}");
            let Some(view) = cursor.latest().await.with_context(context)? else {
                println!("No journal entries.");
                return Ok(());
            };
            print!("{}", render::journal(view));
            for _ in 1..entries {
                let Some(view) = cursor.older().await.with_context(context)? else {
                    break;
                };
                print!("{}", render::journal(view));
            }
        }
    }
    Ok(())
}

async fn replay(
    service: GameService,
    game_id: String,
    index: Option<isize>,
    all: bool,
) -> anyhow::Result<()> {
    let (controller, fut) = controller::create(service);
    tokio::spawn(fut);

    let LoadOutcome::Applied(mut frame) = controller
        .load(game_id.as_str())
        .await
        .with_context(|| format!("Unable to load game {game_id}"))?
    else {
        bail!("load of game {game_id} was superseded");
    };

    if all {
        let Some(first) = controller.set_index(0).await else {
            bail!("replay of game {game_id} was unloaded");
        };
        frame = first;
        loop {
            println!("{}", render::frame(frame.replay(), frame.snapshot()));
            if !frame.controls().next {
                break;
            }
            match controller.step(Step::Next).await {
                Some(next) => frame = next,
                None => break,
            }
        }
        return Ok(());
    }

    if let Some(index) = index {
        if let Some(moved) = controller.set_index(index).await {
            frame = moved;
        }
    }
    print!("{}", render::frame(frame.replay(), frame.snapshot()));
    Ok(())
}

async fn watch(service: GameService, game_id: String) -> anyhow::Result<()> {
    let state = service
        .game_state(&game_id)
        .await
        .with_context(|| format!("Unable to load game {game_id}"))?;
    print!("{}", render::game_summary(&state));
    if state.status != GameStatus::InProgress {
        return Ok(());
    }

    let shutdown_signal = shutdown_signal().context("failed to listen for shutdown signals")?;
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal.await;
            cancel.cancel();
        }
    });

    let (update_tx, update_rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
    let (res, ()) = tokio::join!(
        live::follow(&service, &game_id, update_tx, cancel),
        print_updates(update_rx),
    );
    res.with_context(|| format!("Unable to follow game {game_id}"))
}

async fn print_updates(mut update_rx: mpsc::Receiver<LiveUpdate>) {
    while let Some(update) = update_rx.recv().await {
        if let Some(message) = &update.forfeit_message {
            println!("Move forfeited: {message}");
        }
        print!("{}", render::game_summary(&update.state));
    }
}

#[cfg(unix)]
fn shutdown_signal() -> io::Result<impl Future<Output = ()>> {
    let mut interrupt = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
    })
}

#[cfg(windows)]
fn shutdown_signal() -> io::Result<impl Future<Output = ()>> {
    let mut ctrl_c = signal::windows::ctrl_c()?;

    Ok(async move {
        ctrl_c.recv().await;
    })
}
