use std::io::Write as _;
use std::sync::Arc;

use clap::Parser;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;

use wordrace::{
    format_evaluation, init_logging, print_view, ConnectionState, Game, GameId, GameServer,
    GameSession, GameStatus, GameStore, LocalIdentity, MemoryStore, Player, PlayerId, RemoteStore,
    StoreError, WordList, DEFAULT_MAX_ATTEMPTS, WORD_LENGTH,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
enum Commands {
    /// Play a solo game on the local machine.
    Solo {
        #[arg(long, help = "Fix RNG seed for a reproducible game (e.g., --seed 12345)")]
        seed: Option<u64>,
        #[arg(long, help = "Play against a chosen target word instead of a random one")]
        word: Option<String>,
    },
    /// Host a game server for multiplayer races.
    Serve {
        #[arg(long, default_value = "0.0.0.0:4520")]
        bind: String,
    },
    /// Create a multiplayer game on a server and wait for opponents.
    Create {
        #[arg(long, default_value = "127.0.0.1:4520")]
        connect: String,
        #[arg(long, help = "Display nickname shown to other players")]
        nick: Option<String>,
        #[arg(long, help = "Fix RNG seed for a reproducible game (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
    /// Join a multiplayer game by id.
    Join {
        #[arg(long, default_value = "127.0.0.1:4520")]
        connect: String,
        #[arg(long)]
        game: GameId,
        #[arg(long, help = "Display nickname shown to other players")]
        nick: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Solo { seed, word } => run_solo(seed, word).await,
        Commands::Serve { bind } => {
            println!("Serving wordrace games at {}...", bind);
            let listener = TcpListener::bind(&bind).await?;
            GameServer::new().serve(listener).await
        }
        Commands::Create {
            connect,
            nick,
            seed,
        } => {
            let words = Arc::new(WordList::builtin());
            let mut rng = make_rng(seed);
            let player = local_player(&mut rng, nick);
            let store = Arc::new(RemoteStore::connect(&connect).await?);
            let target = words.pick(&mut rng);
            let session = GameSession::create(
                store,
                words,
                player,
                target,
                DEFAULT_MAX_ATTEMPTS,
                true,
            )
            .await?;
            println!(
                "Game {} created. Opponents join with: wordrace join --connect {} --game {}",
                session.game_id(),
                connect,
                session.game_id()
            );
            run_multiplayer(session).await
        }
        Commands::Join {
            connect,
            game,
            nick,
        } => {
            let words = Arc::new(WordList::builtin());
            let mut rng = make_rng(None);
            let player = local_player(&mut rng, nick);
            let store = Arc::new(RemoteStore::connect(&connect).await?);
            let session = GameSession::join(store, words, player, game).await?;
            println!("Joined game {}.", game);
            run_multiplayer(session).await
        }
    }
}

fn make_rng(seed: Option<u64>) -> SmallRng {
    if let Some(s) = seed {
        SmallRng::seed_from_u64(s)
    } else {
        let mut seed_rng = rand::rng();
        SmallRng::from_rng(&mut seed_rng)
    }
}

fn local_player(rng: &mut SmallRng, nick: Option<String>) -> Player {
    let mut identity = LocalIdentity::new();
    let mut player = identity.get_or_create(rng);
    if let Some(nick) = nick {
        identity.update_nickname(&nick);
        player = identity.get_or_create(rng);
    }
    player
}

async fn run_solo(seed: Option<u64>, word: Option<String>) -> anyhow::Result<()> {
    let words = Arc::new(WordList::builtin());
    let mut rng = make_rng(seed);
    let player = local_player(&mut rng, None);
    let target = match word {
        Some(raw) => words
            .check(&raw)
            .map_err(|e| anyhow::anyhow!("--word: {}", e))?,
        None => words.pick(&mut rng),
    };
    let store: Arc<dyn GameStore> = Arc::new(MemoryStore::new());
    let session = GameSession::create(
        store,
        words,
        player.clone(),
        target,
        DEFAULT_MAX_ATTEMPTS,
        false,
    )
    .await?;

    println!(
        "Guess the {}-letter word. You have {} attempts.",
        WORD_LENGTH, DEFAULT_MAX_ATTEMPTS
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let view = session.view().await;
        prompt(view.game.attempts_of(player.id), view.game.max_attempts);
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match session.submit(&line).await {
            Ok(outcome) => {
                println!("  {}", format_evaluation(&outcome.guess.word, &outcome.guess.eval));
                if outcome.status == GameStatus::Completed {
                    announce(&session.view().await.game, player.id);
                    break;
                }
            }
            Err(StoreError::Validation(e)) => println!("  {}, try again", e),
            Err(StoreError::GameOver(e)) => {
                println!("  {}", e);
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

async fn run_multiplayer(mut session: GameSession) -> anyhow::Result<()> {
    let me = session.player().id;
    let mut view_rx = session.watch();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("First to solve the word wins. Type a guess, or /retry after a connection loss.");
    {
        let view = session.view().await;
        prompt(view.game.attempts_of(me), view.game.max_attempts);
    }
    loop {
        tokio::select! {
            changed = view_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = view_rx.borrow_and_update().clone();
                print_view(&view, me);
                if view.game.status == GameStatus::Completed {
                    announce(&view.game, me);
                    break;
                }
                prompt(view.game.attempts_of(me), view.game.max_attempts);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed == "/retry" {
                    match session.retry_connection().await {
                        Ok(()) => println!("  reconnected"),
                        Err(e) => println!("  retry failed: {}", e),
                    }
                    continue;
                }
                match session.submit(trimmed).await {
                    Ok(outcome) => {
                        println!("  {}", format_evaluation(&outcome.guess.word, &outcome.guess.eval));
                        if outcome.status == GameStatus::Completed {
                            announce(&session.view().await.game, me);
                            break;
                        }
                    }
                    Err(StoreError::Validation(e)) => println!("  {}, try again", e),
                    Err(StoreError::GameOver(e)) => {
                        // The race may still be undecided; keep watching.
                        println!("  {}; waiting for the other players", e);
                    }
                    Err(StoreError::Connection(e)) | Err(StoreError::Persistence(e)) => {
                        println!("  {} (use /retry)", e);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }
    let view = session.view().await;
    if view.connection == ConnectionState::Degraded {
        println!("Connection was lost; final state shown from local replica.");
    }
    Ok(())
}

fn prompt(used: u32, max: u32) {
    print!("guess {}/{}> ", (used + 1).min(max), max);
    let _ = std::io::stdout().flush();
}

fn announce(game: &Game, me: PlayerId) {
    match game.winner {
        Some(winner) if winner == me => {
            println!("\nYou got it! The word was {}.", game.target);
        }
        Some(winner) => {
            println!(
                "\n{} solved it first. The word was {}.",
                game.nickname_of(winner).unwrap_or("another player"),
                game.target
            );
        }
        None => println!("\nOut of attempts. The word was {}.", game.target),
    }
}
