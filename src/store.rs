#![cfg(feature = "std")]

//! Persistence and change-stream collaborator.
//!
//! [`GameStore`] is the narrow interface the game core consumes: create a
//! game record, insert a guess, update status, fetch a snapshot, subscribe to
//! the per-game change stream. [`MemoryStore`] is the in-process
//! implementation: the authoritative store behind the server in multiplayer
//! mode, and the whole persistence layer in solo mode. The remote
//! implementation lives in [`crate::remote`]; which one a session gets is an
//! injection decision, the state machine logic is written once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::common::{GameId, GameOverError, Millis, PlayerId, ValidationError};
use crate::event::{Applied, GameEvent};
use crate::game::{Game, GamePlayer, GameStatus, GuessRecord};
use crate::player::Player;
use crate::word::{Alphabet, Word};

/// Failures surfaced by store operations.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StoreError {
    /// Malformed guess input; never consumes an attempt.
    Validation(ValidationError),
    /// Submission after the terminal state or an exhausted budget.
    GameOver(GameOverError),
    /// No game with this id.
    NotFound(GameId),
    /// Subscription could not be established or was lost.
    Connection(String),
    /// A create/insert/update call failed. Not silently retried.
    Persistence(String),
}

impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        StoreError::Validation(err)
    }
}

impl From<GameOverError> for StoreError {
    fn from(err: GameOverError) -> Self {
        StoreError::GameOver(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Validation(e) => write!(f, "invalid guess: {}", e),
            StoreError::GameOver(e) => write!(f, "game over: {}", e),
            StoreError::NotFound(id) => write!(f, "no game with id {}", id),
            StoreError::Connection(e) => write!(f, "connection error: {}", e),
            StoreError::Persistence(e) => write!(f, "persistence error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// A live per-game event stream.
///
/// Scoped resource: dropping the subscription (or the session owning it)
/// tears the stream down. `unsubscribe` is idempotent.
pub struct Subscription {
    rx: mpsc::Receiver<GameEvent>,
    task: JoinHandle<()>,
    closed: bool,
}

impl Subscription {
    pub(crate) fn new(rx: mpsc::Receiver<GameEvent>, task: JoinHandle<()>) -> Self {
        Self {
            rx,
            task,
            closed: false,
        }
    }

    /// Next event, or `None` once the stream is closed or lost.
    pub async fn recv(&mut self) -> Option<GameEvent> {
        if self.closed {
            return None;
        }
        self.rx.recv().await
    }

    pub fn unsubscribe(&mut self) {
        if !self.closed {
            self.closed = true;
            self.task.abort();
            self.rx.close();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// The persistence/transport collaborator consumed by game sessions.
#[async_trait::async_trait]
pub trait GameStore: Send + Sync {
    async fn create_game(
        &self,
        target: Word,
        max_attempts: u32,
        multiplayer: bool,
        creator: Player,
    ) -> Result<Game, StoreError>;

    /// Register membership. Idempotent: joining twice is a no-op.
    async fn join_game(&self, game: GameId, player: Player) -> Result<Game, StoreError>;

    /// Persist one guess. Rejects submissions for terminal games or players
    /// whose budget is spent, mirroring the core's own gate.
    async fn insert_guess(
        &self,
        game: GameId,
        player: PlayerId,
        text: &str,
    ) -> Result<GuessRecord, StoreError>;

    /// Status/winner update. The terminal transition commits once; calls
    /// against an already-completed game return the stored outcome unchanged.
    async fn update_status(
        &self,
        game: GameId,
        status: GameStatus,
        winner: Option<PlayerId>,
    ) -> Result<Game, StoreError>;

    /// Current game/players/guesses snapshot, used once at session start.
    async fn snapshot(&self, game: GameId) -> Result<Game, StoreError>;

    /// Subscribe to the per-game change stream.
    async fn subscribe(&self, game: GameId) -> Result<Subscription, StoreError>;
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> Millis {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Millis)
        .unwrap_or(0)
}

struct GameEntry {
    game: Game,
    events: broadcast::Sender<GameEvent>,
}

/// In-process authoritative store with a broadcast change stream per game.
///
/// All mutations for one game commit under one lock, so concurrent inserts
/// serialize and the winning transition happens exactly once.
pub struct MemoryStore {
    games: Mutex<HashMap<GameId, GameEntry>>,
    next_game: AtomicU64,
    next_guess: AtomicU64,
    alphabet: Alphabet,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            games: Mutex::new(HashMap::new()),
            next_game: AtomicU64::new(1),
            next_guess: AtomicU64::new(1),
            alphabet: Alphabet::ENGLISH,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl GameStore for MemoryStore {
    async fn create_game(
        &self,
        target: Word,
        max_attempts: u32,
        multiplayer: bool,
        creator: Player,
    ) -> Result<Game, StoreError> {
        let id = self.next_game.fetch_add(1, Ordering::Relaxed);
        let now = now_millis();
        let membership = GamePlayer {
            player: creator.id,
            nickname: creator.nickname,
            joined_at: now,
        };
        let game = Game::new(id, target, max_attempts, multiplayer, membership, now);
        let (events, _) = broadcast::channel(256);
        let mut games = self.games.lock().unwrap();
        games.insert(id, GameEntry {
            game: game.clone(),
            events,
        });
        Ok(game)
    }

    async fn join_game(&self, game: GameId, player: Player) -> Result<Game, StoreError> {
        let mut games = self.games.lock().unwrap();
        let entry = games.get_mut(&game).ok_or(StoreError::NotFound(game))?;
        let event = GameEvent::PlayerJoined {
            game,
            player: GamePlayer {
                player: player.id,
                nickname: player.nickname,
                joined_at: now_millis(),
            },
        };
        if entry.game.apply(event.clone()) == Applied::PlayerAdded {
            let _ = entry.events.send(event);
        }
        Ok(entry.game.clone())
    }

    async fn insert_guess(
        &self,
        game: GameId,
        player: PlayerId,
        text: &str,
    ) -> Result<GuessRecord, StoreError> {
        let mut games = self.games.lock().unwrap();
        let entry = games.get_mut(&game).ok_or(StoreError::NotFound(game))?;
        let word = Word::parse(text, &self.alphabet)?;
        entry.game.check_submit(player)?;
        let id = self.next_guess.fetch_add(1, Ordering::Relaxed);
        let record = GuessRecord::score(id, player, word, &entry.game.target, now_millis());
        let status_before = entry.game.status;
        entry.game.apply(GameEvent::GuessAdded {
            game,
            guess: record.clone(),
        });
        let _ = entry.events.send(GameEvent::GuessAdded {
            game,
            guess: record.clone(),
        });
        // A winning guess completes the game inside the same commit; the
        // status event follows the guess event in creation order.
        if status_before == GameStatus::Active && entry.game.status == GameStatus::Completed {
            let _ = entry.events.send(GameEvent::GameStatusChanged {
                game,
                status: entry.game.status,
                winner: entry.game.winner,
                updated_at: entry.game.updated_at,
            });
        }
        Ok(record)
    }

    async fn update_status(
        &self,
        game: GameId,
        status: GameStatus,
        winner: Option<PlayerId>,
    ) -> Result<Game, StoreError> {
        let mut games = self.games.lock().unwrap();
        let entry = games.get_mut(&game).ok_or(StoreError::NotFound(game))?;
        // First writer wins: once terminal, later updates are no-ops.
        if entry.game.status == GameStatus::Completed {
            return Ok(entry.game.clone());
        }
        let event = GameEvent::GameStatusChanged {
            game,
            status,
            winner,
            updated_at: now_millis(),
        };
        entry.game.apply(event.clone());
        let _ = entry.events.send(event);
        Ok(entry.game.clone())
    }

    async fn snapshot(&self, game: GameId) -> Result<Game, StoreError> {
        let games = self.games.lock().unwrap();
        let entry = games.get(&game).ok_or(StoreError::NotFound(game))?;
        Ok(entry.game.clone())
    }

    async fn subscribe(&self, game: GameId) -> Result<Subscription, StoreError> {
        let mut events = {
            let games = self.games.lock().unwrap();
            let entry = games.get(&game).ok_or(StoreError::NotFound(game))?;
            entry.events.subscribe()
        };
        let (tx, rx) = mpsc::channel(64);
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        log::warn!("subscription for game {} lagged, {} events dropped", game, n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Ok(Subscription::new(rx, task))
    }
}
