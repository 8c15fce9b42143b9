#![cfg(feature = "std")]

//! Per-player game session controller.
//!
//! The session owns the shared state cell for one game: local submissions
//! and remote-event merges both lock it, so exactly one state-mutating
//! operation commits at a time. UI layers observe changes through a watch
//! channel instead of reaching into session internals; the core stays
//! framework-agnostic and just exposes state plus a change notification.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::common::{GameId, PlayerId};
use crate::event::GameEvent;
use crate::game::{Game, GameStatus, GuessRecord};
use crate::keyboard::KeyboardState;
use crate::player::Player;
use crate::store::{GameStore, StoreError, Subscription};
use crate::word::WordList;

/// Health of the realtime link, independent of game-state correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Solo mode: no transport involved at all.
    Local,
    Connected,
    /// The change stream was lost. Local state is intact; the user may
    /// trigger [`GameSession::retry_connection`].
    Degraded,
}

/// What a UI layer sees: the current replica, the viewer's keyboard and the
/// link health.
#[derive(Debug, Clone)]
pub struct GameView {
    pub game: Game,
    pub keyboard: KeyboardState,
    pub connection: ConnectionState,
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub guess: GuessRecord,
    pub status: GameStatus,
}

pub struct GameSession {
    store: Arc<dyn GameStore>,
    words: Arc<WordList>,
    player: Player,
    game_id: GameId,
    state: Arc<Mutex<Game>>,
    view: Arc<watch::Sender<GameView>>,
    pump: Option<JoinHandle<()>>,
}

impl GameSession {
    /// Create a game and enter it.
    pub async fn create(
        store: Arc<dyn GameStore>,
        words: Arc<WordList>,
        player: Player,
        target: crate::word::Word,
        max_attempts: u32,
        multiplayer: bool,
    ) -> Result<Self, StoreError> {
        let game = store
            .create_game(target, max_attempts, multiplayer, player.clone())
            .await?;
        Self::enter(store, words, player, game).await
    }

    /// Join an existing game by id.
    pub async fn join(
        store: Arc<dyn GameStore>,
        words: Arc<WordList>,
        player: Player,
        game_id: GameId,
    ) -> Result<Self, StoreError> {
        let game = store.join_game(game_id, player.clone()).await?;
        Self::enter(store, words, player, game).await
    }

    async fn enter(
        store: Arc<dyn GameStore>,
        words: Arc<WordList>,
        player: Player,
        game: Game,
    ) -> Result<Self, StoreError> {
        let multiplayer = game.multiplayer;
        let game_id = game.id;
        let connection = if multiplayer {
            ConnectionState::Connected
        } else {
            ConnectionState::Local
        };
        let keyboard = game.keyboard_for(player.id);
        let (view, _) = watch::channel(GameView {
            game: game.clone(),
            keyboard,
            connection,
        });
        let mut session = Self {
            store,
            words,
            player,
            game_id,
            state: Arc::new(Mutex::new(game)),
            view: Arc::new(view),
            pump: None,
        };
        if multiplayer {
            session.resubscribe().await?;
        }
        Ok(session)
    }

    /// (Re)establish the change stream and reseed local state.
    ///
    /// Subscribes first, then fetches the snapshot: any event delivered in
    /// the overlap window is collapsed by identity de-duplication, whereas
    /// the opposite order could drop events with no way to recover them.
    async fn resubscribe(&mut self) -> Result<(), StoreError> {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        let subscription = self.store.subscribe(self.game_id).await?;
        let snapshot = self.store.snapshot(self.game_id).await?;
        {
            let mut game = self.state.lock().await;
            *game = snapshot;
            publish_view(&self.view, &game, self.player.id, ConnectionState::Connected);
        }
        self.pump = Some(tokio::spawn(pump_events(
            subscription,
            self.state.clone(),
            self.view.clone(),
            self.player.id,
        )));
        Ok(())
    }

    /// Explicit, user-triggered reconnect after degradation. Never invoked
    /// automatically.
    pub async fn retry_connection(&mut self) -> Result<(), StoreError> {
        self.resubscribe().await
    }

    /// Validate, persist and record one guess.
    ///
    /// Local state advances only after the store acknowledges the insert.
    /// Validation failures never consume an attempt; terminal and
    /// over-budget submissions fail fast without touching the store.
    pub async fn submit(&self, raw: &str) -> Result<SubmitOutcome, StoreError> {
        self.words.check(raw)?;
        let mut game = self.state.lock().await;
        game.check_submit(self.player.id)?;
        let record = self
            .store
            .insert_guess(self.game_id, self.player.id, raw)
            .await?;
        game.apply(GameEvent::GuessAdded {
            game: self.game_id,
            guess: record.clone(),
        });
        // Solo: spending the last attempt without a match ends the game as a
        // loss. Multiplayer budgets are per player and do not end the game.
        if !game.multiplayer
            && game.status == GameStatus::Active
            && game.attempts_of(self.player.id) >= game.max_attempts
        {
            let updated = self
                .store
                .update_status(self.game_id, GameStatus::Completed, None)
                .await?;
            game.apply(GameEvent::GameStatusChanged {
                game: self.game_id,
                status: updated.status,
                winner: updated.winner,
                updated_at: updated.updated_at,
            });
        }
        let status = game.status;
        let connection = self.view.borrow().connection;
        publish_view(&self.view, &game, self.player.id, connection);
        Ok(SubmitOutcome {
            guess: record,
            status,
        })
    }

    /// Observe state changes; the receiver always holds the latest view.
    pub fn watch(&self) -> watch::Receiver<GameView> {
        self.view.subscribe()
    }

    /// Current view of the game for this player.
    pub async fn view(&self) -> GameView {
        let game = self.state.lock().await;
        GameView {
            keyboard: game.keyboard_for(self.player.id),
            game: game.clone(),
            connection: self.view.borrow().connection,
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Leave the game, releasing the subscription.
    pub fn leave(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.release();
    }
}

fn publish_view(
    view: &watch::Sender<GameView>,
    game: &Game,
    viewer: PlayerId,
    connection: ConnectionState,
) {
    view.send_replace(GameView {
        game: game.clone(),
        keyboard: game.keyboard_for(viewer),
        connection,
    });
}

/// Merge remote events into the shared cell until the stream ends, then
/// flag the link as degraded. Dropping the subscription (via task abort)
/// releases it.
async fn pump_events(
    mut subscription: Subscription,
    state: Arc<Mutex<Game>>,
    view: Arc<watch::Sender<GameView>>,
    viewer: PlayerId,
) {
    while let Some(event) = subscription.recv().await {
        let mut game = state.lock().await;
        let applied = game.apply(event);
        log::debug!("remote event applied: {:?}", applied);
        publish_view(&view, &game, viewer, ConnectionState::Connected);
    }
    let game = state.lock().await;
    publish_view(&view, &game, viewer, ConnectionState::Degraded);
}
