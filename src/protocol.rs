#![cfg(feature = "std")]

//! Wire protocol between a remote client and the game server.
//!
//! One request yields one reply on an RPC connection; a connection that sent
//! `Subscribe` switches to a push stream of [`Message::Event`] frames.

use crate::common::{GameId, PlayerId};
use crate::event::GameEvent;
use crate::game::{Game, GameStatus, GuessRecord};
use crate::player::Player;
use crate::store::StoreError;
use crate::word::Word;

pub const PROTOCOL_VERSION: u16 = 1;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Message {
    /// Handshake, sent by the client before anything else.
    Hello { version: u16 },
    HelloAck { version: u16 },
    /// Create a game record; replied to with `GameResp`.
    CreateGame {
        target: Word,
        max_attempts: u32,
        multiplayer: bool,
        creator: Player,
    },
    /// Register membership; replied to with `GameResp`.
    JoinGame { game: GameId, player: Player },
    /// Insert a guess record; replied to with `GuessResp`.
    InsertGuess {
        game: GameId,
        player: PlayerId,
        text: String,
    },
    /// Status/winner update; replied to with `GameResp`.
    UpdateStatus {
        game: GameId,
        status: GameStatus,
        winner: Option<PlayerId>,
    },
    /// Current snapshot of game, players and guesses; replied to with `GameResp`.
    FetchSnapshot { game: GameId },
    /// Turn this connection into a per-game event stream; acknowledged with
    /// `Ack`, then `Event` frames until either side closes.
    Subscribe { game: GameId },
    GameResp(Game),
    GuessResp(GuessRecord),
    Event(GameEvent),
    Ack,
    Error(StoreError),
}
