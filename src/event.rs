//! Remote-event reconciliation.
//!
//! Every state change travels as one [`GameEvent`], and a single reducer
//! ([`Game::apply`]) merges events into the local replica. Inserts are
//! de-duplicated by identity, so the reducer is idempotent: the local echo of
//! an own submission, a replay after reconnect, or a genuinely new remote
//! event all go through the same path.

use crate::common::{GameId, Millis, PlayerId};
use crate::game::{Game, GamePlayer, GameStatus, GuessRecord};

/// A state-changing event for one game, as delivered by the change stream.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum GameEvent {
    GuessAdded {
        game: GameId,
        guess: GuessRecord,
    },
    PlayerJoined {
        game: GameId,
        player: GamePlayer,
    },
    GameStatusChanged {
        game: GameId,
        status: GameStatus,
        winner: Option<PlayerId>,
        updated_at: Millis,
    },
}

impl GameEvent {
    pub fn game_id(&self) -> GameId {
        match self {
            GameEvent::GuessAdded { game, .. }
            | GameEvent::PlayerJoined { game, .. }
            | GameEvent::GameStatusChanged { game, .. } => *game,
        }
    }
}

/// What applying one event did to the replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    GuessInserted,
    /// A guess with this identity already exists locally.
    DuplicateGuess,
    PlayerAdded,
    /// This membership already exists locally.
    DuplicatePlayer,
    StatusUpdated,
    /// Event addressed to a different game id; nothing changed.
    WrongGame,
}

impl Game {
    /// Merge one event into this replica. Idempotent by identity.
    pub fn apply(&mut self, event: GameEvent) -> Applied {
        if event.game_id() != self.id {
            return Applied::WrongGame;
        }
        match event {
            GameEvent::GuessAdded { guess, .. } => {
                if self.guesses.iter().any(|g| g.id == guess.id) {
                    return Applied::DuplicateGuess;
                }
                if guess.created_at > self.updated_at {
                    self.updated_at = guess.created_at;
                }
                let winning = guess.is_winning();
                let winner = guess.player;
                self.guesses.push(guess);
                // A winning guess completes the game; guesses that arrive
                // after completion stay in the history without re-opening
                // play.
                if winning && self.status == GameStatus::Active {
                    self.status = GameStatus::Completed;
                    self.winner = Some(winner);
                }
                Applied::GuessInserted
            }
            GameEvent::PlayerJoined { player, .. } => {
                if self.is_member(player.player) {
                    return Applied::DuplicatePlayer;
                }
                if player.joined_at > self.updated_at {
                    self.updated_at = player.joined_at;
                }
                self.players.push(player);
                Applied::PlayerAdded
            }
            GameEvent::GameStatusChanged {
                status,
                winner,
                updated_at,
                ..
            } => {
                // The stream is the source of truth for completion: always
                // overwrite, never merge.
                self.status = status;
                self.winner = winner;
                self.updated_at = updated_at;
                Applied::StatusUpdated
            }
        }
    }
}
