//! Game state: membership, guess history, attempt budgets and the
//! win/loss state machine.

use alloc::string::String;
use alloc::vec::Vec;

use crate::common::{GameId, GameOverError, GuessId, Millis, PlayerId};
use crate::evaluate::{evaluate, Evaluation};
use crate::keyboard::{aggregate, KeyboardState};
use crate::word::Word;

/// Lifecycle of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum GameStatus {
    /// Multiplayer lobby, pre-start. Reachable only through a status event
    /// from a peer still running the lobby flow; new games start `Active`.
    Waiting,
    /// Accepting guesses.
    Active,
    /// Terminal. No transition leaves this state.
    Completed,
}

/// Membership of one player in one game. Append-only, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GamePlayer {
    pub player: PlayerId,
    pub nickname: String,
    pub joined_at: Millis,
}

/// One submitted guess with its evaluation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GuessRecord {
    pub id: GuessId,
    pub player: PlayerId,
    pub word: Word,
    pub eval: Evaluation,
    pub created_at: Millis,
}

impl GuessRecord {
    /// Build a record by scoring `word` against `target`.
    pub fn score(id: GuessId, player: PlayerId, word: Word, target: &Word, created_at: Millis) -> Self {
        let eval = evaluate(&word, target);
        Self {
            id,
            player,
            word,
            eval,
            created_at,
        }
    }

    /// `true` when every position matched the target exactly.
    pub fn is_winning(&self) -> bool {
        crate::evaluate::is_winning(&self.eval)
    }
}

/// One play session: a target word, its participants and their guesses.
///
/// The struct doubles as the local replica in multiplayer mode; remote
/// events merge into it through [`Game::apply`](crate::event).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Game {
    pub id: GameId,
    pub target: Word,
    pub max_attempts: u32,
    pub multiplayer: bool,
    pub status: GameStatus,
    pub winner: Option<PlayerId>,
    pub players: Vec<GamePlayer>,
    pub guesses: Vec<GuessRecord>,
    pub created_at: Millis,
    pub updated_at: Millis,
}

impl Game {
    pub fn new(
        id: GameId,
        target: Word,
        max_attempts: u32,
        multiplayer: bool,
        creator: GamePlayer,
        created_at: Millis,
    ) -> Self {
        let mut players = Vec::new();
        players.push(creator);
        Self {
            id,
            target,
            max_attempts,
            multiplayer,
            status: GameStatus::Active,
            winner: None,
            players,
            guesses: Vec::new(),
            created_at,
            updated_at: created_at,
        }
    }

    pub fn is_member(&self, player: PlayerId) -> bool {
        self.players.iter().any(|p| p.player == player)
    }

    pub fn nickname_of(&self, player: PlayerId) -> Option<&str> {
        self.players
            .iter()
            .find(|p| p.player == player)
            .map(|p| p.nickname.as_str())
    }

    pub fn guesses_of(&self, player: PlayerId) -> impl Iterator<Item = &GuessRecord> {
        self.guesses.iter().filter(move |g| g.player == player)
    }

    /// Number of attempts `player` has used in this game.
    pub fn attempts_of(&self, player: PlayerId) -> u32 {
        self.guesses_of(player).count() as u32
    }

    /// Gate every submission: terminal games and exhausted budgets reject
    /// before anything is recorded or persisted.
    pub fn check_submit(&self, player: PlayerId) -> Result<(), GameOverError> {
        if self.status == GameStatus::Completed {
            return Err(GameOverError::Completed);
        }
        if self.attempts_of(player) >= self.max_attempts {
            return Err(GameOverError::OutOfAttempts);
        }
        Ok(())
    }

    /// `true` once the submitting player can no longer change the outcome:
    /// the game is terminal, or (solo) their budget is spent.
    pub fn is_over_for(&self, player: PlayerId) -> bool {
        self.check_submit(player).is_err()
    }

    /// Best-known keyboard state derived from `player`'s own guesses.
    pub fn keyboard_for(&self, player: PlayerId) -> KeyboardState {
        aggregate(self.guesses_of(player).map(|g| &g.word), &self.target)
    }
}
