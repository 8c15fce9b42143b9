//! Common types for wordrace: letter scoring states, ids and the core
//! error taxonomy.

/// Identifier of a game, assigned by the authoritative store.
pub type GameId = u64;
/// Identifier of a player, assigned by the identity provider.
pub type PlayerId = u64;
/// Identifier of a single guess record, assigned at insertion.
pub type GuessId = u64;
/// Milliseconds since the Unix epoch, stamped by the store.
pub type Millis = u64;

/// Outcome of scoring one letter position of a guess against the target.
///
/// The derived ordering `Absent < Present < Correct` is what makes the
/// keyboard aggregation a plain `max` upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum LetterState {
    /// Letter does not occur in the (remaining) target pool.
    Absent,
    /// Letter occurs in the target, at a different position.
    Present,
    /// Letter matches the target at this exact position.
    Correct,
}

/// Reasons a raw guess is rejected before it ever reaches the game.
///
/// Validation failures are ordinary user-input outcomes: they never consume
/// an attempt and are surfaced as a transient notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum ValidationError {
    /// Input does not have exactly `WORD_LENGTH` letters.
    WrongLength(usize),
    /// Input contains a character outside the active alphabet.
    NonAlphabetic(char),
    /// Input is well-formed but not in the active word list.
    NotInWordList,
}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ValidationError::WrongLength(n) => {
                write!(f, "expected {} letters, got {}", crate::config::WORD_LENGTH, n)
            }
            ValidationError::NonAlphabetic(ch) => write!(f, "'{}' is not a letter", ch),
            ValidationError::NotInWordList => write!(f, "not in word list"),
        }
    }
}

/// A submission arrived after play ended for the submitting player.
///
/// Not retryable: the caller must treat the game (or this player's part in
/// it) as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum GameOverError {
    /// The game already reached its terminal state.
    Completed,
    /// The submitting player exhausted their attempt budget.
    OutOfAttempts,
}

impl core::fmt::Display for GameOverError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            GameOverError::Completed => write!(f, "game is already completed"),
            GameOverError::OutOfAttempts => write!(f, "no attempts remaining"),
        }
    }
}
