/// Number of letters in every target word and guess.
pub const WORD_LENGTH: usize = 5;

/// Attempt budget per player unless a game overrides it.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;
