//! Word representation and guess validation.
//!
//! A [`Word`] is exactly [`WORD_LENGTH`] uppercase letters from a fixed
//! [`Alphabet`]. Parsing normalizes case; the [`WordList`] decides dictionary
//! membership for the active language.

use alloc::vec::Vec;

use crate::common::ValidationError;
use crate::config::WORD_LENGTH;

/// The set of letters a word may be built from.
///
/// The base alphabet is ASCII A-Z; languages with extra letters list them
/// here (already uppercased).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alphabet {
    extra: &'static [char],
}

impl Alphabet {
    pub const ENGLISH: Alphabet = Alphabet { extra: &[] };

    pub const fn with_extra(extra: &'static [char]) -> Self {
        Self { extra }
    }

    pub fn contains(&self, ch: char) -> bool {
        ch.is_ascii_uppercase() || self.extra.contains(&ch)
    }
}

/// A fixed-length word: the target of a game, or one guess against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Word {
    letters: [char; WORD_LENGTH],
}

impl Word {
    /// Parse and normalize a raw candidate.
    ///
    /// Input is trimmed and uppercased; anything that is not exactly
    /// [`WORD_LENGTH`] letters of `alphabet` is rejected with the reason.
    pub fn parse(raw: &str, alphabet: &Alphabet) -> Result<Self, ValidationError> {
        let mut letters = [' '; WORD_LENGTH];
        let mut n = 0usize;
        for ch in raw.trim().chars() {
            let up = ch.to_uppercase().next().unwrap_or(ch);
            if !alphabet.contains(up) {
                return Err(ValidationError::NonAlphabetic(ch));
            }
            if n == WORD_LENGTH {
                // Count the rest so the error reports the real length.
                n = raw.trim().chars().count();
                return Err(ValidationError::WrongLength(n));
            }
            letters[n] = up;
            n += 1;
        }
        if n != WORD_LENGTH {
            return Err(ValidationError::WrongLength(n));
        }
        Ok(Self { letters })
    }

    pub const fn letters(&self) -> &[char; WORD_LENGTH] {
        &self.letters
    }
}

impl core::fmt::Display for Word {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for ch in self.letters {
            write!(f, "{}", ch)?;
        }
        Ok(())
    }
}

/// Dictionary of accepted words for one language.
///
/// Membership is the second half of guess validation: a candidate must parse
/// as a [`Word`] *and* be present here. Lookups never fail; malformed input
/// is simply not valid.
#[derive(Debug, Clone)]
pub struct WordList {
    alphabet: Alphabet,
    words: Vec<Word>,
}

impl WordList {
    /// Build a list from raw entries, skipping any that do not parse.
    pub fn new<'a, I>(alphabet: Alphabet, entries: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut words: Vec<Word> = entries
            .into_iter()
            .filter_map(|raw| Word::parse(raw, &alphabet).ok())
            .collect();
        words.sort_unstable();
        words.dedup();
        Self { alphabet, words }
    }

    /// The bundled English corpus.
    pub fn builtin() -> Self {
        Self::new(Alphabet::ENGLISH, include_str!("wordlist.txt").lines())
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &Word) -> bool {
        self.words.binary_search(word).is_ok()
    }

    /// Full validation: well-formed and in the dictionary.
    pub fn is_valid(&self, candidate: &str) -> bool {
        self.check(candidate).is_ok()
    }

    /// Validation that reports why a candidate was rejected.
    pub fn check(&self, candidate: &str) -> Result<Word, ValidationError> {
        let word = Word::parse(candidate, &self.alphabet)?;
        if self.contains(&word) {
            Ok(word)
        } else {
            Err(ValidationError::NotInWordList)
        }
    }

    /// Pick a uniformly random target word.
    pub fn pick<R: rand::Rng>(&self, rng: &mut R) -> Word {
        self.words[rng.random_range(0..self.words.len())]
    }
}
