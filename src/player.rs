//! Player identity.
//!
//! The core treats identity as an opaque token. The local provider hands out
//! one [`Player`] per process and is held explicitly by whoever needs it;
//! there is no module-level current-player singleton.

use alloc::format;
use alloc::string::{String, ToString};

use crate::common::PlayerId;

/// An identity with a display nickname.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Player {
    pub id: PlayerId,
    pub nickname: String,
}

/// Local player identity provider.
///
/// Owns the cached identity and its lifecycle: `get_or_create` materializes
/// it on first use, `invalidate` drops the cache so the next call mints a
/// fresh identity.
#[derive(Debug, Default)]
pub struct LocalIdentity {
    current: Option<Player>,
}

impl LocalIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached identity, creating one with a generated nickname if none
    /// exists yet.
    pub fn get_or_create<R: rand::Rng>(&mut self, rng: &mut R) -> Player {
        if let Some(player) = &self.current {
            return player.clone();
        }
        let id: PlayerId = rng.random();
        let player = Player {
            id,
            nickname: format!("player-{:04}", id % 10_000),
        };
        self.current = Some(player.clone());
        player
    }

    pub fn current(&self) -> Option<&Player> {
        self.current.as_ref()
    }

    /// Update the nickname of the cached identity, if any.
    pub fn update_nickname(&mut self, nickname: &str) {
        if let Some(player) = self.current.as_mut() {
            player.nickname = nickname.to_string();
        }
    }

    /// Drop the cached identity.
    pub fn invalidate(&mut self) {
        self.current = None;
    }
}
