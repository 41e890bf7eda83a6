//! Entity identification.
//!
//! Every per-game object (card instance, token, permanent) has a unique
//! `EntityId`, allocated by the owning `GameState`. Player identities use
//! [`super::PlayerId`]; entity IDs below `player_count` are reserved so a
//! player can also be referenced as an entity where an effect needs it.

use serde::{Deserialize, Serialize};

/// Unique identifier for a per-game object.
///
/// IDs `0..player_count` are reserved for players; cards and tokens are
/// allocated from `player_count` upward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Create a new entity ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Create the entity ID reserved for a player index.
    #[must_use]
    pub const fn player_id(index: u8) -> Self {
        Self(index as u32)
    }

    /// First ID available for non-player entities.
    #[must_use]
    pub const fn first_non_player(player_count: usize) -> u32 {
        player_count as u32
    }

    /// Check whether this ID refers to a player.
    #[must_use]
    pub const fn is_player(self, player_count: usize) -> bool {
        self.0 < player_count as u32
    }

    /// Convert to a player index if this is a player entity.
    #[must_use]
    pub const fn as_player_index(self, player_count: usize) -> Option<u8> {
        if self.is_player(player_count) {
            Some(self.0 as u8)
        } else {
            None
        }
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}
