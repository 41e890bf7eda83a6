//! Card instances: per-game objects.
//!
//! An instance pairs an immutable definition with per-game identity: the
//! owner (fixed for the whole game), the current controller (meaningful on
//! the battlefield and stack), and a zone tag kept in sync by
//! [`crate::core::GameState::move_card`].

use serde::{Deserialize, Serialize};

use crate::core::entity::EntityId;
use crate::core::player::PlayerId;
use crate::zones::Zone;

use super::definition::CardId;

/// A card in a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInstance {
    /// Unique entity ID for this instance.
    pub entity: EntityId,

    /// The definition this instance was printed from.
    pub card: CardId,

    /// Owner: the player whose deck (or command zone) it started in.
    pub owner: PlayerId,

    /// Current controller. Equal to the owner except while a control-change
    /// applies on the battlefield or stack.
    pub controller: PlayerId,

    /// Zone tag. `GameState::move_card` is the only writer.
    pub zone: Zone,

    /// Tokens cease to exist when they leave the battlefield.
    pub is_token: bool,
}

impl CardInstance {
    /// Create an instance owned and controlled by `owner`.
    #[must_use]
    pub fn new(entity: EntityId, card: CardId, owner: PlayerId, zone: Zone) -> Self {
        Self {
            entity,
            card,
            owner,
            controller: owner,
            zone,
            is_token: false,
        }
    }

    /// Create a token instance.
    #[must_use]
    pub fn token(entity: EntityId, card: CardId, owner: PlayerId) -> Self {
        Self {
            entity,
            card,
            owner,
            controller: owner,
            zone: Zone::Battlefield,
            is_token: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_controls_initially() {
        let card = CardInstance::new(
            EntityId(10),
            CardId::new(1),
            PlayerId::new(2),
            Zone::Library(PlayerId::new(2)),
        );
        assert_eq!(card.controller, card.owner);
        assert!(!card.is_token);
    }

    #[test]
    fn test_token_starts_on_battlefield() {
        let token = CardInstance::token(EntityId(11), CardId::new(9), PlayerId::new(0));
        assert_eq!(token.zone, Zone::Battlefield);
        assert!(token.is_token);
    }
}
