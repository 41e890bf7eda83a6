//! Card registry: the in-game view of the external card database.
//!
//! A game's registry is seeded from the external database at creation and
//! only ever grows by token definitions minted during play. Definitions are
//! never mutated.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::definition::{CardDefinition, CardId};

/// Registry of card definitions for one game.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CardRegistry {
    cards: FxHashMap<CardId, CardDefinition>,
    next_token_id: u32,
}

/// Token definitions are minted from this range so they can never collide
/// with database card IDs.
const TOKEN_ID_BASE: u32 = 0x8000_0000;

impl CardRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a database card definition.
    ///
    /// Panics if a card with the same ID already exists; the upstream
    /// database guarantees unique IDs.
    pub fn register(&mut self, card: CardDefinition) {
        let prior = self.cards.insert(card.id, card);
        assert!(prior.is_none(), "duplicate card definition ID");
    }

    /// Mint a token definition, returning its ID.
    pub fn mint_token(&mut self, mut definition: CardDefinition) -> CardId {
        let id = CardId::new(TOKEN_ID_BASE + self.next_token_id);
        self.next_token_id += 1;
        definition.id = id;
        self.cards.insert(id, definition);
        id
    }

    /// Get a card definition by ID.
    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&CardDefinition> {
        self.cards.get(&id)
    }

    /// Whether a definition exists.
    #[must_use]
    pub fn contains(&self, id: CardId) -> bool {
        self.cards.contains_key(&id)
    }

    /// Number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate over all definitions.
    pub fn iter(&self) -> impl Iterator<Item = &CardDefinition> {
        self.cards.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let mut registry = CardRegistry::new();
        registry.register(CardDefinition::new(CardId::new(1), "Forest", "Basic Land — Forest"));

        assert!(registry.contains(CardId::new(1)));
        assert_eq!(registry.get(CardId::new(1)).unwrap().name, "Forest");
        assert!(registry.get(CardId::new(2)).is_none());
    }

    #[test]
    fn test_mint_token_ids_do_not_collide() {
        let mut registry = CardRegistry::new();
        registry.register(CardDefinition::new(CardId::new(1), "Forest", "Basic Land — Forest"));

        let a = registry.mint_token(CardDefinition::new(CardId::new(0), "Saproling", "Creature — Saproling").with_pt(1, 1));
        let b = registry.mint_token(CardDefinition::new(CardId::new(0), "Treasure", "Artifact — Treasure"));

        assert_ne!(a, b);
        assert!(a.raw() >= TOKEN_ID_BASE);
        assert_eq!(registry.len(), 3);
    }
}
