//! Zone containers and the one-zone invariant.
//!
//! The manager tracks which zone every card instance occupies and keeps
//! explicit ordering for the zones where order matters (library, graveyard,
//! stack). Hidden-ness is a property of the zone, applied by the view layer.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::entity::EntityId;
use crate::core::player::PlayerId;

/// A game zone.
///
/// Library, hand, graveyard, and command zones are per-player; battlefield,
/// exile, and the stack are shared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    /// Ordered, hidden. Index 0 is the bottom; the last index is the top.
    Library(PlayerId),
    /// Unordered, hidden from opponents.
    Hand(PlayerId),
    /// Unordered, public. Mutable state lives on `Permanent`.
    Battlefield,
    /// Ordered, public.
    Graveyard(PlayerId),
    /// Unordered, public unless an effect states otherwise.
    Exile,
    /// Ordered, public. Mirrors `GameStack` membership.
    Stack,
    /// Commanders wait here between casts.
    Command(PlayerId),
}

impl Zone {
    /// Whether card order is tracked for this zone.
    #[must_use]
    pub fn is_ordered(self) -> bool {
        matches!(self, Zone::Library(_) | Zone::Graveyard(_) | Zone::Stack)
    }

    /// Whether the zone's contents are hidden from other players.
    #[must_use]
    pub fn is_hidden(self) -> bool {
        matches!(self, Zone::Library(_) | Zone::Hand(_))
    }

    /// The player a per-player zone belongs to.
    #[must_use]
    pub fn owner(self) -> Option<PlayerId> {
        match self {
            Zone::Library(p) | Zone::Hand(p) | Zone::Graveyard(p) | Zone::Command(p) => Some(p),
            Zone::Battlefield | Zone::Exile | Zone::Stack => None,
        }
    }
}

/// Where to insert a card in an ordered zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZonePosition {
    Top,
    Bottom,
}

/// Tracks card locations and per-zone ordering.
///
/// The manager enforces membership; it does not interpret the move (zone
/// change events, attachment severing, and timestamping happen in
/// `GameState::move_card`, the sole caller of `transfer`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ZoneManager {
    /// One-zone invariant: each entity maps to exactly one zone.
    locations: FxHashMap<EntityId, Zone>,

    /// Explicit ordering for ordered zones.
    order: FxHashMap<Zone, Vec<EntityId>>,
}

impl ZoneManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a new entity in a zone. Panics if the entity already exists;
    /// entering a game is a one-time event per instance.
    pub fn place(&mut self, entity: EntityId, zone: Zone, position: ZonePosition) {
        let prior = self.locations.insert(entity, zone);
        assert!(prior.is_none(), "entity already placed in a zone");
        self.insert_ordered(entity, zone, position);
    }

    /// Move an entity to a new zone. Returns the old zone, or `None` if the
    /// entity is unknown. Moving to the current zone is a no-op.
    pub fn transfer(&mut self, entity: EntityId, to: Zone, position: ZonePosition) -> Option<Zone> {
        let from = *self.locations.get(&entity)?;
        if from == to {
            return Some(from);
        }

        if from.is_ordered() {
            if let Some(order) = self.order.get_mut(&from) {
                order.retain(|&e| e != entity);
            }
        }

        self.locations.insert(entity, to);
        self.insert_ordered(entity, to, position);
        Some(from)
    }

    /// Remove an entity from the game entirely (tokens ceasing to exist,
    /// owned objects of a player who lost). Returns its former zone.
    pub fn remove(&mut self, entity: EntityId) -> Option<Zone> {
        let zone = self.locations.remove(&entity)?;
        if let Some(order) = self.order.get_mut(&zone) {
            order.retain(|&e| e != entity);
        }
        Some(zone)
    }

    fn insert_ordered(&mut self, entity: EntityId, zone: Zone, position: ZonePosition) {
        if !zone.is_ordered() {
            return;
        }
        let order = self.order.entry(zone).or_default();
        match position {
            ZonePosition::Top => order.push(entity),
            ZonePosition::Bottom => order.insert(0, entity),
        }
    }

    /// The zone an entity is in.
    #[must_use]
    pub fn zone_of(&self, entity: EntityId) -> Option<Zone> {
        self.locations.get(&entity).copied()
    }

    /// Whether an entity is in a specific zone.
    #[must_use]
    pub fn is_in(&self, entity: EntityId, zone: Zone) -> bool {
        self.locations.get(&entity) == Some(&zone)
    }

    /// All entities in a zone, unordered.
    pub fn in_zone(&self, zone: Zone) -> impl Iterator<Item = EntityId> + '_ {
        self.locations
            .iter()
            .filter(move |(_, &z)| z == zone)
            .map(|(&e, _)| e)
    }

    /// Entities in an ordered zone, bottom first.
    #[must_use]
    pub fn ordered(&self, zone: Zone) -> &[EntityId] {
        self.order.get(&zone).map_or(&[], |v| v.as_slice())
    }

    /// Top card of an ordered zone.
    #[must_use]
    pub fn top(&self, zone: Zone) -> Option<EntityId> {
        self.order.get(&zone).and_then(|v| v.last().copied())
    }

    /// Number of cards in a zone.
    #[must_use]
    pub fn size(&self, zone: Zone) -> usize {
        if zone.is_ordered() {
            self.order.get(&zone).map_or(0, Vec::len)
        } else {
            self.in_zone(zone).count()
        }
    }

    /// Reorder an ordered zone in place (shuffling a library). `cards` must
    /// be a permutation of the zone's current contents.
    pub fn set_order(&mut self, zone: Zone, cards: Vec<EntityId>) {
        debug_assert!(zone.is_ordered());
        debug_assert_eq!(cards.len(), self.size(zone));
        self.order.insert(zone, cards);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(i: u8) -> PlayerId {
        PlayerId::new(i)
    }

    #[test]
    fn test_one_zone_invariant() {
        let mut zones = ZoneManager::new();
        let lib = Zone::Library(p(0));
        zones.place(EntityId(10), lib, ZonePosition::Top);

        assert_eq!(zones.zone_of(EntityId(10)), Some(lib));
        zones.transfer(EntityId(10), Zone::Hand(p(0)), ZonePosition::Top);
        assert_eq!(zones.zone_of(EntityId(10)), Some(Zone::Hand(p(0))));
        assert_eq!(zones.size(lib), 0);
    }

    #[test]
    fn test_library_ordering() {
        let mut zones = ZoneManager::new();
        let lib = Zone::Library(p(0));
        zones.place(EntityId(10), lib, ZonePosition::Top);
        zones.place(EntityId(11), lib, ZonePosition::Top);
        zones.place(EntityId(12), lib, ZonePosition::Bottom);

        assert_eq!(zones.ordered(lib), &[EntityId(12), EntityId(10), EntityId(11)]);
        assert_eq!(zones.top(lib), Some(EntityId(11)));
    }

    #[test]
    fn test_transfer_same_zone_is_noop() {
        let mut zones = ZoneManager::new();
        let lib = Zone::Library(p(0));
        zones.place(EntityId(10), lib, ZonePosition::Top);
        zones.place(EntityId(11), lib, ZonePosition::Top);

        assert_eq!(zones.transfer(EntityId(10), lib, ZonePosition::Top), Some(lib));
        // Order unchanged: no remove/re-add churn.
        assert_eq!(zones.ordered(lib), &[EntityId(10), EntityId(11)]);
    }

    #[test]
    fn test_remove_clears_ordering() {
        let mut zones = ZoneManager::new();
        let grave = Zone::Graveyard(p(1));
        zones.place(EntityId(10), grave, ZonePosition::Top);
        assert_eq!(zones.remove(EntityId(10)), Some(grave));
        assert_eq!(zones.size(grave), 0);
        assert_eq!(zones.zone_of(EntityId(10)), None);
    }

    #[test]
    fn test_unordered_zone_membership() {
        let mut zones = ZoneManager::new();
        zones.place(EntityId(10), Zone::Battlefield, ZonePosition::Top);
        zones.place(EntityId(11), Zone::Battlefield, ZonePosition::Top);

        let mut on_field: Vec<_> = zones.in_zone(Zone::Battlefield).collect();
        on_field.sort();
        assert_eq!(on_field, vec![EntityId(10), EntityId(11)]);
    }

    #[test]
    fn test_hidden_and_ordered_flags() {
        assert!(Zone::Library(p(0)).is_hidden());
        assert!(Zone::Hand(p(0)).is_hidden());
        assert!(!Zone::Battlefield.is_hidden());
        assert!(Zone::Stack.is_ordered());
        assert!(!Zone::Exile.is_ordered());
    }
}
