//! Battlefield permanents.
//!
//! A `Permanent` is the mutable battlefield state of a card instance:
//! tapped flag, marked damage, counters, attachments, and the zone-entry
//! timestamp used for legend-rule and layer tie-breaks. Effective
//! power/toughness is never stored; it is derived at read time by
//! [`crate::core::GameState::effective_pt`].

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::entity::EntityId;
use crate::core::player::PlayerId;

/// Kinds of counters a permanent can carry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounterKind {
    PlusOnePlusOne,
    MinusOneMinusOne,
    Charge,
    Loyalty,
    /// Named counter the engine does not interpret.
    Other(String),
}

/// Mutable battlefield state for one card instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permanent {
    /// The card instance this state belongs to.
    pub entity: EntityId,

    /// Current controller.
    pub controller: PlayerId,

    pub tapped: bool,

    /// Damage marked this turn; cleared at cleanup. Lethal damage is
    /// detected by the SBA loop, never applied here.
    pub damage: i64,

    /// Counter type to count.
    pub counters: FxHashMap<CounterKind, u32>,

    /// What this permanent is attached to (auras, equipment). A non-owning
    /// reference; severed on any zone change of either side.
    pub attached_to: Option<EntityId>,

    /// Permanents attached to this one.
    pub attachments: SmallVec<[EntityId; 2]>,

    /// Zone-entry timestamp, re-stamped on every battlefield entry.
    pub timestamp: u64,

    /// Creatures cannot tap for costs the turn they arrive.
    pub summoning_sick: bool,

    /// Per-turn activation counts, keyed by ability index; cleared each turn.
    pub activations_this_turn: FxHashMap<usize, u32>,
}

impl Permanent {
    /// Create battlefield state for a card entering under `controller`.
    #[must_use]
    pub fn new(entity: EntityId, controller: PlayerId, timestamp: u64) -> Self {
        Self {
            entity,
            controller,
            tapped: false,
            damage: 0,
            counters: FxHashMap::default(),
            attached_to: None,
            attachments: SmallVec::new(),
            timestamp,
            summoning_sick: true,
            activations_this_turn: FxHashMap::default(),
        }
    }

    /// Number of counters of one kind.
    #[must_use]
    pub fn counter_count(&self, kind: &CounterKind) -> u32 {
        self.counters.get(kind).copied().unwrap_or(0)
    }

    /// Add counters of one kind.
    pub fn add_counters(&mut self, kind: CounterKind, count: u32) {
        *self.counters.entry(kind).or_insert(0) += count;
    }

    /// Remove up to `count` counters of one kind; returns how many came off.
    pub fn remove_counters(&mut self, kind: &CounterKind, count: u32) -> u32 {
        let Some(current) = self.counters.get_mut(kind) else {
            return 0;
        };
        let removed = (*current).min(count);
        *current -= removed;
        if *current == 0 {
            self.counters.remove(kind);
        }
        removed
    }

    /// Net power/toughness delta from +1/+1 and -1/-1 counters.
    #[must_use]
    pub fn counter_pt_delta(&self) -> i64 {
        i64::from(self.counter_count(&CounterKind::PlusOnePlusOne))
            - i64::from(self.counter_count(&CounterKind::MinusOneMinusOne))
    }

    /// New-turn bookkeeping: summoning sickness wears off for the active
    /// player's permanents and activation limits reset for everyone.
    pub fn start_of_turn(&mut self, active: PlayerId) {
        if self.controller == active {
            self.summoning_sick = false;
        }
        self.activations_this_turn.clear();
    }
}
