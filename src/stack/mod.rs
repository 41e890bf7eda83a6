//! The stack: LIFO container of pending spells and abilities.
//!
//! Only the top item is resolvable. Resolution semantics (target
//! re-validation, per-clause fizzle, permanents entering) live in the
//! session; this module owns membership, ordering, and countering.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::entity::EntityId;
use crate::core::player::PlayerId;
use crate::effects::{SpellEffect, TargetRef};
use crate::triggers::TriggerConfidence;

/// Unique identifier for a stack item within one game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackItemId(pub u32);

impl StackItemId {
    /// Create a new stack item ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for StackItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StackItem({})", self.0)
    }
}

/// What a stack item is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackItemKind {
    /// A spell: the card instance is in the stack zone while this exists.
    Spell {
        card: EntityId,
        /// Chosen targets, one list per *targeted* clause in clause order.
        targets_per_clause: Vec<SmallVec<[TargetRef; 2]>>,
        /// Bound X for `{X}` costs.
        x: Option<i64>,
    },

    /// A triggered or activated ability. Carries last-known information so
    /// it resolves even if the source has left the battlefield.
    Ability {
        source: EntityId,
        source_name: String,
        controller_at_creation: PlayerId,
        effects: Vec<SpellEffect>,
        targets: SmallVec<[TargetRef; 2]>,
        /// Targets still to be bound via a resolution step.
        awaiting_targets: bool,
        /// "You may ..." abilities confirm at resolution.
        may: bool,
        /// Structured descriptor or oracle-text pattern match.
        confidence: TriggerConfidence,
        description: String,
    },
}

/// An entry on the stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackItem {
    pub id: StackItemId,
    pub controller: PlayerId,
    pub kind: StackItemKind,
}

impl StackItem {
    /// Display name for prompts and logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.kind {
            StackItemKind::Spell { card, .. } => format!("spell {card}"),
            StackItemKind::Ability { source_name, description, .. } => {
                format!("{source_name}: {description}")
            }
        }
    }
}

/// The LIFO stack. Index 0 is the bottom; the last index is the top.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStack {
    items: Vec<StackItem>,
    next_id: u32,
}

impl GameStack {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new item onto the top, returning its ID.
    pub fn push(&mut self, controller: PlayerId, kind: StackItemKind) -> StackItemId {
        let id = StackItemId::new(self.next_id);
        self.next_id += 1;
        self.items.push(StackItem { id, controller, kind });
        id
    }

    /// Pop the top item. The caller resolves it.
    pub fn pop(&mut self) -> Option<StackItem> {
        self.items.pop()
    }

    /// Peek at the top item.
    #[must_use]
    pub fn peek(&self) -> Option<&StackItem> {
        self.items.last()
    }

    /// Remove an item anywhere in the stack (countering). The item's
    /// effects never run; cost refunds never happen.
    pub fn remove(&mut self, id: StackItemId) -> Option<StackItem> {
        let idx = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(idx))
    }

    /// Find an item by ID.
    #[must_use]
    pub fn get(&self, id: StackItemId) -> Option<&StackItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Find an item mutably (binding late-chosen trigger targets).
    pub fn get_mut(&mut self, id: StackItemId) -> Option<&mut StackItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Whether any stack item is still awaiting target selection.
    #[must_use]
    pub fn any_awaiting_targets(&self) -> bool {
        self.items.iter().any(|item| {
            matches!(&item.kind, StackItemKind::Ability { awaiting_targets: true, .. })
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterate bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &StackItem> {
        self.items.iter()
    }
}
