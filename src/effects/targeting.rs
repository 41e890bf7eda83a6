//! Target specifications and legality.
//!
//! A `TargetSpec` describes what a spell clause or ability may target and
//! how many targets it takes. Legality is checked when targets are chosen
//! and checked *again* when the spell or ability resolves; stored targets
//! are never trusted across the gap.

use serde::{Deserialize, Serialize};

use crate::cards::CardType;
use crate::core::error::GameError;
use crate::core::player::PlayerId;
use crate::core::state::GameState;
use crate::core::entity::EntityId;
use crate::stack::StackItemId;
use crate::zones::Zone;

/// A reference to something targetable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetRef {
    /// A permanent on the battlefield.
    Permanent(EntityId),
    /// A player.
    Player(PlayerId),
    /// A spell or ability on the stack.
    Spell(StackItemId),
}

/// What kind of object a spec targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    /// Any permanent.
    Permanent,
    /// Creature permanents only.
    Creature,
    /// A player.
    Player,
    /// "Any target": a creature or a player.
    CreatureOrPlayer,
    /// A spell on the stack (counterspells).
    SpellOnStack,
    /// A permanent of a specific card type.
    PermanentOfType(CardType),
}

/// Additional restrictions on legal targets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetFilter {
    /// Controlled by the targeting player.
    ControlledByYou,
    /// Controlled by an opponent of the targeting player.
    ControlledByOpponent,
    /// Permanent has the given subtype.
    HasSubtype(String),
    /// Permanent is not the source of the effect.
    NotSource,
}

/// A target requirement: kind, filters, and an exact count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub kind: TargetKind,
    pub filters: Vec<TargetFilter>,
    /// Exact number of distinct targets required.
    pub count: usize,
}

impl TargetSpec {
    /// Target one object of the given kind.
    #[must_use]
    pub fn one(kind: TargetKind) -> Self {
        Self { kind, filters: Vec::new(), count: 1 }
    }

    /// Target `count` objects of the given kind.
    #[must_use]
    pub fn exactly(kind: TargetKind, count: usize) -> Self {
        Self { kind, filters: Vec::new(), count }
    }

    /// Add a filter (builder).
    #[must_use]
    pub fn with_filter(mut self, filter: TargetFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Check one candidate against kind and filters.
    #[must_use]
    pub fn allows(
        &self,
        state: &GameState,
        chooser: PlayerId,
        source: Option<EntityId>,
        target: TargetRef,
    ) -> bool {
        match target {
            TargetRef::Player(p) => {
                if !matches!(self.kind, TargetKind::Player | TargetKind::CreatureOrPlayer) {
                    return false;
                }
                if p.index() >= state.player_count() || !state.alive(p) {
                    return false;
                }
                self.filters.iter().all(|f| match f {
                    TargetFilter::ControlledByYou => p == chooser,
                    TargetFilter::ControlledByOpponent => p != chooser,
                    TargetFilter::HasSubtype(_) | TargetFilter::NotSource => false,
                })
            }
            TargetRef::Permanent(entity) => {
                if !state.zones.is_in(entity, Zone::Battlefield) {
                    return false;
                }
                let Some(perm) = state.permanent(entity) else {
                    return false;
                };
                let Some(def) = state.definition_of(entity) else {
                    return false;
                };
                let kind_ok = match self.kind {
                    TargetKind::Permanent => true,
                    TargetKind::Creature | TargetKind::CreatureOrPlayer => {
                        def.type_line.is_creature()
                    }
                    TargetKind::PermanentOfType(ty) => def.type_line.has_type(ty),
                    TargetKind::Player | TargetKind::SpellOnStack => false,
                };
                if !kind_ok {
                    return false;
                }
                self.filters.iter().all(|f| match f {
                    TargetFilter::ControlledByYou => perm.controller == chooser,
                    TargetFilter::ControlledByOpponent => perm.controller != chooser,
                    TargetFilter::HasSubtype(subtype) => def.type_line.has_subtype(subtype),
                    TargetFilter::NotSource => Some(entity) != source,
                })
            }
            TargetRef::Spell(item_id) => {
                if !matches!(self.kind, TargetKind::SpellOnStack) {
                    return false;
                }
                state.stack.get(item_id).is_some()
            }
        }
    }
}

/// Enumerate every currently legal target for a spec.
#[must_use]
pub fn legal_targets(
    state: &GameState,
    spec: &TargetSpec,
    chooser: PlayerId,
    source: Option<EntityId>,
) -> Vec<TargetRef> {
    let mut out = Vec::new();

    for player in state.alive_players() {
        let candidate = TargetRef::Player(player);
        if spec.allows(state, chooser, source, candidate) {
            out.push(candidate);
        }
    }

    let mut on_field: Vec<EntityId> = state.zones.in_zone(Zone::Battlefield).collect();
    on_field.sort();
    for entity in on_field {
        let candidate = TargetRef::Permanent(entity);
        if spec.allows(state, chooser, source, candidate) {
            out.push(candidate);
        }
    }

    for item in state.stack.iter() {
        let candidate = TargetRef::Spell(item.id);
        if spec.allows(state, chooser, source, candidate) {
            out.push(candidate);
        }
    }

    out
}

/// Validate a chosen target list against a spec: exact count, no
/// duplicates, every entry currently legal. Used at selection time and
/// again at resolution time.
pub fn validate_targets(
    state: &GameState,
    spec: &TargetSpec,
    chooser: PlayerId,
    source: Option<EntityId>,
    targets: &[TargetRef],
) -> Result<(), GameError> {
    if targets.len() != spec.count {
        return Err(GameError::selection(format!(
            "expected {} target(s), got {}",
            spec.count,
            targets.len()
        )));
    }
    for (i, a) in targets.iter().enumerate() {
        if targets[..i].contains(a) {
            return Err(GameError::selection("duplicate target"));
        }
    }
    for target in targets {
        if !spec.allows(state, chooser, source, *target) {
            return Err(GameError::target(format!("{target:?} is not a legal target")));
        }
    }
    Ok(())
}
