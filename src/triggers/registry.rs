//! Trigger registration, event matching, and APNAP ordering.
//!
//! Triggers are registered per battlefield permanent when it enters and
//! unregistered after its departure events have been matched — a source
//! that leaves before its trigger reaches the stack still fires, using the
//! last-known information captured at match time.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::entity::EntityId;
use crate::core::player::PlayerId;
use crate::core::state::GameState;
use crate::effects::{SpellEffect, TargetSpec};

use super::condition::{ConditionOutcome, EventContext, TriggerCondition};
use super::event::GameEvent;

/// How a trigger was derived from card data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerConfidence {
    /// From the upstream structured-ability translator.
    Structured,
    /// From the oracle-text pattern fallback; best effort.
    Pattern,
}

/// A trigger attached to a battlefield permanent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredTrigger {
    pub condition: TriggerCondition,
    pub effects: Vec<SpellEffect>,
    /// Targets bound when the trigger goes on the stack.
    pub target: Option<TargetSpec>,
    /// "You may" triggers confirm at resolution.
    pub may: bool,
    pub confidence: TriggerConfidence,
    pub description: String,
}

/// A matched trigger waiting to be ordered and placed on the stack.
///
/// Captures last-known information: the source may be gone by the time the
/// item is pushed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTrigger {
    pub source: EntityId,
    pub source_name: String,
    pub controller: PlayerId,
    pub effects: Vec<SpellEffect>,
    pub target: Option<TargetSpec>,
    pub may: bool,
    pub confidence: TriggerConfidence,
    pub description: String,
}

/// A trigger whose condition could not be decided. Reported, never fired.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndecidedTrigger {
    pub source: EntityId,
    pub source_name: String,
    pub controller: PlayerId,
    pub clause: String,
    pub description: String,
}

/// Per-game trigger registry, indexed by source permanent.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TriggerRegistry {
    by_source: FxHashMap<EntityId, Vec<RegisteredTrigger>>,
}

impl TriggerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a permanent's triggers (battlefield entry).
    pub fn register(&mut self, source: EntityId, triggers: Vec<RegisteredTrigger>) {
        if !triggers.is_empty() {
            self.by_source.insert(source, triggers);
        }
    }

    /// Unregister a departed permanent. Call only after its departure
    /// events have been matched.
    pub fn unregister(&mut self, source: EntityId) {
        self.by_source.remove(&source);
    }

    /// Triggers registered for a source.
    #[must_use]
    pub fn for_source(&self, source: EntityId) -> &[RegisteredTrigger] {
        self.by_source.get(&source).map_or(&[], Vec::as_slice)
    }

    /// Number of sources with registered triggers.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.by_source.len()
    }

    /// Match one event against every registered trigger.
    ///
    /// Fired matches land in `pending`; conditions that could not be
    /// decided land in `undecided`. Iteration order is made deterministic
    /// by sorting sources; final ordering is APNAP via [`order_apnap`].
    pub fn collect(
        &self,
        event: &GameEvent,
        state: &GameState,
        pending: &mut Vec<PendingTrigger>,
        undecided: &mut Vec<UndecidedTrigger>,
    ) {
        let mut sources: Vec<EntityId> = self.by_source.keys().copied().collect();
        sources.sort();

        for source in sources {
            let controller = state
                .permanent(source)
                .map(|p| p.controller)
                .or_else(|| state.card(source).map(|c| c.controller));
            let Some(controller) = controller else {
                continue;
            };
            let source_name = state
                .definition_of(source)
                .map_or_else(|| format!("{source}"), |d| d.name.clone());

            for trigger in &self.by_source[&source] {
                let ctx = EventContext { event, state, source, controller };
                match trigger.condition.evaluate(&ctx, None) {
                    ConditionOutcome::Holds => pending.push(PendingTrigger {
                        source,
                        source_name: source_name.clone(),
                        controller,
                        effects: trigger.effects.clone(),
                        target: trigger.target.clone(),
                        may: trigger.may,
                        confidence: trigger.confidence,
                        description: trigger.description.clone(),
                    }),
                    ConditionOutcome::Undecidable(clause) => undecided.push(UndecidedTrigger {
                        source,
                        source_name: source_name.clone(),
                        controller,
                        clause,
                        description: trigger.description.clone(),
                    }),
                    ConditionOutcome::Fails => {}
                }
            }
        }
    }
}

/// Order a batch of matched triggers by APNAP: the active player's
/// triggers first (in their existing order), then each following player in
/// turn order. The sort is stable, so one controller's triggers keep their
/// registration order.
pub fn order_apnap(pending: &mut [PendingTrigger], active: PlayerId, player_count: usize) {
    pending.sort_by_key(|t| t.controller.seats_after(active, player_count));
}
