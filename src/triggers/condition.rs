//! Trigger conditions and tri-state evaluation.
//!
//! A condition is evaluated against one event, from the point of view of a
//! trigger's source and controller. The result is three-valued: a condition
//! whose truth cannot be derived from available context reports
//! [`ConditionOutcome::Undecidable`] — it is never silently defaulted to
//! true or false.

use serde::{Deserialize, Serialize};

use crate::cards::CardType;
use crate::core::entity::EntityId;
use crate::core::player::PlayerId;
use crate::core::state::GameState;
use crate::turn::Step;

use super::event::GameEvent;

/// Three-valued evaluation result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOutcome {
    Holds,
    Fails,
    /// The needed context is not tracked (e.g. mana-payment provenance).
    /// Carries the clause that could not be decided.
    Undecidable(String),
}

impl ConditionOutcome {
    #[must_use]
    pub fn holds(&self) -> bool {
        matches!(self, ConditionOutcome::Holds)
    }
}

/// Evaluation context: the event plus the trigger's standpoint.
pub struct EventContext<'a> {
    pub event: &'a GameEvent,
    pub state: &'a GameState,
    /// The permanent the trigger is printed on.
    pub source: EntityId,
    /// The trigger's controller.
    pub controller: PlayerId,
}

/// A condition for a triggered ability.
///
/// `Self*` variants are relative to the trigger's source; `You*` variants
/// are relative to its controller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerCondition {
    /// "When this permanent enters the battlefield."
    SelfEnters,
    /// "When this permanent dies."
    SelfDies,
    /// "When this permanent leaves the battlefield."
    SelfLeaves,

    /// "Whenever a creature dies" / "... a creature you control dies."
    CreatureDies { yours_only: bool },

    /// Landfall: a land entered the battlefield under your control.
    Landfall,

    /// "Whenever you cast a spell" with optional type/subtype filters
    /// (tribal-cast: "whenever you cast an Elf spell").
    YouCastSpell {
        card_type: Option<CardType>,
        subtype: Option<String>,
    },

    /// "Whenever you draw a card", optionally only the first each turn.
    YouDrawCard { first_each_turn: bool },

    /// "At the beginning of <step>", optionally only on your own turn.
    BeginningOfStep { step: Step, own_turn_only: bool },

    /// Intervening-if clause requiring mana-payment provenance, which the
    /// engine does not track. Always evaluates to `Undecidable`.
    CastWithTreasureMana,

    // === Combinators (Kleene three-valued logic) ===
    All(Vec<TriggerCondition>),
    Any(Vec<TriggerCondition>),
    Not(Box<TriggerCondition>),

    Always,
    Never,

    /// Host-defined predicate by name. Undecidable unless the session was
    /// configured with an evaluator for it.
    Custom(String),
}

impl TriggerCondition {
    /// Evaluate against one event.
    ///
    /// `custom_eval` resolves [`TriggerCondition::Custom`] predicates;
    /// without one, custom conditions are undecidable.
    #[must_use]
    pub fn evaluate(
        &self,
        ctx: &EventContext<'_>,
        custom_eval: Option<&dyn Fn(&str, &EventContext<'_>) -> Option<bool>>,
    ) -> ConditionOutcome {
        use ConditionOutcome::{Fails, Holds, Undecidable};

        let decided = |b: bool| if b { Holds } else { Fails };

        match self {
            TriggerCondition::SelfEnters => decided(matches!(
                ctx.event,
                GameEvent::PermanentEntered { entity, .. } if *entity == ctx.source
            )),
            TriggerCondition::SelfDies => decided(matches!(
                ctx.event,
                GameEvent::PermanentDied { entity, .. } if *entity == ctx.source
            )),
            TriggerCondition::SelfLeaves => decided(matches!(
                ctx.event,
                GameEvent::PermanentDied { entity, .. } | GameEvent::PermanentLeft { entity, .. }
                    if *entity == ctx.source
            )),
            TriggerCondition::CreatureDies { yours_only } => decided(matches!(
                ctx.event,
                GameEvent::PermanentDied { was_creature: true, former_controller, .. }
                    if !yours_only || *former_controller == ctx.controller
            )),
            TriggerCondition::Landfall => decided(matches!(
                ctx.event,
                GameEvent::LandPlayed { controller, .. } if *controller == ctx.controller
            )),
            TriggerCondition::YouCastSpell { card_type, subtype } => {
                let GameEvent::SpellCast { controller, card, .. } = ctx.event else {
                    return Fails;
                };
                if *controller != ctx.controller {
                    return Fails;
                }
                let Some(def) = ctx.state.registry.get(*card) else {
                    // The cast object is no longer identifiable.
                    return Undecidable("cast spell's identity unavailable".to_string());
                };
                let type_ok = card_type.map_or(true, |t| def.type_line.has_type(t));
                let subtype_ok = subtype
                    .as_ref()
                    .map_or(true, |s| def.type_line.has_subtype(s));
                decided(type_ok && subtype_ok)
            }
            TriggerCondition::YouDrawCard { first_each_turn } => {
                let GameEvent::CardDrawn { player, nth_this_turn } = ctx.event else {
                    return Fails;
                };
                decided(*player == ctx.controller && (!first_each_turn || *nth_this_turn == 1))
            }
            TriggerCondition::BeginningOfStep { step, own_turn_only } => {
                let GameEvent::StepStarted { step: started, active } = ctx.event else {
                    return Fails;
                };
                decided(started == step && (!own_turn_only || *active == ctx.controller))
            }
            TriggerCondition::CastWithTreasureMana => Undecidable(
                "whether mana from a Treasure was spent is not tracked".to_string(),
            ),

            TriggerCondition::All(conditions) => {
                let mut undecided = None;
                for condition in conditions {
                    match condition.evaluate(ctx, custom_eval) {
                        Fails => return Fails,
                        Undecidable(clause) => undecided = Some(clause),
                        Holds => {}
                    }
                }
                undecided.map_or(Holds, Undecidable)
            }
            TriggerCondition::Any(conditions) => {
                let mut undecided = None;
                for condition in conditions {
                    match condition.evaluate(ctx, custom_eval) {
                        Holds => return Holds,
                        Undecidable(clause) => undecided = Some(clause),
                        Fails => {}
                    }
                }
                undecided.map_or(Fails, Undecidable)
            }
            TriggerCondition::Not(inner) => match inner.evaluate(ctx, custom_eval) {
                Holds => Fails,
                Fails => Holds,
                undecidable @ Undecidable(_) => undecidable,
            },

            TriggerCondition::Always => Holds,
            TriggerCondition::Never => Fails,

            TriggerCondition::Custom(name) => match custom_eval.and_then(|f| f(name, ctx)) {
                Some(result) => decided(result),
                None => Undecidable(format!("no evaluator for custom condition '{name}'")),
            },
        }
    }

    /// AND with another condition.
    #[must_use]
    pub fn and(self, other: TriggerCondition) -> Self {
        match self {
            TriggerCondition::All(mut conditions) => {
                conditions.push(other);
                TriggerCondition::All(conditions)
            }
            _ => TriggerCondition::All(vec![self, other]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardId;

    fn ctx_for<'a>(event: &'a GameEvent, state: &'a GameState) -> EventContext<'a> {
        EventContext {
            event,
            state,
            source: EntityId(100),
            controller: PlayerId::new(0),
        }
    }

    fn empty_state() -> GameState {
        GameState::new(2, 1, crate::cards::CardRegistry::new())
    }

    #[test]
    fn test_self_enters() {
        let state = empty_state();
        let event = GameEvent::PermanentEntered {
            entity: EntityId(100),
            controller: PlayerId::new(0),
            card: CardId::new(1),
        };
        let ctx = ctx_for(&event, &state);
        assert!(TriggerCondition::SelfEnters.evaluate(&ctx, None).holds());

        let other = GameEvent::PermanentEntered {
            entity: EntityId(101),
            controller: PlayerId::new(0),
            card: CardId::new(1),
        };
        let ctx = ctx_for(&other, &state);
        assert_eq!(
            TriggerCondition::SelfEnters.evaluate(&ctx, None),
            ConditionOutcome::Fails
        );
    }

    #[test]
    fn test_landfall_is_controller_relative() {
        let state = empty_state();
        let yours = GameEvent::LandPlayed { entity: EntityId(5), controller: PlayerId::new(0) };
        let theirs = GameEvent::LandPlayed { entity: EntityId(6), controller: PlayerId::new(1) };

        let ctx = ctx_for(&yours, &state);
        assert!(TriggerCondition::Landfall.evaluate(&ctx, None).holds());
        let ctx = ctx_for(&theirs, &state);
        assert!(!TriggerCondition::Landfall.evaluate(&ctx, None).holds());
    }

    #[test]
    fn test_first_draw_of_turn() {
        let state = empty_state();
        let condition = TriggerCondition::YouDrawCard { first_each_turn: true };

        let first = GameEvent::CardDrawn { player: PlayerId::new(0), nth_this_turn: 1 };
        let second = GameEvent::CardDrawn { player: PlayerId::new(0), nth_this_turn: 2 };

        assert!(condition.evaluate(&ctx_for(&first, &state), None).holds());
        assert!(!condition.evaluate(&ctx_for(&second, &state), None).holds());
    }

    #[test]
    fn test_treasure_mana_is_undecidable() {
        let state = empty_state();
        let event = GameEvent::SpellCast {
            entity: EntityId(5),
            controller: PlayerId::new(0),
            card: CardId::new(1),
        };
        let outcome = TriggerCondition::CastWithTreasureMana.evaluate(&ctx_for(&event, &state), None);
        assert!(matches!(outcome, ConditionOutcome::Undecidable(_)));
    }

    #[test]
    fn test_kleene_combinators() {
        let state = empty_state();
        let event = GameEvent::TurnStarted { turn: 1, active: PlayerId::new(0) };
        let ctx = ctx_for(&event, &state);

        // Fails short-circuits Undecidable in All.
        let all = TriggerCondition::All(vec![
            TriggerCondition::CastWithTreasureMana,
            TriggerCondition::Never,
        ]);
        assert_eq!(all.evaluate(&ctx, None), ConditionOutcome::Fails);

        // Holds + Undecidable in All stays Undecidable.
        let all = TriggerCondition::All(vec![
            TriggerCondition::Always,
            TriggerCondition::CastWithTreasureMana,
        ]);
        assert!(matches!(all.evaluate(&ctx, None), ConditionOutcome::Undecidable(_)));

        // Holds short-circuits Undecidable in Any.
        let any = TriggerCondition::Any(vec![
            TriggerCondition::CastWithTreasureMana,
            TriggerCondition::Always,
        ]);
        assert_eq!(any.evaluate(&ctx, None), ConditionOutcome::Holds);

        // Not preserves Undecidable.
        let not = TriggerCondition::Not(Box::new(TriggerCondition::CastWithTreasureMana));
        assert!(matches!(not.evaluate(&ctx, None), ConditionOutcome::Undecidable(_)));
    }

    #[test]
    fn test_custom_without_evaluator_is_undecidable() {
        let state = empty_state();
        let event = GameEvent::TurnStarted { turn: 1, active: PlayerId::new(0) };
        let ctx = ctx_for(&event, &state);

        let condition = TriggerCondition::Custom("morbid".to_string());
        assert!(matches!(condition.evaluate(&ctx, None), ConditionOutcome::Undecidable(_)));

        let eval = |name: &str, _ctx: &EventContext<'_>| (name == "morbid").then_some(true);
        assert!(condition.evaluate(&ctx, Some(&eval)).holds());
    }
}
