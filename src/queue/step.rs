//! Resolution steps: typed pending decisions with embedded validators.
//!
//! One type, one validator, one applier: every [`StepKind`] variant is
//! validated here against the live game state, and applied by exactly one
//! arm of the session's step applier. Validation never mutates; a response
//! that fails any check leaves the step queued and the game untouched.

use serde::{Deserialize, Serialize};

use crate::cards::Color;
use crate::core::entity::EntityId;
use crate::core::error::GameError;
use crate::core::player::PlayerId;
use crate::core::state::GameState;
use crate::effects::{validate_targets, SpellEffect, TargetRef, TargetSpec};
use crate::stack::StackItemId;
use crate::zones::Zone;

use super::StepId;

/// What chosen targets will be bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetPurpose {
    /// Finish the parked cast (targets for the spell being cast).
    FinishCast,
    /// Bind targets of a triggered ability already on the stack.
    BindAbility(StackItemId),
}

/// Why a discard is being requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscardReason {
    /// Cleanup-step maximum hand size.
    CleanupLimit,
    /// A resolved effect.
    Effect,
}

/// A typed pending decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    /// Bind the X of the parked cast. `max` is the largest payable X,
    /// computed when the step is created.
    ChooseX { min: i64, max: i64 },

    /// Choose targets.
    ChooseTargets {
        spec: TargetSpec,
        purpose: TargetPurpose,
        /// Source object, for `NotSource` filters.
        source: Option<EntityId>,
    },

    /// Choose a color for "add one mana of any color", `count` times that
    /// color.
    ChooseManaColor { count: u32 },

    /// Discard exactly `count` cards from hand. `count` is already clamped
    /// to hand size at creation.
    Discard { count: usize, reason: DiscardReason },

    /// Choose `count` cards from your graveyard to return to hand.
    ChooseFromGraveyard { count: usize },

    /// Choose `count` permanents from `legal` to tap (or untap).
    TapChoice { legal: Vec<EntityId>, count: usize, tap: bool },

    /// Put `count` cards from hand on the bottom of your library, in the
    /// order given.
    HandToBottom { count: usize },

    /// Legend rule: keep one of `candidates`, the rest go to graveyards.
    LegendChoice { name: String, candidates: Vec<EntityId> },

    /// Confirm or decline a "you may" ability at resolution.
    MayAbility {
        description: String,
        source: EntityId,
        source_name: String,
        effects: Vec<SpellEffect>,
        targets: Vec<TargetRef>,
    },
}

/// A player response to a resolution step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Number(i64),
    Targets(Vec<TargetRef>),
    Cards(Vec<EntityId>),
    Color(Color),
    Confirm(bool),
}

/// One pending decision for one player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionStep {
    pub id: StepId,
    pub player: PlayerId,
    /// Mandatory steps block the player's other actions until answered.
    pub mandatory: bool,
    pub kind: StepKind,
}

impl StepKind {
    /// Prompt text shown to the deciding player.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            StepKind::ChooseX { min, max } => format!("choose X ({min} to {max})"),
            StepKind::ChooseTargets { spec, .. } => {
                format!("choose {} target(s)", spec.count)
            }
            StepKind::ChooseManaColor { count } => format!("choose a color for {count} mana"),
            StepKind::Discard { count, .. } => format!("discard {count} card(s)"),
            StepKind::ChooseFromGraveyard { count } => {
                format!("return {count} card(s) from your graveyard to your hand")
            }
            StepKind::TapChoice { count, tap: true, .. } => format!("tap {count} permanent(s)"),
            StepKind::TapChoice { count, tap: false, .. } => {
                format!("untap {count} permanent(s)")
            }
            StepKind::HandToBottom { count } => {
                format!("put {count} card(s) on the bottom of your library")
            }
            StepKind::LegendChoice { name, .. } => format!("choose which {name} to keep"),
            StepKind::MayAbility { description, source_name, .. } => {
                format!("{source_name}: you may {description}")
            }
        }
    }
}

impl ResolutionStep {
    /// Validate a response without mutating anything.
    ///
    /// Checks variant shape, counts, id membership (hand, graveyard,
    /// candidate list), duplicates, and target legality against the live
    /// state.
    pub fn validate(&self, state: &GameState, response: &Response) -> Result<(), GameError> {
        match (&self.kind, response) {
            (StepKind::ChooseX { min, max }, Response::Number(n)) => {
                if n < min || n > max {
                    return Err(GameError::selection(format!(
                        "X must be between {min} and {max}, got {n}"
                    )));
                }
                Ok(())
            }

            (StepKind::ChooseTargets { spec, source, .. }, Response::Targets(targets)) => {
                validate_targets(state, spec, self.player, *source, targets)
            }

            (StepKind::ChooseManaColor { .. }, Response::Color(_)) => Ok(()),

            (StepKind::Discard { count, .. }, Response::Cards(cards)) => {
                check_distinct_in_zone(state, cards, *count, Zone::Hand(self.player), "hand")
            }

            (StepKind::ChooseFromGraveyard { count }, Response::Cards(cards)) => {
                check_distinct_in_zone(
                    state,
                    cards,
                    *count,
                    Zone::Graveyard(self.player),
                    "graveyard",
                )
            }

            (StepKind::TapChoice { legal, count, .. }, Response::Cards(cards)) => {
                if cards.len() != *count {
                    return Err(GameError::selection(format!(
                        "expected {count} permanent(s), got {}",
                        cards.len()
                    )));
                }
                for (i, card) in cards.iter().enumerate() {
                    if cards[..i].contains(card) {
                        return Err(GameError::selection("duplicate permanent"));
                    }
                    if !legal.contains(card) {
                        return Err(GameError::selection(format!("{card} is not a legal choice")));
                    }
                }
                Ok(())
            }

            (StepKind::HandToBottom { count }, Response::Cards(cards)) => {
                check_distinct_in_zone(state, cards, *count, Zone::Hand(self.player), "hand")
            }

            (StepKind::LegendChoice { candidates, .. }, Response::Cards(cards)) => {
                let [kept] = cards.as_slice() else {
                    return Err(GameError::selection("choose exactly one permanent to keep"));
                };
                if !candidates.contains(kept) {
                    return Err(GameError::selection(format!("{kept} is not one of the duplicates")));
                }
                Ok(())
            }

            (StepKind::MayAbility { .. }, Response::Confirm(_)) => Ok(()),

            // Variant mismatch: the response shape does not fit the step.
            (kind, response) => Err(GameError::selection(format!(
                "response {response:?} does not answer {}",
                kind_name(kind)
            ))),
        }
    }
}

fn kind_name(kind: &StepKind) -> &'static str {
    match kind {
        StepKind::ChooseX { .. } => "an X-value choice",
        StepKind::ChooseTargets { .. } => "a target selection",
        StepKind::ChooseManaColor { .. } => "a mana-color choice",
        StepKind::Discard { .. } => "a discard selection",
        StepKind::ChooseFromGraveyard { .. } => "a graveyard selection",
        StepKind::TapChoice { .. } => "a tap choice",
        StepKind::HandToBottom { .. } => "a hand-to-bottom selection",
        StepKind::LegendChoice { .. } => "a legend-rule choice",
        StepKind::MayAbility { .. } => "a may-ability confirmation",
    }
}

fn check_distinct_in_zone(
    state: &GameState,
    cards: &[EntityId],
    count: usize,
    zone: Zone,
    zone_name: &str,
) -> Result<(), GameError> {
    if cards.len() != count {
        return Err(GameError::selection(format!(
            "expected {count} card(s), got {}",
            cards.len()
        )));
    }
    for (i, card) in cards.iter().enumerate() {
        if cards[..i].contains(card) {
            return Err(GameError::selection("duplicate card"));
        }
        if !state.zones.is_in(*card, zone) {
            return Err(GameError::selection(format!("{card} is not in your {zone_name}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardRegistry;

    fn state() -> GameState {
        GameState::new(2, 1, CardRegistry::new())
    }

    fn step(kind: StepKind) -> ResolutionStep {
        ResolutionStep {
            id: StepId::new(0),
            player: PlayerId::new(0),
            mandatory: true,
            kind,
        }
    }

    #[test]
    fn test_choose_x_bounds() {
        let state = state();
        let step = step(StepKind::ChooseX { min: 0, max: 4 });

        assert!(step.validate(&state, &Response::Number(0)).is_ok());
        assert!(step.validate(&state, &Response::Number(4)).is_ok());

        let err = step.validate(&state, &Response::Number(5)).unwrap_err();
        assert_eq!(err.code(), "invalid_selection");
    }

    #[test]
    fn test_variant_mismatch_is_invalid_selection() {
        let state = state();
        let step = step(StepKind::ChooseX { min: 0, max: 4 });

        let err = step.validate(&state, &Response::Confirm(true)).unwrap_err();
        assert_eq!(err.code(), "invalid_selection");
    }

    #[test]
    fn test_discard_requires_cards_from_hand() {
        let state = state();
        let step = step(StepKind::Discard { count: 1, reason: DiscardReason::Effect });

        // Wrong count.
        let err = step.validate(&state, &Response::Cards(vec![])).unwrap_err();
        assert_eq!(err.code(), "invalid_selection");

        // Card not in hand (no cards exist in this bare state).
        let err = step
            .validate(&state, &Response::Cards(vec![EntityId(42)]))
            .unwrap_err();
        assert_eq!(err.code(), "invalid_selection");
    }

    #[test]
    fn test_legend_choice_membership() {
        let state = state();
        let step = step(StepKind::LegendChoice {
            name: "Urza".to_string(),
            candidates: vec![EntityId(10), EntityId(11)],
        });

        assert!(step.validate(&state, &Response::Cards(vec![EntityId(10)])).is_ok());
        assert!(step.validate(&state, &Response::Cards(vec![EntityId(9)])).is_err());
        assert!(step
            .validate(&state, &Response::Cards(vec![EntityId(10), EntityId(11)]))
            .is_err());
    }

    #[test]
    fn test_tap_choice_duplicates_rejected() {
        let state = state();
        let step = step(StepKind::TapChoice {
            legal: vec![EntityId(10), EntityId(11)],
            count: 2,
            tap: true,
        });

        let err = step
            .validate(&state, &Response::Cards(vec![EntityId(10), EntityId(10)]))
            .unwrap_err();
        assert_eq!(err.code(), "invalid_selection");
    }
}
