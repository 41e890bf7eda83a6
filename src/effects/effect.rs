//! Effect descriptors.
//!
//! Tagged variants describing what a resolving spell clause or ability
//! does. The single applier lives in [`super::apply`]; nothing else
//! interprets these.

use serde::{Deserialize, Serialize};

use crate::cards::Color;
use crate::zones::CounterKind;

/// A numeric amount, fixed or bound to the spell's X.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Amount {
    Fixed(i64),
    X,
}

impl Amount {
    /// Resolve against the bound X (0 when no X was bound).
    #[must_use]
    pub fn resolve(self, x: Option<i64>) -> i64 {
        match self {
            Amount::Fixed(n) => n,
            Amount::X => x.unwrap_or(0),
        }
    }
}

/// Which players a player-directed effect applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerGroup {
    /// The controller of the resolving spell or ability.
    Controller,
    /// Every opponent of the controller, in APNAP order.
    EachOpponent,
    /// The clause's chosen player targets.
    Target,
}

/// One atomic effect.
///
/// `...Target` variants apply to each of the resolving clause's targets;
/// player-group variants resolve their audience through [`PlayerGroup`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpellEffect {
    // === Target-directed ===
    /// Deal damage to each target (marked damage on creatures, life loss
    /// for players).
    DealDamage { amount: Amount },
    /// Destroy each targeted permanent.
    DestroyTarget,
    /// Exile each targeted permanent.
    ExileTarget,
    /// Tap each targeted permanent.
    TapTarget,
    /// Untap each targeted permanent.
    UntapTarget,
    /// Return each targeted permanent to its owner's hand.
    ReturnTargetToHand,
    /// Counter each targeted spell (moved to owner's graveyard, no refund).
    CounterTarget,
    /// +P/+T until end of turn on each targeted creature.
    PumpTarget { power: i64, toughness: i64 },
    /// Put counters on each targeted permanent.
    AddCountersToTarget { kind: CounterKind, count: u32 },

    // === Player-directed ===
    DrawCards { who: PlayerGroup, count: Amount },
    GainLife { who: PlayerGroup, amount: Amount },
    LoseLife { who: PlayerGroup, amount: Amount },
    /// Affected players choose and discard; drives a resolution step.
    DiscardCards { who: PlayerGroup, count: u32 },

    // === Controller-directed ===
    /// Create `count` token copies of an inline definition.
    CreateToken {
        name: String,
        type_line: String,
        power: Option<i64>,
        toughness: Option<i64>,
        count: u32,
    },
    /// Add mana to the controller's pool. `None` color means the
    /// controller chooses via a resolution step.
    AddMana { color: Option<Color>, count: u32 },
    /// Return cards from the controller's graveyard to hand; drives a
    /// resolution step for the selection.
    ReturnFromOwnGraveyard { count: u32 },
}

impl SpellEffect {
    /// Convenience: "deal N damage to any target" payload.
    #[must_use]
    pub fn damage(amount: i64) -> Self {
        SpellEffect::DealDamage { amount: Amount::Fixed(amount) }
    }

    /// Convenience: controller draws `count` cards.
    #[must_use]
    pub fn draw(count: i64) -> Self {
        SpellEffect::DrawCards {
            who: PlayerGroup::Controller,
            count: Amount::Fixed(count),
        }
    }

    /// Convenience: controller gains `amount` life.
    #[must_use]
    pub fn gain_life(amount: i64) -> Self {
        SpellEffect::GainLife {
            who: PlayerGroup::Controller,
            amount: Amount::Fixed(amount),
        }
    }

    /// Whether this effect needs the clause's targets to do anything.
    #[must_use]
    pub fn is_target_directed(&self) -> bool {
        matches!(
            self,
            SpellEffect::DealDamage { .. }
                | SpellEffect::DestroyTarget
                | SpellEffect::ExileTarget
                | SpellEffect::TapTarget
                | SpellEffect::UntapTarget
                | SpellEffect::ReturnTargetToHand
                | SpellEffect::CounterTarget
                | SpellEffect::PumpTarget { .. }
                | SpellEffect::AddCountersToTarget { .. }
        ) || matches!(
            self,
            SpellEffect::DrawCards { who: PlayerGroup::Target, .. }
                | SpellEffect::GainLife { who: PlayerGroup::Target, .. }
                | SpellEffect::LoseLife { who: PlayerGroup::Target, .. }
                | SpellEffect::DiscardCards { who: PlayerGroup::Target, .. }
        )
    }
}
