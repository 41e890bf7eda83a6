//! Typed game events.
//!
//! Every mutation that can matter to a trigger emits one of these. Events
//! carry last-known information (names, former controllers) so triggers
//! from departed sources still read correctly.

use serde::{Deserialize, Serialize};

use crate::cards::CardId;
use crate::core::entity::EntityId;
use crate::core::player::PlayerId;
use crate::core::state::LossReason;
use crate::effects::TargetRef;
use crate::turn::Step;

/// A game event, produced by mutations and consumed by the trigger engine
/// and the state-based action loop.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A new turn began.
    TurnStarted { turn: u32, active: PlayerId },

    /// A step began.
    StepStarted { step: Step, active: PlayerId },

    /// A player drew a card. `nth_this_turn` is 1 for the first draw.
    CardDrawn { player: PlayerId, nth_this_turn: u32 },

    /// A land entered the battlefield from a land play or an effect.
    LandPlayed { entity: EntityId, controller: PlayerId },

    /// A spell was cast (put on the stack, costs paid).
    SpellCast { entity: EntityId, controller: PlayerId, card: CardId },

    /// A spell was countered.
    SpellCountered { card: EntityId, controller: PlayerId },

    /// A permanent entered the battlefield.
    PermanentEntered { entity: EntityId, controller: PlayerId, card: CardId },

    /// A permanent left the battlefield for anywhere but a graveyard.
    PermanentLeft {
        entity: EntityId,
        former_controller: PlayerId,
        card: CardId,
        name: String,
    },

    /// A permanent went from the battlefield to a graveyard.
    PermanentDied {
        entity: EntityId,
        former_controller: PlayerId,
        card: CardId,
        name: String,
        was_creature: bool,
    },

    /// Damage was dealt to a permanent or player.
    DamageDealt { target: TargetRef, amount: i64, source: EntityId },

    /// A player's life total changed.
    LifeChanged { player: PlayerId, delta: i64 },

    /// A player lost the game.
    PlayerLost { player: PlayerId, reason: LossReason },
}

impl GameEvent {
    /// The acting/affected player, where the event has one. Used by
    /// controller-relative trigger filters.
    #[must_use]
    pub fn acting_player(&self) -> Option<PlayerId> {
        match self {
            GameEvent::TurnStarted { active, .. } | GameEvent::StepStarted { active, .. } => {
                Some(*active)
            }
            GameEvent::CardDrawn { player, .. }
            | GameEvent::LifeChanged { player, .. }
            | GameEvent::PlayerLost { player, .. } => Some(*player),
            GameEvent::LandPlayed { controller, .. }
            | GameEvent::SpellCast { controller, .. }
            | GameEvent::SpellCountered { controller, .. }
            | GameEvent::PermanentEntered { controller, .. } => Some(*controller),
            GameEvent::PermanentLeft { former_controller, .. }
            | GameEvent::PermanentDied { former_controller, .. } => Some(*former_controller),
            GameEvent::DamageDealt { .. } => None,
        }
    }

    /// The entity at the center of the event, where there is one.
    #[must_use]
    pub fn subject(&self) -> Option<EntityId> {
        match self {
            GameEvent::LandPlayed { entity, .. }
            | GameEvent::SpellCast { entity, .. }
            | GameEvent::PermanentEntered { entity, .. }
            | GameEvent::PermanentLeft { entity, .. }
            | GameEvent::PermanentDied { entity, .. } => Some(*entity),
            GameEvent::SpellCountered { card, .. } => Some(*card),
            GameEvent::DamageDealt { source, .. } => Some(*source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acting_player() {
        let event = GameEvent::CardDrawn { player: PlayerId::new(2), nth_this_turn: 1 };
        assert_eq!(event.acting_player(), Some(PlayerId::new(2)));

        let event = GameEvent::DamageDealt {
            target: TargetRef::Player(PlayerId::new(0)),
            amount: 3,
            source: EntityId(9),
        };
        assert_eq!(event.acting_player(), None);
    }

    #[test]
    fn test_subject() {
        let event = GameEvent::PermanentDied {
            entity: EntityId(12),
            former_controller: PlayerId::new(0),
            card: CardId::new(3),
            name: "Grizzly Bears".to_string(),
            was_creature: true,
        };
        assert_eq!(event.subject(), Some(EntityId(12)));
    }
}
