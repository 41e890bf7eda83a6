//! Player actions and the append-only event log.
//!
//! An [`Action`] is a player command submitted to a session; the session
//! validates it completely before mutating anything. Accepted actions and
//! the events they produce are appended to the [`EventLog`], which backs
//! replay and incremental client sync.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::effects::TargetRef;
use crate::queue::{Response, StepId};
use crate::triggers::GameEvent;
use crate::turn::AutoPassPrefs;

use super::entity::EntityId;
use super::player::PlayerId;

/// A player command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Play a land from hand (main phase, empty stack, one per turn).
    PlayLand { card: EntityId },

    /// Cast a spell from hand or a commander from the command zone.
    ///
    /// `targets` carries one list per targeted clause, in clause order; `x`
    /// binds the X of an `{X}` cost. Either may instead be supplied later
    /// through resolution steps.
    CastSpell {
        card: EntityId,
        targets: Vec<Vec<TargetRef>>,
        x: Option<i64>,
    },

    /// Activate an ability of a battlefield permanent by ability index.
    ActivateAbility {
        source: EntityId,
        ability: usize,
        targets: Vec<TargetRef>,
    },

    /// Pass priority.
    PassPriority,

    /// Active-player shortcut: pass through the rest of the current step
    /// when every other player has auto-pass enabled and nothing is
    /// pending.
    AdvanceStep,

    /// Answer a pending resolution step. `step` defaults to the player's
    /// front-most step.
    SubmitResponse {
        step: Option<StepId>,
        response: Response,
    },

    /// Decline an optional resolution step.
    CancelStep { step: StepId },

    /// Replace the player's auto-pass preferences.
    SetAutoPass { prefs: AutoPassPrefs },

    /// Concede the game.
    Concede,
}

/// An accepted action, as recorded in the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Position in the game's action sequence, starting at 0.
    pub seq: u64,
    pub player: PlayerId,
    pub action: Action,
}

/// Append-only log of accepted actions and emitted events.
///
/// Backed by persistent vectors so snapshots share structure with the live
/// log instead of deep-copying it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vector<GameEvent>,
    actions: Vector<ActionRecord>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn record_event(&mut self, event: GameEvent) {
        self.events.push_back(event);
    }

    /// Append an accepted action, assigning its sequence number.
    pub fn record_action(&mut self, player: PlayerId, action: Action) -> u64 {
        let seq = self.actions.len() as u64;
        self.actions.push_back(ActionRecord { seq, player, action });
        seq
    }

    /// Number of events logged so far.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Number of accepted actions.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Events at or after `from`, for incremental client sync.
    pub fn events_since(&self, from: usize) -> impl Iterator<Item = &GameEvent> {
        self.events.iter().skip(from)
    }

    /// Iterate all events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    /// Iterate all accepted actions, oldest first.
    pub fn actions(&self) -> impl Iterator<Item = &ActionRecord> {
        self.actions.iter()
    }
}
