//! The resolution queue: pending player decisions.
//!
//! A per-game, per-player FIFO of [`ResolutionStep`]s. The engine parks on
//! a non-empty queue instead of blocking a thread: further action for a
//! player is gated by their front-most mandatory step. A step leaves the
//! queue only after a fully valid response; an invalid response leaves the
//! step and all game state untouched.

pub mod step;

pub use step::{DiscardReason, Response, ResolutionStep, StepKind, TargetPurpose};

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core::player::{PlayerId, PlayerMap};

/// Unique identifier for a resolution step within one game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(pub u64);

impl StepId {
    /// Create a new step ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Step({})", self.0)
    }
}

/// Per-player FIFO queues of pending decisions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolutionQueue {
    queues: PlayerMap<VecDeque<ResolutionStep>>,
    next_id: u64,
}

impl ResolutionQueue {
    /// Create empty queues for `player_count` players.
    #[must_use]
    pub fn new(player_count: usize) -> Self {
        Self {
            queues: PlayerMap::new(player_count, |_| VecDeque::new()),
            next_id: 0,
        }
    }

    /// Enqueue a step for a player, returning its ID.
    pub fn enqueue(&mut self, player: PlayerId, mandatory: bool, kind: StepKind) -> StepId {
        let id = StepId::new(self.next_id);
        self.next_id += 1;
        self.queues[player].push_back(ResolutionStep { id, player, mandatory, kind });
        id
    }

    /// The front-most pending step for a player.
    #[must_use]
    pub fn front(&self, player: PlayerId) -> Option<&ResolutionStep> {
        self.queues[player].front()
    }

    /// Look up a step by ID anywhere in a player's queue.
    #[must_use]
    pub fn get(&self, player: PlayerId, id: StepId) -> Option<&ResolutionStep> {
        self.queues[player].iter().find(|s| s.id == id)
    }

    /// Remove a step by ID. Callers validate the response first; removal
    /// is the point of no return.
    pub fn take(&mut self, player: PlayerId, id: StepId) -> Option<ResolutionStep> {
        let queue = &mut self.queues[player];
        let idx = queue.iter().position(|s| s.id == id)?;
        queue.remove(idx)
    }

    /// Cancel a step without applying it (optional steps only; callers
    /// enforce that).
    pub fn cancel(&mut self, player: PlayerId, id: StepId) -> Option<ResolutionStep> {
        self.take(player, id)
    }

    /// Whether a player has any pending step.
    #[must_use]
    pub fn has_pending(&self, player: PlayerId) -> bool {
        !self.queues[player].is_empty()
    }

    /// Whether a player has a pending mandatory step.
    #[must_use]
    pub fn has_mandatory(&self, player: PlayerId) -> bool {
        self.queues[player].iter().any(|s| s.mandatory)
    }

    /// Whether any player has any pending step.
    #[must_use]
    pub fn any_pending(&self) -> bool {
        self.queues.iter().any(|(_, q)| !q.is_empty())
    }

    /// Number of steps pending for a player.
    #[must_use]
    pub fn len_for(&self, player: PlayerId) -> usize {
        self.queues[player].len()
    }

    /// Iterate a player's pending steps, front first.
    pub fn iter_for(&self, player: PlayerId) -> impl Iterator<Item = &ResolutionStep> {
        self.queues[player].iter()
    }
}
