//! Turn structure and the priority system.

pub mod step;
pub mod priority;

pub use step::Step;
pub use priority::{AutoPassPrefs, PrioritySystem};

use serde::{Deserialize, Serialize};

use crate::core::player::{PlayerId, PlayerMap};

/// Per-turn bookkeeping: whose turn it is, which step, and the counters
/// trigger conditions and limits read ("first draw this turn", one land
/// per turn).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    /// Turn number, starting at 1.
    pub turn_number: u32,
    /// The player whose turn it is.
    pub active: PlayerId,
    pub step: Step,
    /// Lands played by the active player this turn.
    pub lands_played: u32,
    /// Cards drawn per player this turn.
    pub draws_this_turn: PlayerMap<u32>,
}

impl TurnState {
    /// State for the first turn of a game.
    #[must_use]
    pub fn new(player_count: usize, starting_player: PlayerId) -> Self {
        Self {
            turn_number: 1,
            active: starting_player,
            step: Step::Untap,
            lands_played: 0,
            draws_this_turn: PlayerMap::with_value(player_count, 0),
        }
    }

    /// Begin the next player's turn.
    pub fn begin_turn(&mut self, next_active: PlayerId) {
        self.turn_number += 1;
        self.active = next_active;
        self.step = Step::Untap;
        self.lands_played = 0;
        for (_, draws) in self.draws_this_turn.iter_mut() {
            *draws = 0;
        }
    }

    /// Whether the current step is a main phase of the given player's turn.
    #[must_use]
    pub fn is_main_phase_of(&self, player: PlayerId) -> bool {
        self.active == player && matches!(self.step, Step::Main1 | Step::Main2)
    }
}
