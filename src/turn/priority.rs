//! The priority system.
//!
//! Tracks who may act, who has passed since the last mutation, and each
//! player's auto-pass preferences. The session decides what an all-pass
//! means (resolve the stack top, or advance the step); this module only
//! answers "has everyone passed in a row?".

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::core::player::{PlayerId, PlayerMap};

use super::step::Step;

/// A player's auto-pass configuration.
///
/// When enabled, the engine passes on the player's behalf in steps outside
/// their stop list, provided no triggers are pending and no resolution
/// step is waiting on anyone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoPassPrefs {
    pub enabled: bool,
    /// Steps the player always wants to hold priority in.
    pub stops: FxHashSet<Step>,
}

impl AutoPassPrefs {
    /// Prefs that stop in the given steps.
    #[must_use]
    pub fn stopping_at(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            enabled: true,
            stops: steps.into_iter().collect(),
        }
    }
}

/// Priority holder, passed-set, and auto-pass preferences.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrioritySystem {
    holder: PlayerId,
    passed: PlayerMap<bool>,
    pub prefs: PlayerMap<AutoPassPrefs>,
}

impl PrioritySystem {
    /// Create with priority held by `holder` and an empty passed-set.
    #[must_use]
    pub fn new(player_count: usize, holder: PlayerId) -> Self {
        Self {
            holder,
            passed: PlayerMap::with_value(player_count, false),
            prefs: PlayerMap::with_value(player_count, AutoPassPrefs::default()),
        }
    }

    /// Who currently holds priority.
    #[must_use]
    pub fn holder(&self) -> PlayerId {
        self.holder
    }

    /// Whether a player is in the passed-set.
    #[must_use]
    pub fn has_passed(&self, player: PlayerId) -> bool {
        self.passed[player]
    }

    /// Grant priority to `player` and clear the passed-set. Every mutating
    /// action routes through here, so any response window reopens fully.
    pub fn grant(&mut self, player: PlayerId) {
        self.holder = player;
        self.clear_passes();
    }

    /// Clear the passed-set without moving priority.
    pub fn clear_passes(&mut self) {
        for (_, passed) in self.passed.iter_mut() {
            *passed = false;
        }
    }

    /// Record that the holder passed and hand priority to the next player
    /// in `order` (alive players, turn order). Returns `true` if every
    /// player in `order` has now passed consecutively.
    ///
    /// The caller must have verified that `player` holds priority.
    pub fn record_pass(&mut self, player: PlayerId, order: &[PlayerId]) -> bool {
        debug_assert_eq!(player, self.holder);
        self.passed[player] = true;

        if order.iter().all(|&p| self.passed[p]) {
            return true;
        }

        // Hand priority to the next player in order who hasn't passed.
        let start = order.iter().position(|&p| p == player).unwrap_or(0);
        for offset in 1..=order.len() {
            let candidate = order[(start + offset) % order.len()];
            if !self.passed[candidate] {
                self.holder = candidate;
                break;
            }
        }
        false
    }

    /// Whether the holder's preferences allow an automatic pass right now.
    ///
    /// `waiting` covers both pending (unplaced) triggers and any open
    /// resolution step; the stop list applies only to non-active players —
    /// the active player never auto-passes, their turn is where decisions
    /// happen.
    #[must_use]
    pub fn would_auto_pass(&self, step: Step, active: PlayerId, waiting: bool) -> bool {
        if waiting {
            return false;
        }
        let prefs = &self.prefs[self.holder];
        if !prefs.enabled {
            return false;
        }
        if self.holder == active {
            return false;
        }
        !prefs.stops.contains(&step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(n: u8) -> Vec<PlayerId> {
        (0..n).map(PlayerId::new).collect()
    }

    #[test]
    fn test_pass_rotates_and_detects_all_passed() {
        let order = order(4);
        let mut prio = PrioritySystem::new(4, PlayerId::new(0));

        assert!(!prio.record_pass(PlayerId::new(0), &order));
        assert_eq!(prio.holder(), PlayerId::new(1));
        assert!(!prio.record_pass(PlayerId::new(1), &order));
        assert!(!prio.record_pass(PlayerId::new(2), &order));
        assert!(prio.record_pass(PlayerId::new(3), &order));
    }

    #[test]
    fn test_grant_resets_passes() {
        let order = order(2);
        let mut prio = PrioritySystem::new(2, PlayerId::new(0));
        prio.record_pass(PlayerId::new(0), &order);

        prio.grant(PlayerId::new(1));
        assert_eq!(prio.holder(), PlayerId::new(1));
        assert!(!prio.has_passed(PlayerId::new(0)));
    }

    #[test]
    fn test_pass_skips_players_already_passed() {
        // 3 players; P0 passes, P1 acts (grant), then P1 and P2 pass; the
        // round returns to P0.
        let order = order(3);
        let mut prio = PrioritySystem::new(3, PlayerId::new(0));
        prio.record_pass(PlayerId::new(0), &order);
        prio.grant(PlayerId::new(1));
        assert!(!prio.record_pass(PlayerId::new(1), &order));
        assert_eq!(prio.holder(), PlayerId::new(2));
        assert!(!prio.record_pass(PlayerId::new(2), &order));
        assert_eq!(prio.holder(), PlayerId::new(0));
        assert!(prio.record_pass(PlayerId::new(0), &order));
    }

    #[test]
    fn test_auto_pass_rules() {
        let mut prio = PrioritySystem::new(2, PlayerId::new(1));
        let active = PlayerId::new(0);

        // Disabled by default.
        assert!(!prio.would_auto_pass(Step::Upkeep, active, false));

        prio.prefs[PlayerId::new(1)] = AutoPassPrefs::stopping_at([Step::End]);
        assert!(prio.would_auto_pass(Step::Upkeep, active, false));
        // Stop list holds.
        assert!(!prio.would_auto_pass(Step::End, active, false));
        // Pending triggers / open steps always hold.
        assert!(!prio.would_auto_pass(Step::Upkeep, active, true));
        // The active player never auto-passes.
        assert!(!prio.would_auto_pass(Step::Upkeep, PlayerId::new(1), false));
    }
}
