//! Player identification and per-player data storage.
//!
//! ## PlayerId
//!
//! Type-safe player identifier. Commander pods are usually 2-4 players but
//! the engine supports up to 255.
//!
//! ## PlayerMap
//!
//! Per-player storage backed by `Vec` for O(1) access, indexable by
//! `PlayerId`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Player identifier. Indices are 0-based in seating order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw seating index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over all player IDs in seating order.
    pub fn all(player_count: usize) -> impl Iterator<Item = PlayerId> {
        (0..player_count as u8).map(PlayerId)
    }

    /// Next player in turn order, wrapping around the table.
    #[must_use]
    pub fn next_in_order(self, player_count: usize) -> PlayerId {
        PlayerId(((self.index() + 1) % player_count) as u8)
    }

    /// Distance from `from` to `self` going clockwise around the table.
    ///
    /// Used for APNAP ordering: the active player is distance 0, the player
    /// to their left distance 1, and so on.
    #[must_use]
    pub fn seats_after(self, from: PlayerId, player_count: usize) -> usize {
        (self.index() + player_count - from.index()) % player_count
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// Per-player data storage with O(1) access.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    data: Vec<T>,
}

impl<T> PlayerMap<T> {
    /// Create a new map with values from a factory function.
    pub fn new(player_count: usize, factory: impl Fn(PlayerId) -> T) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= 255, "At most 255 players supported");

        let data = (0..player_count as u8)
            .map(|i| factory(PlayerId(i)))
            .collect();

        Self { data }
    }

    /// Create a new map with all entries set to the same value.
    pub fn with_value(player_count: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(player_count, |_| value.clone())
    }

    /// Number of players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; a map is created with at least one player.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a value by player, or `None` if out of range.
    #[must_use]
    pub fn get(&self, player: PlayerId) -> Option<&T> {
        self.data.get(player.index())
    }

    /// Get a mutable value by player, or `None` if out of range.
    pub fn get_mut(&mut self, player: PlayerId) -> Option<&mut T> {
        self.data.get_mut(player.index())
    }

    /// Iterate over `(PlayerId, &T)` pairs in seating order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }

    /// Iterate over `(PlayerId, &mut T)` pairs in seating order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PlayerId, &mut T)> {
        self.data
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }
}

impl<T> Index<PlayerId> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &T {
        &self.data[player.index()]
    }
}

impl<T> IndexMut<PlayerId> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.data[player.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_in_order_wraps() {
        assert_eq!(PlayerId::new(0).next_in_order(4), PlayerId::new(1));
        assert_eq!(PlayerId::new(3).next_in_order(4), PlayerId::new(0));
    }

    #[test]
    fn test_seats_after() {
        let active = PlayerId::new(1);
        assert_eq!(active.seats_after(active, 4), 0);
        assert_eq!(PlayerId::new(2).seats_after(active, 4), 1);
        assert_eq!(PlayerId::new(0).seats_after(active, 4), 3);
    }

    #[test]
    fn test_player_map_index() {
        let mut life: PlayerMap<i64> = PlayerMap::with_value(4, 40);
        assert_eq!(life[PlayerId::new(2)], 40);
        life[PlayerId::new(2)] = 21;
        assert_eq!(life[PlayerId::new(2)], 21);
    }

    #[test]
    fn test_player_map_iter_order() {
        let map = PlayerMap::new(3, |p| p.index() as i64);
        let collected: Vec<_> = map.iter().map(|(p, v)| (p.0, *v)).collect();
        assert_eq!(collected, vec![(0, 0), (1, 1), (2, 2)]);
    }
}
