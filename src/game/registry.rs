//! A registry of concurrently running games.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::session::{GameSession, GameSetup};
use crate::core::GameError;

/// Opaque handle for one game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameId(pub u64);

impl GameId {
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Game({})", self.0)
    }
}

/// Owns every live [`GameSession`] and hands out handles to them.
#[derive(Clone, Debug, Default)]
pub struct GameRegistry {
    games: FxHashMap<GameId, GameSession>,
    next_id: u64,
}

impl GameRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a game and return its handle.
    pub fn create(&mut self, setup: GameSetup) -> Result<GameId, GameError> {
        let id = GameId::new(self.next_id);
        let session = GameSession::new(id, setup)?;
        self.next_id += 1;
        self.games.insert(id, session);
        Ok(id)
    }

    #[must_use]
    pub fn get(&self, id: GameId) -> Option<&GameSession> {
        self.games.get(&id)
    }

    pub fn get_mut(&mut self, id: GameId) -> Option<&mut GameSession> {
        self.games.get_mut(&id)
    }

    /// Drop a finished (or abandoned) game.
    pub fn remove(&mut self, id: GameId) -> Option<GameSession> {
        self.games.remove(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.games.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Handles of all live games.
    pub fn ids(&self) -> impl Iterator<Item = GameId> + '_ {
        self.games.keys().copied()
    }
}
