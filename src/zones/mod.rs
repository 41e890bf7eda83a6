//! Zones and battlefield permanents.
//!
//! Canonical containers for every card in the game, plus the mutable state
//! of battlefield permanents. A card instance is in exactly one zone at a
//! time; every transition is an explicit move through
//! [`crate::core::GameState::move_card`].

pub mod manager;
pub mod permanent;

pub use manager::{Zone, ZoneManager, ZonePosition};
pub use permanent::{CounterKind, Permanent};
