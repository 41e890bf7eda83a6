//! Core engine types: entities, players, errors, actions, state, RNG.
//!
//! These are the building blocks every other module leans on. Nothing in
//! here interprets card text or rules; that lives in `triggers`, `effects`,
//! and `rules`.

pub mod entity;
pub mod player;
pub mod error;
pub mod rng;
pub mod action;
pub mod state;

pub use entity::EntityId;
pub use player::{PlayerId, PlayerMap};
pub use error::GameError;
pub use rng::GameRng;
pub use action::{Action, ActionRecord, EventLog};
pub use state::{ContinuousEffect, GameState, LossReason, PendingCast, PlayerState};
