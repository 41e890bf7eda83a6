//! # commander-engine
//!
//! Authoritative rules engine for Commander-format, multiplayer Magic: The
//! Gathering. The engine tracks shared mutable game state for several remote
//! players, enforces the turn/priority structure, resolves a LIFO spell and
//! ability stack, matches and orders triggered abilities, and drives a queue
//! of player-facing decisions that gate further play.
//!
//! ## Design Principles
//!
//! 1. **One game, one actor**: each [`game::GameSession`] owns all mutable
//!    state for one game. Mutations are serialized through `&mut self`;
//!    independent games share nothing.
//!
//! 2. **Validate before complete**: every player-facing command and every
//!    resolution-step response is fully validated before any state is
//!    touched. A rejected action leaves the game byte-identical.
//!
//! 3. **Derived, never stored**: effective power/toughness is computed at
//!    read time from base values, counters, and continuous effects.
//!
//! ## Modules
//!
//! - `core`: entity/player identifiers, errors, actions, event log, RNG
//! - `cards`: immutable card definitions, mana, per-game instances
//! - `zones`: zone containers and battlefield permanents
//! - `turn`: step sequence and the priority system
//! - `stack`: the LIFO spell/ability stack
//! - `triggers`: event matching, APNAP ordering, oracle-text fallback
//! - `queue`: pending player decisions (resolution steps)
//! - `effects`: effect descriptors, targeting, and the applier
//! - `rules`: the state-based action loop
//! - `game`: session, registry, and per-viewer projections

pub mod core;
pub mod cards;
pub mod zones;
pub mod turn;
pub mod stack;
pub mod triggers;
pub mod queue;
pub mod effects;
pub mod rules;
pub mod game;

// Re-export commonly used types
pub use crate::core::{
    Action, ActionRecord, EntityId, EventLog, GameError, GameRng, GameState,
    PlayerId, PlayerMap, PlayerState,
};

pub use crate::cards::{
    CardDefinition, CardId, CardInstance, CardRegistry, CardType, Color,
    ManaCost, ManaPool, Supertype, TypeLine,
};

pub use crate::zones::{CounterKind, Permanent, Zone, ZoneManager};

pub use crate::turn::{AutoPassPrefs, PrioritySystem, Step, TurnState};

pub use crate::stack::{GameStack, StackItem, StackItemId, StackItemKind};

pub use crate::triggers::{
    ConditionOutcome, GameEvent, PendingTrigger, TriggerCondition,
    TriggerConfidence, TriggerRegistry, UndecidedTrigger,
};

pub use crate::queue::{
    Response, ResolutionQueue, ResolutionStep, StepId, StepKind,
};

pub use crate::effects::{Amount, PlayerGroup, SpellEffect, TargetRef, TargetSpec};

pub use crate::game::{
    GameId, GameRegistry, GameSession, GameSetup, PlayerSetup, PlayerView,
    StackItemView,
};
