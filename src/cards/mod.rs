//! Card data: immutable definitions, mana, and per-game instances.
//!
//! Definitions come from an external card database and are never mutated by
//! the engine. Instances are per-game objects carrying owner, controller,
//! and a zone tag.

pub mod mana;
pub mod definition;
pub mod instance;
pub mod registry;

pub use mana::{Color, ManaCost, ManaPool};
pub use definition::{
    ActivatedAbilityDef, ActivationCost, CardDefinition, CardId, CardType,
    SpellClause, Supertype, TriggeredAbilityDef, TypeLine,
};
pub use instance::CardInstance;
pub use registry::CardRegistry;
