//! Effect descriptors, targeting, and the applier.
//!
//! Effects are tagged variants with exactly one applier
//! ([`apply::apply_effects`]); target requirements are tagged specs with
//! exactly one legality checker, used both at cast time and again at
//! resolution time.

pub mod targeting;
pub mod effect;
pub mod apply;

pub use targeting::{legal_targets, validate_targets, TargetFilter, TargetKind, TargetRef, TargetSpec};
pub use effect::{Amount, PlayerGroup, SpellEffect};
pub use apply::{apply_effects, EffectContext};
