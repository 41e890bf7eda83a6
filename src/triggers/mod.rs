//! The triggered-ability engine.
//!
//! Two matching pipelines feed the stack:
//!
//! 1. **Event-based**: typed [`GameEvent`]s are matched against the
//!    structured [`TriggerCondition`]s registered for battlefield
//!    permanents.
//! 2. **Text-pattern fallback** ([`patterns`]): oracle text is scanned for
//!    well-known phrasings when a card has no structured descriptors;
//!    matches are marked lower confidence.
//!
//! All matches for one event are batched and ordered by APNAP before being
//! converted to stack items. Conditions evaluate to a tri-state
//! [`ConditionOutcome`]; a condition the engine cannot decide is surfaced,
//! never defaulted.

pub mod event;
pub mod condition;
pub mod registry;
pub mod patterns;

pub use event::GameEvent;
pub use condition::{ConditionOutcome, EventContext, TriggerCondition};
pub use registry::{
    order_apnap, PendingTrigger, RegisteredTrigger, TriggerConfidence,
    TriggerRegistry, UndecidedTrigger,
};
pub use patterns::scan_oracle_text;
