//! Rule enforcement that runs between player actions.

pub mod sba;

pub use sba::run_state_based_actions;
