//! Typed error surface.
//!
//! Every rejection leaves the game untouched: callers validate completely
//! before mutating, so an `Err` from any public operation means zero state
//! change. Each kind carries a stable `code()` for client display; message
//! text may change between versions, codes may not.

use thiserror::Error;

use super::player::PlayerId;

/// An error rejecting a player command or resolution response.
///
/// Nothing here is fatal to the process: the offending input is dropped and
/// the game remains resumable.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    /// The action is not legal right now (no priority, out of turn,
    /// per-turn limit exceeded, wrong timing).
    #[error("illegal action: {reason}")]
    IllegalAction { reason: String },

    /// A resolution response was malformed or out of range (wrong count,
    /// wrong variant, id outside the legal set).
    #[error("invalid selection: {reason}")]
    InvalidSelection { reason: String },

    /// A chosen target is not in the legal-target set, or is no longer
    /// legal at resolution time.
    #[error("invalid target: {reason}")]
    InvalidTarget { reason: String },

    /// The player or game is unknown to the registry, or the player does
    /// not belong to this game.
    #[error("not in game: {reason}")]
    NotInGame { reason: String },

    /// A rule condition cannot be evaluated with currently available
    /// context (e.g. mana-payment provenance is not tracked).
    ///
    /// No gameplay path raises this today: undecidable trigger conditions
    /// are recorded in `GameState::undecided` and surfaced in views
    /// instead. Reserved for operations that cannot proceed without the
    /// answer.
    #[error("cannot decide: {clause}")]
    StateUndecidable { clause: String },
}

impl GameError {
    /// Stable machine-readable code for client display.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            GameError::IllegalAction { .. } => "illegal_action",
            GameError::InvalidSelection { .. } => "invalid_selection",
            GameError::InvalidTarget { .. } => "invalid_target",
            GameError::NotInGame { .. } => "not_in_game",
            GameError::StateUndecidable { .. } => "state_undecidable",
        }
    }

    /// Shorthand for an illegal-action rejection.
    pub fn illegal(reason: impl Into<String>) -> Self {
        GameError::IllegalAction { reason: reason.into() }
    }

    /// Shorthand for an invalid-selection rejection.
    pub fn selection(reason: impl Into<String>) -> Self {
        GameError::InvalidSelection { reason: reason.into() }
    }

    /// Shorthand for an invalid-target rejection.
    pub fn target(reason: impl Into<String>) -> Self {
        GameError::InvalidTarget { reason: reason.into() }
    }

    /// Shorthand for an unknown-player rejection.
    pub fn not_in_game(player: PlayerId) -> Self {
        GameError::NotInGame {
            reason: format!("{player} is not seated in this game"),
        }
    }

    /// Shorthand for an undecidable rule condition.
    pub fn undecidable(clause: impl Into<String>) -> Self {
        GameError::StateUndecidable { clause: clause.into() }
    }
}
