//! Game lifecycle: session, registry, and per-viewer projections.

pub mod session;
pub mod registry;
pub mod view;

pub use session::{GameSession, GameSetup, PlayerSetup};
pub use registry::{GameId, GameRegistry};
pub use view::{PlayerView, StackItemView};
