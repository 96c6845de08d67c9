pub mod events;
pub mod ids;
pub mod life;
pub mod phase;
pub mod session;
pub mod token;
pub mod turn;
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub mod wasm_api;

#[cfg(test)]
mod tests;

pub use events::{LifeChanged, ListenerId, Listeners, PhaseChanged, TokenChanged, TurnChanged};
pub use ids::{CardId, PlayerId};
pub use life::{LifeConfig, LifeError, LifeManager, LifeSnapshot};
pub use phase::{ActionKind, Phase, PhaseActions};
#[cfg(feature = "serialization")]
pub use session::SnapshotError;
pub use session::{GameSession, SessionConfig, SessionSnapshot};
pub use token::{
    DEFINITIONS, TokenConfig, TokenDefinition, TokenError, TokenKind, TokenManager, TokenSnapshot,
};
pub use turn::{TurnConfig, TurnError, TurnManager, TurnSnapshot, next_phase};
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub use wasm_api::WasmBoard;
