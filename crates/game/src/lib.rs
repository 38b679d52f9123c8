//! Blob arena game core: simulation, reconciliation with a realtime store and
//! the session task the UI talks to.

pub mod collision;
pub mod config;
pub mod entity;
pub mod error;
pub mod game;
pub mod render;
pub mod session;
pub mod sync;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use error::GameError;
pub use game::{Game, LeaderboardEntry, SessionState, SimEvent, TickReport};
pub use render::{CommandList, DrawCommand, NullSurface, Surface};
pub use session::{spawn_session, GameHandle, SessionStatus};
pub use sync::{MemoryStore, RemoteStore, SyncBridge, SyncError};
pub use world::WorldBounds;
