//! Game error types.

use crate::sync::SyncError;
use protocol::ProtocolError;
use thiserror::Error;

/// Errors reported to callers of the control surface.
///
/// Nothing here is fatal to the process: every variant leaves the game either
/// not started or unchanged.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Sign-in rejected ({code}): {message}")]
    RemoteAuthFailure { code: String, message: String },

    #[error("Remote store error: {0}")]
    Sync(#[from] SyncError),

    #[error("Tick rate must be at least 1 tick per second")]
    InvalidTickRate,

    #[error("A session is already running or finished")]
    NotIdle,

    #[error("The game session has shut down")]
    SessionClosed,
}
