//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while parsing colors or sync records.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Unknown color name: {0:?}")]
    UnknownColorName(String),

    #[error("Invalid hex color {0:?} (expected #rrggbb)")]
    InvalidHexFormat(String),

    #[error("Invalid sync record: {0}")]
    InvalidRecord(#[from] serde_json::Error),
}
