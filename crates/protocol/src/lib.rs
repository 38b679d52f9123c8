//! Shared protocol crate for blob-arena.
//!
//! This crate contains:
//! - Vector helpers (named directions, zero-safe normalization)
//! - RGB color parsing and formatting
//! - Sync records mirrored through the realtime store

mod color;
mod error;
pub mod records;
pub mod vector;

pub use color::{clamp_channel, to_rgb_string, Color};
pub use error::ProtocolError;
pub use records::{EntityRecord, ParticleRecord};
pub use vector::Vector;
