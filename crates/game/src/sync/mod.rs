//! Remote store contract and the glue between it and the simulation.
//!
//! The store is a realtime JSON tree addressed by `/`-separated paths
//! (`players/<id>`, `particles/<id>`). Subscriptions deliver [`StoreEvent`]s
//! into an unbounded channel owned by the subscriber; every subscription first
//! replays the current state, the way realtime databases do.

mod bridge;
mod memory;

pub use bridge::SyncBridge;
pub use memory::{MemoryConnection, MemoryStore};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// Channel a subscription delivers into.
pub type EventSender = mpsc::UnboundedSender<StoreEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<StoreEvent>;

/// Store failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Connection to the store is closed")]
    Disconnected,

    #[error("Invalid store path '{0}'")]
    InvalidPath(String),

    #[error("Sign-in rejected ({code}): {message}")]
    AuthRejected { code: String, message: String },
}

/// A change observed on a subscribed path.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreEvent {
    /// The subscribed path.
    pub path: String,
    pub change: Change,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    ChildAdded { key: String, value: Value },
    ChildRemoved { key: String, value: Value },
    /// Whole value at the path; `None` once it has been removed.
    ValueChanged(Option<Value>),
}

/// Subscription flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listen {
    ChildAdded,
    ChildRemoved,
    Value,
}

/// A connection to a realtime store.
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// Sign in and return the session id.
    async fn sign_in_anonymously(&self) -> Result<String, SyncError>;

    async fn set(&self, path: &str, value: Value) -> Result<(), SyncError>;

    async fn remove(&self, path: &str) -> Result<(), SyncError>;

    async fn subscribe(&self, path: &str, listen: Listen, tx: EventSender) -> Result<(), SyncError>;

    /// Remove `path` when this connection goes away.
    async fn on_disconnect_remove(&self, path: &str) -> Result<(), SyncError>;

    async fn read_once(&self, path: &str) -> Result<Option<Value>, SyncError>;

    /// Close the connection, running its on-disconnect removals.
    async fn disconnect(&self);

    async fn on_child_added(&self, path: &str, tx: EventSender) -> Result<(), SyncError> {
        self.subscribe(path, Listen::ChildAdded, tx).await
    }

    async fn on_child_removed(&self, path: &str, tx: EventSender) -> Result<(), SyncError> {
        self.subscribe(path, Listen::ChildRemoved, tx).await
    }

    async fn on_value_changed(&self, path: &str, tx: EventSender) -> Result<(), SyncError> {
        self.subscribe(path, Listen::Value, tx).await
    }
}

/// Split a path into its segments, rejecting empty ones.
pub(crate) fn segments(path: &str) -> Result<Vec<&str>, SyncError> {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.iter().any(|s| s.is_empty()) {
        return Err(SyncError::InvalidPath(path.to_string()));
    }
    Ok(parts)
}
