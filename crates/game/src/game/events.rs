//! Events the simulation emits for the sync layer.

use protocol::{EntityRecord, ParticleRecord};

/// Something the rest of the world should hear about.
///
/// The simulation never talks to the store directly; it queues these and the
/// [`SyncBridge`](crate::sync::SyncBridge) turns them into writes.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// The local player signed in and should be published.
    PlayerJoined(EntityRecord),
    /// Latest local player state, pushed every tick while alive.
    PlayerUpdated(EntityRecord),
    /// The local player left the game.
    PlayerLeft { id: String },
    /// An entity was eaten (possibly the local player).
    EntityDied { id: String },
    /// A particle was created locally.
    ParticleSpawned(ParticleRecord),
    /// A particle was eaten locally.
    ParticleConsumed { id: String },
}
