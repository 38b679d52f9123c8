//! Turns simulation events into store writes.

use super::{RemoteStore, SyncError};
use crate::error::GameError;
use crate::game::SimEvent;
use protocol::records::{self, PARTICLES, PLAYERS};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Writes the local view of the world to a [`RemoteStore`].
pub struct SyncBridge<S> {
    store: S,
    writes: u64,
    failures: u64,
}

impl<S: RemoteStore> SyncBridge<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            writes: 0,
            failures: 0,
        }
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Successful and failed event writes so far.
    pub fn stats(&self) -> (u64, u64) {
        (self.writes, self.failures)
    }

    /// Write every event in order. Failures are logged and skipped; returns how many failed.
    pub async fn publish(&mut self, events: Vec<SimEvent>) -> usize {
        let mut failed = 0;
        for event in &events {
            match self.apply(event).await {
                Ok(()) => self.writes += 1,
                Err(e) => {
                    warn!("Store write for {:?} failed: {}", kind(event), e);
                    self.failures += 1;
                    failed += 1;
                }
            }
        }
        failed
    }

    /// Write a single event.
    pub async fn apply(&self, event: &SimEvent) -> Result<(), GameError> {
        match event {
            SimEvent::PlayerJoined(record) => {
                let path = records::player_path(&record.id);
                self.store.set(&path, record.to_value()?).await?;
                self.store.on_disconnect_remove(&path).await?;
                info!("Published player {}", record.id);
            }
            SimEvent::PlayerUpdated(record) => {
                self.store.set(&records::player_path(&record.id), record.to_value()?).await?;
            }
            SimEvent::PlayerLeft { id } => {
                self.store.remove(&records::player_path(id)).await?;
                if self.players_empty().await? {
                    info!("Last player left, clearing particles");
                    self.store.remove(PARTICLES).await?;
                }
            }
            SimEvent::EntityDied { id } => {
                debug!("Removing eaten player {}", id);
                self.store.remove(&records::player_path(id)).await?;
            }
            SimEvent::ParticleSpawned(record) => {
                self.store.set(&records::particle_path(&record.id), record.to_value()?).await?;
            }
            SimEvent::ParticleConsumed { id } => {
                self.store.remove(&records::particle_path(id)).await?;
            }
        }
        Ok(())
    }

    async fn players_empty(&self) -> Result<bool, SyncError> {
        Ok(match self.store.read_once(PLAYERS).await? {
            None | Some(Value::Null) => true,
            Some(Value::Object(players)) => players.is_empty(),
            Some(_) => false,
        })
    }
}

fn kind(event: &SimEvent) -> &'static str {
    match event {
        SimEvent::PlayerJoined(_) => "PlayerJoined",
        SimEvent::PlayerUpdated(_) => "PlayerUpdated",
        SimEvent::PlayerLeft { .. } => "PlayerLeft",
        SimEvent::EntityDied { .. } => "EntityDied",
        SimEvent::ParticleSpawned(_) => "ParticleSpawned",
        SimEvent::ParticleConsumed { .. } => "ParticleConsumed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::MemoryStore;
    use glam::Vec2;
    use protocol::{Color, EntityRecord, ParticleRecord};

    fn player(id: &str) -> EntityRecord {
        EntityRecord {
            id: id.into(),
            name: id.into(),
            position: Vec2::new(1.0, 2.0),
            color_rgb: Color::new(5, 6, 7),
            radius: 6.0,
            ..Default::default()
        }
    }

    fn particle(id: &str) -> ParticleRecord {
        ParticleRecord {
            id: id.into(),
            points: 70,
            radius: 2.0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_join_update_and_disconnect() {
        let store = MemoryStore::new();
        let mut bridge = SyncBridge::new(store.connect());
        bridge.publish(vec![SimEvent::PlayerJoined(player("a"))]).await;
        assert!(store.value("players/a").is_some());

        let mut moved = player("a");
        moved.position = Vec2::new(40.0, 50.0);
        bridge.publish(vec![SimEvent::PlayerUpdated(moved.clone())]).await;
        let stored = EntityRecord::from_value(store.value("players/a").unwrap()).unwrap();
        assert_eq!(stored, moved);

        // The join registered an on-disconnect removal.
        drop(bridge);
        assert_eq!(store.value("players/a"), None);
    }

    #[tokio::test]
    async fn test_particles_and_deaths() {
        let store = MemoryStore::new();
        let mut bridge = SyncBridge::new(store.connect());
        let failed = bridge
            .publish(vec![
                SimEvent::ParticleSpawned(particle("p1")),
                SimEvent::ParticleSpawned(particle("p2")),
                SimEvent::ParticleConsumed { id: "p1".into() },
                SimEvent::PlayerJoined(player("victim")),
                SimEvent::EntityDied { id: "victim".into() },
            ])
            .await;
        assert_eq!(failed, 0);
        assert_eq!(store.value("particles/p1"), None);
        assert!(store.value("particles/p2").is_some());
        assert_eq!(store.value("players/victim"), None);
        assert_eq!(bridge.stats(), (5, 0));
    }

    #[tokio::test]
    async fn test_last_player_clears_particles() {
        let store = MemoryStore::new();
        let mut bridge = SyncBridge::new(store.connect());
        bridge
            .publish(vec![
                SimEvent::PlayerJoined(player("a")),
                SimEvent::PlayerJoined(player("b")),
                SimEvent::ParticleSpawned(particle("p")),
            ])
            .await;

        bridge.publish(vec![SimEvent::PlayerLeft { id: "a".into() }]).await;
        assert!(store.value("particles/p").is_some());

        bridge.publish(vec![SimEvent::PlayerLeft { id: "b".into() }]).await;
        assert_eq!(store.value("particles"), None);
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_fatal() {
        let store = MemoryStore::new();
        let conn = store.connect();
        conn.disconnect().await;
        let mut bridge = SyncBridge::new(conn);
        let failed = bridge
            .publish(vec![
                SimEvent::ParticleSpawned(particle("p")),
                SimEvent::ParticleConsumed { id: "p".into() },
            ])
            .await;
        assert_eq!(failed, 2);
        assert_eq!(bridge.stats(), (0, 2));
    }
}
