//! Merging remote store state into the local simulation.

use super::{Game, SimEvent};
use crate::entity::{Entity, Particle};
use protocol::{EntityRecord, ParticleRecord};
use tracing::debug;

/// What applying one remote record did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// An existing local copy was updated.
    Updated,
    /// No local copy existed, so one was created.
    Created,
    /// The local copy was removed.
    Removed,
    /// Nothing to do: our own record, a duplicate, or one that already died.
    Ignored,
}

/// Counts for a whole snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub updated: usize,
    pub created: usize,
    pub ignored: usize,
}

impl ReconcileSummary {
    fn record(&mut self, outcome: Reconciled) {
        match outcome {
            Reconciled::Updated => self.updated += 1,
            Reconciled::Created => self.created += 1,
            Reconciled::Removed | Reconciled::Ignored => self.ignored += 1,
        }
    }
}

impl Game {
    fn is_own_id(&self, id: &str) -> bool {
        self.session_id.as_deref() == Some(id)
    }

    /// Our own record, or a player that died or left. Late writes for these are echoes.
    fn is_skipped(&self, id: &str) -> bool {
        self.is_own_id(id) || self.departed.contains(id)
    }

    fn upsert_entity(&mut self, record: &EntityRecord) -> Reconciled {
        if self.is_skipped(&record.id) {
            return Reconciled::Ignored;
        }
        match self.entities.iter_mut().find(|e| e.id.as_deref() == Some(record.id.as_str())) {
            Some(entity) => {
                entity.apply_record(record);
                Reconciled::Updated
            }
            None => {
                debug!("Creating entity {} missing locally", record.id);
                self.entities.push(Entity::from_record(record));
                Reconciled::Created
            }
        }
    }

    /// Merge the full `players` collection. Entities absent from the snapshot are kept;
    /// removals arrive as their own events.
    pub fn apply_players_snapshot(&mut self, records: Vec<EntityRecord>) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        for record in &records {
            summary.record(self.upsert_entity(record));
        }
        summary
    }

    /// A player record appeared remotely.
    pub fn apply_player_added(&mut self, record: EntityRecord) -> Reconciled {
        if self.is_skipped(&record.id) || self.entities.iter().any(|e| e.id.as_deref() == Some(record.id.as_str())) {
            return Reconciled::Ignored;
        }
        debug!("Player {} joined", record.id);
        self.entities.push(Entity::from_record(&record));
        Reconciled::Created
    }

    /// A player record disappeared remotely. Our own id means we were eaten or kicked.
    ///
    /// Dropping our own player queues one more removal of its record, clearing any
    /// update we pushed before hearing about it.
    pub fn apply_player_removed(&mut self, id: &str) -> Reconciled {
        if self.is_own_id(id) {
            if self.player.take().is_none() {
                return Reconciled::Ignored;
            }
            debug!("Own record {} removed, dropping player", id);
            self.events.push(SimEvent::EntityDied { id: id.to_string() });
            return Reconciled::Removed;
        }
        self.departed.insert(id.to_string());
        match self.entities.iter().position(|e| e.id.as_deref() == Some(id)) {
            Some(index) => {
                self.entities.remove(index);
                Reconciled::Removed
            }
            None => {
                debug!("Player {} already gone", id);
                Reconciled::Ignored
            }
        }
    }

    /// Merge the full `particles` collection.
    pub fn apply_particles_snapshot(&mut self, records: Vec<ParticleRecord>) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        for record in records {
            if self.consumed.contains(&record.id) {
                summary.record(Reconciled::Ignored);
                continue;
            }
            let outcome = match self.particles.iter_mut().find(|p| p.id == record.id) {
                Some(particle) => {
                    particle.apply_record(&record);
                    Reconciled::Updated
                }
                None => {
                    self.particles.push(Particle::from_record(record));
                    Reconciled::Created
                }
            };
            summary.record(outcome);
        }
        summary
    }

    pub fn apply_particle_added(&mut self, record: ParticleRecord) -> Reconciled {
        if self.consumed.contains(&record.id) || self.particles.iter().any(|p| p.id == record.id) {
            return Reconciled::Ignored;
        }
        self.particles.push(Particle::from_record(record));
        Reconciled::Created
    }

    pub fn apply_particle_removed(&mut self, id: &str) -> Reconciled {
        self.consumed.remove(id);
        match self.particles.iter().position(|p| p.id == id) {
            Some(index) => {
                self.particles.remove(index);
                Reconciled::Removed
            }
            None => {
                debug!("Particle {} already gone", id);
                Reconciled::Ignored
            }
        }
    }
}
