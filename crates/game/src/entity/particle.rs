//! Food particle.

use crate::collision::Body;
use crate::config::{ParticleConfig, ParticleIdentity};
use crate::world::{self, WorldBounds};
use glam::Vec2;
use protocol::{Color, ParticleRecord};
use rand::Rng;

/// A stationary food item that entities eat.
///
/// Eaten particles are destroyed and replaced by freshly spawned ones rather
/// than being moved in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub id: String,
    pub position: Vec2,
    pub color: Color,
    pub radius: f32,
    pub points: u32,
}

impl Particle {
    /// Spawn a particle at a random position with a random point value and color.
    pub fn spawn(bounds: &WorldBounds, identity: ParticleIdentity, config: &ParticleConfig) -> Self {
        let position = bounds.random_position(config.spawn_margin);
        let points = if config.max_points > config.min_points {
            rand::rng().random_range(config.min_points..=config.max_points)
        } else {
            config.min_points
        };
        let id = match identity {
            ParticleIdentity::ById => world::random_id(),
            ParticleIdentity::ByPosition => world::position_key(position),
        };
        Self {
            id,
            position,
            color: world::random_color(),
            radius: config.radius,
            points,
        }
    }

    /// Adopt a particle announced by another client.
    pub fn from_record(record: ParticleRecord) -> Self {
        Self {
            id: record.id,
            position: record.position,
            color: record.color,
            radius: record.radius,
            points: record.points,
        }
    }

    /// Overwrite the mutable fields from a remote record.
    pub fn apply_record(&mut self, record: &ParticleRecord) {
        self.position = record.position;
        self.color = record.color;
        self.radius = record.radius;
        self.points = record.points;
    }

    pub fn to_record(&self) -> ParticleRecord {
        ParticleRecord {
            id: self.id.clone(),
            position: self.position,
            color: self.color,
            radius: self.radius,
            points: self.points,
        }
    }
}

impl Body for Particle {
    fn position(&self) -> Vec2 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_ranges() {
        let bounds = WorldBounds::new(400.0, 300.0);
        let config = ParticleConfig::default();
        for _ in 0..200 {
            let p = Particle::spawn(&bounds, ParticleIdentity::ById, &config);
            assert!((50..=150).contains(&p.points));
            assert!((50.0..=350.0).contains(&p.position.x));
            assert!((50.0..=250.0).contains(&p.position.y));
            assert_eq!(p.radius, 2.0);
            assert_eq!(p.id.len(), 16);
        }
    }

    #[test]
    fn test_position_identity() {
        let bounds = WorldBounds::new(400.0, 300.0);
        let p = Particle::spawn(&bounds, ParticleIdentity::ByPosition, &ParticleConfig::default());
        assert_eq!(p.id, format!("{}x{}", p.position.x, p.position.y));
    }

    #[test]
    fn test_record_adoption_keeps_remote_color() {
        let record = ParticleRecord {
            id: "remote".into(),
            position: Vec2::new(5.0, 6.0),
            color: Color::new(1, 2, 3),
            radius: 2.0,
            points: 99,
        };
        let p = Particle::from_record(record.clone());
        assert_eq!(p.color, Color::new(1, 2, 3));
        assert_eq!(p.to_record(), record);
    }
}
