//! Obstacle hazard.

use crate::collision::Body;
use crate::config::ParticleConfig;
use crate::world::WorldBounds;
use glam::Vec2;
use protocol::Color;
use rand::Rng;

/// Obstacles are drawn in a fixed dark color.
pub const OBSTACLE_COLOR: Color = Color::new(60, 60, 60);

/// A static hazard. Touching it costs the entity `value` points, after which
/// the obstacle jumps somewhere else.
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub position: Vec2,
    pub color: Color,
    pub radius: f32,
    pub value: u32,
}

impl Obstacle {
    /// Create an obstacle at a random position with a random value.
    pub fn spawn(bounds: &WorldBounds, radius: f32, config: &ParticleConfig) -> Self {
        let mut obstacle = Self {
            position: Vec2::ZERO,
            color: OBSTACLE_COLOR,
            radius,
            value: 0,
        };
        obstacle.relocate(bounds, config);
        obstacle
    }

    /// Move to a fresh random position and re-roll the value.
    pub fn relocate(&mut self, bounds: &WorldBounds, config: &ParticleConfig) {
        self.position = bounds.random_position(config.spawn_margin);
        self.value = if config.max_points > config.min_points {
            rand::rng().random_range(config.min_points..=config.max_points)
        } else {
            config.min_points
        };
    }

    /// Move to a set position.
    #[inline]
    pub fn move_to(&mut self, position: Vec2) {
        self.position = position;
    }
}

impl Body for Obstacle {
    fn position(&self) -> Vec2 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relocate_rerolls_within_field() {
        let bounds = WorldBounds::new(300.0, 300.0);
        let config = ParticleConfig::default();
        let mut obstacle = Obstacle::spawn(&bounds, 4.0, &config);
        for _ in 0..50 {
            obstacle.relocate(&bounds, &config);
            assert!((50..=150).contains(&obstacle.value));
            assert!((50.0..=250.0).contains(&obstacle.position.x));
        }
        obstacle.move_to(Vec2::new(7.0, 8.0));
        assert_eq!(obstacle.position(), Vec2::new(7.0, 8.0));
    }
}
