//! Playing field bounds and random placement helpers.

use glam::Vec2;
use protocol::Color;
use rand::Rng;

/// Size of the playing field. Coordinates run over `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

impl WorldBounds {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Get a random position at least `margin` away from every edge.
    ///
    /// Falls back to the centre on an axis too small for the margin.
    pub fn random_position(&self, margin: f32) -> Vec2 {
        let mut rng = rand::rng();
        let mut axis = |len: f32| {
            let (min, max) = (margin, len - margin);
            if max > min {
                rng.random_range(min..=max)
            } else {
                len / 2.0
            }
        };
        let x = axis(self.width);
        let y = axis(self.height);
        Vec2::new(x, y)
    }

    /// Wrap a position that left the field to the opposite edge.
    ///
    /// A coordinate below zero moves to the far edge and one beyond the far edge
    /// moves to zero; positions on the field are returned unchanged.
    #[inline]
    pub fn wrap(&self, mut position: Vec2) -> Vec2 {
        if position.x < 0.0 {
            position.x = self.width;
        } else if position.x > self.width {
            position.x = 0.0;
        }
        if position.y < 0.0 {
            position.y = self.height;
        } else if position.y > self.height {
            position.y = 0.0;
        }
        position
    }
}

/// Generate a random color.
#[inline]
pub fn random_color() -> Color {
    let mut rng = rand::rng();
    Color::new(
        rng.random_range(50..=255),
        rng.random_range(50..=255),
        rng.random_range(50..=255),
    )
}

/// Generate a random 16 hex digit identifier.
pub fn random_id() -> String {
    format!("{:016x}", rand::rng().random::<u64>())
}

/// Identifier derived from a position, used when particles are keyed by where they sit.
pub fn position_key(position: Vec2) -> String {
    format!("{}x{}", position.x, position.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_position_respects_margin() {
        let bounds = WorldBounds::new(200.0, 150.0);
        for _ in 0..500 {
            let p = bounds.random_position(50.0);
            assert!((50.0..=150.0).contains(&p.x));
            assert!((50.0..=100.0).contains(&p.y));
        }
    }

    #[test]
    fn test_random_position_tiny_field() {
        let p = WorldBounds::new(60.0, 80.0).random_position(50.0);
        assert_eq!(p, Vec2::new(30.0, 40.0));
    }

    #[test]
    fn test_wrap_is_torus() {
        let bounds = WorldBounds::new(100.0, 50.0);
        assert_eq!(bounds.wrap(Vec2::new(-1.0, 10.0)), Vec2::new(100.0, 10.0));
        assert_eq!(bounds.wrap(Vec2::new(101.0, 10.0)), Vec2::new(0.0, 10.0));
        assert_eq!(bounds.wrap(Vec2::new(10.0, -0.5)), Vec2::new(10.0, 50.0));
        assert_eq!(bounds.wrap(Vec2::new(10.0, 51.0)), Vec2::new(10.0, 0.0));
        assert_eq!(bounds.wrap(Vec2::new(100.0, 50.0)), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn test_ids() {
        assert_eq!(random_id().len(), 16);
        assert_eq!(position_key(Vec2::new(12.5, 40.0)), "12.5x40");
    }
}
