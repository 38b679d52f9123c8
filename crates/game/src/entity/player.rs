//! The locally controlled entity.

use super::Entity;
use glam::Vec2;
use protocol::Color;

/// The entity driven by this client's input.
///
/// All other entities are driven by remote snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// Shared simulation state.
    pub entity: Entity,
    /// Latest input heading from the UI.
    pub input: Vec2,
}

impl Player {
    /// Create a new player; the session id is bound later by `register`.
    pub fn new(name: impl Into<String>, position: Vec2, color: Color, radius: f32, skin: Option<String>) -> Self {
        Self {
            entity: Entity::new(name, position, color, radius, skin),
            input: Vec2::ZERO,
        }
    }

    /// Session id, once signed in.
    #[inline]
    pub fn session_id(&self) -> Option<&str> {
        self.entity.id.as_deref()
    }

    /// Bind the signed-in session id.
    pub fn register(&mut self, session_id: impl Into<String>) {
        self.entity.id = Some(session_id.into());
    }

    /// Store the input heading and steer the entity with it.
    pub fn set_input(&mut self, direction: Vec2) {
        self.input = direction;
        self.entity.set_direction(direction);
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.entity.is_alive
    }
}
