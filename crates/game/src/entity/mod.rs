//! Arena entities.
//!
//! Particles are food, entities are blobs (the local player's included) and
//! obstacles are local hazards.

mod blob;
mod obstacle;
mod particle;
mod player;

pub use blob::{Collision, Entity, EntityContact, Rules};
pub use obstacle::{Obstacle, OBSTACLE_COLOR};
pub use particle::Particle;
pub use player::Player;
