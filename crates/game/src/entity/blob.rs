//! Movable, collidable entity.

use super::Particle;
use crate::collision::{first_contact, Body};
use crate::config::{Config, GrowthSource};
use crate::world::WorldBounds;
use glam::Vec2;
use protocol::{Color, EntityRecord};

/// Velocity is halved every tick after acceleration is applied.
const VELOCITY_DECAY: f32 = 0.5;

/// Movement and growth tuning shared by every entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rules {
    /// Per-tick push is `damping / radius`, so big entities accelerate slowly.
    pub damping: f32,
    /// Radius gained per particle point.
    pub particle_growth: f32,
    pub growth_source: GrowthSource,
}

impl Rules {
    pub fn from_config(config: &Config) -> Self {
        Self {
            damping: config.entity.damping,
            particle_growth: config.entity.particle_growth,
            growth_source: config.game.growth_source,
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// A blob in the arena, either the local player's or one mirrored from a remote client.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Session id of the owning client. `None` until the local player signs in.
    pub id: Option<String>,
    pub name: String,
    pub position: Vec2,
    /// Last known unit heading.
    pub direction: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub color: Color,
    pub border_color: Color,
    pub skin: Option<String>,
    pub points: u64,
    pub is_alive: bool,
}

/// What a collision check did this tick.
#[derive(Debug, Default, PartialEq)]
pub struct Collision {
    /// Particle eaten this tick, already taken out of the collection.
    pub particle: Option<Particle>,
    pub entity: Option<EntityContact>,
}

/// Outcome of touching another entity. `index` refers to the slice passed in.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityContact {
    /// This entity ate the other one.
    Ate { index: usize, victim: Option<String> },
    /// The other entity ate this one.
    EatenBy { index: usize, victim: Option<String> },
    /// Equal radius, or one of the two was already dead.
    Standoff { index: usize },
}

impl Entity {
    /// Create a new live entity.
    pub fn new(name: impl Into<String>, position: Vec2, color: Color, radius: f32, skin: Option<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            position,
            direction: Vec2::ZERO,
            velocity: Vec2::ZERO,
            radius,
            color,
            border_color: color.border(),
            skin,
            points: 0,
            is_alive: true,
        }
    }

    /// Advance one step: accelerate along the heading, decay velocity, move and wrap.
    ///
    /// `dt` is the step length relative to a 60 Hz tick.
    pub fn tick(&mut self, dt: f32, bounds: &WorldBounds, rules: &Rules) {
        if !self.is_alive {
            return;
        }
        let damp = if self.radius > 0.0 { rules.damping / self.radius } else { 0.0 };
        self.velocity = (self.velocity + self.direction * damp * dt) * VELOCITY_DECAY;
        self.position = bounds.wrap(self.position + self.velocity * dt);
    }

    /// Store the heading used by `tick`. Does not move the entity.
    #[inline]
    pub fn set_direction(&mut self, direction: Vec2) {
        self.direction = direction;
    }

    /// Set the fill color and derive the border from it.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.border_color = color.border();
    }

    /// Index of the first body whose position is inside this entity's contact box.
    #[inline]
    pub fn collides<B: Body>(&self, others: &[B]) -> Option<usize> {
        first_contact(self.position, self.radius, others)
    }

    /// Eat at most one particle and at most one entity.
    ///
    /// The eaten particle is removed from `particles` and handed back. An entity
    /// contact only consumes when both are alive and the radii differ; the
    /// larger one eats.
    pub fn check_collision(
        &mut self,
        particles: &mut Vec<Particle>,
        entities: &mut [Entity],
        rules: &Rules,
    ) -> Collision {
        let mut collision = Collision::default();
        if !self.is_alive {
            return collision;
        }

        if let Some(index) = self.collides(particles.as_slice()) {
            let particle = particles.remove(index);
            self.eat_particle(&particle, rules);
            collision.particle = Some(particle);
        }

        if let Some(index) = self.collides(&*entities) {
            let other = &mut entities[index];
            let contact = if !(self.is_alive && other.is_alive) {
                EntityContact::Standoff { index }
            } else if self.radius > other.radius {
                EntityContact::Ate { index, victim: self.eat_entity(other, rules) }
            } else if other.radius > self.radius {
                EntityContact::EatenBy { index, victim: other.eat_entity(self, rules) }
            } else {
                EntityContact::Standoff { index }
            };
            collision.entity = Some(contact);
        }

        collision
    }

    /// Grow by a particle's value.
    pub fn eat_particle(&mut self, particle: &Particle, rules: &Rules) {
        self.radius += particle.points as f32 * rules.particle_growth;
        self.points += particle.points as u64;
    }

    /// Absorb another entity. Returns the victim's id for remote removal.
    pub fn eat_entity(&mut self, other: &mut Entity, rules: &Rules) -> Option<String> {
        self.radius += match rules.growth_source {
            GrowthSource::Radius => other.radius,
            GrowthSource::Points => other.points as f32 * rules.particle_growth,
        };
        self.points += other.points;
        other.get_eaten()
    }

    /// Die. Returns the id the sync layer should remove, if this entity was ever registered.
    pub fn get_eaten(&mut self) -> Option<String> {
        if !self.is_alive {
            return None;
        }
        self.is_alive = false;
        self.id.clone()
    }

    pub fn from_record(record: &EntityRecord) -> Self {
        let mut entity = Self::new(
            record.name.clone(),
            record.position,
            record.color_rgb,
            record.radius,
            record.skin.clone(),
        );
        entity.id = Some(record.id.clone());
        entity.direction = record.direction;
        entity.velocity = record.velocity;
        entity.points = record.points;
        entity.is_alive = record.is_alive;
        entity
    }

    /// Merge a remote snapshot.
    ///
    /// Applying the same record twice leaves the entity unchanged. Death is
    /// terminal and the radius never shrinks, whatever the record says.
    pub fn apply_record(&mut self, record: &EntityRecord) {
        self.position = record.position;
        self.direction = record.direction;
        self.velocity = record.velocity;
        self.set_color(record.color_rgb);
        self.radius = self.radius.max(record.radius);
        self.points = record.points;
        self.is_alive = self.is_alive && record.is_alive;
        if self.name != record.name {
            self.name = record.name.clone();
        }
        if self.skin != record.skin {
            self.skin = record.skin.clone();
        }
    }

    pub fn to_record(&self) -> EntityRecord {
        EntityRecord {
            id: self.id.clone().unwrap_or_default(),
            name: self.name.clone(),
            position: self.position,
            direction: self.direction,
            velocity: self.velocity,
            color: self.color.to_string(),
            color_rgb: self.color,
            border_color: self.border_color.to_string(),
            radius: self.radius,
            skin: self.skin.clone(),
            points: self.points,
            is_alive: self.is_alive,
        }
    }
}

impl Body for Entity {
    fn position(&self) -> Vec2 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::vector::RIGHT;

    const BOUNDS: WorldBounds = WorldBounds::new(800.0, 600.0);

    fn blob(id: &str, x: f32, y: f32, radius: f32) -> Entity {
        let mut e = Entity::new(id, Vec2::new(x, y), Color::new(100, 100, 100), radius, None);
        e.id = Some(id.to_string());
        e
    }

    fn particle(x: f32, y: f32, points: u32) -> Particle {
        Particle {
            id: format!("{x}x{y}"),
            position: Vec2::new(x, y),
            color: Color::new(1, 1, 1),
            radius: 2.0,
            points,
        }
    }

    #[test]
    fn test_dead_entity_is_inert() {
        for radius in [0.5, 6.0, 40.0] {
            let mut e = blob("a", 10.0, 10.0, radius);
            e.velocity = Vec2::new(3.0, -2.0);
            e.direction = RIGHT;
            e.is_alive = false;
            let before = e.clone();
            e.tick(1.0, &BOUNDS, &Rules::default());
            assert_eq!(e, before);
        }
    }

    #[test]
    fn test_tick_damped_by_radius() {
        let rules = Rules::default();
        let mut small = blob("s", 100.0, 100.0, 5.0);
        let mut big = blob("b", 100.0, 100.0, 50.0);
        small.set_direction(RIGHT);
        big.set_direction(RIGHT);
        small.tick(1.0, &BOUNDS, &rules);
        big.tick(1.0, &BOUNDS, &rules);
        // damp = 10 / r, then halved
        assert_eq!(small.velocity, Vec2::new(1.0, 0.0));
        assert_eq!(big.velocity, Vec2::new(0.1, 0.0));
        assert_eq!(small.position, Vec2::new(101.0, 100.0));
        assert!(big.position.x < small.position.x);
    }

    #[test]
    fn test_velocity_decays_without_heading() {
        let mut e = blob("a", 100.0, 100.0, 6.0);
        e.velocity = Vec2::new(8.0, 0.0);
        e.tick(1.0, &BOUNDS, &Rules::default());
        assert_eq!(e.velocity, Vec2::new(4.0, 0.0));
        assert_eq!(e.position, Vec2::new(104.0, 100.0));
    }

    #[test]
    fn test_wrap_on_tick() {
        let rules = Rules::default();
        let mut e = blob("a", -5.0, 700.0, 6.0);
        e.tick(1.0, &BOUNDS, &rules);
        assert_eq!(e.position, Vec2::new(800.0, 0.0));

        let mut e = blob("b", 900.0, -1.0, 6.0);
        e.tick(1.0, &BOUNDS, &rules);
        assert_eq!(e.position, Vec2::new(0.0, 600.0));
    }

    #[test]
    fn test_bigger_eats_smaller() {
        let rules = Rules::default();
        let mut a = blob("a", 100.0, 100.0, 10.0);
        a.points = 5;
        let mut others = vec![blob("b", 105.0, 100.0, 5.0)];
        others[0].points = 7;

        let collision = a.check_collision(&mut Vec::new(), &mut others, &rules);
        assert_eq!(
            collision.entity,
            Some(EntityContact::Ate { index: 0, victim: Some("b".into()) })
        );
        assert!(!others[0].is_alive);
        assert_eq!(a.radius, 15.0);
        assert_eq!(a.points, 12);

        // The victim is inert afterwards.
        let before = others[0].clone();
        others[0].tick(1.0, &BOUNDS, &rules);
        assert_eq!(others[0], before);
        assert_eq!(others[0].get_eaten(), None);
    }

    #[test]
    fn test_smaller_is_eaten_by_bigger() {
        let rules = Rules::default();
        let mut small = blob("small", 100.0, 100.0, 4.0);
        let mut others = vec![blob("big", 101.0, 101.0, 9.0)];

        let collision = small.check_collision(&mut Vec::new(), &mut others, &rules);
        assert_eq!(
            collision.entity,
            Some(EntityContact::EatenBy { index: 0, victim: Some("small".into()) })
        );
        assert!(!small.is_alive);
        assert_eq!(others[0].radius, 13.0);
    }

    #[test]
    fn test_equal_radius_is_a_standoff() {
        let rules = Rules::default();
        let mut a = blob("a", 100.0, 100.0, 8.0);
        let mut others = vec![blob("b", 102.0, 100.0, 8.0)];
        let collision = a.check_collision(&mut Vec::new(), &mut others, &rules);
        assert_eq!(collision.entity, Some(EntityContact::Standoff { index: 0 }));
        assert!(a.is_alive && others[0].is_alive);
        assert_eq!(a.radius, 8.0);
    }

    #[test]
    fn test_dead_entities_are_not_eaten_again() {
        let rules = Rules::default();
        let mut a = blob("a", 100.0, 100.0, 10.0);
        let mut others = vec![blob("b", 100.0, 100.0, 5.0)];
        others[0].is_alive = false;
        let collision = a.check_collision(&mut Vec::new(), &mut others, &rules);
        assert_eq!(collision.entity, Some(EntityContact::Standoff { index: 0 }));
        assert_eq!(a.radius, 10.0);
    }

    #[test]
    fn test_eats_one_particle_per_check() {
        let rules = Rules::default();
        let mut a = blob("a", 100.0, 100.0, 6.0);
        let mut particles = vec![particle(500.0, 500.0, 80), particle(101.0, 99.0, 100), particle(100.0, 100.0, 60)];

        let collision = a.check_collision(&mut particles, &mut [], &rules);
        let eaten = collision.particle.unwrap();
        assert_eq!(eaten.points, 100);
        assert_eq!(particles.len(), 2);
        assert_eq!(a.points, 100);
        assert!((a.radius - 6.1).abs() < 1e-5);
    }

    #[test]
    fn test_growth_by_points() {
        let rules = Rules { growth_source: GrowthSource::Points, ..Rules::default() };
        let mut a = blob("a", 0.0, 0.0, 10.0);
        let mut b = blob("b", 0.0, 0.0, 5.0);
        b.points = 2000;
        a.eat_entity(&mut b, &rules);
        assert!((a.radius - 12.0).abs() < 1e-5);
        assert_eq!(a.points, 2000);
    }

    #[test]
    fn test_unregistered_entity_dies_silently() {
        let mut e = Entity::new("local", Vec2::ZERO, Color::default(), 6.0, None);
        assert_eq!(e.get_eaten(), None);
        assert!(!e.is_alive);
    }

    #[test]
    fn test_apply_record_is_idempotent() {
        let mut e = blob("a", 0.0, 0.0, 6.0);
        let mut record = blob("a", 40.0, 50.0, 9.0).to_record();
        record.name = "renamed".into();
        record.skin = Some("skin.png".into());
        record.points = 300;

        e.apply_record(&record);
        let once = e.clone();
        e.apply_record(&record);
        assert_eq!(e, once);
        assert_eq!(e.position, Vec2::new(40.0, 50.0));
        assert_eq!(e.name, "renamed");
        assert_eq!(e.radius, 9.0);
    }

    #[test]
    fn test_apply_record_cannot_revive_or_shrink() {
        let mut e = blob("a", 0.0, 0.0, 12.0);
        e.is_alive = false;
        let record = blob("a", 1.0, 1.0, 3.0).to_record();
        e.apply_record(&record);
        assert!(!e.is_alive);
        assert_eq!(e.radius, 12.0);
    }
}
