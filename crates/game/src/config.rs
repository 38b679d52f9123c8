//! Game configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub entity: EntityConfig,
    #[serde(default)]
    pub particle: ParticleConfig,
    #[serde(default)]
    pub obstacle: ObstacleConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load configuration from `path`, writing the defaults there if it does not exist.
    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No {} found, creating default config", path.display());
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }
}

/// How particles are identified across clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleIdentity {
    /// Random id assigned at spawn.
    #[default]
    ById,
    /// Id derived from the spawn position (`"<x>x<y>"`).
    ByPosition,
}

/// What an entity grows by when it eats another entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthSource {
    /// Add the eaten entity's full radius.
    #[default]
    Radius,
    /// Add the eaten entity's points scaled like particle growth.
    Points,
}

/// Playing field size.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorldConfig {
    #[serde(default = "default_world_width")]
    pub width: f32,
    #[serde(default = "default_world_height")]
    pub height: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_world_width(),
            height: default_world_height(),
        }
    }
}

fn default_world_width() -> f32 {
    1280.0
}
fn default_world_height() -> f32 {
    720.0
}

/// Simulation loop and policy settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameConfig {
    /// Fixed simulation rate.
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: u32,
    #[serde(default)]
    pub particle_identity: ParticleIdentity,
    #[serde(default)]
    pub growth_source: GrowthSource,
    /// Particles created when the remote particle collection is empty.
    #[serde(default = "default_initial_particles")]
    pub initial_particles: usize,
    /// The spawner stops adding particles at this count (0 = no limit).
    #[serde(default = "default_max_particles")]
    pub max_particles: usize,
    /// Spawn delay is `random(min, max) * step` milliseconds.
    #[serde(default = "default_spawn_delay_min_steps")]
    pub spawn_delay_min_steps: u32,
    #[serde(default = "default_spawn_delay_max_steps")]
    pub spawn_delay_max_steps: u32,
    #[serde(default = "default_spawn_delay_step_ms")]
    pub spawn_delay_step_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: default_ticks_per_second(),
            particle_identity: ParticleIdentity::default(),
            growth_source: GrowthSource::default(),
            initial_particles: default_initial_particles(),
            max_particles: default_max_particles(),
            spawn_delay_min_steps: default_spawn_delay_min_steps(),
            spawn_delay_max_steps: default_spawn_delay_max_steps(),
            spawn_delay_step_ms: default_spawn_delay_step_ms(),
        }
    }
}

fn default_ticks_per_second() -> u32 {
    60
}
fn default_initial_particles() -> usize {
    100
}
fn default_max_particles() -> usize {
    400
}
fn default_spawn_delay_min_steps() -> u32 {
    1
}
fn default_spawn_delay_max_steps() -> u32 {
    50
}
fn default_spawn_delay_step_ms() -> u64 {
    100
}

/// Entity movement and growth tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntityConfig {
    #[serde(default = "default_start_radius")]
    pub start_radius: f32,
    /// Acceleration numerator; the per-tick push is `damping / radius`.
    #[serde(default = "default_damping")]
    pub damping: f32,
    /// Radius gained per particle point.
    #[serde(default = "default_particle_growth")]
    pub particle_growth: f32,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            start_radius: default_start_radius(),
            damping: default_damping(),
            particle_growth: default_particle_growth(),
        }
    }
}

fn default_start_radius() -> f32 {
    6.0
}
fn default_damping() -> f32 {
    10.0
}
fn default_particle_growth() -> f32 {
    0.001
}

/// Particle settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParticleConfig {
    #[serde(default = "default_particle_radius")]
    pub radius: f32,
    #[serde(default = "default_min_points")]
    pub min_points: u32,
    #[serde(default = "default_max_points")]
    pub max_points: u32,
    /// Distance kept from the world edge when placing particles and players.
    #[serde(default = "default_spawn_margin")]
    pub spawn_margin: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            radius: default_particle_radius(),
            min_points: default_min_points(),
            max_points: default_max_points(),
            spawn_margin: default_spawn_margin(),
        }
    }
}

fn default_particle_radius() -> f32 {
    2.0
}
fn default_min_points() -> u32 {
    50
}
fn default_max_points() -> u32 {
    150
}
fn default_spawn_margin() -> f32 {
    50.0
}

/// Obstacle settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObstacleConfig {
    #[serde(default)]
    pub amount: usize,
    #[serde(default = "default_obstacle_radius")]
    pub radius: f32,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            amount: 0,
            radius: default_obstacle_radius(),
        }
    }
}

fn default_obstacle_radius() -> f32 {
    4.0
}
