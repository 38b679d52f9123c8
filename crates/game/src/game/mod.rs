//! Game state and the fixed-tick simulation.
//!
//! `Game` owns every particle, entity and obstacle plus the local player. It is
//! a plain synchronous state machine (`Idle -> Running -> Stopped`); the
//! [`session`](crate::session) module drives it from a ticker and feeds it
//! remote snapshots between ticks.

mod events;
mod leaderboard;
mod reconcile;

pub use events::SimEvent;
pub use leaderboard::LeaderboardEntry;
pub use reconcile::{Reconciled, ReconcileSummary};

use crate::config::Config;
use crate::entity::{Entity, EntityContact, Obstacle, Particle, Player, Rules};
use crate::error::GameError;
use crate::render::{self, Surface};
use crate::world::WorldBounds;
use glam::Vec2;
use protocol::{vector, Color};
use rand::Rng;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Movement constants are tuned for this rate; other rates scale `dt`.
const NOMINAL_TICKS_PER_SECOND: f32 = 60.0;

/// Lifecycle of a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Waiting for `start_game`.
    #[default]
    Idle,
    /// Ticking.
    Running,
    /// Left; `reset` returns to `Idle` for a new session.
    Stopped,
}

/// Summary of one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub particles_eaten: usize,
    /// Id of the entity the player ate this tick.
    pub entity_eaten: Option<String>,
    pub player_died: bool,
    pub obstacle_hits: usize,
    pub particles_spawned: usize,
}

/// The simulation core.
#[derive(Debug)]
pub struct Game {
    config: Config,
    rules: Rules,
    bounds: WorldBounds,
    state: SessionState,
    ticks_per_second: u32,
    tick_count: u64,

    particles: Vec<Particle>,
    entities: Vec<Entity>,
    obstacles: Vec<Obstacle>,
    player: Option<Player>,
    /// Signed-in id; outlives the player so our own records stay skipped.
    session_id: Option<String>,
    /// Remote players that died or were removed this session.
    departed: HashSet<String>,
    /// Particles eaten locally whose removal the store has not echoed yet.
    consumed: HashSet<String>,

    /// Time left until the spawner adds a particle.
    spawn_timer: Duration,
    /// Outgoing events, drained by the sync layer.
    events: Vec<SimEvent>,
}

impl Game {
    /// Create an idle game.
    pub fn new(config: Config) -> Self {
        Self {
            rules: Rules::from_config(&config),
            bounds: WorldBounds::new(config.world.width, config.world.height),
            state: SessionState::Idle,
            ticks_per_second: config.game.ticks_per_second.max(1),
            tick_count: 0,
            particles: Vec::with_capacity(config.game.max_particles),
            entities: Vec::new(),
            obstacles: Vec::with_capacity(config.obstacle.amount),
            player: None,
            session_id: None,
            departed: HashSet::new(),
            consumed: HashSet::new(),
            spawn_timer: Duration::ZERO,
            events: Vec::new(),
            config,
        }
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    #[inline]
    pub fn ticks_per_second(&self) -> u32 {
        self.ticks_per_second
    }

    /// Ticker period: `1000 / ticks_per_second` milliseconds.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.ticks_per_second as f64)
    }

    #[inline]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Take the events queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Start a session. Returns false (and changes nothing) on invalid input.
    pub fn start_game(&mut self, name: Option<&str>, color_hex: Option<&str>, skin: Option<&str>) -> bool {
        match self.try_start_game(name, color_hex, skin) {
            Ok(()) => true,
            Err(e) => {
                warn!("Refusing to start game: {}", e);
                false
            }
        }
    }

    /// Start a session, reporting why it could not start.
    pub fn try_start_game(
        &mut self,
        name: Option<&str>,
        color_hex: Option<&str>,
        skin: Option<&str>,
    ) -> Result<(), GameError> {
        if self.state != SessionState::Idle {
            return Err(GameError::NotIdle);
        }
        let name = name
            .filter(|n| !n.is_empty())
            .ok_or(GameError::InvalidInput("player name is empty"))?;
        let color_hex = color_hex
            .filter(|c| !c.is_empty())
            .ok_or(GameError::InvalidInput("player color is empty"))?;
        let color = Color::from_hex(color_hex)?;
        let skin = skin.filter(|s| !s.is_empty()).map(str::to_string);

        let position = self.bounds.random_position(self.config.particle.spawn_margin);
        self.player = Some(Player::new(name, position, color, self.config.entity.start_radius, skin));

        self.obstacles.clear();
        for _ in 0..self.config.obstacle.amount {
            self.obstacles
                .push(Obstacle::spawn(&self.bounds, self.config.obstacle.radius, &self.config.particle));
        }

        self.spawn_timer = self.roll_spawn_delay();
        self.state = SessionState::Running;
        info!(
            "Game started for '{}' at ({:.0}, {:.0}), {} ticks/s",
            name, position.x, position.y, self.ticks_per_second
        );
        Ok(())
    }

    /// Undo a start that could not finish joining and return to `Idle`.
    ///
    /// A player that was already registered is withdrawn with `PlayerLeft`.
    pub fn abort_start(&mut self) {
        if self.state != SessionState::Running {
            return;
        }
        if let Some(id) = self.session_id.take() {
            self.events.push(SimEvent::PlayerLeft { id });
        }
        self.player = None;
        self.particles.clear();
        self.entities.clear();
        self.obstacles.clear();
        self.departed.clear();
        self.consumed.clear();
        self.tick_count = 0;
        self.state = SessionState::Idle;
        info!("Game start aborted");
    }

    /// Bind the signed-in session id to the local player and publish it.
    pub fn register_player(&mut self, session_id: &str) -> bool {
        let Some(player) = self.player.as_mut() else {
            return false;
        };
        player.register(session_id);
        self.session_id = Some(session_id.to_string());
        info!("Player '{}' registered as {}", player.entity.name, session_id);
        self.events.push(SimEvent::PlayerJoined(player.entity.to_record()));
        true
    }

    /// Fill an empty world with the initial particles. Returns how many were created.
    pub fn seed_particles(&mut self, remote_count: usize) -> usize {
        if !self.is_running() || remote_count > 0 {
            return 0;
        }
        let amount = self.config.game.initial_particles;
        for _ in 0..amount {
            self.spawn_particle();
        }
        info!("Seeded {} particles", amount);
        amount
    }

    /// Leave the running game. Safe to call at any time; only the first call does anything.
    pub fn leave_game(&mut self) -> bool {
        if self.state != SessionState::Running {
            return false;
        }
        if let Some(player) = self.player.take() {
            if let Some(id) = player.entity.id {
                self.events.push(SimEvent::PlayerLeft { id });
            }
        }
        self.state = SessionState::Stopped;
        info!("Left game after {} ticks", self.tick_count);
        true
    }

    /// Return a stopped game to `Idle`, dropping everything from the old session.
    pub fn reset(&mut self) {
        if self.state != SessionState::Stopped {
            return;
        }
        self.particles.clear();
        self.entities.clear();
        self.obstacles.clear();
        self.player = None;
        self.session_id = None;
        self.departed.clear();
        self.consumed.clear();
        self.events.clear();
        self.tick_count = 0;
        self.state = SessionState::Idle;
    }

    /// Steer the player. The heading is normalized.
    pub fn set_player_direction(&mut self, direction: Vec2) {
        if let Some(player) = self.player.as_mut() {
            player.set_input(vector::normalized(direction));
        }
    }

    /// Steer the player towards a point on the field.
    pub fn set_player_target(&mut self, target: Vec2) {
        if let Some(player) = self.player.as_mut() {
            let heading = vector::heading(player.entity.position, target);
            player.set_input(heading);
        }
    }

    pub fn set_player_name(&mut self, name: &str) -> Result<(), GameError> {
        if name.is_empty() {
            return Err(GameError::InvalidInput("player name is empty"));
        }
        if let Some(player) = self.player.as_mut() {
            player.entity.name = name.to_string();
        }
        Ok(())
    }

    pub fn set_player_color(&mut self, color: Color) {
        if let Some(player) = self.player.as_mut() {
            player.entity.set_color(color);
        }
    }

    pub fn set_player_skin(&mut self, skin: Option<String>) {
        if let Some(player) = self.player.as_mut() {
            player.entity.skin = skin.filter(|s| !s.is_empty());
        }
    }

    /// Change the simulation rate. The driver swaps its ticker on the next turn.
    pub fn update_tick_rate(&mut self, ticks_per_second: u32) -> Result<(), GameError> {
        if ticks_per_second == 0 {
            return Err(GameError::InvalidTickRate);
        }
        if ticks_per_second != self.ticks_per_second {
            info!("Tick rate {} -> {} ticks/s", self.ticks_per_second, ticks_per_second);
            self.ticks_per_second = ticks_per_second;
        }
        Ok(())
    }

    /// Adopt a new field size (the canvas was resized).
    pub fn resize(&mut self, bounds: WorldBounds) {
        debug!("World resized to {}x{}", bounds.width, bounds.height);
        self.bounds = bounds;
    }

    /// Advance the simulation by one tick and draw the frame.
    ///
    /// Remote entities move first so the player's collision check sees where
    /// they are this tick.
    pub fn tick(&mut self, surface: &mut dyn Surface) -> TickReport {
        let mut report = TickReport {
            tick: self.tick_count,
            ..Default::default()
        };
        if !self.is_running() {
            return report;
        }
        self.tick_count += 1;
        report.tick = self.tick_count;

        let dt = NOMINAL_TICKS_PER_SECOND / self.ticks_per_second as f32;
        let bounds = self.bounds;
        let rules = self.rules;

        render::draw_background(surface, &bounds);
        for particle in &self.particles {
            render::draw_particle(surface, particle);
        }
        for obstacle in &self.obstacles {
            render::draw_obstacle(surface, obstacle);
        }
        for entity in &mut self.entities {
            entity.tick(dt, &bounds, &rules);
            render::draw_entity(surface, entity);
        }

        if let Some(player) = self.player.as_mut().filter(|p| p.is_alive()) {
            player.entity.tick(dt, &bounds, &rules);

            let collision = player
                .entity
                .check_collision(&mut self.particles, &mut self.entities, &rules);
            if let Some(particle) = collision.particle {
                debug!("Player ate particle {} (+{})", particle.id, particle.points);
                report.particles_eaten += 1;
                self.consumed.insert(particle.id.clone());
                self.events.push(SimEvent::ParticleConsumed { id: particle.id });
            }
            match collision.entity {
                Some(EntityContact::Ate { index, victim }) => {
                    info!("Player ate '{}'", self.entities[index].name);
                    if let Some(id) = victim {
                        self.departed.insert(id.clone());
                        self.events.push(SimEvent::EntityDied { id: id.clone() });
                        report.entity_eaten = Some(id);
                    }
                }
                Some(EntityContact::EatenBy { index, victim }) => {
                    info!("Player was eaten by '{}'", self.entities[index].name);
                    report.player_died = true;
                    if let Some(id) = victim {
                        self.events.push(SimEvent::EntityDied { id });
                    }
                }
                Some(EntityContact::Standoff { .. }) | None => {}
            }

            let hit = player
                .is_alive()
                .then(|| player.entity.collides(self.obstacles.as_slice()))
                .flatten();
            if let Some(index) = hit {
                let obstacle = &mut self.obstacles[index];
                player.entity.points = player.entity.points.saturating_sub(obstacle.value as u64);
                debug!("Player hit an obstacle (-{})", obstacle.value);
                obstacle.relocate(&bounds, &self.config.particle);
                report.obstacle_hits += 1;
            }

            render::draw_entity(surface, &player.entity);

            if player.is_alive() && player.session_id().is_some() {
                self.events.push(SimEvent::PlayerUpdated(player.entity.to_record()));
            }
        }

        report.particles_spawned = self.run_spawner();
        report
    }

    fn run_spawner(&mut self) -> usize {
        self.spawn_timer = self.spawn_timer.saturating_sub(self.tick_interval());
        if !self.spawn_timer.is_zero() {
            return 0;
        }
        self.spawn_timer = self.roll_spawn_delay();
        let max = self.config.game.max_particles;
        if max > 0 && self.particles.len() >= max {
            return 0;
        }
        self.spawn_particle();
        1
    }

    fn roll_spawn_delay(&self) -> Duration {
        let game = &self.config.game;
        let steps = if game.spawn_delay_max_steps > game.spawn_delay_min_steps {
            rand::rng().random_range(game.spawn_delay_min_steps..=game.spawn_delay_max_steps)
        } else {
            game.spawn_delay_min_steps
        };
        Duration::from_millis(steps as u64 * game.spawn_delay_step_ms)
    }

    fn spawn_particle(&mut self) {
        let particle = Particle::spawn(&self.bounds, self.config.game.particle_identity, &self.config.particle);
        self.events.push(SimEvent::ParticleSpawned(particle.to_record()));
        self.particles.push(particle);
    }
}
