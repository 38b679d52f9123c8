//! The session actor.
//!
//! One task owns the [`Game`] and multiplexes three inputs: the tick timer,
//! commands from the UI (through a [`GameHandle`]) and events from the remote
//! store. Because everything runs on that task, reconciliation always happens
//! between two ticks and the game state needs no locking.

use crate::config::Config;
use crate::error::GameError;
use crate::game::{Game, LeaderboardEntry, Reconciled, SessionState};
use crate::render::Surface;
use crate::sync::{Change, EventReceiver, EventSender, RemoteStore, StoreEvent, SyncBridge, SyncError};
use crate::world::WorldBounds;
use futures_util::FutureExt;
use glam::Vec2;
use protocol::records::{PARTICLES, PLAYERS};
use protocol::{Color, EntityRecord, ParticleRecord};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

type Reply<T> = oneshot::Sender<T>;

/// Requests from the UI to the session task.
#[derive(Debug)]
enum Command {
    Start {
        name: String,
        color: String,
        skin: Option<String>,
        reply: Reply<Result<(), GameError>>,
    },
    Leave { reply: Reply<bool> },
    SetDirection(Vec2),
    SetTarget(Vec2),
    SetName { name: String, reply: Reply<Result<(), GameError>> },
    SetColor(Color),
    SetSkin(Option<String>),
    UpdateTickRate { ticks_per_second: u32, reply: Reply<Result<(), GameError>> },
    Resize(WorldBounds),
    Leaderboard { reply: Reply<Vec<LeaderboardEntry>> },
    Status { reply: Reply<SessionStatus> },
    Shutdown,
}

/// Snapshot of the session for the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub state: SessionState,
    pub tick: u64,
    pub ticks_per_second: u32,
    /// Signed-in session id of the local player.
    pub session_id: Option<String>,
    pub player_alive: bool,
    pub points: u64,
    pub radius: f32,
    pub position: Option<Vec2>,
    /// Remote entities currently mirrored.
    pub entities: usize,
    pub particles: usize,
}

/// Cheap, cloneable control surface for a running session.
#[derive(Debug, Clone)]
pub struct GameHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl GameHandle {
    fn send(&self, command: Command) -> Result<(), GameError> {
        self.tx.send(command).map_err(|_| GameError::SessionClosed)
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, GameError> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply))?;
        rx.await.map_err(|_| GameError::SessionClosed)
    }

    /// Start a session. Returns false when the input is invalid or sign-in failed.
    pub async fn start_game(&self, name: &str, color_hex: &str, skin: Option<&str>) -> bool {
        match self.try_start_game(name, color_hex, skin).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Could not start game: {}", e);
                false
            }
        }
    }

    pub async fn try_start_game(&self, name: &str, color_hex: &str, skin: Option<&str>) -> Result<(), GameError> {
        let (name, color, skin) = (name.to_string(), color_hex.to_string(), skin.map(str::to_string));
        self.request(|reply| Command::Start { name, color, skin, reply }).await?
    }

    /// Leave the current game. Returns whether there was one to leave.
    pub async fn leave_game(&self) -> Result<bool, GameError> {
        self.request(|reply| Command::Leave { reply }).await
    }

    pub fn set_direction(&self, direction: Vec2) -> Result<(), GameError> {
        self.send(Command::SetDirection(direction))
    }

    /// Steer towards a point on the field (pointer position).
    pub fn set_target(&self, target: Vec2) -> Result<(), GameError> {
        self.send(Command::SetTarget(target))
    }

    pub async fn set_name(&self, name: &str) -> Result<(), GameError> {
        let name = name.to_string();
        self.request(|reply| Command::SetName { name, reply }).await?
    }

    pub fn set_color(&self, color: Color) -> Result<(), GameError> {
        self.send(Command::SetColor(color))
    }

    pub fn set_skin(&self, skin: Option<String>) -> Result<(), GameError> {
        self.send(Command::SetSkin(skin))
    }

    pub async fn update_tick_rate(&self, ticks_per_second: u32) -> Result<(), GameError> {
        self.request(|reply| Command::UpdateTickRate { ticks_per_second, reply }).await?
    }

    pub fn resize(&self, width: f32, height: f32) -> Result<(), GameError> {
        self.send(Command::Resize(WorldBounds::new(width, height)))
    }

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, GameError> {
        self.request(|reply| Command::Leaderboard { reply }).await
    }

    pub async fn status(&self) -> Result<SessionStatus, GameError> {
        self.request(|reply| Command::Status { reply }).await
    }

    /// Leave, disconnect from the store and stop the task.
    pub fn shutdown(&self) -> Result<(), GameError> {
        self.send(Command::Shutdown)
    }
}

/// Spawn a session task drawing into `surface` and syncing through `store`.
pub fn spawn_session<S>(config: Config, store: S, surface: Box<dyn Surface + Send>) -> (GameHandle, JoinHandle<()>)
where
    S: RemoteStore + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let (store_tx, store_rx) = mpsc::unbounded_channel();
    let session = Session {
        game: Game::new(config),
        bridge: SyncBridge::new(store),
        surface,
        store_tx,
        store_rx,
        subscribed: false,
    };
    let task = tokio::spawn(session.run(rx));
    (GameHandle { tx }, task)
}

enum Flow {
    Continue,
    RebuildTicker,
    Shutdown,
}

struct Session<S> {
    game: Game,
    bridge: SyncBridge<S>,
    surface: Box<dyn Surface + Send>,
    store_tx: EventSender,
    store_rx: EventReceiver,
    subscribed: bool,
}

fn new_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

impl<S: RemoteStore> Session<S> {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut ticker = new_ticker(self.game.tick_interval());
        info!("Session started ({} ticks/s)", self.game.ticks_per_second());

        loop {
            tokio::select! {
                // Parked while no game is running.
                scheduled = ticker.tick(), if self.game.is_running() => {
                    let mut skipped = 0u32;
                    while ticker.tick().now_or_never().is_some() {
                        skipped += 1;
                    }
                    if skipped > 0 {
                        debug!(
                            "Skipped {} ticks to stay current (lag: {:?})",
                            skipped,
                            Instant::now().saturating_duration_since(scheduled)
                        );
                    }
                    self.on_tick().await;
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        debug!("All handles dropped");
                        break;
                    };
                    match self.handle(command).await {
                        Flow::Continue => {}
                        Flow::RebuildTicker => {
                            drop(ticker);
                            ticker = new_ticker(self.game.tick_interval());
                        }
                        Flow::Shutdown => break,
                    }
                }
                Some(event) = self.store_rx.recv() => {
                    self.on_store_event(event);
                    self.flush().await;
                }
            }
        }

        self.leave().await;
        self.bridge.store().disconnect().await;
        let (writes, failures) = self.bridge.stats();
        info!("Session stopped ({} store writes, {} failed)", writes, failures);
    }

    async fn on_tick(&mut self) {
        if !self.game.is_running() {
            return;
        }
        let started = std::time::Instant::now();
        let report = self.game.tick(self.surface.as_mut());
        if report.player_died {
            info!("Player died on tick {}", report.tick);
        }
        self.flush().await;

        let elapsed = started.elapsed();
        let budget = self.game.tick_interval().mul_f64(0.9);
        if elapsed > budget {
            warn!(
                "Slow tick #{}: {:?} (budget: {:?}) - {} entities, {} particles",
                report.tick,
                elapsed,
                budget,
                self.game.entities().len(),
                self.game.particles().len()
            );
        }
    }

    /// Push queued simulation events to the store.
    async fn flush(&mut self) {
        let events = self.game.drain_events();
        if !events.is_empty() {
            self.bridge.publish(events).await;
        }
    }

    async fn handle(&mut self, command: Command) -> Flow {
        match command {
            Command::Start { name, color, skin, reply } => {
                let result = self.start(&name, &color, skin.as_deref()).await;
                let started = result.is_ok();
                let _ = reply.send(result);
                if started {
                    return Flow::RebuildTicker;
                }
            }
            Command::Leave { reply } => {
                let left = self.leave().await;
                let _ = reply.send(left);
            }
            Command::SetDirection(direction) => self.game.set_player_direction(direction),
            Command::SetTarget(target) => self.game.set_player_target(target),
            Command::SetName { name, reply } => {
                let _ = reply.send(self.game.set_player_name(&name));
            }
            Command::SetColor(color) => self.game.set_player_color(color),
            Command::SetSkin(skin) => self.game.set_player_skin(skin),
            Command::UpdateTickRate { ticks_per_second, reply } => {
                let before = self.game.ticks_per_second();
                let result = self.game.update_tick_rate(ticks_per_second);
                let changed = result.is_ok() && before != self.game.ticks_per_second();
                let _ = reply.send(result);
                if changed {
                    return Flow::RebuildTicker;
                }
            }
            Command::Resize(bounds) => self.game.resize(bounds),
            Command::Leaderboard { reply } => {
                let _ = reply.send(self.game.leaderboard());
            }
            Command::Status { reply } => {
                let _ = reply.send(self.status());
            }
            Command::Shutdown => return Flow::Shutdown,
        }
        Flow::Continue
    }

    async fn start(&mut self, name: &str, color: &str, skin: Option<&str>) -> Result<(), GameError> {
        if self.game.state() == SessionState::Stopped {
            self.game.reset();
        }
        self.game.try_start_game(Some(name), Some(color), skin)?;

        let session_id = match self.bridge.store().sign_in_anonymously().await {
            Ok(id) => id,
            Err(e) => {
                self.game.abort_start();
                warn!("Sign-in failed: {}", e);
                return Err(match e {
                    SyncError::AuthRejected { code, message } => GameError::RemoteAuthFailure { code, message },
                    other => other.into(),
                });
            }
        };
        if let Err(e) = self.join(&session_id).await {
            warn!("Joining as {} failed: {}", session_id, e);
            self.game.abort_start();
            self.flush().await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Publish the player, adopt the remote world and subscribe to it.
    async fn join(&mut self, session_id: &str) -> Result<(), SyncError> {
        self.game.register_player(session_id);
        self.flush().await;

        // Adopt what is already there before seeding an empty world.
        let store = self.bridge.store();
        let players = store.read_once(PLAYERS).await?;
        let particles = store.read_once(PARTICLES).await?;
        let summary = self.game.apply_players_snapshot(decode_collection(players));
        let remote_particles = decode_collection::<ParticleRecord>(particles);
        let remote_count = remote_particles.len();
        self.game.apply_particles_snapshot(remote_particles);
        debug!("Joined with {} remote players, {} particles", summary.created, remote_count);
        self.game.seed_particles(remote_count);
        self.flush().await;

        if !self.subscribed {
            subscribe(self.bridge.store(), &self.store_tx).await?;
            self.subscribed = true;
        }
        Ok(())
    }

    async fn leave(&mut self) -> bool {
        let left = self.game.leave_game();
        self.flush().await;
        left
    }

    fn on_store_event(&mut self, event: StoreEvent) {
        if !self.game.is_running() {
            debug!("Ignoring store event on {} while not running", event.path);
            return;
        }
        match (event.path.as_str(), event.change) {
            (PLAYERS, Change::ChildAdded { key, value }) => {
                if let Some(record) = decode::<EntityRecord>(&key, value) {
                    self.game.apply_player_added(record);
                }
            }
            (PLAYERS, Change::ChildRemoved { key, .. }) => {
                let own = self.game.session_id() == Some(key.as_str());
                if self.game.apply_player_removed(&key) == Reconciled::Removed && own {
                    info!("Own player record was removed");
                }
            }
            (PLAYERS, Change::ValueChanged(value)) => {
                self.game.apply_players_snapshot(decode_collection(value));
            }
            (PARTICLES, Change::ChildAdded { key, value }) => {
                if let Some(record) = decode::<ParticleRecord>(&key, value) {
                    self.game.apply_particle_added(record);
                }
            }
            (PARTICLES, Change::ChildRemoved { key, .. }) => {
                self.game.apply_particle_removed(&key);
            }
            (PARTICLES, Change::ValueChanged(value)) => {
                self.game.apply_particles_snapshot(decode_collection(value));
            }
            (path, change) => debug!("Unhandled store event on {}: {:?}", path, change),
        }
    }

    fn status(&self) -> SessionStatus {
        let player = self.game.player();
        SessionStatus {
            state: self.game.state(),
            tick: self.game.tick_count(),
            ticks_per_second: self.game.ticks_per_second(),
            session_id: self.game.session_id().map(str::to_string),
            player_alive: player.is_some_and(|p| p.is_alive()),
            points: player.map_or(0, |p| p.entity.points),
            radius: player.map_or(0.0, |p| p.entity.radius),
            position: player.map(|p| p.entity.position),
            entities: self.game.entities().len(),
            particles: self.game.particles().len(),
        }
    }
}

async fn subscribe<S: RemoteStore>(store: &S, tx: &EventSender) -> Result<(), SyncError> {
    store.on_child_added(PLAYERS, tx.clone()).await?;
    store.on_child_removed(PLAYERS, tx.clone()).await?;
    store.on_value_changed(PLAYERS, tx.clone()).await?;
    store.on_child_added(PARTICLES, tx.clone()).await?;
    store.on_child_removed(PARTICLES, tx.clone()).await?;
    store.on_value_changed(PARTICLES, tx.clone()).await?;
    Ok(())
}

/// Records stored under a collection carry their id; fall back to the key when they don't.
trait Keyed {
    fn key_mut(&mut self) -> &mut String;
}

impl Keyed for EntityRecord {
    fn key_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

impl Keyed for ParticleRecord {
    fn key_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

fn decode<T>(key: &str, value: Value) -> Option<T>
where
    T: serde::de::DeserializeOwned + Keyed,
{
    match serde_json::from_value::<T>(value) {
        Ok(mut record) => {
            if record.key_mut().is_empty() {
                *record.key_mut() = key.to_string();
            }
            Some(record)
        }
        Err(e) => {
            warn!("Dropping undecodable record {}: {}", key, e);
            None
        }
    }
}

fn decode_collection<T>(value: Option<Value>) -> Vec<T>
where
    T: serde::de::DeserializeOwned + Keyed,
{
    match value {
        Some(Value::Object(map)) => map.into_iter().filter_map(|(key, value)| decode(&key, value)).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_subscribe_follows_both_collections() {
        let store = MemoryStore::new();
        let conn = store.connect();
        let (tx, mut rx) = mpsc::unbounded_channel();
        subscribe(&conn, &tx).await.unwrap();

        // Replays of the empty collections.
        let mut replayed = Vec::new();
        while let Ok(event) = rx.try_recv() {
            replayed.push(event);
        }
        assert!(replayed.contains(&StoreEvent {
            path: PLAYERS.into(),
            change: Change::ValueChanged(None),
        }));
        assert!(replayed.contains(&StoreEvent {
            path: PARTICLES.into(),
            change: Change::ValueChanged(None),
        }));

        let other = store.connect();
        other.set("particles/p1", json!({ "id": "p1" })).await.unwrap();
        let mut changes = Vec::new();
        while let Ok(event) = rx.try_recv() {
            changes.push(event.change);
        }
        assert!(changes.iter().any(|c| matches!(c, Change::ChildAdded { key, .. } if key == "p1")));
        assert!(changes.iter().any(|c| matches!(c, Change::ValueChanged(Some(_)))));
    }
}
