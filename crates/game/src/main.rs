//! Headless blob arena.
//!
//! Runs a local player and a few wandering opponents against an in-process
//! store and logs the leaderboard until interrupted.

use game::world;
use game::{spawn_session, Config, GameHandle, MemoryStore, NullSurface};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const OPPONENTS: usize = 3;
const STEER_INTERVAL: Duration = Duration::from_millis(750);
const REPORT_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Blob Arena v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("Loaded configuration");
    info!("  World: {}x{}", config.world.width, config.world.height);
    info!("  Tick rate: {} ticks/s", config.game.ticks_per_second);
    info!("  Growth: {:?}, particle ids: {:?}", config.game.growth_source, config.game.particle_identity);

    let name = std::env::args().nth(1).unwrap_or_else(|| "player".to_string());
    let store = MemoryStore::new();

    let mut sessions = Vec::with_capacity(OPPONENTS + 1);
    for i in 0..=OPPONENTS {
        let player_name = if i == 0 { name.clone() } else { format!("bot-{i}") };
        let color = world::random_color().to_hex();
        let (handle, task) = spawn_session(config.clone(), store.connect(), Box::new(NullSurface));
        handle.try_start_game(&player_name, &color, None).await?;
        sessions.push((handle, task));
    }
    info!("{} sessions running, press Ctrl+C to stop", sessions.len());

    let mut steer = tokio::time::interval(STEER_INTERVAL);
    let mut report = tokio::time::interval(REPORT_INTERVAL);
    let (width, height) = (config.world.width, config.world.height);

    loop {
        tokio::select! {
            _ = steer.tick() => {
                for (handle, _) in &sessions {
                    let target = {
                        let mut rng = rand::rng();
                        glam::Vec2::new(rng.random_range(0.0..=width), rng.random_range(0.0..=height))
                    };
                    if let Err(e) = handle.set_target(target) {
                        warn!("Failed to steer: {}", e);
                    }
                }
            }
            _ = report.tick() => {
                log_leaderboard(&sessions[0].0).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    for (handle, task) in sessions {
        handle.shutdown()?;
        task.await?;
    }
    Ok(())
}

async fn log_leaderboard(handle: &GameHandle) {
    let board = match handle.leaderboard().await {
        Ok(board) => board,
        Err(e) => {
            warn!("Leaderboard unavailable: {}", e);
            return;
        }
    };
    info!("Leaderboard ({} alive):", board.len());
    for (rank, entry) in board.iter().take(10).enumerate() {
        let marker = if entry.is_local { " (you)" } else { "" };
        info!("  {:>2}. {:<16} {:>6}{}", rank + 1, entry.name, entry.points, marker);
    }
    if let Ok(status) = handle.status().await {
        if !status.player_alive {
            info!("You were eaten; {} particles remain", status.particles);
        }
    }
}
