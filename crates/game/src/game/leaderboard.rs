//! Player boards shown next to the arena.

use super::Game;
use protocol::Color;

/// A leaderboard entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    /// Session id (None for a local player that has not signed in yet).
    pub id: Option<String>,
    pub name: String,
    pub points: u64,
    pub color: Color,
    pub border_color: Color,
    pub skin: Option<String>,
    /// Whether this is the local player.
    pub is_local: bool,
}

impl Game {
    /// Live entities and the local player, highest points first.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let local = self
            .player
            .iter()
            .filter(|p| p.is_alive())
            .map(|p| (&p.entity, true));
        let remote = self.entities.iter().filter(|e| e.is_alive).map(|e| (e, false));

        let mut entries: Vec<LeaderboardEntry> = local
            .chain(remote)
            .map(|(e, is_local)| LeaderboardEntry {
                id: e.id.clone(),
                name: e.name.clone(),
                points: e.points,
                color: e.color,
                border_color: e.border_color,
                skin: e.skin.clone(),
                is_local,
            })
            .collect();
        entries.sort_by(|a, b| b.points.cmp(&a.points));
        entries
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::game::Game;
    use glam::Vec2;
    use protocol::{Color, EntityRecord};

    fn record(id: &str, points: u64, alive: bool) -> EntityRecord {
        EntityRecord {
            id: id.into(),
            name: id.into(),
            position: Vec2::new(10.0, 10.0),
            color_rgb: Color::new(1, 2, 3),
            radius: 6.0,
            points,
            is_alive: alive,
            ..Default::default()
        }
    }

    #[test]
    fn test_sorted_by_points_and_skips_dead() {
        let mut game = Game::new(Config::default());
        assert!(game.start_game(Some("me"), Some("#102030"), None));
        game.apply_players_snapshot(vec![
            record("low", 10, true),
            record("dead", 9999, false),
            record("high", 500, true),
        ]);

        let board = game.leaderboard();
        let names: Vec<&str> = board.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["high", "low", "me"]);
        assert!(board[2].is_local);
        assert_eq!(board[2].color, Color::new(0x10, 0x20, 0x30));
    }
}
