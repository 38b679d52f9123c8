//! Records mirrored through the realtime store.
//!
//! Records are flat JSON objects stored under `players/<id>` and
//! `particles/<id>`. Every field has a default so that partially written or
//! older records still decode.

use crate::{Color, ProtocolError, Vector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Collection holding one record per connected player.
pub const PLAYERS: &str = "players";
/// Collection holding one record per particle.
pub const PARTICLES: &str = "particles";

/// Store path of a player record.
pub fn player_path(id: &str) -> String {
    format!("{PLAYERS}/{id}")
}

/// Store path of a particle record.
pub fn particle_path(id: &str) -> String {
    format!("{PARTICLES}/{id}")
}

/// Remote view of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityRecord {
    pub id: String,
    pub name: String,
    #[serde(with = "xy")]
    pub position: Vector,
    #[serde(with = "xy")]
    pub direction: Vector,
    #[serde(with = "xy")]
    pub velocity: Vector,
    /// CSS form of `color_rgb`, kept for web clients.
    pub color: String,
    pub color_rgb: Color,
    pub border_color: String,
    pub radius: f32,
    pub skin: Option<String>,
    pub points: u64,
    pub is_alive: bool,
}

impl Default for EntityRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            position: Vector::ZERO,
            direction: Vector::ZERO,
            velocity: Vector::ZERO,
            color: Color::default().to_string(),
            color_rgb: Color::default(),
            border_color: Color::default().border().to_string(),
            radius: 0.0,
            skin: None,
            points: 0,
            is_alive: true,
        }
    }
}

impl EntityRecord {
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> Result<Value, ProtocolError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Remote view of a particle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleRecord {
    pub id: String,
    #[serde(with = "xy")]
    pub position: Vector,
    pub color: Color,
    pub radius: f32,
    pub points: u32,
}

impl ParticleRecord {
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> Result<Value, ProtocolError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Vectors travel as `{ "x": .., "y": .. }` objects.
mod xy {
    use crate::Vector;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize, Default)]
    #[serde(default)]
    struct Xy {
        x: f32,
        y: f32,
    }

    pub fn serialize<S: Serializer>(v: &Vector, serializer: S) -> Result<S::Ok, S::Error> {
        Xy { x: v.x, y: v.y }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vector, D::Error> {
        let xy = Xy::deserialize(deserializer)?;
        Ok(Vector::new(xy.x, xy.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_record_wire_shape() {
        let record = EntityRecord {
            id: "abc".into(),
            name: "blob".into(),
            position: Vector::new(10.0, 20.0),
            radius: 6.0,
            ..Default::default()
        };
        let value = record.to_value().unwrap();
        assert_eq!(value["position"], json!({ "x": 10.0, "y": 20.0 }));
        assert_eq!(value["is_alive"], json!(true));
        assert_eq!(value["skin"], Value::Null);
    }

    #[test]
    fn test_entity_record_partial_decode() {
        let record = EntityRecord::from_value(json!({
            "id": "p1",
            "position": { "x": 3.5 },
            "radius": 9.0
        }))
        .unwrap();
        assert_eq!(record.id, "p1");
        assert_eq!(record.position, Vector::new(3.5, 0.0));
        assert!(record.is_alive);
        assert_eq!(record.points, 0);
    }

    #[test]
    fn test_particle_record_rejects_wrong_types() {
        let err = ParticleRecord::from_value(json!({ "points": "lots" })).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidRecord(_)));
    }

    #[test]
    fn test_paths() {
        assert_eq!(player_path("u1"), "players/u1");
        assert_eq!(particle_path("10x20"), "particles/10x20");
    }
}
