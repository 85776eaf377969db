//! Server -> Client message building.

use crate::{
    Direction, EnemyKind, ExplosionSize, PlayerId, PowerUpKind, ProtocolError, Sound, TilePos,
};
use serde::{Deserialize, Serialize};

/// Roster entry as shown in the lobby and HUD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub ready: bool,
    /// `player1` or `player2`, used by the client to pick a sprite.
    pub tank_type: String,
    pub lives: i32,
    pub score: u32,
    pub stars: u8,
}

/// A player-controlled tank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TankView {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub direction: Direction,
    pub speed: f32,
    pub shoot_speed: f32,
    pub invincible: bool,
    pub invincible_until: Option<u64>,
    pub can_shoot_multiple: bool,
    pub is_shielded: bool,
}

/// An AI-controlled tank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyView {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub direction: Direction,
    pub speed: f32,
    #[serde(rename = "type")]
    pub kind: EnemyKind,
    pub health: u8,
    pub carry_power_up: bool,
    pub frozen: bool,
    pub frozen_until: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletView {
    pub id: u32,
    pub tank_id: u32,
    pub x: f32,
    pub y: f32,
    pub direction: Direction,
    pub speed: f32,
    pub power: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerUpView {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub kind: PowerUpKind,
    pub created_at: u64,
    pub expires_at: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplosionView {
    pub x: f32,
    pub y: f32,
    pub age: u32,
    pub size: ExplosionSize,
}

/// Terrain layout as tile lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    pub walls: Vec<TilePos>,
    pub steel_walls: Vec<TilePos>,
    pub water: Vec<TilePos>,
    pub trees: Vec<TilePos>,
    pub base_position: TilePos,
}

/// Full game-state snapshot (no delta compression).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub tanks: Vec<TankView>,
    pub enemy_tanks: Vec<EnemyView>,
    pub bullets: Vec<BulletView>,
    pub power_ups: Vec<PowerUpView>,
    pub explosions: Vec<ExplosionView>,
    pub map: MapView,
    pub remaining_enemies: u32,
    pub level: u32,
    pub base_destroyed: bool,
    pub game_over: bool,
    pub level_completed: bool,
    pub is_paused: bool,
    pub players: Vec<PlayerView>,
}

/// Per-player result shown on the level-complete screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub id: PlayerId,
    pub score: u32,
    pub lives: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub name: String,
    pub score: u32,
}

/// Server -> client message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerPacket {
    // Unicast replies
    RoomCreated { room_id: String, player_id: PlayerId },
    RoomJoined { room_id: String, player_id: PlayerId },
    Error { message: String },
    HighScores(Vec<HighScoreEntry>),
    HighScoreSaved,

    // Roster
    PlayerJoined { player_id: PlayerId },
    PlayerLeft { player_id: PlayerId },
    PlayerStatusUpdate(Vec<PlayerView>),

    // Game flow
    GameStart(Box<GameSnapshot>),
    GameStateUpdate(Box<GameSnapshot>),
    GamePaused(bool),
    LevelComplete { level: u32, player_stats: Vec<PlayerStats> },
    LevelChanged { level: u32, map: MapView },
    GameOver { reason: String },
    GameEnded { reason: String },

    // Entity events
    EnemySpawned { enemy_tank: EnemyView },
    PowerUpSpawned { power_up: PowerUpView },
    PowerUpCollected {
        player_id: PlayerId,
        power_up_id: u32,
        power_up_type: PowerUpKind,
    },
    PowerUpsExpired { power_up_ids: Vec<u32> },
    PlayerPowerUpExpired { player_id: PlayerId, power_up: String },
    AllEnemiesDestroyed { player_id: PlayerId, count: u32 },
    PlayerGotExtraLife { player_id: PlayerId, lives: i32 },
    BaseWallsReverted,
    PlayerHit { player_id: PlayerId, lives: i32 },
    ScoreUpdate { player_id: PlayerId, score: u32 },
    PlaySound { sound: Sound },
}

impl ServerPacket {
    /// Encode as a JSON text frame.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Build an `error` reply.
    pub fn error(message: impl Into<String>) -> Self {
        ServerPacket::Error {
            message: message.into(),
        }
    }

    /// Whether this is the per-tick snapshot (very frequent; not worth logging).
    pub fn is_state_update(&self) -> bool {
        matches!(self, ServerPacket::GameStateUpdate(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_room_created() {
        let json = ServerPacket::RoomCreated {
            room_id: "ABC123".to_string(),
            player_id: 7,
        }
        .to_json()
        .unwrap();
        assert_eq!(
            json,
            r#"{"event":"roomCreated","data":{"roomId":"ABC123","playerId":7}}"#
        );
    }

    #[test]
    fn test_encode_paused_flag() {
        let json = ServerPacket::GamePaused(true).to_json().unwrap();
        assert_eq!(json, r#"{"event":"gamePaused","data":true}"#);
    }

    #[test]
    fn test_enemy_kind_field_is_named_type() {
        let view = EnemyView {
            id: 1,
            x: 2.0,
            y: 0.0,
            direction: Direction::Down,
            speed: 0.03,
            kind: EnemyKind::Armor,
            health: 4,
            carry_power_up: true,
            frozen: false,
            frozen_until: None,
        };
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["type"], "armor");
        assert_eq!(value["carryPowerUp"], true);
        assert_eq!(value["direction"], "down");
    }
}
