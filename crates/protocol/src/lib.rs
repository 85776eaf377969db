//! Shared protocol crate for the tank arena server.
//!
//! This crate contains:
//! - Client -> server and server -> client message definitions
//! - Game-state snapshot views broadcast every tick
//! - Shared types (Direction, TilePos, tank and power-up kinds)
//!
//! Messages travel as JSON text frames shaped `{"event": ..., "data": ...}`.

mod error;
pub mod packets;

pub use error::ProtocolError;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Side length of the square arena, in tiles.
pub const MAP_SIZE: usize = 26;

/// Connection-scoped player identifier.
pub type PlayerId = u32;

/// Facing / movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All four directions in a fixed order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit step in tile space (y grows downward).
    #[inline]
    pub fn vector(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
        }
    }
}

/// Integer tile coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile center as a continuous position.
    #[inline]
    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    /// Chebyshev distance between two tiles.
    #[inline]
    pub fn chebyshev(self, other: TilePos) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

/// Enemy tank variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    Basic,
    Fast,
    Power,
    Armor,
}

/// Power-up variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUpKind {
    Helmet,
    Clock,
    Shovel,
    Star,
    Grenade,
    Tank,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 6] = [
        PowerUpKind::Helmet,
        PowerUpKind::Clock,
        PowerUpKind::Shovel,
        PowerUpKind::Star,
        PowerUpKind::Grenade,
        PowerUpKind::Tank,
    ];
}

/// Explosion size hint for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplosionSize {
    Small,
    Large,
}

/// Sound cues the client plays on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sound {
    Shoot,
    Explosion,
    PlayerDeath,
    WallHit,
    LevelComplete,
    LifeUp,
    Improvement,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_vectors_are_unit_steps() {
        for dir in Direction::ALL {
            assert_eq!(dir.vector().length(), 1.0);
        }
        assert_eq!(Direction::Up.vector().y, -1.0);
    }

    #[test]
    fn test_chebyshev() {
        let base = TilePos::new(12, 24);
        assert_eq!(base.chebyshev(TilePos::new(10, 22)), 2);
        assert_eq!(base.chebyshev(TilePos::new(12, 21)), 3);
    }
}
