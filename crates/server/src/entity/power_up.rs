//! Collectible power-ups.

use tank_protocol::packets::PowerUpView;
use tank_protocol::{PowerUpKind, TilePos};

#[derive(Debug, Clone)]
pub struct PowerUp {
    pub id: u32,
    pub tile: TilePos,
    pub kind: PowerUpKind,
    pub created_at: u64,
    pub expires_at: u64,
}

impl PowerUp {
    #[inline]
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    pub fn view(&self) -> PowerUpView {
        PowerUpView {
            id: self.id,
            x: self.tile.x,
            y: self.tile.y,
            kind: self.kind,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}
