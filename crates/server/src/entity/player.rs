//! Room members.

use tank_protocol::PlayerId;
use tank_protocol::packets::{PlayerStats, PlayerView};

use super::player_tank::MAX_STARS;

/// A room member and their persistent stats.
#[derive(Debug, Clone)]
pub struct Player {
    /// Connection ID.
    pub id: PlayerId,
    pub ready: bool,
    pub lives: i32,
    pub score: u32,
    /// Star level, 0..=3.
    pub stars: u8,
}

impl Player {
    pub fn new(id: PlayerId, lives: i32) -> Self {
        Self {
            id,
            ready: false,
            lives,
            score: 0,
            stars: 0,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.lives > 0
    }

    /// Raise the star level by one, capped. Returns the new level.
    pub fn add_star(&mut self) -> u8 {
        self.stars = (self.stars + 1).min(MAX_STARS);
        self.stars
    }

    pub fn view(&self, slot: usize) -> PlayerView {
        PlayerView {
            id: self.id,
            ready: self.ready,
            tank_type: format!("player{}", slot + 1),
            lives: self.lives,
            score: self.score,
            stars: self.stars,
        }
    }

    pub fn stats(&self) -> PlayerStats {
        PlayerStats {
            id: self.id,
            score: self.score,
            lives: self.lives,
        }
    }
}
