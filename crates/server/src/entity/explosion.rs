//! Cosmetic explosions, kept in state so clients can animate them.

use glam::Vec2;
use tank_protocol::ExplosionSize;
use tank_protocol::packets::ExplosionView;

/// Explosions are dropped once they reach this age in ticks.
pub const EXPLOSION_LIFETIME_TICKS: u32 = 8;

#[derive(Debug, Clone)]
pub struct Explosion {
    pub position: Vec2,
    pub age: u32,
    pub size: ExplosionSize,
}

impl Explosion {
    pub fn new(position: Vec2, size: ExplosionSize) -> Self {
        Self {
            position,
            age: 0,
            size,
        }
    }

    /// Age by one tick. Returns false once the explosion should be dropped.
    #[inline]
    pub fn age_one_tick(&mut self) -> bool {
        self.age += 1;
        self.age < EXPLOSION_LIFETIME_TICKS
    }

    pub fn view(&self) -> ExplosionView {
        ExplosionView {
            x: self.position.x,
            y: self.position.y,
            age: self.age,
            size: self.size,
        }
    }
}
