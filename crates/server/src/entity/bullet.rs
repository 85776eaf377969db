//! Bullets.

use glam::Vec2;
use tank_protocol::packets::BulletView;
use tank_protocol::{Direction, TilePos};

/// Which side fired a bullet. Bullets never hurt their own side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Faction {
    Player,
    Enemy,
}

#[derive(Debug, Clone)]
pub struct Bullet {
    pub id: u32,
    /// Shooter's tank ID (player ID or enemy ID, see `faction`).
    pub owner: u32,
    pub faction: Faction,
    pub position: Vec2,
    pub direction: Direction,
    pub speed: f32,
    pub power: u8,
    /// Last point already tested for hits. Starts at the shooter's centre,
    /// so the first tick also covers the gap up to the muzzle.
    pub swept_from: Vec2,
}

/// Longest gap between two hit tests along a bullet's path.
const SWEEP_STEP: f32 = 0.25;

impl Bullet {
    /// Advance one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.position += self.direction.vector() * self.speed;
    }

    /// Points between `swept_from` (exclusive) and the current position
    /// (inclusive), at most `SWEEP_STEP` apart.
    pub fn path_samples(&self) -> impl Iterator<Item = Vec2> + use<> {
        let from = self.swept_from;
        let delta = self.position - from;
        let steps = (delta.length() / SWEEP_STEP).ceil().max(1.0) as u32;
        (1..=steps).map(move |k| from + delta * (k as f32 / steps as f32))
    }

    /// Tile the bullet is currently over.
    #[inline]
    pub fn tile(&self) -> TilePos {
        TilePos::new(self.position.x.round() as i32, self.position.y.round() as i32)
    }

    pub fn is_from(&self, faction: Faction, owner: u32) -> bool {
        self.faction == faction && self.owner == owner
    }

    pub fn view(&self) -> BulletView {
        BulletView {
            id: self.id,
            tank_id: self.owner,
            x: self.position.x,
            y: self.position.y,
            direction: self.direction,
            speed: self.speed,
            power: self.power,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_samples_cover_gap_from_shooter() {
        let bullet = Bullet {
            id: 1,
            owner: 1,
            faction: Faction::Enemy,
            position: Vec2::new(12.0, 22.75),
            direction: Direction::Down,
            speed: 0.25,
            power: 1,
            swept_from: Vec2::new(12.0, 21.5),
        };
        let ys: Vec<f32> = bullet.path_samples().map(|p| p.y).collect();
        assert_eq!(ys.len(), 5);
        assert!((ys[0] - 21.75).abs() < 1e-5);
        assert_eq!(*ys.last().unwrap(), 22.75);
        assert!(ys.windows(2).all(|w| w[1] - w[0] <= SWEEP_STEP + 1e-5));
    }

    #[test]
    fn test_path_samples_without_movement_test_current_position() {
        let bullet = Bullet {
            id: 1,
            owner: 1,
            faction: Faction::Player,
            position: Vec2::new(3.0, 3.0),
            direction: Direction::Up,
            speed: 0.3,
            power: 1,
            swept_from: Vec2::new(3.0, 3.0),
        };
        assert_eq!(bullet.path_samples().collect::<Vec<_>>(), vec![Vec2::new(3.0, 3.0)]);
    }
}
