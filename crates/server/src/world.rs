//! World state management.
//!
//! Holds every entity of one room's arena together with the terrain.

use crate::entity::{Bullet, EnemyTank, Explosion, Faction, PlayerTank, PowerUp};
use crate::map::Map;
use glam::Vec2;
use tank_protocol::packets::{BulletView, EnemyView, ExplosionView, PowerUpView, TankView};
use tank_protocol::{ExplosionSize, MAP_SIZE, PlayerId, TilePos};

/// All entities of one arena.
#[derive(Debug, Clone)]
pub struct World {
    /// Next entity ID to assign.
    next_id: u32,
    /// Player tanks still in play, in membership order.
    pub tanks: Vec<PlayerTank>,
    pub enemy_tanks: Vec<EnemyTank>,
    pub bullets: Vec<Bullet>,
    /// Never more than one.
    pub power_ups: Vec<PowerUp>,
    pub explosions: Vec<Explosion>,
    pub map: Map,
}

impl World {
    pub fn new(map: Map) -> Self {
        Self {
            next_id: 1,
            tanks: Vec::with_capacity(2),
            enemy_tanks: Vec::with_capacity(4),
            bullets: Vec::with_capacity(16),
            power_ups: Vec::with_capacity(1),
            explosions: Vec::with_capacity(16),
            map,
        }
    }

    /// Get the next entity ID.
    pub fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        if self.next_id == 0 {
            self.next_id = 1; // Skip 0
        }
        id
    }

    #[inline]
    pub fn tank(&self, id: PlayerId) -> Option<&PlayerTank> {
        self.tanks.iter().find(|t| t.id == id)
    }

    #[inline]
    pub fn tank_mut(&mut self, id: PlayerId) -> Option<&mut PlayerTank> {
        self.tanks.iter_mut().find(|t| t.id == id)
    }

    pub fn remove_tank(&mut self, id: PlayerId) -> Option<PlayerTank> {
        let idx = self.tanks.iter().position(|t| t.id == id)?;
        Some(self.tanks.remove(idx))
    }

    /// Bullets in flight fired by one shooter.
    pub fn live_bullets(&self, faction: Faction, owner: u32) -> usize {
        self.bullets.iter().filter(|b| b.is_from(faction, owner)).count()
    }

    pub fn spawn_explosion(&mut self, position: Vec2, size: ExplosionSize) {
        self.explosions.push(Explosion::new(position, size));
    }

    /// Tiles where a power-up may be placed: no blocking terrain and no tank
    /// of either side within one tile.
    pub fn free_tiles(&self) -> Vec<TilePos> {
        let size = MAP_SIZE as i32;
        let mut tiles = Vec::new();
        for y in 0..size {
            for x in 0..size {
                let tile = TilePos::new(x, y);
                if self.map.blocks_tanks(tile) {
                    continue;
                }
                let center = tile.as_vec2();
                let occupied = self
                    .tanks
                    .iter()
                    .map(|t| t.position)
                    .chain(self.enemy_tanks.iter().map(|e| e.position))
                    .any(|p| (p.x - center.x).abs() < 1.0 && (p.y - center.y).abs() < 1.0);
                if !occupied {
                    tiles.push(tile);
                }
            }
        }
        tiles
    }

    /// Swap in a new map and drop everything but the player tanks.
    pub fn reset_for_level(&mut self, map: Map) {
        self.map = map;
        self.enemy_tanks.clear();
        self.bullets.clear();
        self.power_ups.clear();
        self.explosions.clear();
    }

    pub fn tank_views(&self, now: u64) -> Vec<TankView> {
        self.tanks.iter().map(|t| t.view(now)).collect()
    }

    pub fn enemy_views(&self, now: u64) -> Vec<EnemyView> {
        self.enemy_tanks.iter().map(|e| e.view(now)).collect()
    }

    pub fn bullet_views(&self) -> Vec<BulletView> {
        self.bullets.iter().map(Bullet::view).collect()
    }

    pub fn power_up_views(&self) -> Vec<PowerUpView> {
        self.power_ups.iter().map(PowerUp::view).collect()
    }

    pub fn explosion_views(&self) -> Vec<ExplosionView> {
        self.explosions.iter().map(Explosion::view).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EnemyTank;
    use tank_protocol::EnemyKind;

    #[test]
    fn test_ids_are_unique() {
        let mut world = World::new(Map::default());
        let a = world.next_id();
        let b = world.next_id();
        assert_ne!(a, b);
        assert_ne!(a, 0);
    }

    #[test]
    fn test_free_tiles_exclude_terrain_and_tanks() {
        let mut world = World::new(Map::default_layout());
        world.tanks.push(PlayerTank::new(1, Vec2::new(8.0, 24.0), 0, 0));
        world
            .enemy_tanks
            .push(EnemyTank::new(2, EnemyKind::Basic, Vec2::new(2.5, 0.0), false));

        let free = world.free_tiles();
        assert!(!free.contains(&TilePos::new(0, 10))); // brick
        assert!(!free.contains(&TilePos::new(4, 12))); // steel
        assert!(!free.contains(&TilePos::new(10, 15))); // water
        assert!(!free.contains(&TilePos::new(12, 24))); // base
        assert!(!free.contains(&TilePos::new(8, 24)));
        assert!(!free.contains(&TilePos::new(2, 0)));
        assert!(!free.contains(&TilePos::new(3, 0)));
        assert!(free.contains(&TilePos::new(9, 23)));
        assert!(free.contains(&TilePos::new(3, 11))); // trees are fine
    }

    #[test]
    fn test_reset_keeps_player_tanks() {
        let mut world = World::new(Map::default_layout());
        world.tanks.push(PlayerTank::new(1, Vec2::new(8.0, 24.0), 0, 0));
        world
            .enemy_tanks
            .push(EnemyTank::new(2, EnemyKind::Basic, Vec2::new(2.0, 0.0), false));
        world.spawn_explosion(Vec2::ZERO, ExplosionSize::Small);

        world.reset_for_level(Map::generate(2));
        assert_eq!(world.tanks.len(), 1);
        assert!(world.enemy_tanks.is_empty());
        assert!(world.explosions.is_empty());
    }
}
