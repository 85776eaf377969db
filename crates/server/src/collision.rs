//! Movement collision checks.
//!
//! Answers whether a tank may occupy a candidate position. Players and enemies
//! use different tolerance bands: enemies get tighter boxes so they do not
//! gridlock around spawn points and corridors.

use crate::world::World;
use glam::Vec2;
use tank_protocol::{PlayerId, TilePos};

/// Box half-extents and map bounds used for one kind of mover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Lowest allowed coordinate on either axis.
    pub min_bound: f32,
    /// Highest allowed coordinate on either axis.
    pub max_bound: f32,
    /// Whether a position exactly on a bound is allowed.
    pub inclusive_bounds: bool,
    /// Reach against brick, steel, water and the base.
    pub terrain: f32,
    pub player_tanks: f32,
    pub enemy_tanks: f32,
}

pub const PLAYER_TOLERANCE: Tolerance = Tolerance {
    min_bound: 0.0,
    max_bound: 25.0,
    inclusive_bounds: true,
    terrain: 0.75,
    player_tanks: 0.75,
    enemy_tanks: 0.75,
};

pub const ENEMY_TOLERANCE: Tolerance = Tolerance {
    min_bound: 0.1,
    max_bound: 24.9,
    inclusive_bounds: false,
    terrain: 0.5,
    player_tanks: 0.4,
    enemy_tanks: 0.3,
};

/// The tank being moved; it never collides with itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mover {
    Player(PlayerId),
    Enemy(u32),
}

impl Tolerance {
    fn axis_in_bounds(&self, v: f32) -> bool {
        if self.inclusive_bounds {
            v >= self.min_bound && v <= self.max_bound
        } else {
            v > self.min_bound && v < self.max_bound
        }
    }

    /// A move out of bounds is rejected unless it heads back inside, so a tank
    /// placed on the edge is never pinned there.
    fn allows_axis(&self, from: f32, to: f32) -> bool {
        if self.axis_in_bounds(to) {
            return true;
        }
        if to < self.min_bound || (!self.inclusive_bounds && to <= self.min_bound) {
            to > from
        } else {
            to < from
        }
    }
}

/// Whether `a` and `b` overlap as axis-aligned boxes of half-extent `reach`.
#[inline]
pub fn overlaps(a: Vec2, b: Vec2, reach: f32) -> bool {
    (a.x - b.x).abs() < reach && (a.y - b.y).abs() < reach
}

/// Whether moving `mover` from `from` to `to` is blocked.
pub fn is_blocked(world: &World, mover: Mover, from: Vec2, to: Vec2, tolerance: &Tolerance) -> bool {
    if !tolerance.allows_axis(from.x, to.x) || !tolerance.allows_axis(from.y, to.y) {
        return true;
    }

    if hits_terrain(world, to, tolerance.terrain) {
        return true;
    }

    let player_hit = world.tanks.iter().any(|tank| {
        mover != Mover::Player(tank.id) && overlaps(to, tank.position, tolerance.player_tanks)
    });
    if player_hit {
        return true;
    }

    world.enemy_tanks.iter().any(|enemy| {
        mover != Mover::Enemy(enemy.id) && overlaps(to, enemy.position, tolerance.enemy_tanks)
    })
}

/// Terrain test over the handful of tiles the box can touch.
fn hits_terrain(world: &World, pos: Vec2, reach: f32) -> bool {
    let min_x = (pos.x - reach).floor() as i32;
    let max_x = (pos.x + reach).ceil() as i32;
    let min_y = (pos.y - reach).floor() as i32;
    let max_y = (pos.y + reach).ceil() as i32;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let tile = TilePos::new(x, y);
            if world.map.blocks_tanks(tile) && overlaps(pos, tile.as_vec2(), reach) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EnemyTank, PlayerTank};
    use crate::map::Map;
    use tank_protocol::EnemyKind;

    fn open_world() -> World {
        World::new(Map::empty(TilePos::new(12, 24)))
    }

    #[test]
    fn test_player_bounds_are_inclusive() {
        let world = open_world();
        let from = Vec2::new(0.05, 5.0);
        assert!(!is_blocked(&world, Mover::Player(1), from, Vec2::new(0.0, 5.0), &PLAYER_TOLERANCE));
        assert!(is_blocked(&world, Mover::Player(1), Vec2::new(0.0, 5.0), Vec2::new(-0.05, 5.0), &PLAYER_TOLERANCE));
    }

    #[test]
    fn test_enemy_bounds_are_exclusive_but_allow_leaving_the_edge() {
        let world = open_world();
        let mover = Mover::Enemy(1);
        // Sliding along the top edge is not allowed...
        assert!(is_blocked(&world, mover, Vec2::new(2.0, 0.0), Vec2::new(2.04, 0.0), &ENEMY_TOLERANCE));
        // ...but driving down into the field is.
        assert!(!is_blocked(&world, mover, Vec2::new(2.0, 0.0), Vec2::new(2.0, 0.04), &ENEMY_TOLERANCE));
        assert!(is_blocked(&world, mover, Vec2::new(5.0, 24.85), Vec2::new(5.0, 24.9), &ENEMY_TOLERANCE));
    }

    #[test]
    fn test_terrain_bands() {
        let mut world = open_world();
        world.map = Map::default_layout();
        // Brick at (0, 18) and (1, 18).
        let below = Vec2::new(1.0, 19.0);
        assert!(is_blocked(&world, Mover::Player(1), below, Vec2::new(1.0, 18.7), &PLAYER_TOLERANCE));
        assert!(!is_blocked(&world, Mover::Enemy(1), below, Vec2::new(1.0, 18.7), &ENEMY_TOLERANCE));
        assert!(is_blocked(&world, Mover::Enemy(1), below, Vec2::new(1.0, 18.45), &ENEMY_TOLERANCE));
    }

    #[test]
    fn test_trees_never_block() {
        let mut world = open_world();
        world.map = Map::default_layout();
        assert!(world.map.is_tree(TilePos::new(3, 10)));
        assert!(!is_blocked(&world, Mover::Player(1), Vec2::new(3.0, 11.5), Vec2::new(3.0, 11.0), &PLAYER_TOLERANCE));
    }

    #[test]
    fn test_tanks_block_each_other_but_not_themselves() {
        let mut world = open_world();
        world.tanks.push(PlayerTank::new(1, Vec2::new(5.0, 5.0), 0, 0));
        world.enemy_tanks.push(EnemyTank::new(7, EnemyKind::Basic, Vec2::new(10.0, 5.0), false));

        let near_player = Vec2::new(5.35, 5.0);
        assert!(!is_blocked(&world, Mover::Player(1), Vec2::new(5.3, 5.0), near_player, &PLAYER_TOLERANCE));
        assert!(is_blocked(&world, Mover::Player(2), Vec2::new(5.4, 5.0), near_player, &PLAYER_TOLERANCE));
        assert!(is_blocked(&world, Mover::Enemy(8), Vec2::new(5.4, 5.0), near_player, &ENEMY_TOLERANCE));

        let near_enemy = Vec2::new(10.35, 5.0);
        assert!(!is_blocked(&world, Mover::Enemy(8), Vec2::new(10.4, 5.0), near_enemy, &ENEMY_TOLERANCE));
        assert!(is_blocked(&world, Mover::Player(1), Vec2::new(10.4, 5.0), near_enemy, &PLAYER_TOLERANCE));
        assert!(!is_blocked(&world, Mover::Enemy(7), Vec2::new(10.0, 5.0), near_enemy, &ENEMY_TOLERANCE));
    }
}
