//! Per-tick decisions for enemy tanks.
//!
//! Each enemy acts on its own: it may reconsider its heading (sometimes
//! aiming at the closest player), tries to drive forward, picks a free
//! direction when blocked, and fires on a cooldown-gated roll.

use crate::collision::{ENEMY_TOLERANCE, Mover, is_blocked};
use crate::entity::{Bullet, ENEMY_BULLET_SPEED, Faction, Tank};
use crate::world::World;
use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use tank_protocol::Direction;

/// Axis-aligned heading from `from` towards `to`, along the axis with the
/// larger gap. Ties go horizontal.
pub fn heading_towards(from: Vec2, to: Vec2) -> Direction {
    let delta = to - from;
    if delta.x.abs() >= delta.y.abs() {
        if delta.x > 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if delta.y > 0.0 {
        Direction::Down
    } else {
        Direction::Up
    }
}

fn random_direction<R: Rng>(rng: &mut R) -> Direction {
    Direction::ALL[rng.random_range(0..Direction::ALL.len())]
}

/// Run one AI step for every enemy. Returns the number of shots fired.
pub fn update_enemies<R: Rng>(world: &mut World, now: u64, rng: &mut R) -> u32 {
    let mut shots = 0;
    for idx in 0..world.enemy_tanks.len() {
        {
            let enemy = &mut world.enemy_tanks[idx];
            if enemy.is_frozen(now) {
                continue;
            }
            enemy.frozen_until = None;
        }

        reconsider_heading(world, idx, rng);
        drive(world, idx, rng);
        if try_fire(world, idx, now, rng) {
            shots += 1;
        }
    }
    shots
}

fn reconsider_heading<R: Rng>(world: &mut World, idx: usize, rng: &mut R) {
    let (position, profile) = {
        let enemy = &world.enemy_tanks[idx];
        (enemy.position, enemy.profile())
    };
    if !rng.random_bool(profile.direction_change_chance) {
        return;
    }
    let aim = rng.random_bool(profile.target_chance);
    let heading = pick_heading(world, position, aim, rng);
    world.enemy_tanks[idx].direction = heading;
}

/// New heading for an enemy at `position`: towards the closest player tank
/// when aiming and one is live, otherwise random.
fn pick_heading<R: Rng>(world: &World, position: Vec2, aim: bool, rng: &mut R) -> Direction {
    let nearest = aim
        .then(|| {
            world
                .tanks
                .iter()
                .map(|t| t.position)
                .min_by(|a, b| a.distance_squared(position).total_cmp(&b.distance_squared(position)))
        })
        .flatten();

    match nearest {
        Some(target) => heading_towards(position, target),
        None => random_direction(rng),
    }
}

fn drive<R: Rng>(world: &mut World, idx: usize, rng: &mut R) {
    let (id, from, direction) = {
        let enemy = &world.enemy_tanks[idx];
        (enemy.id, enemy.position, enemy.direction)
    };
    let mover = Mover::Enemy(id);
    let candidate = world.enemy_tanks[idx].step_towards(direction);

    if !is_blocked(world, mover, from, candidate, &ENEMY_TOLERANCE) {
        world.enemy_tanks[idx].position = candidate;
        return;
    }

    let open: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|&dir| {
            let to = world.enemy_tanks[idx].step_towards(dir);
            !is_blocked(world, mover, from, to, &ENEMY_TOLERANCE)
        })
        .collect();

    world.enemy_tanks[idx].direction = match open.choose(rng) {
        Some(&dir) => dir,
        None => random_direction(rng),
    };
}

fn try_fire<R: Rng>(world: &mut World, idx: usize, now: u64, rng: &mut R) -> bool {
    let enemy = &world.enemy_tanks[idx];
    if !enemy.cooldown_ready(now) || !rng.random_bool(enemy.profile().shoot_chance) {
        return false;
    }

    let (owner, origin, position, direction, power) = (
        enemy.id,
        enemy.position,
        enemy.muzzle(),
        enemy.direction,
        enemy.profile().bullet_power,
    );
    let id = world.next_id();
    world.bullets.push(Bullet {
        id,
        owner,
        faction: Faction::Enemy,
        position,
        direction,
        speed: ENEMY_BULLET_SPEED,
        power,
        swept_from: origin,
    });
    world.enemy_tanks[idx].last_shot = Some(now);
    true
}
