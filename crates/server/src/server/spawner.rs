//! Enemy and power-up spawning.
//!
//! Both spawners are driven by self-rescheduling room timers; this module only
//! decides what a single firing does and how long to wait for the next one.

use super::game::GameState;
use crate::entity::{EnemyTank, PowerUp};
use crate::world::World;
use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::time::Duration;
use tank_protocol::packets::{EnemyView, PowerUpView};
use tank_protocol::{EnemyKind, PowerUpKind};

/// Columns enemies enter from, on row 0.
pub const ENEMY_SPAWN_COLUMNS: [f32; 3] = [2.0, 12.0, 22.0];

/// Weighted type table; the level scales how far into it a roll may reach.
const ENEMY_TYPE_TABLE: [EnemyKind; 5] = [
    EnemyKind::Basic,
    EnemyKind::Basic,
    EnemyKind::Fast,
    EnemyKind::Power,
    EnemyKind::Armor,
];

/// Chance a spawned enemy carries a power-up.
const CARRIER_CHANCE: f64 = 0.1;
/// Every n-th spawn of a level is always a carrier.
const CARRIER_EVERY: u32 = 10;

/// Result of one enemy spawner firing.
#[derive(Debug, Clone, PartialEq)]
pub enum EnemySpawn {
    Spawned(EnemyView),
    /// Cap reached or paused; try again shortly without using up the quota.
    Retry,
    /// Nothing left to spawn this level; stop rescheduling.
    Exhausted,
}

/// Pick an enemy type for `level` from a uniform roll `r` in [0, 1).
pub fn enemy_kind_for(level: u32, r: f64) -> EnemyKind {
    let reach = 1.0 + f64::from(level) / 2.0;
    let idx = ((r * reach).floor() as usize).min(ENEMY_TYPE_TABLE.len() - 1);
    ENEMY_TYPE_TABLE[idx]
}

/// One enemy spawner firing.
pub fn spawn_enemy<R: Rng>(game: &mut GameState, rng: &mut R) -> EnemySpawn {
    if game.remaining_enemies == 0 {
        return EnemySpawn::Exhausted;
    }
    if game.is_paused || game.world.enemy_tanks.len() >= game.rules.max_live_enemies {
        return EnemySpawn::Retry;
    }

    let x = ENEMY_SPAWN_COLUMNS[rng.random_range(0..ENEMY_SPAWN_COLUMNS.len())];
    let kind = enemy_kind_for(game.level, rng.random::<f64>());
    let carrier =
        rng.random_bool(CARRIER_CHANCE) || game.spawned_this_level() % CARRIER_EVERY == 0;

    let id = game.world.next_id();
    let enemy = EnemyTank::new(id, kind, Vec2::new(x, 0.0), carrier);
    // Views carry timestamps only for frozen tanks; a fresh one never is.
    let view = enemy.view(0);
    game.world.enemy_tanks.push(enemy);
    game.remaining_enemies -= 1;

    EnemySpawn::Spawned(view)
}

/// Delay before the next enemy spawner firing.
pub fn next_enemy_delay<R: Rng>(game: &GameState, outcome: &EnemySpawn, rng: &mut R) -> Option<Duration> {
    let rules = &game.rules;
    match outcome {
        EnemySpawn::Spawned(_) => Some(Duration::from_millis(
            rng.random_range(rules.enemy_spawn_min_ms..rules.enemy_spawn_max_ms.max(rules.enemy_spawn_min_ms + 1)),
        )),
        EnemySpawn::Retry => Some(Duration::from_millis(rules.spawn_retry_ms)),
        EnemySpawn::Exhausted => None,
    }
}

/// Delay before the next power-up spawner firing.
pub fn next_power_up_delay<R: Rng>(game: &GameState, rng: &mut R) -> Duration {
    let rules = &game.rules;
    Duration::from_millis(
        rng.random_range(rules.power_up_spawn_min_ms..rules.power_up_spawn_max_ms.max(rules.power_up_spawn_min_ms + 1)),
    )
}

/// Put a random power-up on a random free tile. Returns `None` if the map
/// has no free tile.
pub fn place_power_up<R: Rng>(world: &mut World, now: u64, lifetime_ms: u64, rng: &mut R) -> Option<PowerUpView> {
    let tile = *world.free_tiles().choose(rng)?;
    let kind = PowerUpKind::ALL[rng.random_range(0..PowerUpKind::ALL.len())];
    let id = world.next_id();
    let power_up = PowerUp {
        id,
        tile,
        kind,
        created_at: now,
        expires_at: now + lifetime_ms,
    };
    let view = power_up.view();
    world.power_ups.push(power_up);
    Some(view)
}

/// One power-up spawner firing. Only one power-up may exist at a time.
pub fn spawn_power_up<R: Rng>(game: &mut GameState, now: u64, rng: &mut R) -> Option<PowerUpView> {
    if game.game_over || game.is_paused || !game.world.power_ups.is_empty() {
        return None;
    }
    let lifetime = game.rules.power_up_lifetime_ms;
    place_power_up(&mut game.world, now, lifetime, rng)
}
