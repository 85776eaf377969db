//! Game entities.
//!
//! This module defines every entity that lives in a room's game state.

mod bullet;
mod enemy;
mod explosion;
mod player;
mod player_tank;
mod power_up;
mod tank;

pub use bullet::{Bullet, Faction};
pub use enemy::{ENEMY_BULLET_SPEED, EnemyProfile, EnemyTank};
pub use explosion::{EXPLOSION_LIFETIME_TICKS, Explosion};
pub use player::Player;
pub use player_tank::{
    MAX_STARS, PlayerTank, SPAWN_INVINCIBILITY_MS, cadence_for_stars, spawn_point,
    speed_for_stars,
};
pub use power_up::PowerUp;
pub use tank::Tank;
