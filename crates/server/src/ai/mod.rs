//! Enemy tank AI.

mod enemy_ai;

pub use enemy_ai::{heading_towards, update_enemies};
