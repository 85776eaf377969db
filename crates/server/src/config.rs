//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub game: GameConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("config.toml"))
    }

    /// Load configuration from `path`, writing the defaults there if missing.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No {:?} found, creating default config", path);
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }
}

/// Server networking and scheduling settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Connections per IP limit.
    #[serde(default = "default_ip_limit")]
    pub ip_limit: usize,
    /// Room tick interval in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            max_connections: default_max_connections(),
            ip_limit: default_ip_limit(),
            tick_interval_ms: default_tick_interval(),
        }
    }
}

fn default_port() -> u16 {
    5001
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_max_connections() -> usize {
    200
}
fn default_ip_limit() -> usize {
    16
}
fn default_tick_interval() -> u64 {
    50
}

/// Gameplay rules shared by every room.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct GameConfig {
    /// Lives each player starts with.
    #[serde(default = "default_starting_lives")]
    pub starting_lives: i32,
    /// Enemy tanks spawned per level.
    #[serde(default = "default_enemies_per_level")]
    pub enemies_per_level: u32,
    /// Enemy tanks alive at the same time.
    #[serde(default = "default_max_live_enemies")]
    pub max_live_enemies: usize,
    /// Pause between level completion and the next level.
    #[serde(default = "default_level_transition")]
    pub level_transition_ms: u64,
    /// Retry delay when the enemy cap is reached.
    #[serde(default = "default_spawn_retry")]
    pub spawn_retry_ms: u64,
    #[serde(default = "default_enemy_spawn_min")]
    pub enemy_spawn_min_ms: u64,
    #[serde(default = "default_enemy_spawn_max")]
    pub enemy_spawn_max_ms: u64,
    #[serde(default = "default_power_up_spawn_min")]
    pub power_up_spawn_min_ms: u64,
    #[serde(default = "default_power_up_spawn_max")]
    pub power_up_spawn_max_ms: u64,
    /// How long an uncollected power-up stays on the map.
    #[serde(default = "default_power_up_lifetime")]
    pub power_up_lifetime_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_lives: default_starting_lives(),
            enemies_per_level: default_enemies_per_level(),
            max_live_enemies: default_max_live_enemies(),
            level_transition_ms: default_level_transition(),
            spawn_retry_ms: default_spawn_retry(),
            enemy_spawn_min_ms: default_enemy_spawn_min(),
            enemy_spawn_max_ms: default_enemy_spawn_max(),
            power_up_spawn_min_ms: default_power_up_spawn_min(),
            power_up_spawn_max_ms: default_power_up_spawn_max(),
            power_up_lifetime_ms: default_power_up_lifetime(),
        }
    }
}

fn default_starting_lives() -> i32 {
    3
}
fn default_enemies_per_level() -> u32 {
    20
}
fn default_max_live_enemies() -> usize {
    4
}
fn default_level_transition() -> u64 {
    5000
}
fn default_spawn_retry() -> u64 {
    2000
}
fn default_enemy_spawn_min() -> u64 {
    2000
}
fn default_enemy_spawn_max() -> u64 {
    5000
}
fn default_power_up_spawn_min() -> u64 {
    30000
}
fn default_power_up_spawn_max() -> u64 {
    60000
}
fn default_power_up_lifetime() -> u64 {
    20000
}
