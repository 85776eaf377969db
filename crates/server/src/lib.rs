//! Authoritative tank arena game server library.

pub mod ai;
pub mod collision;
pub mod config;
pub mod entity;
pub mod highscores;
pub mod map;
pub mod server;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use server::{RoomManager, run};
