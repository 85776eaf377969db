//! A game room: membership, lifecycle and the level state machine.
//!
//! Every method here is synchronous and runs under the room's mutex. Timers
//! live in [`RoomTimers`]; the async loops that drive them are in
//! [`super::scheduler`].

use super::error::RoomError;
use super::game::{GameState, Outcome, PendingBroadcasts};
use super::scheduler::RoomTimers;
use super::spawner::{self, EnemySpawn};
use crate::config::GameConfig;
use crate::entity::Player;
use crate::map::Map;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tank_protocol::packets::{InputState, ServerPacket};
use tank_protocol::{PlayerId, Sound};
use tokio::sync::{Mutex, broadcast};
use tokio::time::Instant;
use tracing::{debug, info};

/// Members per room.
pub const MAX_PLAYERS: usize = 2;

const BROADCAST_CAPACITY: usize = 512;

/// A room behind its lock, shared between the registry and timer tasks.
pub type SharedRoom = Arc<Mutex<Room>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Waiting,
    Playing,
    /// A member left mid-game.
    Ended,
    GameOver,
}

/// What the tick loop must do after a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickFlow {
    /// False once the room left `playing`; the loop must stop.
    pub running: bool,
    /// Schedule the level transition.
    pub level_complete: bool,
    /// (Re)arm the shovel revert timer.
    pub shovel_armed: bool,
}

#[derive(Debug)]
pub struct Room {
    pub id: String,
    pub status: RoomStatus,
    /// Members in join order; the index is the spawn slot.
    pub players: Vec<Player>,
    pub game: GameState,
    pub timers: RoomTimers,
    pub tick_interval: Duration,
    rules: GameConfig,
    rng: StdRng,
    /// Zero point of the room clock.
    epoch: Instant,
    tx: broadcast::Sender<Arc<ServerPacket>>,
}

impl Room {
    pub fn new(id: String, rules: GameConfig, tick_interval: Duration) -> Self {
        Self::with_rng(id, rules, tick_interval, StdRng::from_os_rng())
    }

    pub fn with_rng(id: String, rules: GameConfig, tick_interval: Duration, rng: StdRng) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            id,
            status: RoomStatus::Waiting,
            players: Vec::with_capacity(MAX_PLAYERS),
            game: GameState::new(Map::default(), rules),
            timers: RoomTimers::default(),
            tick_interval,
            rules,
            rng,
            epoch: Instant::now(),
            tx,
        }
    }

    /// Milliseconds since the room was created.
    #[inline]
    pub fn now(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ServerPacket>> {
        self.tx.subscribe()
    }

    /// Send to every member. Nobody listening is not an error.
    pub fn broadcast(&self, packet: ServerPacket) {
        let _ = self.tx.send(Arc::new(packet));
    }

    fn flush(&self, pending: PendingBroadcasts) {
        for packet in pending.events {
            self.broadcast(packet);
        }
    }

    #[inline]
    pub fn is_member(&self, player_id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Add a member. Only waiting rooms with a free slot accept players.
    pub fn add_player(&mut self, player_id: PlayerId) -> Result<(), RoomError> {
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameInProgress);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(RoomError::RoomFull);
        }
        if !self.is_member(player_id) {
            self.players.push(Player::new(player_id, self.rules.starting_lives));
        }
        Ok(())
    }

    fn roster(&self) -> ServerPacket {
        ServerPacket::PlayerStatusUpdate(
            self.players
                .iter()
                .enumerate()
                .map(|(slot, p)| p.view(slot))
                .collect(),
        )
    }

    /// Mark a member ready. Returns true if this started the game, in which
    /// case the caller must start the room's timers.
    pub fn mark_ready(&mut self, player_id: PlayerId) -> bool {
        if self.status != RoomStatus::Waiting {
            return false;
        }
        let Some(player) = self.players.iter_mut().find(|p| p.id == player_id) else {
            return false;
        };
        player.ready = true;
        self.broadcast(self.roster());

        if self.players.iter().all(|p| p.ready) {
            self.start_game();
            return true;
        }
        false
    }

    fn start_game(&mut self) {
        let now = self.now();
        self.status = RoomStatus::Playing;
        self.game.start(&self.players, now);
        info!("Game started in room {} with {} player(s)", self.id, self.players.len());
        self.broadcast(ServerPacket::GameStart(Box::new(self.game.snapshot(&self.players, now))));
    }

    /// Flip the pause flag. Returns the new flag, or `None` if ignored.
    pub fn toggle_pause(&mut self, player_id: PlayerId) -> Option<bool> {
        if self.status != RoomStatus::Playing || !self.is_member(player_id) {
            return None;
        }
        self.game.is_paused = !self.game.is_paused;
        debug!("Room {} paused: {}", self.id, self.game.is_paused);
        self.broadcast(ServerPacket::GamePaused(self.game.is_paused));
        Some(self.game.is_paused)
    }

    /// Apply one input right away. Returns false if it was ignored.
    pub fn submit_input(&mut self, player_id: PlayerId, input: &InputState) -> bool {
        if self.status != RoomStatus::Playing || self.game.is_paused || !self.is_member(player_id) {
            return false;
        }
        let now = self.now();
        let pending = self.game.apply_input(player_id, input, now);
        self.flush(pending);
        true
    }

    /// Drop a member. Returns true if the room is now empty and must be
    /// destroyed. A mid-game departure ends the match.
    pub fn remove_member(&mut self, player_id: PlayerId) -> bool {
        let Some(idx) = self.players.iter().position(|p| p.id == player_id) else {
            return self.players.is_empty();
        };
        self.players.remove(idx);
        self.game.world.remove_tank(player_id);
        self.broadcast(ServerPacket::PlayerLeft { player_id });

        if self.players.is_empty() {
            self.timers.cancel_all();
            return true;
        }

        if self.status == RoomStatus::Playing {
            info!("Player {} left room {} mid-game, ending it", player_id, self.id);
            self.status = RoomStatus::Ended;
            self.timers.cancel_all();
            self.broadcast(ServerPacket::GameEnded {
                reason: "Player disconnected".to_string(),
            });
        }
        false
    }

    /// One scheduler firing: simulate, evaluate, broadcast.
    pub fn run_tick(&mut self) -> TickFlow {
        if self.status != RoomStatus::Playing {
            return TickFlow::default();
        }
        if self.game.is_paused {
            return TickFlow {
                running: true,
                ..TickFlow::default()
            };
        }

        let now = self.now();
        let pending = self.game.tick(&mut self.players, now, &mut self.rng);
        let mut flow = TickFlow {
            running: true,
            level_complete: false,
            shovel_armed: pending.shovel_armed,
        };
        self.flush(pending);

        match self.game.evaluate_outcome(&self.players) {
            Outcome::Continue => {}
            Outcome::GameOver(reason) => {
                info!("Game over in room {}: {}", self.id, reason);
                self.status = RoomStatus::GameOver;
                // The tick loop is the caller; it stops on its own.
                self.timers.tick.release();
                self.timers.cancel_all();
                self.broadcast(ServerPacket::GameOver {
                    reason: reason.to_string(),
                });
                flow = TickFlow::default();
            }
            Outcome::LevelComplete => {
                info!("Room {} completed level {}", self.id, self.game.level);
                self.broadcast(ServerPacket::LevelComplete {
                    level: self.game.level,
                    player_stats: GameState::player_stats(&self.players),
                });
                self.broadcast(ServerPacket::PlaySound {
                    sound: Sound::LevelComplete,
                });
                flow.level_complete = true;
            }
        }

        self.broadcast(ServerPacket::GameStateUpdate(Box::new(
            self.game.snapshot(&self.players, now),
        )));
        flow
    }

    /// Start the next level. Returns false if the room is no longer playing.
    pub fn advance_level(&mut self) -> bool {
        if self.status != RoomStatus::Playing {
            return false;
        }
        let now = self.now();
        // The new map has no fortification to revert.
        self.timers.shovel_revert.cancel();
        let map = self.game.advance_level(&self.players, now);
        info!("Room {} advanced to level {}", self.id, self.game.level);
        self.broadcast(ServerPacket::LevelChanged {
            level: self.game.level,
            map,
        });
        true
    }

    /// One enemy spawner firing. Returns the delay until the next one, or
    /// `None` to stop the spawner.
    pub fn spawn_enemy(&mut self) -> Option<Duration> {
        if self.status != RoomStatus::Playing {
            return None;
        }
        let outcome = spawner::spawn_enemy(&mut self.game, &mut self.rng);
        if let EnemySpawn::Spawned(enemy_tank) = &outcome {
            debug!("Room {} spawned enemy {} ({:?})", self.id, enemy_tank.id, enemy_tank.kind);
            self.broadcast(ServerPacket::EnemySpawned {
                enemy_tank: enemy_tank.clone(),
            });
        }
        spawner::next_enemy_delay(&self.game, &outcome, &mut self.rng)
    }

    /// One power-up spawner firing. Returns the delay until the next one, or
    /// `None` to stop the spawner.
    pub fn spawn_power_up(&mut self) -> Option<Duration> {
        if self.status != RoomStatus::Playing {
            return None;
        }
        let now = self.now();
        if let Some(power_up) = spawner::spawn_power_up(&mut self.game, now, &mut self.rng) {
            debug!("Room {} spawned power-up {:?}", self.id, power_up.kind);
            self.broadcast(ServerPacket::PowerUpSpawned { power_up });
        }
        Some(spawner::next_power_up_delay(&self.game, &mut self.rng))
    }

    /// Shovel timer expiry.
    pub fn revert_base_walls(&mut self) {
        if self.game.revert_fortification() {
            self.broadcast(ServerPacket::BaseWallsReverted);
        }
    }
}
