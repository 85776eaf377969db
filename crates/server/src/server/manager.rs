//! Room registry.
//!
//! The registry lock is never held while waiting on a room lock, so a slow
//! room cannot stall lookups of the others.

use super::error::RoomError;
use super::room::{Room, SharedRoom};
use super::scheduler;
use crate::config::GameConfig;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tank_protocol::PlayerId;
use tank_protocol::packets::{InputState, ServerPacket};
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::info;

const ROOM_ID_LEN: usize = 6;
const ROOM_ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Receiver for one room's broadcasts.
pub type RoomReceiver = broadcast::Receiver<Arc<ServerPacket>>;

#[derive(Debug)]
pub struct RoomManager {
    rooms: RwLock<HashMap<String, SharedRoom>>,
    rules: GameConfig,
    tick_interval: Duration,
}

impl RoomManager {
    pub fn new(rules: GameConfig, tick_interval: Duration) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            rules,
            tick_interval,
        }
    }

    /// Open a fresh room with `player_id` as its first member.
    pub async fn create_room(&self, player_id: PlayerId) -> (String, RoomReceiver) {
        let mut rooms = self.rooms.write().await;
        let room_id = loop {
            let candidate = generate_room_id(&mut rand::rng());
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let mut room = Room::new(room_id.clone(), self.rules, self.tick_interval);
        let rx = room.subscribe();
        // A fresh room is waiting and empty.
        let _ = room.add_player(player_id);
        rooms.insert(room_id.clone(), Arc::new(Mutex::new(room)));
        info!("Room {} created by player {} ({} rooms)", room_id, player_id, rooms.len());
        (room_id, rx)
    }

    /// Add `player_id` to an existing room and announce it to the members.
    pub async fn join_room(&self, room_id: &str, player_id: PlayerId) -> Result<RoomReceiver, RoomError> {
        let shared = self.get(room_id).await.ok_or(RoomError::RoomNotFound)?;
        let mut room = shared.lock().await;
        // Emptied (and unregistered) while we waited for the lock.
        if room.is_empty() {
            return Err(RoomError::RoomNotFound);
        }
        room.add_player(player_id)?;
        let rx = room.subscribe();
        room.broadcast(ServerPacket::PlayerJoined { player_id });
        info!("Player {} joined room {}", player_id, room_id);
        Ok(rx)
    }

    pub async fn get(&self, room_id: &str) -> Option<SharedRoom> {
        self.rooms.read().await.get(room_id).cloned()
    }

    /// Mark a member ready, starting the room's timers if that began the game.
    pub async fn mark_ready(&self, room_id: &str, player_id: PlayerId) {
        let Some(shared) = self.get(room_id).await else { return };
        let mut room = shared.lock().await;
        if room.mark_ready(player_id) {
            scheduler::start(&shared, &mut room);
        }
    }

    pub async fn toggle_pause(&self, room_id: &str, player_id: PlayerId) {
        if let Some(shared) = self.get(room_id).await {
            shared.lock().await.toggle_pause(player_id);
        }
    }

    pub async fn submit_input(&self, room_id: &str, player_id: PlayerId, input: &InputState) {
        if let Some(shared) = self.get(room_id).await {
            shared.lock().await.submit_input(player_id, input);
        }
    }

    /// Drop a member, destroying the room when it empties.
    pub async fn remove_member(&self, room_id: &str, player_id: PlayerId) {
        let Some(shared) = self.get(room_id).await else { return };
        let mut room = shared.lock().await;
        if !room.remove_member(player_id) {
            return;
        }

        // Joins already holding the handle see an empty room and give up.
        let mut rooms = self.rooms.write().await;
        if rooms.remove(room_id).is_some() {
            info!("Room {} destroyed ({} rooms)", room_id, rooms.len());
        }
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

fn generate_room_id<R: Rng>(rng: &mut R) -> String {
    (0..ROOM_ID_LEN)
        .map(|_| ROOM_ID_ALPHABET[rng.random_range(0..ROOM_ID_ALPHABET.len())] as char)
        .collect()
}
