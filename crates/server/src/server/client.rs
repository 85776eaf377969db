//! Client session state.

use super::manager::{RoomManager, RoomReceiver};
use crate::highscores;
use std::sync::Arc;
use tank_protocol::PlayerId;
use tank_protocol::packets::{ClientPacket, ServerPacket};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One connected client.
#[derive(Debug)]
pub struct Session {
    /// Player id assigned on connect.
    pub id: PlayerId,
    /// Room this connection is a member of, if any.
    room: Option<String>,
    /// Broadcasts of that room.
    room_rx: Option<RoomReceiver>,
    /// Replies addressed to this client only.
    outbox: mpsc::UnboundedSender<ServerPacket>,
}

impl Session {
    pub fn new(id: PlayerId, outbox: mpsc::UnboundedSender<ServerPacket>) -> Self {
        Self {
            id,
            room: None,
            room_rx: None,
            outbox,
        }
    }

    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    fn reply(&self, packet: ServerPacket) {
        // The receiver lives as long as the connection loop.
        let _ = self.outbox.send(packet);
    }

    /// Next broadcast of the current room. Pends forever outside a room.
    pub async fn next_broadcast(&mut self) -> Arc<ServerPacket> {
        loop {
            let Some(rx) = self.room_rx.as_mut() else {
                return std::future::pending().await;
            };
            match rx.recv().await {
                Ok(packet) => return packet,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Player {} lagged, {} room messages dropped", self.id, skipped);
                }
                Err(RecvError::Closed) => {
                    self.room_rx = None;
                }
            }
        }
    }

    /// Handle one decoded message.
    pub async fn handle(&mut self, packet: ClientPacket, manager: &RoomManager) {
        match packet {
            ClientPacket::CreateRoom => {
                self.leave(manager).await;
                let (room_id, rx) = manager.create_room(self.id).await;
                self.enter(room_id.clone(), rx);
                self.reply(ServerPacket::RoomCreated {
                    room_id,
                    player_id: self.id,
                });
            }
            ClientPacket::JoinRoom(room_id) => {
                if self.room.as_deref() == Some(room_id.as_str()) {
                    self.reply(ServerPacket::RoomJoined {
                        room_id,
                        player_id: self.id,
                    });
                    return;
                }
                match manager.join_room(&room_id, self.id).await {
                    Ok(rx) => {
                        self.leave(manager).await;
                        self.enter(room_id.clone(), rx);
                        self.reply(ServerPacket::RoomJoined {
                            room_id,
                            player_id: self.id,
                        });
                    }
                    Err(e) => {
                        debug!("Player {} could not join {}: {}", self.id, room_id, e);
                        self.reply(ServerPacket::error(e.to_string()));
                    }
                }
            }
            ClientPacket::PlayerReady(room_id) => manager.mark_ready(&room_id, self.id).await,
            ClientPacket::PlayerInput { room_id, input } => {
                manager.submit_input(&room_id, self.id, &input).await
            }
            ClientPacket::TogglePause(room_id) => manager.toggle_pause(&room_id, self.id).await,
            ClientPacket::GetHighScores => self.reply(ServerPacket::HighScores(highscores::table())),
            ClientPacket::SaveHighScore { name, score } => {
                highscores::save(&name, score);
                self.reply(ServerPacket::HighScoreSaved);
            }
        }
    }

    fn enter(&mut self, room_id: String, rx: RoomReceiver) {
        self.room = Some(room_id);
        self.room_rx = Some(rx);
    }

    /// Leave the current room, if any.
    pub async fn leave(&mut self, manager: &RoomManager) {
        self.room_rx = None;
        if let Some(room_id) = self.room.take() {
            manager.remove_member(&room_id, self.id).await;
        }
    }
}
