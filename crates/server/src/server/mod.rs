//! Game server implementation.

use crate::config::Config;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tank_protocol::ProtocolError;
use tank_protocol::packets::{ClientPacket, ServerPacket};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, mpsc};
use tokio_tungstenite::{WebSocketStream, accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

pub mod client;
pub mod error;
pub mod game;
pub mod manager;
pub mod room;
pub mod scheduler;
pub mod spawner;

pub use client::Session;
pub use error::RoomError;
pub use game::{GameState, PendingBroadcasts};
pub use manager::RoomManager;
pub use room::{Room, RoomStatus, SharedRoom};
pub use scheduler::{RoomTimers, TimerHandle};

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Player ids are unique for the lifetime of the process.
static NEXT_PLAYER_ID: AtomicU32 = AtomicU32::new(1);

/// Connection tracking state (shared across connection handlers).
struct ConnectionState {
    /// Number of connections per IP address.
    ip_connections: HashMap<IpAddr, usize>,
    /// Total number of connections.
    total_connections: usize,
}

impl ConnectionState {
    fn new() -> Self {
        Self {
            ip_connections: HashMap::new(),
            total_connections: 0,
        }
    }

    /// Try to add a connection, returns true if allowed.
    fn try_add_connection(&mut self, ip: IpAddr, max_total: usize, max_per_ip: usize) -> bool {
        if self.total_connections >= max_total {
            return false;
        }
        let current = self.ip_connections.get(&ip).copied().unwrap_or(0);
        if current >= max_per_ip {
            return false;
        }
        *self.ip_connections.entry(ip).or_insert(0) += 1;
        self.total_connections += 1;
        true
    }

    fn remove_connection(&mut self, ip: IpAddr) {
        if let Some(count) = self.ip_connections.get_mut(&ip) {
            if *count > 0 {
                *count -= 1;
                self.total_connections = self.total_connections.saturating_sub(1);
            }
            if *count == 0 {
                self.ip_connections.remove(&ip);
            }
        }
    }
}

/// Run the game server.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on ws://{}", addr);

    let conn_state = Arc::new(RwLock::new(ConnectionState::new()));
    let manager = Arc::new(RoomManager::new(
        config.game,
        Duration::from_millis(config.server.tick_interval_ms),
    ));

    let max_connections = config.server.max_connections;
    let ip_limit = config.server.ip_limit;

    loop {
        let (stream, addr) = listener.accept().await?;
        let ip = addr.ip();

        {
            let mut state = conn_state.write().await;
            if !state.try_add_connection(ip, max_connections, ip_limit) {
                warn!("Connection rejected (limit reached): {}", addr);
                continue;
            }
        }

        let manager = Arc::clone(&manager);
        let conn_state = Arc::clone(&conn_state);

        tokio::spawn(async move {
            let result = handle_connection(stream, addr, manager).await;

            // Always remove from connection tracking when done
            conn_state.write().await.remove_connection(addr.ip());

            if let Err(e) = result {
                error!("Connection error from {}: {}", addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    manager: Arc<RoomManager>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    let player_id = NEXT_PLAYER_ID.fetch_add(1, Ordering::Relaxed);
    info!("New connection from {} (player {})", addr, player_id);

    let (mut write, mut read) = ws_stream.split();
    let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel();
    let mut session = Session::new(player_id, outbox_tx);

    loop {
        tokio::select! {
            // Replies go out before room traffic queued after them.
            biased;

            Some(packet) = outbox_rx.recv() => {
                if let Err(e) = send_packet(&mut write, &packet).await {
                    warn!("Failed to send to {}: {}", addr, e);
                    break;
                }
            }
            packet = session.next_broadcast() => {
                if let Err(e) = send_packet(&mut write, &packet).await {
                    warn!("Failed to send room update to {}: {}", addr, e);
                    break;
                }
            }
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match ClientPacket::parse(text.as_str()) {
                        Ok(packet) => session.handle(packet, &manager).await,
                        Err(e) => warn!("Dropping message from {}: {}", addr, e),
                    },
                    Some(Ok(Message::Binary(_))) => {
                        warn!("Dropping message from {}: {}", addr, ProtocolError::UnsupportedFrame("binary"));
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} disconnected", addr);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }
        }
    }

    session.leave(&manager).await;
    debug!("Player {} cleaned up", player_id);
    Ok(())
}

async fn send_packet(write: &mut WsSink, packet: &ServerPacket) -> anyhow::Result<()> {
    let json = packet.to_json()?;
    write.send(Message::Text(json.into())).await?;
    Ok(())
}
