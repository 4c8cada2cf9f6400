//! WebSocket Game Server
//!
//! Async transport for the arena. One accept loop, one task per connection:
//! a writer task drains the connection's outbound channel and a reader loop
//! parses inbound frames and hands them to the broadcaster. The transport
//! never touches the world directly.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::game::state::{ConnectionId, World, WorldConfig};
use crate::network::broadcaster::EventBroadcaster;
use crate::network::protocol::{ClientEvent, ServerEvent};
use crate::network::registry::SessionRegistry;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Outbound queue depth per connection.
    pub send_queue: usize,
    /// World dimensions.
    pub world: WorldConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".parse().expect("static addr"),
            max_connections: 256,
            send_queue: 64,
            world: WorldConfig::default(),
        }
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind the listen address.
    #[error("failed to bind: {0}")]
    Bind(#[from] std::io::Error),
}

/// The game server: shared world, connection registry, and accept loop.
pub struct GameServer {
    config: ServerConfig,
    world: Arc<RwLock<World>>,
    registry: Arc<SessionRegistry>,
    broadcaster: Arc<EventBroadcaster>,
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server. The world (and its first collectible)
    /// exists from this point, before any client connects.
    pub fn new(config: ServerConfig) -> Self {
        let world = Arc::new(RwLock::new(World::new(config.world)));
        let registry = Arc::new(SessionRegistry::new());
        let broadcaster = Arc::new(EventBroadcaster::new(world.clone(), registry.clone()));
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            world,
            registry,
            broadcaster,
            shutdown_tx,
        }
    }

    /// Run the accept loop until shutdown.
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("Coin Rush server listening on {}", self.config.bind_addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.registry.connection_count().await >= self.config.max_connections {
                                warn!("connection limit reached, rejecting {}", addr);
                                continue;
                            }
                            self.spawn_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle one WebSocket connection on its own task.
    fn spawn_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let broadcaster = self.broadcaster.clone();
        let send_queue = self.config.send_queue;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    debug!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (event_tx, mut event_rx) = mpsc::channel::<ServerEvent>(send_queue);

            // Writer task: serialize outbound events in queue order.
            let writer_task = tokio::spawn(async move {
                while let Some(event) = event_rx.recv().await {
                    let text = match event.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("failed to serialize event: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            let id = ConnectionId::random();
            if let Err(e) = broadcaster.on_connect(id, event_tx).await {
                error!(connection = %id, "failed to create player: {}", e);
                writer_task.abort();
                return;
            }
            debug!(connection = %id, "serving {}", addr);

            // Reader loop: this task is the only consumer of the client's
            // inbound stream, so its events apply in arrival order.
            loop {
                tokio::select! {
                    frame = ws_receiver.next() => {
                        match frame {
                            Some(Ok(Message::Text(text))) => {
                                match ClientEvent::from_json(&text) {
                                    Ok(ClientEvent::Move(input)) => {
                                        broadcaster.on_move(id, input).await;
                                    }
                                    Ok(ClientEvent::CollectItem) => {
                                        broadcaster.on_collect(id).await;
                                    }
                                    // Malformed input is dropped, the
                                    // connection stays open.
                                    Err(e) => {
                                        debug!(connection = %id, "ignoring invalid frame: {}", e);
                                    }
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                break;
                            }
                            Some(Err(e)) => {
                                debug!(connection = %id, "WebSocket error: {}", e);
                                break;
                            }
                            // Binary, ping and pong frames carry no game
                            // events.
                            Some(Ok(_)) => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            writer_task.abort();
            broadcaster.on_disconnect(id).await;
        });
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Number of open connections.
    pub async fn connection_count(&self) -> usize {
        self.registry.connection_count().await
    }

    /// Number of players in the world.
    pub async fn player_count(&self) -> usize {
        self.world.read().await.player_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.world.canvas_width, 640);
        assert_eq!(config.world.canvas_height, 480);
    }

    #[tokio::test]
    async fn test_server_starts_empty_with_collectible() {
        let server = GameServer::new(ServerConfig::default());
        assert_eq!(server.connection_count().await, 0);
        assert_eq!(server.player_count().await, 0);

        // The collectible exists before any client connects.
        let world = server.world.read().await;
        assert!(world.collectible().value >= 1);
    }

    #[tokio::test]
    async fn test_server_shutdown() {
        let server = GameServer::new(ServerConfig::default());
        server.shutdown();
        // Should not panic
    }
}
