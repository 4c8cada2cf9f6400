//! Session Registry
//!
//! Tracks the outbound channel of every open connection and implements the
//! broadcast primitives. Delivery is non-blocking: a peer whose queue is
//! full loses its own events, it never stalls delivery to the rest, and a
//! closed channel never aborts a broadcast mid-way.

use std::collections::BTreeMap;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::game::state::ConnectionId;
use crate::network::protocol::ServerEvent;

/// Registry of open connections and their outbound event channels.
///
/// Membership mirrors the set of open connections exactly: `register` on
/// connect, `unregister` on disconnect, nothing else touches the map.
#[derive(Default)]
pub struct SessionRegistry {
    connections: RwLock<BTreeMap<ConnectionId, mpsc::Sender<ServerEvent>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection's outbound channel.
    pub async fn register(&self, id: ConnectionId, sender: mpsc::Sender<ServerEvent>) {
        self.connections.write().await.insert(id, sender);
    }

    /// Remove a connection. Returns false if it was already gone.
    pub async fn unregister(&self, id: &ConnectionId) -> bool {
        self.connections.write().await.remove(id).is_some()
    }

    /// Number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send an event to a single connection.
    pub async fn send_to(&self, id: &ConnectionId, event: ServerEvent) {
        let sender = self.connections.read().await.get(id).cloned();
        if let Some(sender) = sender {
            Self::deliver(id, &sender, event);
        }
    }

    /// Send an event to every registered connection.
    pub async fn broadcast(&self, event: ServerEvent) {
        self.broadcast_filtered(None, event).await;
    }

    /// Send an event to every registered connection except one.
    pub async fn broadcast_except(&self, except: &ConnectionId, event: ServerEvent) {
        self.broadcast_filtered(Some(*except), event).await;
    }

    async fn broadcast_filtered(&self, except: Option<ConnectionId>, event: ServerEvent) {
        let targets: Vec<(ConnectionId, mpsc::Sender<ServerEvent>)> = {
            let connections = self.connections.read().await;
            connections
                .iter()
                .filter(|(id, _)| Some(**id) != except)
                .map(|(id, sender)| (*id, sender.clone()))
                .collect()
        };

        for (id, sender) in targets {
            Self::deliver(&id, &sender, event.clone());
        }
    }

    /// Non-blocking delivery. A full queue means the peer has stopped
    /// draining its socket; it loses this event rather than wedging every
    /// handler that broadcasts after it.
    fn deliver(id: &ConnectionId, sender: &mpsc::Sender<ServerEvent>, event: ServerEvent) {
        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                debug!(connection = %id, "dropping event for stalled connection");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(connection = %id, "dropping event for closed connection");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (mpsc::Sender<ServerEvent>, mpsc::Receiver<ServerEvent>) {
        mpsc::channel(16)
    }

    #[tokio::test]
    async fn test_broadcast_reaches_everyone() {
        let registry = SessionRegistry::new();
        let a = ConnectionId::random();
        let b = ConnectionId::random();
        let (tx_a, mut rx_a) = channel();
        let (tx_b, mut rx_b) = channel();
        registry.register(a, tx_a).await;
        registry.register(b, tx_b).await;

        registry.broadcast(ServerEvent::PlayerLeft(a)).await;

        assert_eq!(rx_a.recv().await.unwrap(), ServerEvent::PlayerLeft(a));
        assert_eq!(rx_b.recv().await.unwrap(), ServerEvent::PlayerLeft(a));
    }

    #[tokio::test]
    async fn test_broadcast_except_skips_sender() {
        let registry = SessionRegistry::new();
        let a = ConnectionId::random();
        let b = ConnectionId::random();
        let (tx_a, mut rx_a) = channel();
        let (tx_b, mut rx_b) = channel();
        registry.register(a, tx_a).await;
        registry.register(b, tx_b).await;

        registry.broadcast_except(&a, ServerEvent::PlayerLeft(b)).await;

        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.recv().await.unwrap(), ServerEvent::PlayerLeft(b));
    }

    #[tokio::test]
    async fn test_dead_recipient_does_not_abort_broadcast() {
        let registry = SessionRegistry::new();
        let a = ConnectionId::random();
        let b = ConnectionId::random();
        let (tx_a, rx_a) = channel();
        let (tx_b, mut rx_b) = channel();
        registry.register(a, tx_a).await;
        registry.register(b, tx_b).await;

        // a's receiver is gone; b must still get the event.
        drop(rx_a);
        registry.broadcast(ServerEvent::PlayerLeft(a)).await;

        assert_eq!(rx_b.recv().await.unwrap(), ServerEvent::PlayerLeft(a));
    }

    #[tokio::test]
    async fn test_stalled_recipient_does_not_starve_broadcast() {
        let registry = SessionRegistry::new();
        let stalled = ConnectionId::random();
        let healthy = ConnectionId::random();
        // The stalled peer keeps its receiver alive but never reads, and its
        // queue holds a single event.
        let (tx_stalled, mut rx_stalled) = mpsc::channel(1);
        let (tx_healthy, mut rx_healthy) = mpsc::channel(16);
        registry.register(stalled, tx_stalled).await;
        registry.register(healthy, tx_healthy).await;

        // First broadcast fills the stalled peer's queue.
        registry.broadcast(ServerEvent::PlayerLeft(stalled)).await;
        // Later broadcasts must still reach the healthy peer promptly.
        registry.broadcast(ServerEvent::PlayerLeft(healthy)).await;
        registry.send_to(&healthy, ServerEvent::PlayerLeft(healthy)).await;

        assert_eq!(rx_healthy.recv().await.unwrap(), ServerEvent::PlayerLeft(stalled));
        assert_eq!(rx_healthy.recv().await.unwrap(), ServerEvent::PlayerLeft(healthy));
        assert_eq!(rx_healthy.recv().await.unwrap(), ServerEvent::PlayerLeft(healthy));

        // The stalled peer got the first event and lost the overflow.
        assert_eq!(rx_stalled.recv().await.unwrap(), ServerEvent::PlayerLeft(stalled));
        assert!(rx_stalled.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unregister_stops_delivery() {
        let registry = SessionRegistry::new();
        let a = ConnectionId::random();
        let (tx_a, mut rx_a) = channel();
        registry.register(a, tx_a).await;
        assert_eq!(registry.connection_count().await, 1);

        assert!(registry.unregister(&a).await);
        assert!(!registry.unregister(&a).await);
        assert_eq!(registry.connection_count().await, 0);

        registry.broadcast(ServerEvent::PlayerLeft(a)).await;
        registry.send_to(&a, ServerEvent::PlayerLeft(a)).await;
        assert!(rx_a.try_recv().is_err());
    }
}
