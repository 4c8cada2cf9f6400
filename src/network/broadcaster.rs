//! Event Broadcaster
//!
//! The protocol state machine: applies validated inbound events to the
//! world and emits the resulting deltas. Every world mutation happens under
//! one write lock over the whole world; broadcasts go out after the lock is
//! released. A connection's events are handled by its own reader task in
//! arrival order, so one sender's deltas are emitted in input order.

use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

use crate::game::state::{ConnectionId, Pickup, World, WorldError};
use crate::network::protocol::{
    InitPayload, ItemCollectedPayload, MoveInput, PlayerMovedPayload, ServerEvent,
};
use crate::network::registry::SessionRegistry;

/// Dispatches inbound client events against the shared world.
pub struct EventBroadcaster {
    world: Arc<RwLock<World>>,
    registry: Arc<SessionRegistry>,
}

impl EventBroadcaster {
    /// Create a broadcaster over a shared world and registry.
    pub fn new(world: Arc<RwLock<World>>, registry: Arc<SessionRegistry>) -> Self {
        Self { world, registry }
    }

    /// Handle a new connection: create its player, send `init` to it, and
    /// announce `newPlayer` to everyone else.
    pub async fn on_connect(
        &self,
        id: ConnectionId,
        sender: mpsc::Sender<ServerEvent>,
    ) -> Result<(), WorldError> {
        let init = {
            let mut world = self.world.write().await;
            let player = world.add_player(id)?;
            InitPayload::new(player, world.snapshot(), world.config())
        };
        let player = init.player.clone();

        self.registry.register(id, sender).await;
        self.registry.send_to(&id, ServerEvent::Init(init)).await;
        self.registry
            .broadcast_except(&id, ServerEvent::NewPlayer(player))
            .await;

        info!(connection = %id, "client connected");
        Ok(())
    }

    /// Handle a `move` event: clamp and apply the position, then re-check
    /// the pickup, all in one critical section. The clamped position is
    /// broadcast to every connection including the sender.
    pub async fn on_move(&self, id: ConnectionId, input: MoveInput) {
        let (x, y) = input.truncated();

        let (moved, pickup) = {
            let mut world = self.world.write().await;
            match world.apply_move(&id, x, y) {
                Some(clamped) => (Some(clamped), world.try_collect(&id)),
                // Late move racing a disconnect: no-op.
                None => (None, None),
            }
        };

        if let Some((x, y)) = moved {
            self.registry
                .broadcast(ServerEvent::PlayerMoved(PlayerMovedPayload { id, x, y }))
                .await;
        }
        if let Some(pickup) = pickup {
            self.broadcast_pickup(pickup).await;
        }
    }

    /// Handle an explicit `collectItem` event: a pickup attempt at the
    /// current position, with no prior move. Covers a player standing still
    /// under a freshly spawned collectible.
    pub async fn on_collect(&self, id: ConnectionId) {
        let pickup = self.world.write().await.try_collect(&id);
        if let Some(pickup) = pickup {
            self.broadcast_pickup(pickup).await;
        }
    }

    /// Handle a transport disconnect: remove the player and announce
    /// `playerLeft` to the remaining connections.
    pub async fn on_disconnect(&self, id: ConnectionId) {
        let removed = self.world.write().await.remove_player(&id);
        self.registry.unregister(&id).await;

        if removed.is_some() {
            self.registry.broadcast(ServerEvent::PlayerLeft(id)).await;
            info!(connection = %id, "client disconnected");
        } else {
            debug!(connection = %id, "disconnect for unknown player");
        }
    }

    async fn broadcast_pickup(&self, pickup: Pickup) {
        self.registry
            .broadcast(ServerEvent::ItemCollected(ItemCollectedPayload::from(pickup)))
            .await;
    }
}
