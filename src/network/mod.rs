//! Network Layer
//!
//! WebSocket transport, the wire protocol, and the dispatcher that turns
//! inbound client events into world mutations and outbound deltas. All game
//! rules live in `game/`; this layer only validates, serializes, and routes.

pub mod broadcaster;
pub mod protocol;
pub mod registry;
pub mod server;

pub use broadcaster::EventBroadcaster;
pub use protocol::{ClientEvent, InitPayload, ItemCollectedPayload, MoveInput, PlayerMovedPayload, ServerEvent};
pub use registry::SessionRegistry;
pub use server::{GameServer, ServerConfig, ServerError};
