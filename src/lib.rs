//! # Coin Rush Game Server
//!
//! Authoritative state-sync server for a minimal real-time multiplayer arena:
//! square avatars on a fixed canvas racing to grab a single shared coin that
//! respawns after every pickup.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     COIN RUSH SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/              - Authoritative world (no I/O)           │
//! │  ├── geometry.rs    - AABB overlap + bounds clamping         │
//! │  ├── collectible.rs - Random in-bounds coin spawning         │
//! │  └── state.rs       - World: players, coin, scores           │
//! │                                                              │
//! │  network/           - Transport and protocol                 │
//! │  ├── protocol.rs    - Wire messages (JSON over WebSocket)    │
//! │  ├── registry.rs    - Connection registry + broadcast        │
//! │  ├── broadcaster.rs - Inbound event dispatch + deltas        │
//! │  └── server.rs      - WebSocket accept loop                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Authority Guarantee
//!
//! Clients are untrusted. Every movement is clamped server-side and the
//! clamped values are what get broadcast; every pickup is re-checked under
//! the world lock before any score is granted. The world is the only writer
//! of positions and scores, so a single connection's misbehavior can never
//! corrupt shared state or grant unearned points.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod game;
pub mod network;

// Re-export commonly used types
pub use game::geometry::Aabb;
pub use game::state::{ConnectionId, Player, Pickup, World, WorldConfig, WorldError};
pub use network::broadcaster::EventBroadcaster;
pub use network::registry::SessionRegistry;
pub use network::server::{GameServer, ServerConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Canvas width in pixels
pub const CANVAS_WIDTH: i32 = 640;

/// Canvas height in pixels
pub const CANVAS_HEIGHT: i32 = 480;

/// Side length of a player's square avatar
pub const PLAYER_SIZE: i32 = 30;

/// Side length of the collectible's square
pub const COLLECTIBLE_SIZE: i32 = 15;

/// Inset from the canvas edges for random spawns
pub const SPAWN_MARGIN: i32 = 20;
