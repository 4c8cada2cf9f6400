//! Game Logic Module
//!
//! The authoritative world and its pure helpers. No I/O and no locking
//! in here - concurrency control is the caller's job (see `network/`).
//!
//! ## Module Structure
//!
//! - `geometry`: AABB overlap and bounds clamping
//! - `collectible`: Random in-bounds coin spawning
//! - `state`: World state, players, pickup resolution

pub mod collectible;
pub mod geometry;
pub mod state;

// Re-export key types
pub use collectible::Collectible;
pub use geometry::Aabb;
pub use state::{ConnectionId, Pickup, Player, World, WorldConfig, WorldError, WorldSnapshot};
