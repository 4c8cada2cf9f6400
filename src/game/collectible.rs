//! Collectible Spawning
//!
//! Produces the single shared coin at a random in-bounds position. Spawn
//! positions are inset by a margin so the coin never sits flush against a
//! canvas edge.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::state::WorldConfig;

/// The single shared collectible.
///
/// The id is unique for the process lifetime (monotonic counter owned by
/// the world); it exists for display and debugging, not correctness.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collectible {
    /// Process-unique identifier of this spawn.
    pub id: u64,
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Score granted on pickup, in `[1, 3]`.
    pub value: u32,
}

/// Draw a random margin-inset coordinate for an entity of `size`.
///
/// Range is `[margin, canvas - margin - size)`, mirroring the clamp-free
/// spawn rule: entities spawn strictly inside the playfield.
pub fn random_inset_coord<R: Rng>(rng: &mut R, canvas: i32, size: i32, margin: i32) -> i32 {
    rng.gen_range(0..canvas - 2 * margin - size) + margin
}

/// Spawn a fresh collectible with the given id.
pub fn spawn<R: Rng>(rng: &mut R, id: u64, config: &WorldConfig) -> Collectible {
    Collectible {
        id,
        x: random_inset_coord(rng, config.canvas_width, config.collectible_size, config.margin),
        y: random_inset_coord(rng, config.canvas_height, config.collectible_size, config.margin),
        value: rng.gen_range(1..=3),
    }
}
