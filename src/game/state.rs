//! World State
//!
//! The single authoritative world: connected players, the one shared
//! collectible, and the fixed canvas dimensions. Every mutation here is a
//! plain synchronous method; callers serialize access with one lock around
//! the whole world (see `network::broadcaster`), so each operation is
//! atomic as observed by concurrent connections.

use std::collections::BTreeMap;
use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::collectible::{self, Collectible};
use crate::game::geometry::{self, Aabb};

/// Opaque per-connection identifier, stable for the connection lifetime.
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// State of a single connected player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Owning connection.
    pub id: ConnectionId,
    /// Left edge of the avatar.
    pub x: i32,
    /// Top edge of the avatar.
    pub y: i32,
    /// Accumulated score. Never decreases.
    pub score: u32,
}

/// Fixed world dimensions, shared read-only by all components.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldConfig {
    /// Canvas width in pixels.
    pub canvas_width: i32,
    /// Canvas height in pixels.
    pub canvas_height: i32,
    /// Side length of a player avatar.
    pub player_size: i32,
    /// Side length of the collectible.
    pub collectible_size: i32,
    /// Inset from canvas edges for random spawns.
    pub margin: i32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            canvas_width: crate::CANVAS_WIDTH,
            canvas_height: crate::CANVAS_HEIGHT,
            player_size: crate::PLAYER_SIZE,
            collectible_size: crate::COLLECTIBLE_SIZE,
            margin: crate::SPAWN_MARGIN,
        }
    }
}

/// World mutation errors.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A player with this connection id already exists. The connection
    /// lifecycle guarantees one add per connection, so hitting this is a
    /// caller bug.
    #[error("player {0} already exists")]
    PlayerExists(ConnectionId),
}

/// Result of a granted pickup.
///
/// Carries everything the `itemCollected` broadcast needs, captured inside
/// the same critical section as the grant so the players map is consistent
/// with the new score.
#[derive(Clone, Debug)]
pub struct Pickup {
    /// Who collected.
    pub player_id: ConnectionId,
    /// The collector's score after the grant.
    pub new_score: u32,
    /// The replacement collectible.
    pub collectible: Collectible,
    /// Full players map at grant time.
    pub players: BTreeMap<ConnectionId, Player>,
}

/// Read-only copy of the world for payload construction.
#[derive(Clone, Debug)]
pub struct WorldSnapshot {
    /// All connected players.
    pub players: BTreeMap<ConnectionId, Player>,
    /// The active collectible.
    pub collectible: Collectible,
}

/// The authoritative world.
///
/// Exactly one collectible exists at all times; it is created in `new` and
/// only ever replaced atomically inside [`World::try_collect`].
pub struct World {
    config: WorldConfig,
    players: BTreeMap<ConnectionId, Player>,
    collectible: Collectible,
    next_collectible_id: u64,
    rng: StdRng,
}

impl World {
    /// Create a world with an entropy-seeded RNG and an initial collectible.
    pub fn new(config: WorldConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a world with a fixed seed, for reproducible tests.
    pub fn with_seed(config: WorldConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: WorldConfig, mut rng: StdRng) -> Self {
        let collectible = collectible::spawn(&mut rng, 1, &config);
        Self {
            config,
            players: BTreeMap::new(),
            collectible,
            next_collectible_id: 1,
            rng,
        }
    }

    /// World dimensions.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The active collectible.
    pub fn collectible(&self) -> &Collectible {
        &self.collectible
    }

    /// Look up a player.
    pub fn player(&self, id: &ConnectionId) -> Option<&Player> {
        self.players.get(id)
    }

    /// Number of connected players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Add a player at a random margin-inset spawn with score 0.
    pub fn add_player(&mut self, id: ConnectionId) -> Result<Player, WorldError> {
        if self.players.contains_key(&id) {
            return Err(WorldError::PlayerExists(id));
        }

        let player = Player {
            id,
            x: collectible::random_inset_coord(
                &mut self.rng,
                self.config.canvas_width,
                self.config.player_size,
                self.config.margin,
            ),
            y: collectible::random_inset_coord(
                &mut self.rng,
                self.config.canvas_height,
                self.config.player_size,
                self.config.margin,
            ),
            score: 0,
        };

        self.players.insert(id, player.clone());
        Ok(player)
    }

    /// Remove a player, returning its final record if it was present.
    pub fn remove_player(&mut self, id: &ConnectionId) -> Option<Player> {
        self.players.remove(id)
    }

    /// Clamp and apply a movement, returning the clamped position.
    ///
    /// Returns `None` if the player is gone (a late move racing a
    /// disconnect) - a no-op, never an error. The returned values are what
    /// must be broadcast; raw client input is never re-broadcast.
    pub fn apply_move(&mut self, id: &ConnectionId, x: i32, y: i32) -> Option<(i32, i32)> {
        let config = self.config;
        let player = self.players.get_mut(id)?;
        player.x = geometry::clamp_axis(x, config.player_size, config.canvas_width);
        player.y = geometry::clamp_axis(y, config.player_size, config.canvas_height);
        Some((player.x, player.y))
    }

    /// Grant a pickup if the player currently overlaps the collectible.
    ///
    /// Check and mutation form one step: on overlap the collectible's value
    /// is added to the player's score and the collectible is replaced before
    /// this returns, so no later caller can be granted the same collectible.
    pub fn try_collect(&mut self, id: &ConnectionId) -> Option<Pickup> {
        let player = self.players.get(id)?;
        let avatar = Aabb::square(player.x, player.y, self.config.player_size);
        let coin = Aabb::square(
            self.collectible.x,
            self.collectible.y,
            self.config.collectible_size,
        );
        if !geometry::overlaps(avatar, coin) {
            return None;
        }

        let value = self.collectible.value;
        let new_score = {
            let player = self.players.get_mut(id)?;
            player.score += value;
            player.score
        };

        self.next_collectible_id += 1;
        self.collectible = collectible::spawn(&mut self.rng, self.next_collectible_id, &self.config);

        Some(Pickup {
            player_id: *id,
            new_score,
            collectible: self.collectible.clone(),
            players: self.players.clone(),
        })
    }

    /// Read-only copy of players and collectible.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            players: self.players.clone(),
            collectible: self.collectible.clone(),
        }
    }

    /// Place the collectible directly. Test hook for collision scenarios.
    #[cfg(test)]
    pub(crate) fn place_collectible(&mut self, x: i32, y: i32, value: u32) {
        self.collectible.x = x;
        self.collectible.y = y;
        self.collectible.value = value;
    }
}
