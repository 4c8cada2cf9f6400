//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket. Every frame
//! is a JSON object `{"event": <name>, "data": <payload>}`; field names are
//! the contract and are asserted literally in the tests below.
//!
//! Inbound validation is structural: a frame that does not deserialize
//! (unknown event, non-numeric coordinates, missing fields) is dropped
//! silently at the boundary and never reaches the world.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::game::collectible::Collectible;
use crate::game::state::{ConnectionId, Pickup, Player, WorldConfig, WorldSnapshot};

// =============================================================================
// CLIENT -> SERVER EVENTS
// =============================================================================

/// Events sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Request to move the avatar to the given coordinates.
    Move(MoveInput),

    /// Explicit pickup attempt at the current position.
    CollectItem,
}

impl ClientEvent {
    /// Parse from a JSON text frame.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Requested movement target.
///
/// Accepted as JSON numbers, including fractional ones; coordinates are
/// truncated toward zero before they touch the world. Anything non-numeric
/// fails deserialization and the frame is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveInput {
    /// Requested left edge.
    pub x: f64,
    /// Requested top edge.
    pub y: f64,
}

impl MoveInput {
    /// Truncate to the integer canvas grid.
    pub fn truncated(self) -> (i32, i32) {
        (self.x.trunc() as i32, self.y.trunc() as i32)
    }
}

// =============================================================================
// SERVER -> CLIENT EVENTS
// =============================================================================

/// Events sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Full bootstrap state, sent once to a new connection.
    Init(InitPayload),

    /// A new player joined; sent to every other connection.
    NewPlayer(Player),

    /// A player moved; carries the server-clamped position.
    PlayerMoved(PlayerMovedPayload),

    /// A pickup was granted and the collectible replaced.
    ItemCollected(ItemCollectedPayload),

    /// A player disconnected. Payload is the bare connection id.
    PlayerLeft(ConnectionId),
}

impl ServerEvent {
    /// Serialize to a JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Everything a new client needs to render immediately, without racing
/// subsequent delta events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPayload {
    /// The newly created player record.
    pub player: Player,
    /// Full current players map, including the new player.
    pub players: BTreeMap<ConnectionId, Player>,
    /// The active collectible.
    pub collectible: Collectible,
    /// Canvas width in pixels.
    pub canvas_width: i32,
    /// Canvas height in pixels.
    pub canvas_height: i32,
    /// Player avatar side length.
    pub player_size: i32,
    /// Collectible side length.
    pub collectible_size: i32,
}

impl InitPayload {
    /// Assemble from the new player record and a world snapshot.
    pub fn new(player: Player, snapshot: WorldSnapshot, config: &WorldConfig) -> Self {
        Self {
            player,
            players: snapshot.players,
            collectible: snapshot.collectible,
            canvas_width: config.canvas_width,
            canvas_height: config.canvas_height,
            player_size: config.player_size,
            collectible_size: config.collectible_size,
        }
    }
}

/// Server-confirmed position after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMovedPayload {
    /// The moving player.
    pub id: ConnectionId,
    /// Clamped left edge.
    pub x: i32,
    /// Clamped top edge.
    pub y: i32,
}

/// Outcome of a granted pickup. The full players map is included so every
/// client reconciles scores from the same snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCollectedPayload {
    /// The collector.
    pub player_id: ConnectionId,
    /// The collector's new score.
    pub new_score: u32,
    /// The freshly spawned replacement collectible.
    pub new_collectible: Collectible,
    /// All players at grant time.
    pub players: BTreeMap<ConnectionId, Player>,
}

impl From<Pickup> for ItemCollectedPayload {
    fn from(pickup: Pickup) -> Self {
        Self {
            player_id: pickup.player_id,
            new_score: pickup.new_score,
            new_collectible: pickup.collectible,
            players: pickup.players,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn sample_player(id: ConnectionId) -> Player {
        Player { id, x: 100, y: 200, score: 5 }
    }

    #[test]
    fn test_move_event_parses() {
        let event = ClientEvent::from_json(r#"{"event":"move","data":{"x":3.7,"y":-2}}"#).unwrap();
        let ClientEvent::Move(input) = event else {
            panic!("expected move");
        };
        assert_eq!(input.truncated(), (3, -2));
    }

    #[test]
    fn test_move_truncates_toward_zero() {
        let input = MoveInput { x: -0.9, y: 99.99 };
        assert_eq!(input.truncated(), (0, 99));
    }

    #[test]
    fn test_non_numeric_move_is_rejected() {
        assert!(ClientEvent::from_json(r#"{"event":"move","data":{"x":"10","y":20}}"#).is_err());
        assert!(ClientEvent::from_json(r#"{"event":"move","data":{"x":null,"y":20}}"#).is_err());
        assert!(ClientEvent::from_json(r#"{"event":"move","data":{"y":20}}"#).is_err());
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        assert!(ClientEvent::from_json(r#"{"event":"teleport","data":{}}"#).is_err());
        assert!(ClientEvent::from_json("not json").is_err());
    }

    #[test]
    fn test_collect_item_parses_without_payload() {
        let event = ClientEvent::from_json(r#"{"event":"collectItem"}"#).unwrap();
        assert_eq!(event, ClientEvent::CollectItem);
    }

    #[test]
    fn test_player_moved_wire_shape() {
        let id = ConnectionId::random();
        let event = ServerEvent::PlayerMoved(PlayerMovedPayload { id, x: 0, y: 0 });
        let value: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();

        assert_eq!(value["event"], "playerMoved");
        assert_eq!(value["data"]["id"], json!(id.to_string()));
        assert_eq!(value["data"]["x"], 0);
        assert_eq!(value["data"]["y"], 0);
    }

    #[test]
    fn test_init_wire_field_names() {
        let id = ConnectionId::random();
        let player = sample_player(id);
        let mut players = BTreeMap::new();
        players.insert(id, player.clone());
        let payload = InitPayload {
            player,
            players,
            collectible: Collectible { id: 1, x: 50, y: 60, value: 2 },
            canvas_width: 640,
            canvas_height: 480,
            player_size: 30,
            collectible_size: 15,
        };

        let value: Value = serde_json::from_str(&ServerEvent::Init(payload).to_json().unwrap()).unwrap();
        assert_eq!(value["event"], "init");
        let data = &value["data"];
        for key in [
            "player",
            "players",
            "collectible",
            "canvasWidth",
            "canvasHeight",
            "playerSize",
            "collectibleSize",
        ] {
            assert!(data.get(key).is_some(), "missing field {key}");
        }
        assert_eq!(data["canvasWidth"], 640);
        assert_eq!(data["players"][id.to_string()]["score"], 5);
    }

    #[test]
    fn test_item_collected_wire_field_names() {
        let id = ConnectionId::random();
        let mut players = BTreeMap::new();
        players.insert(id, sample_player(id));
        let payload = ItemCollectedPayload {
            player_id: id,
            new_score: 7,
            new_collectible: Collectible { id: 3, x: 20, y: 20, value: 1 },
            players,
        };

        let value: Value =
            serde_json::from_str(&ServerEvent::ItemCollected(payload).to_json().unwrap()).unwrap();
        assert_eq!(value["event"], "itemCollected");
        let data = &value["data"];
        assert_eq!(data["playerId"], json!(id.to_string()));
        assert_eq!(data["newScore"], 7);
        assert_eq!(data["newCollectible"]["value"], 1);
        assert!(data["players"].is_object());
    }

    #[test]
    fn test_player_left_is_bare_id() {
        let id = ConnectionId::random();
        let value: Value =
            serde_json::from_str(&ServerEvent::PlayerLeft(id).to_json().unwrap()).unwrap();
        assert_eq!(value["event"], "playerLeft");
        assert_eq!(value["data"], json!(id.to_string()));
    }

    #[test]
    fn test_server_events_round_trip() {
        let id = ConnectionId::random();
        let mut players = BTreeMap::new();
        players.insert(id, sample_player(id));

        let events = vec![
            ServerEvent::NewPlayer(sample_player(id)),
            ServerEvent::PlayerMoved(PlayerMovedPayload { id, x: 610, y: 450 }),
            ServerEvent::ItemCollected(ItemCollectedPayload {
                player_id: id,
                new_score: 3,
                new_collectible: Collectible { id: 9, x: 100, y: 120, value: 3 },
                players,
            }),
            ServerEvent::PlayerLeft(id),
        ];

        for event in events {
            let decoded: ServerEvent = serde_json::from_str(&event.to_json().unwrap()).unwrap();
            assert_eq!(decoded, event);
        }
    }
}
