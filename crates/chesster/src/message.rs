//! The JSON wire protocol.
//!
//! Every frame is an envelope `{"action": ..., "payload": ...}`.
//! Inbound payloads are decoded per action inside the room; outbound
//! payloads are typed structs serialised through [`encode`].

use serde::{Deserialize, Serialize};

/// An inbound client frame, with the payload left raw until the room
/// knows which action it is handling.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientFrame {
    /// The action name.
    pub action: String,
    /// The action-specific payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ClientFrame {
    /// Build a frame from an action and a payload value.
    #[must_use]
    pub fn new(action: &str, payload: serde_json::Value) -> Self {
        Self {
            action: action.to_string(),
            payload,
        }
    }
}

/// The host's color selection in `assign_color`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    /// Host plays white.
    White,
    /// Host plays black.
    Black,
    /// Flip a fair coin.
    Random,
}

/// Payload of the `assign_color` action.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignColorPayload {
    /// The host's selection.
    pub color: ColorChoice,
}

/// Payload of the `move` action.
#[derive(Debug, Clone, Deserialize)]
pub struct MovePayload {
    /// Source square, e.g. `e2`.
    pub from: String,
    /// Destination square, e.g. `e4`.
    pub to: String,
    /// Promotion piece letter (`q`, `r`, `b`, `n`) when promoting.
    #[serde(default)]
    pub promotion: Option<String>,
}

impl MovePayload {
    /// The coordinate move string the engine parser expects.
    #[must_use]
    pub fn as_uci(&self) -> String {
        let mut uci = format!("{}{}", self.from, self.to);
        if let Some(promotion) = &self.promotion {
            uci.push_str(promotion);
        }
        uci
    }
}

/// Payload of the `lobby_state` broadcast.
#[derive(Debug, Clone, Serialize)]
pub struct LobbyStatePayload {
    /// Whether the host has toggled ready.
    pub host_ready: bool,
    /// Whether the guest has toggled ready.
    pub guest_ready: bool,
    /// The host's color, or empty until assigned.
    pub host_color: String,
    /// Whether the recipient of this frame is the host.
    pub is_host: bool,
    /// The room phase: `waiting`, `in_progress`, or `finished`.
    pub game_state: String,
    /// Number of player seats taken.
    pub player_count: usize,
    /// `unranked` or `ranked`.
    pub game_type: String,
}

/// Payload of the `game_state` broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStatePayload {
    /// The position after the latest move.
    pub fen: String,
    /// The engine's status string.
    pub game_status: String,
}

/// Payload of an `error` reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable description.
    pub message: String,
}

/// Payload of the `player_assigned` message.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerAssignedPayload {
    /// `white`, `black`, or `spectator`.
    pub color: String,
}

/// Payload of the `match_found` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchFoundPayload {
    /// The freshly created ranked room.
    #[serde(rename = "roomID")]
    pub room_id: String,
    /// The color this player has been bound to.
    pub color: String,
}

/// Payload of the `queue_status` message.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatusPayload {
    /// `joined_queue` or `left_queue`.
    pub status: String,
    /// Human-readable description.
    pub message: String,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    action: &'a str,
    payload: &'a T,
}

/// Serialise an outbound frame.
#[must_use]
pub fn encode<T: Serialize>(action: &str, payload: &T) -> String {
    match serde_json::to_string(&Envelope { action, payload }) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::error!(action, %err, "failed to encode outbound frame");
            r#"{"action":"error","payload":{"message":"internal encoding error"}}"#.to_string()
        }
    }
}
