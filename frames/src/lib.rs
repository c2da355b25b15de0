//! Shared wire model for the CloudBoard realtime protocol.
//!
//! This crate owns the event types used by both `server` and `client`.
//! Events travel as JSON text frames shaped `{"event": "...", "data": ...}`,
//! with kebab-case event names and camelCase payload keys, so the wire is
//! readable by any board client regardless of language.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Error returned by the frame codec functions.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The event could not be serialized to a text frame.
    #[error("failed to encode wire event: {0}")]
    Encode(#[source] serde_json::Error),
    /// The text frame is not valid JSON or does not match a known event.
    #[error("failed to decode wire event: {0}")]
    Decode(#[source] serde_json::Error),
}

// =============================================================================
// CARD
// =============================================================================

/// A positioned, draggable unit of content on a board.
///
/// The server is the sole source of truth for card existence; clients hold
/// copies that converge via broadcasts and snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: Uuid,
    /// Owning board. Board ids are opaque room names chosen by clients.
    pub board_id: String,
    pub x: f64,
    pub y: f64,
    pub title: String,
    /// Opaque body content; the sync engine never inspects it.
    pub content: Value,
    /// Creation order, used as the default stacking order.
    pub z_index: i32,
}

// =============================================================================
// BOUNDS
// =============================================================================

/// Board-local coordinate bounds. Positions are clamped to
/// `[0, width] x [0, height]` whenever a move is committed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Clamp a candidate position into the board rectangle.
    #[must_use]
    pub fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        (x.clamp(0.0, self.width), y.clamp(0.0, self.height))
    }
}

// =============================================================================
// CLIENT -> SERVER
// =============================================================================

/// Events sent from a board client to the session gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Subscribe to a board room. The server replies with a full snapshot.
    JoinBoard { board_id: String },
    /// Unsubscribe from a board room.
    LeaveBoard { board_id: String },
    /// Authoritative move request for one card.
    CardMoved {
        card_id: Uuid,
        x: f64,
        y: f64,
        board_id: String,
    },
}

// =============================================================================
// SERVER -> CLIENTS
// =============================================================================

/// Events fanned out from the session gateway to board clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Full current card set, sent to a client on every join so late joiners
    /// and reconnecting clients sync to ground truth.
    Snapshot(Vec<Card>),
    /// Position broadcast. Excludes the originating session.
    CardUpdated { card_id: Uuid, x: f64, y: f64 },
    /// Creation broadcast carrying the stored card.
    NewCard(Card),
    /// Deletion broadcast.
    CardRemoved { card_id: Uuid },
    /// Live presence count for the board.
    UserCount(u32),
}

// =============================================================================
// CODEC
// =============================================================================

/// Encode any serializable event as a JSON text frame.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if the value cannot be serialized. The
/// event types in this crate always can; the error path exists for foreign
/// `Serialize` impls.
pub fn encode_event<T: Serialize>(event: &T) -> Result<String, CodecError> {
    serde_json::to_string(event).map_err(CodecError::Encode)
}

/// Decode a client-originated text frame.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed JSON or unknown events.
pub fn decode_client_event(text: &str) -> Result<ClientEvent, CodecError> {
    serde_json::from_str(text).map_err(CodecError::Decode)
}

/// Decode a server-originated text frame.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed JSON or unknown events.
pub fn decode_server_event(text: &str) -> Result<ServerEvent, CodecError> {
    serde_json::from_str(text).map_err(CodecError::Decode)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
