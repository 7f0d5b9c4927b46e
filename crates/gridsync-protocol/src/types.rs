//! Frame types for the Gridsync wire format.
//!
//! Every frame is an internally tagged JSON object: the `type` field
//! names the variant, the remaining fields are the payload. The tags
//! are part of the protocol contract — clients match on them — so each
//! variant carries an explicit rename where the Rust name and the wire
//! tag differ.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A player identifier.
///
/// Identity issuance is out of scope for the synchronization core:
/// whatever string a client presents is the player id. The newtype
/// exists so a player id can't be confused with any other string on a
/// function boundary, and `#[serde(transparent)]` keeps it a plain
/// JSON string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Creates a `PlayerId` from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Inbound frames
// ---------------------------------------------------------------------------

/// A frame sent by a client.
///
/// On the wire:
///
/// ```json
/// { "type": "move", "player": "A", "x": 3, "y": 4, "value": 7 }
/// { "type": "ping" }
/// ```
///
/// Coordinates are deliberately `i64`, not an unsigned type: a client
/// sending `x: -1` must be rejected as out-of-bounds by the game
/// engine, not turned into a decode error here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientFrame {
    /// A move request: place `value` for `player` at `(x, y)`.
    Move {
        player: PlayerId,
        x: i64,
        y: i64,
        value: i64,
    },

    /// Liveness check. Answered with [`ServerFrame::Pong`], unicast.
    /// Never treated as a game move, never broadcast.
    Ping,
}

impl ClientFrame {
    /// The wire tags this protocol understands. Well-formed JSON with
    /// any other tag is classified as
    /// [`ProtocolError::UnknownType`](crate::ProtocolError::UnknownType).
    pub const KNOWN_TAGS: [&'static str; 2] = ["move", "ping"];

    /// Returns `true` if `tag` names a known inbound frame type.
    pub fn is_known_tag(tag: &str) -> bool {
        Self::KNOWN_TAGS.contains(&tag)
    }
}

// ---------------------------------------------------------------------------
// Outbound frames
// ---------------------------------------------------------------------------

/// A frame sent by the server.
///
/// The delivery rules per variant are part of the protocol contract:
///
/// - `connection` — unicast, once, to a newly accepted connection.
/// - `disconnect` — broadcast to the connections that remain after one
///   leaves.
/// - `gameStateUpdate` — broadcast; `data` is the full serialized game
///   state (or an out-of-band payload injected by a non-connection
///   caller, which uses the same frame shape).
/// - `error` — unicast to the offending connection only.
/// - `pong` — unicast reply to a `ping`.
///
/// `data` is an opaque [`serde_json::Value`] rather than a concrete
/// state type so this crate stays a leaf: the engine serializes its
/// snapshot into the frame, and injected payloads need no type at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerFrame {
    /// Greeting for a newly accepted connection.
    #[serde(rename = "connection")]
    Connected { message: String, timestamp: u64 },

    /// A peer left; sent to everyone still connected.
    #[serde(rename = "disconnect")]
    Disconnected { message: String, timestamp: u64 },

    /// Full-state broadcast after an accepted move (or an injected
    /// out-of-band payload).
    #[cfg(feature = "json")]
    GameStateUpdate {
        data: serde_json::Value,
        timestamp: u64,
    },

    /// Something went wrong with the sender's last frame; unicast.
    Error { message: String, timestamp: u64 },

    /// Reply to [`ClientFrame::Ping`].
    Pong { timestamp: u64 },
}

// =========================================================================
// Tests
// =========================================================================
