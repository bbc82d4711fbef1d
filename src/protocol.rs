//! Wire protocol — the JSON vocabulary shared by server and client.
//!
//! DESIGN
//! ======
//! Every websocket payload is one tagged message. Clients send
//! `ClientMessage`, the server replies and broadcasts `ServerMessage`, and
//! the dispatch layer routes on the variant alone — nothing downstream ever
//! re-inspects raw JSON. Drawing mutations travel twice: live as
//! `draw`/`erase`/`clear_canvas` messages, and replayed as the ordered
//! `DrawEvent` list inside `drawing_data`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// DRAW EVENTS
// =============================================================================

/// One committed mutation of a room's shared drawing state.
///
/// `seq` is assigned at the room's single serialization point and is strictly
/// increasing and gapless within a room. Replaying a room's events in `seq`
/// order from an empty surface reproduces its exact visual state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawEvent {
    pub seq: u64,
    pub user_id: Uuid,
    /// Milliseconds since Unix epoch at commit time.
    pub ts_ms: i64,
    #[serde(flatten)]
    pub action: DrawAction,
}

/// The geometric payload of a draw event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawAction {
    /// Paint one stroke segment.
    Stroke {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        color: String,
        size: f64,
    },
    /// Erase along one segment.
    Erase {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        size: f64,
    },
    /// Reset the canvas. Logged as the new start of history, not a deletion
    /// of past sequence numbers.
    Clear,
}

// =============================================================================
// PRESENCE PAYLOADS
// =============================================================================

/// Partial tool update. Any subset of fields may be present; absent fields
/// leave the member's current tool state untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

/// One member in a full roster broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub user_id: Uuid,
    pub username: String,
    pub color: String,
}

// =============================================================================
// CLIENT -> SERVER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a room, implicitly creating unknown public rooms. Omitted
    /// `room_id` targets the default room.
    JoinRoom {
        #[serde(default)]
        room_id: Option<String>,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
    CreatePrivateRoom {
        room_name: String,
        password: String,
        #[serde(default = "default_max_users")]
        max_users: usize,
    },
    Draw {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        color: String,
        size: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool: Option<String>,
    },
    Erase {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        size: f64,
    },
    ClearCanvas,
    CursorMove {
        x: f64,
        y: f64,
    },
    ChangeTool {
        #[serde(flatten)]
        update: ToolUpdate,
    },
}

fn default_max_users() -> usize {
    10
}

// =============================================================================
// SERVER -> CLIENT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Issued once per connection, before anything else.
    UserConnected {
        user_id: Uuid,
    },
    RoomJoined {
        room_id: String,
        room_name: String,
        is_private: bool,
        user_count: usize,
    },
    RoomJoinError {
        message: String,
    },
    PrivateRoomCreated {
        room_id: String,
        room_name: String,
        max_users: usize,
    },
    RoomCreationError {
        message: String,
    },
    /// Ordered log snapshot, sent exactly once per successful join.
    DrawingData {
        data: Vec<DrawEvent>,
    },
    /// Live stroke from a peer. The sender never receives its own echo.
    Draw {
        user_id: Uuid,
        seq: u64,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        color: String,
        size: f64,
    },
    /// Live erase from a peer. The sender never receives its own echo.
    Erase {
        user_id: Uuid,
        seq: u64,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        size: f64,
    },
    /// Canvas reset. Delivered to every member including the sender.
    ClearCanvas,
    UserJoined {
        user_id: Uuid,
        username: String,
    },
    UserLeft {
        user_id: Uuid,
        username: String,
    },
    /// Full authoritative roster, sent after every membership change.
    UsersUpdate {
        users: Vec<RosterEntry>,
    },
    CursorMove {
        user_id: Uuid,
        x: f64,
        y: f64,
        username: String,
    },
    UserToolChange {
        user_id: Uuid,
        username: String,
        tool_data: ToolUpdate,
    },
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
