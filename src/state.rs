//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into axum handlers via the `State` extractor. It
//! holds the room registry: a map of live rooms keyed by room id. The
//! registry lock guards only map membership (insert/remove/lookup); every
//! room carries its own `Mutex<RoomInner>` serialization point, so unrelated
//! rooms never contend. All mutation of a room's log, membership, and
//! subscriber set happens under that one mutex, which is what makes the join
//! snapshot linearizable with concurrent appends.

use std::collections::HashMap;
use std::sync::Arc;

use rand::seq::IndexedRandom;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use uuid::Uuid;

use crate::services::broadcast::BroadcastRouter;
use crate::services::log::EventLog;
use crate::services::presence::PresenceTracker;

/// Room identifier. Public room ids are caller-chosen strings; private room
/// ids are generated and carry [`PRIVATE_ROOM_PREFIX`].
pub type RoomId = String;

/// Prefix reserved for generated private-room ids. Unknown ids with this
/// prefix are never implicitly created as public rooms.
pub const PRIVATE_ROOM_PREFIX: &str = "private_";

/// Room targeted by `join_room` when the client names none.
pub const DEFAULT_ROOM_ID: &str = "default";

/// Display colors assigned to sessions on connect, round-robin by chance.
pub const USER_COLORS: &[&str] = &[
    "#e6194b", "#3cb44b", "#4363d8", "#f58231", "#911eb4", "#46f0f0", "#f032e6", "#008080",
];

// =============================================================================
// ROOM
// =============================================================================

/// Per-room mutable state. Only reachable through [`Room::lock`].
#[derive(Debug)]
pub struct RoomInner {
    pub log: EventLog,
    pub presence: PresenceTracker,
    pub router: BroadcastRouter,
    /// Set when the registry unmaps the room. A join that resolved this
    /// room's `Arc` before the eviction must re-resolve instead of entering.
    pub evicted: bool,
}

impl RoomInner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            log: EventLog::new(),
            presence: PresenceTracker::new(),
            router: BroadcastRouter::new(),
            evicted: false,
        }
    }
}

impl Default for RoomInner {
    fn default() -> Self {
        Self::new()
    }
}

/// A collaboration room. Immutable configuration lives directly on the
/// struct; everything mutable sits behind the room's serialization point.
#[derive(Debug)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    /// SHA-256 digest of the room password. `None` for public rooms.
    pub password_hash: Option<[u8; 32]>,
    /// Maximum concurrent members. `None` = unbounded (implicit public rooms).
    pub capacity: Option<usize>,
    inner: Mutex<RoomInner>,
}

impl Room {
    /// An implicitly created public room: unbounded, named after its id.
    #[must_use]
    pub fn public(id: impl Into<RoomId>) -> Self {
        let id = id.into();
        Self { name: id.clone(), id, password_hash: None, capacity: None, inner: Mutex::new(RoomInner::new()) }
    }

    #[must_use]
    pub fn private(id: impl Into<RoomId>, name: impl Into<String>, password_hash: [u8; 32], capacity: usize) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            password_hash: Some(password_hash),
            capacity: Some(capacity),
            inner: Mutex::new(RoomInner::new()),
        }
    }

    #[must_use]
    pub fn is_private(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Enter the room's serialization point.
    pub async fn lock(&self) -> MutexGuard<'_, RoomInner> {
        self.inner.lock().await
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Per-connection identity. A new connection is a new user: nothing here
/// survives a reconnect.
pub struct Session {
    pub user_id: Uuid,
    pub username: String,
    pub color: String,
    pub room: Option<Arc<Room>>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        let user_id = Uuid::new_v4();
        let username = default_username(user_id);
        let color = (*USER_COLORS
            .choose(&mut rand::rng())
            .unwrap_or(&USER_COLORS[0]))
        .to_string();
        Self { user_id, username, color, room: None }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Placeholder name until the client supplies one on join.
#[must_use]
pub fn default_username(user_id: Uuid) -> String {
    let id = user_id.simple().to_string();
    format!("User_{}", &id[..8])
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state. Clone is required by axum — the registry map is
/// Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<RoomId, Arc<Room>>>>,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self { rooms: Arc::new(RwLock::new(HashMap::new())) }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
