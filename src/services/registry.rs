//! Room registry — creation, authentication, membership, and teardown.
//!
//! DESIGN
//! ======
//! Joining is the one operation that touches two rooms: the caller's prior
//! membership must be removed before the new one is added, atomically with
//! the capacity check and the log snapshot. Both room mutexes are taken in
//! canonical id order so concurrent cross-joins cannot deadlock. The snapshot
//! and the broadcast subscription happen in the same critical section, which
//! is the invariant late-join consistency rests on: every event committed
//! after the snapshot reaches the new subscriber live, and nothing in the
//! snapshot is ever delivered twice.
//!
//! ERROR HANDLING
//! ==============
//! Every failure is local to the requester and leaves shared state untouched:
//! a rejected join never mutates the target room, the log, or the caller's
//! existing membership.

use std::sync::Arc;

use rand::Rng;
use rand::distr::Alphanumeric;
use sha2::{Digest, Sha256};
use tokio::sync::mpsc;
use tracing::info;

use crate::protocol::{DrawEvent, ServerMessage};
use crate::state::{AppState, PRIVATE_ROOM_PREFIX, Room, RoomInner, Session};

/// Length of the random token in generated private-room ids.
const PRIVATE_ID_TOKEN_LEN: usize = 11;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("{0}")]
    InvalidRoomConfig(String),
    #[error("Password required for private room")]
    PasswordRequired,
    #[error("Incorrect password")]
    AuthenticationFailed,
    #[error("Room is full")]
    RoomFull,
    #[error("Room not found: {0}")]
    RoomNotFound(String),
}

/// Result of a successful join, delivered back to the caller's connection.
#[derive(Debug)]
pub struct JoinSuccess {
    pub room: Arc<Room>,
    /// Ordered log snapshot captured atomically with the subscription.
    pub snapshot: Vec<DrawEvent>,
    /// Member count after the join, for the `room_joined` payload.
    pub user_count: usize,
}

// =============================================================================
// CREDENTIALS
// =============================================================================

/// SHA-256 digest of a room password.
#[must_use]
pub fn hash_password(password: &str) -> [u8; 32] {
    Sha256::digest(password.as_bytes()).into()
}

/// Exact-match credential check. Comparing digests rather than plaintext
/// means timing can only relate two unpredictable hashes, never reveal a
/// matching plaintext prefix.
#[must_use]
pub fn verify_password(room: &Room, supplied: &str) -> bool {
    let Some(stored) = room.password_hash else {
        return true;
    };
    hash_password(supplied) == stored
}

// =============================================================================
// ROOM CREATION
// =============================================================================

/// Create a password-protected room with a generated id.
///
/// # Errors
///
/// Returns `InvalidRoomConfig` for an empty or too-short name or password,
/// or a non-positive capacity. Nothing is created on failure.
pub async fn create_private_room(
    state: &AppState,
    room_name: &str,
    password: &str,
    max_users: usize,
) -> Result<Arc<Room>, RegistryError> {
    let room_name = room_name.trim();
    let password = password.trim();

    if room_name.is_empty() || password.is_empty() {
        return Err(RegistryError::InvalidRoomConfig("Room name and password are required".into()));
    }
    if room_name.chars().count() < 3 {
        return Err(RegistryError::InvalidRoomConfig("Room name must be at least 3 characters".into()));
    }
    if password.chars().count() < 4 {
        return Err(RegistryError::InvalidRoomConfig("Password must be at least 4 characters".into()));
    }
    if max_users == 0 {
        return Err(RegistryError::InvalidRoomConfig("Room capacity must be at least 1".into()));
    }

    let password_hash = hash_password(password);

    let mut rooms = state.rooms.write().await;
    let id = loop {
        let candidate = generate_private_room_id();
        if !rooms.contains_key(&candidate) {
            break candidate;
        }
    };
    let room = Arc::new(Room::private(id.clone(), room_name, password_hash, max_users));
    rooms.insert(id, Arc::clone(&room));

    info!(room_id = %room.id, name = %room.name, capacity = max_users, "private room created");
    Ok(room)
}

fn generate_private_room_id() -> String {
    let token: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(PRIVATE_ID_TOKEN_LEN)
        .map(char::from)
        .collect();
    format!("{PRIVATE_ROOM_PREFIX}{token}")
}

// =============================================================================
// JOIN / LEAVE
// =============================================================================

/// Join a room, implicitly creating unknown public rooms.
///
/// On success the caller's prior membership (if any) is removed first — the
/// old room sees a leave notification and roster update before the new room
/// sees the join — and the returned snapshot is linearized with the
/// subscription under the target room's lock.
///
/// # Errors
///
/// `RoomNotFound` for unknown private-looking ids, `PasswordRequired` /
/// `AuthenticationFailed` for credential problems, `RoomFull` at capacity.
/// All failures leave every room, log, and membership untouched.
pub async fn join_room(
    state: &AppState,
    session: &mut Session,
    room_id: &str,
    password: Option<&str>,
    tx: mpsc::Sender<ServerMessage>,
) -> Result<JoinSuccess, RegistryError> {
    // A concurrent last-leave can evict the resolved room before its lock is
    // acquired; the evicted marker is checked under the lock and the whole
    // resolve is retried on a collision, so a join never lands in a room the
    // registry no longer maps.
    let (room, snapshot, user_count) = loop {
        let room = resolve_room(state, room_id).await?;

        // Credential check before any mutation: a failed auth must not
        // disturb the caller's current membership.
        if room.is_private() {
            match password {
                None | Some("") => return Err(RegistryError::PasswordRequired),
                Some(supplied) => {
                    if !verify_password(&room, supplied) {
                        return Err(RegistryError::AuthenticationFailed);
                    }
                }
            }
        }

        match session.room.clone() {
            // Rejoining the current room: swap membership under one lock.
            Some(old_room) if old_room.id == room.id => {
                let mut inner = room.lock().await;
                if inner.evicted {
                    continue;
                }
                remove_member(&mut inner, session);
                let (snapshot, user_count) = add_member(&mut inner, session, tx.clone());
                break (Arc::clone(&room), snapshot, user_count);
            }
            // Switching rooms: lock both in id order so concurrent
            // cross-joins cannot deadlock. Capacity is checked before
            // anything mutates.
            Some(old_room) => {
                let (mut old_inner, mut new_inner) = if old_room.id < room.id {
                    let first = old_room.lock().await;
                    let second = room.lock().await;
                    (first, second)
                } else {
                    let second = room.lock().await;
                    let first = old_room.lock().await;
                    (first, second)
                };
                if new_inner.evicted {
                    continue;
                }
                check_capacity(&room, &new_inner)?;
                remove_member(&mut old_inner, session);
                drop(old_inner);
                let (snapshot, user_count) = add_member(&mut new_inner, session, tx.clone());
                break (Arc::clone(&room), snapshot, user_count);
            }
            None => {
                let mut inner = room.lock().await;
                if inner.evicted {
                    continue;
                }
                check_capacity(&room, &inner)?;
                let (snapshot, user_count) = add_member(&mut inner, session, tx.clone());
                break (Arc::clone(&room), snapshot, user_count);
            }
        }
    };

    if let Some(old_room) = session.room.clone() {
        if old_room.id != room.id {
            maybe_evict(state, &old_room).await;
        }
    }

    session.room = Some(Arc::clone(&room));
    info!(
        user_id = %session.user_id,
        room_id = %room.id,
        members = user_count,
        "user joined room"
    );
    Ok(JoinSuccess { room, snapshot, user_count })
}

/// Leave the current room, if any. Disconnection routes through here too —
/// an implicit leave is indistinguishable from an explicit one.
pub async fn leave_room(state: &AppState, session: &mut Session) {
    let Some(room) = session.room.take() else {
        return;
    };
    {
        let mut inner = room.lock().await;
        remove_member(&mut inner, session);
    }
    maybe_evict(state, &room).await;
    info!(user_id = %session.user_id, room_id = %room.id, "user left room");
}

// =============================================================================
// HELPERS
// =============================================================================

async fn resolve_room(state: &AppState, room_id: &str) -> Result<Arc<Room>, RegistryError> {
    {
        let rooms = state.rooms.read().await;
        if let Some(room) = rooms.get(room_id) {
            return Ok(Arc::clone(room));
        }
    }

    // Ids that look private are never implicitly created.
    if room_id.starts_with(PRIVATE_ROOM_PREFIX) {
        return Err(RegistryError::RoomNotFound(room_id.to_owned()));
    }

    // Implicit public-room bootstrap. Double-checked under the write lock so
    // concurrent first joins land in one shared room.
    let mut rooms = state.rooms.write().await;
    let room = rooms
        .entry(room_id.to_owned())
        .or_insert_with(|| Arc::new(Room::public(room_id)));
    Ok(Arc::clone(room))
}

fn check_capacity(room: &Room, inner: &RoomInner) -> Result<(), RegistryError> {
    if let Some(capacity) = room.capacity {
        if inner.presence.len() >= capacity {
            return Err(RegistryError::RoomFull);
        }
    }
    Ok(())
}

/// Add the session to a room: snapshot, register, announce, subscribe,
/// roster. Must run inside the room's critical section.
fn add_member(
    inner: &mut RoomInner,
    session: &Session,
    tx: mpsc::Sender<ServerMessage>,
) -> (Vec<DrawEvent>, usize) {
    // Snapshot before subscribing: nothing already in the snapshot can also
    // arrive on the live channel.
    let snapshot = inner.log.snapshot();

    inner
        .presence
        .register(session.user_id, &session.username, &session.color);

    // Join notification goes to existing members only — the new subscriber
    // is not wired up yet.
    inner.router.broadcast(
        &ServerMessage::UserJoined { user_id: session.user_id, username: session.username.clone() },
        None,
    );
    inner.router.subscribe(session.user_id, tx);

    // Roster update goes to everyone, the new member included.
    inner
        .router
        .broadcast(&ServerMessage::UsersUpdate { users: inner.presence.roster() }, None);

    let user_count = inner.presence.len();
    (snapshot, user_count)
}

/// Remove the session from a room and notify the remaining members. Must run
/// inside the room's critical section.
fn remove_member(inner: &mut RoomInner, session: &Session) {
    if inner.presence.unregister(session.user_id).is_none() {
        return;
    }
    inner.router.unsubscribe(session.user_id);
    inner.router.broadcast(
        &ServerMessage::UserLeft { user_id: session.user_id, username: session.username.clone() },
        None,
    );
    inner
        .router
        .broadcast(&ServerMessage::UsersUpdate { users: inner.presence.roster() }, None);
}

/// Teardown policy: public rooms with no members and no history are dropped;
/// anything with a credential or a log is retained so history survives
/// temporary emptiness.
async fn maybe_evict(state: &AppState, room: &Arc<Room>) {
    if room.is_private() {
        return;
    }
    let mut rooms = state.rooms.write().await;
    let mut inner = room.lock().await;
    if inner.presence.is_empty() && inner.log.is_empty() {
        // Marked under the lock: a join that resolved this Arc before the
        // eviction sees the flag once it acquires the lock and re-resolves.
        inner.evicted = true;
        rooms.remove(&room.id);
        info!(room_id = %room.id, "evicted empty room");
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
