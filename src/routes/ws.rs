//! WebSocket handler — the connection gateway.
//!
//! DESIGN
//! ======
//! On upgrade, a fresh session identity is minted (a reconnect is a new
//! user), `user_connected` is sent, and the task enters a `select!` loop:
//! - inbound client messages → parse + dispatch, replies written immediately
//! - broadcasts from room peers → forwarded to the socket in arrival order
//!
//! Replies from a dispatch are flushed to the socket before the loop returns
//! to `select!`, so the `drawing_data` snapshot produced by a join always
//! reaches the client before any live event that queued up on the broadcast
//! channel afterwards.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → `user_connected` with the assigned id
//! 2. Client messages → `process_message` → replies + room broadcasts
//! 3. Close or socket error → implicit leave (peers see `user_left` and a
//!    roster update), then cleanup

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::protocol::{ClientMessage, DrawAction, ServerMessage};
use crate::services::registry;
use crate::state::{AppState, DEFAULT_ROOM_ID, Session};

/// Outbound channel depth per connection. A client that falls this far
/// behind starts losing broadcasts rather than stalling the room.
const OUTBOUND_BUFFER: usize = 256;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let mut session = Session::new();
    let (client_tx, mut client_rx) = mpsc::channel::<ServerMessage>(OUTBOUND_BUFFER);

    let welcome = ServerMessage::UserConnected { user_id: session.user_id };
    if send_message(&mut socket, &welcome).await.is_err() {
        return;
    }
    info!(user_id = %session.user_id, "ws: client connected");

    'conn: loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let replies = process_text(&state, &mut session, &client_tx, text.as_str()).await;
                        for reply in replies {
                            if send_message(&mut socket, &reply).await.is_err() {
                                break 'conn;
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(message) = client_rx.recv() => {
                if send_message(&mut socket, &message).await.is_err() {
                    break;
                }
            }
        }
    }

    // Disconnect is an implicit leave: presence is removed and peers receive
    // the same notifications as for an explicit leave.
    registry::leave_room(&state, &mut session).await;
    info!(user_id = %session.user_id, "ws: client disconnected");
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Parse one inbound text payload and dispatch it. Unparseable payloads are
/// dropped — the protocol has no generic error message, and a client that
/// sends malformed JSON gets nothing back, as the original wire behaves.
async fn process_text(
    state: &AppState,
    session: &mut Session,
    client_tx: &mpsc::Sender<ServerMessage>,
    text: &str,
) -> Vec<ServerMessage> {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            warn!(user_id = %session.user_id, error = %e, "ws: invalid inbound message");
            return Vec::new();
        }
    };
    process_message(state, session, client_tx, message).await
}

/// Handle one client message and return the frames owed to the sender.
/// Broadcasts to room peers happen inside, under the room's serialization
/// point, so peers observe drawing mutations in commit order.
async fn process_message(
    state: &AppState,
    session: &mut Session,
    client_tx: &mpsc::Sender<ServerMessage>,
    message: ClientMessage,
) -> Vec<ServerMessage> {
    match message {
        ClientMessage::JoinRoom { room_id, username, password } => {
            // The requested name is applied up front (the join broadcasts it
            // to the new room) and rolled back if the join is rejected, so a
            // failed join leaves the session exactly as it was.
            let prev_username = session.username.clone();
            if let Some(name) = username {
                let name = name.trim();
                if !name.is_empty() {
                    session.username = name.to_owned();
                }
            }
            let room_id = room_id.as_deref().unwrap_or(DEFAULT_ROOM_ID);

            match registry::join_room(state, session, room_id, password.as_deref(), client_tx.clone()).await {
                Ok(join) => vec![
                    ServerMessage::RoomJoined {
                        room_id: join.room.id.clone(),
                        room_name: join.room.name.clone(),
                        is_private: join.room.is_private(),
                        user_count: join.user_count,
                    },
                    // Snapshot is sent exactly once; everything after it
                    // arrives live through the broadcast channel.
                    ServerMessage::DrawingData { data: join.snapshot },
                ],
                Err(e) => {
                    session.username = prev_username;
                    vec![ServerMessage::RoomJoinError { message: e.to_string() }]
                }
            }
        }

        ClientMessage::CreatePrivateRoom { room_name, password, max_users } => {
            match registry::create_private_room(state, &room_name, &password, max_users).await {
                Ok(room) => vec![ServerMessage::PrivateRoomCreated {
                    room_id: room.id.clone(),
                    room_name: room.name.clone(),
                    max_users,
                }],
                Err(e) => vec![ServerMessage::RoomCreationError { message: e.to_string() }],
            }
        }

        ClientMessage::Draw { x0, y0, x1, y1, color, size, tool: _ } => {
            // Drawing outside a room is silently dropped.
            let Some(room) = session.room.clone() else {
                return Vec::new();
            };
            let mut inner = room.lock().await;
            let event = inner.log.append(
                session.user_id,
                DrawAction::Stroke { x0, y0, x1, y1, color: color.clone(), size },
            );
            // Sender excluded: it already applied the stroke locally.
            inner.router.broadcast(
                &ServerMessage::Draw { user_id: session.user_id, seq: event.seq, x0, y0, x1, y1, color, size },
                Some(session.user_id),
            );
            Vec::new()
        }

        ClientMessage::Erase { x0, y0, x1, y1, size } => {
            let Some(room) = session.room.clone() else {
                return Vec::new();
            };
            let mut inner = room.lock().await;
            let event = inner
                .log
                .append(session.user_id, DrawAction::Erase { x0, y0, x1, y1, size });
            inner.router.broadcast(
                &ServerMessage::Erase { user_id: session.user_id, seq: event.seq, x0, y0, x1, y1, size },
                Some(session.user_id),
            );
            Vec::new()
        }

        ClientMessage::ClearCanvas => {
            let Some(room) = session.room.clone() else {
                return Vec::new();
            };
            let mut inner = room.lock().await;
            inner.log.clear(session.user_id);
            info!(user_id = %session.user_id, room_id = %room.id, "canvas cleared");
            // Clear reflects authoritative shared state, so the sender is
            // included and receives it through its own channel.
            inner.router.broadcast(&ServerMessage::ClearCanvas, None);
            Vec::new()
        }

        ClientMessage::CursorMove { x, y } => {
            let Some(room) = session.room.clone() else {
                return Vec::new();
            };
            let mut inner = room.lock().await;
            if inner.presence.update_cursor(session.user_id, x, y) {
                inner.router.broadcast(
                    &ServerMessage::CursorMove {
                        user_id: session.user_id,
                        x,
                        y,
                        username: session.username.clone(),
                    },
                    Some(session.user_id),
                );
            }
            Vec::new()
        }

        ClientMessage::ChangeTool { update } => {
            // The session color follows tool color even outside a room, so
            // the next roster the user appears in shows it.
            if let Some(color) = &update.color {
                session.color = color.clone();
            }
            let Some(room) = session.room.clone() else {
                return Vec::new();
            };
            let mut inner = room.lock().await;
            if inner.presence.update_tool(session.user_id, &update) {
                inner.router.broadcast(
                    &ServerMessage::UserToolChange {
                        user_id: session.user_id,
                        username: session.username.clone(),
                        tool_data: update,
                    },
                    Some(session.user_id),
                );
            }
            Vec::new()
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_message(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), ()> {
    let json = match serde_json::to_string(message) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize message");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
