//! Broadcast router — fan-out of server messages to a room's subscribers.
//!
//! DESIGN
//! ======
//! Each connection subscribes an `mpsc` sender; the websocket task on the
//! other end writes received messages to the socket in arrival order.
//! Delivery is best-effort per connection (no retry, no buffering beyond the
//! live channel), but per-room commit order is preserved because every
//! log-coupled broadcast happens under the room's serialization point: events
//! enter each subscriber's channel in exactly the order they were committed.

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::protocol::ServerMessage;

/// Per-room subscriber set.
#[derive(Debug)]
pub struct BroadcastRouter {
    subscribers: Vec<(Uuid, mpsc::Sender<ServerMessage>)>,
}

impl BroadcastRouter {
    #[must_use]
    pub fn new() -> Self {
        Self { subscribers: Vec::new() }
    }

    /// Bind a connection's outbound channel. Replaces any previous channel
    /// for the same user.
    pub fn subscribe(&mut self, user_id: Uuid, tx: mpsc::Sender<ServerMessage>) {
        self.unsubscribe(user_id);
        self.subscribers.push((user_id, tx));
    }

    pub fn unsubscribe(&mut self, user_id: Uuid) {
        self.subscribers.retain(|(id, _)| *id != user_id);
    }

    /// Deliver a message to every subscriber, optionally excluding one
    /// (drawing, cursor, and tool events exclude their sender, which already
    /// applied the action locally).
    pub fn broadcast(&self, message: &ServerMessage, exclude: Option<Uuid>) {
        for (user_id, tx) in &self.subscribers {
            if exclude == Some(*user_id) {
                continue;
            }
            // Best-effort: if a client's channel is full, skip it.
            let _ = tx.try_send(message.clone());
        }
    }

    /// Deliver to a single subscriber.
    pub fn send_to(&self, user_id: Uuid, message: &ServerMessage) {
        for (id, tx) in &self.subscribers {
            if *id == user_id {
                let _ = tx.try_send(message.clone());
                return;
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl Default for BroadcastRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod tests;
