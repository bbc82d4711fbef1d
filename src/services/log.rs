//! Event log — the ordered, append-only record of drawing mutations.
//!
//! DESIGN
//! ======
//! One log per room, mutated only under the room's serialization point. The
//! log is the authoritative history: rendering state is always a pure
//! function of replaying it in sequence order, which is what makes late-join
//! consistency achievable without handing off live pixels. Sequence numbers
//! are strictly increasing and gapless within a room; `clear` swaps the
//! stored history for a single clear marker but keeps the counter advancing,
//! so a clear is itself an ordered, observable commit.

use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::protocol::{DrawAction, DrawEvent};

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

/// Append-only drawing history for one room.
#[derive(Debug)]
pub struct EventLog {
    events: Vec<DrawEvent>,
    next_seq: u64,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self { events: Vec::new(), next_seq: 0 }
    }

    /// Commit one mutation: assign the next sequence number, store the event,
    /// and return it for broadcast.
    pub fn append(&mut self, user_id: Uuid, action: DrawAction) -> DrawEvent {
        let event = DrawEvent { seq: self.next_seq, user_id, ts_ms: now_ms(), action };
        self.next_seq += 1;
        self.events.push(event.clone());
        event
    }

    /// Atomically replace the stored history with a single clear marker.
    /// Subsequent snapshots contain no pre-clear events; the sequence counter
    /// keeps advancing so the marker is ordered like any other commit.
    pub fn clear(&mut self, user_id: Uuid) -> DrawEvent {
        let marker = DrawEvent { seq: self.next_seq, user_id, ts_ms: now_ms(), action: DrawAction::Clear };
        self.next_seq += 1;
        self.events.clear();
        self.events.push(marker.clone());
        marker
    }

    /// The full ordered history at the instant of call. Callers must hold the
    /// room lock across snapshot + subscribe so no concurrent append can land
    /// in between.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DrawEvent> {
        self.events.clone()
    }

    /// Sequence number the next commit will receive.
    #[must_use]
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "log_test.rs"]
mod tests;
