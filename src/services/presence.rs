//! Presence tracker — who is in a room, where their cursor is, and what tool
//! they hold.
//!
//! DESIGN
//! ======
//! Presence is last-write-wins state with no history: cursor positions are
//! overwritten in place, tool updates merge field-wise. None of it is
//! serialized with the event log — losing or reordering a cursor move has no
//! correctness impact. The roster is ordered by join sequence so repeated
//! roster broadcasts list members stably.

use std::collections::HashMap;

use uuid::Uuid;

use crate::protocol::{RosterEntry, ToolUpdate};

/// Tool state carried per member, merged from partial `change_tool` updates.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolState {
    pub tool: String,
    pub color: String,
    pub size: f64,
}

impl Default for ToolState {
    fn default() -> Self {
        Self { tool: "brush".into(), color: "#000000".into(), size: 2.0 }
    }
}

/// Live per-member presentation state.
#[derive(Debug, Clone)]
pub struct Presence {
    pub username: String,
    pub color: String,
    pub cursor: (f64, f64),
    pub tool: ToolState,
    join_seq: u64,
}

/// Per-room membership and presence map.
#[derive(Debug)]
pub struct PresenceTracker {
    members: HashMap<Uuid, Presence>,
    next_join_seq: u64,
}

impl PresenceTracker {
    #[must_use]
    pub fn new() -> Self {
        Self { members: HashMap::new(), next_join_seq: 0 }
    }

    pub fn register(&mut self, user_id: Uuid, username: &str, color: &str) {
        let presence = Presence {
            username: username.to_owned(),
            color: color.to_owned(),
            cursor: (0.0, 0.0),
            tool: ToolState::default(),
            join_seq: self.next_join_seq,
        };
        self.next_join_seq += 1;
        self.members.insert(user_id, presence);
    }

    pub fn unregister(&mut self, user_id: Uuid) -> Option<Presence> {
        self.members.remove(&user_id)
    }

    /// Unconditional overwrite. Returns false for unknown members.
    pub fn update_cursor(&mut self, user_id: Uuid, x: f64, y: f64) -> bool {
        let Some(presence) = self.members.get_mut(&user_id) else {
            return false;
        };
        presence.cursor = (x, y);
        true
    }

    /// Merge a partial tool update into the member's current tool state. A
    /// color change also recolors the member's roster entry, matching how the
    /// roster is rendered client-side.
    pub fn update_tool(&mut self, user_id: Uuid, update: &ToolUpdate) -> bool {
        let Some(presence) = self.members.get_mut(&user_id) else {
            return false;
        };
        if let Some(tool) = &update.tool {
            presence.tool.tool = tool.clone();
        }
        if let Some(color) = &update.color {
            presence.tool.color = color.clone();
            presence.color = color.clone();
        }
        if let Some(size) = update.size {
            presence.tool.size = size;
        }
        true
    }

    #[must_use]
    pub fn get(&self, user_id: Uuid) -> Option<&Presence> {
        self.members.get(&user_id)
    }

    #[must_use]
    pub fn contains(&self, user_id: Uuid) -> bool {
        self.members.contains_key(&user_id)
    }

    /// Current members in join order, for a full roster broadcast.
    #[must_use]
    pub fn roster(&self) -> Vec<RosterEntry> {
        let mut entries: Vec<(u64, RosterEntry)> = self
            .members
            .iter()
            .map(|(user_id, p)| {
                (
                    p.join_seq,
                    RosterEntry { user_id: *user_id, username: p.username.clone(), color: p.color.clone() },
                )
            })
            .collect();
        entries.sort_by_key(|(join_seq, _)| *join_seq);
        entries.into_iter().map(|(_, entry)| entry).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "presence_test.rs"]
mod tests;
