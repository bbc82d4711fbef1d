//! Client-side reconciler — deterministic replay of room history.
//!
//! DESIGN
//! ======
//! The reconciler is the client's only writer to the drawing surface. The
//! surface itself (rasterization, line primitives) lives behind the
//! [`Surface`] trait — it is an external collaborator, not part of the
//! synchronization core. What matters here is order: overlapping draw and
//! erase segments do not commute, so a snapshot must be replayed in exactly
//! its committed sequence, from a cleared surface, using the same primitives
//! as live events.
//!
//! Presence traffic (cursors, tools, rosters) never reaches the surface.

use crate::protocol::{DrawAction, DrawEvent, ServerMessage};

/// Drawing primitives the reconciler drives. Implementations rasterize;
/// the reconciler only sequences.
pub trait Surface {
    /// Paint one stroke segment.
    fn stroke(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: &str, size: f64);
    /// Erase along one segment.
    fn erase(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, size: f64);
    /// Reset to the empty surface.
    fn clear(&mut self);
}

/// Applies snapshots and live events to a [`Surface`] in commit order.
pub struct Reconciler<S: Surface> {
    surface: S,
    /// Sequence number of the most recently applied event.
    last_seq: Option<u64>,
}

impl<S: Surface> Reconciler<S> {
    pub fn new(surface: S) -> Self {
        Self { surface, last_seq: None }
    }

    /// Replace local state with a room snapshot: clear, then replay every
    /// event in the snapshot's exact order.
    pub fn apply_snapshot(&mut self, events: &[DrawEvent]) {
        self.surface.clear();
        self.last_seq = None;
        for event in events {
            self.apply_event(event);
        }
    }

    /// Apply one live event without re-clearing.
    pub fn apply_live(&mut self, event: &DrawEvent) {
        self.apply_event(event);
    }

    /// Handle one server message. Drawing messages mutate the surface;
    /// presence messages are ignored here — they update presentation state
    /// the caller owns, never the canvas.
    pub fn apply_message(&mut self, message: &ServerMessage) {
        match message {
            ServerMessage::DrawingData { data } => self.apply_snapshot(data),
            ServerMessage::Draw { seq, x0, y0, x1, y1, color, size, .. } => {
                self.surface.stroke(*x0, *y0, *x1, *y1, color, *size);
                self.last_seq = Some(*seq);
            }
            ServerMessage::Erase { seq, x0, y0, x1, y1, size, .. } => {
                self.surface.erase(*x0, *y0, *x1, *y1, *size);
                self.last_seq = Some(*seq);
            }
            // A clear notification needs no snapshot: clear is defined to
            // reset history.
            ServerMessage::ClearCanvas => {
                self.surface.clear();
            }
            _ => {}
        }
    }

    fn apply_event(&mut self, event: &DrawEvent) {
        match &event.action {
            DrawAction::Stroke { x0, y0, x1, y1, color, size } => {
                self.surface.stroke(*x0, *y0, *x1, *y1, color, *size);
            }
            DrawAction::Erase { x0, y0, x1, y1, size } => {
                self.surface.erase(*x0, *y0, *x1, *y1, *size);
            }
            DrawAction::Clear => self.surface.clear(),
        }
        self.last_seq = Some(event.seq);
    }

    /// Sequence number of the most recently applied event, if any.
    pub fn last_seq(&self) -> Option<u64> {
        self.last_seq
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;
