use super::*;
use uuid::Uuid;

// =============================================================================
// TEST SURFACES
// =============================================================================

/// Records every primitive call, for asserting order and arguments.
#[derive(Default)]
struct RecordingSurface {
    calls: Vec<String>,
}

impl Surface for RecordingSurface {
    fn stroke(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: &str, size: f64) {
        self.calls.push(format!("stroke({x0},{y0},{x1},{y1},{color},{size})"));
    }

    fn erase(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, size: f64) {
        self.calls.push(format!("erase({x0},{y0},{x1},{y1},{size})"));
    }

    fn clear(&mut self) {
        self.calls.push("clear".into());
    }
}

/// A one-pixel canvas. Stroke paints its color, erase blanks it, clear
/// resets it. Coarse, but enough to show that draw and erase do not commute.
#[derive(Default)]
struct PixelSurface {
    color: Option<String>,
}

impl Surface for PixelSurface {
    fn stroke(&mut self, _x0: f64, _y0: f64, _x1: f64, _y1: f64, color: &str, _size: f64) {
        self.color = Some(color.to_owned());
    }

    fn erase(&mut self, _x0: f64, _y0: f64, _x1: f64, _y1: f64, _size: f64) {
        self.color = None;
    }

    fn clear(&mut self) {
        self.color = None;
    }
}

fn event(seq: u64, action: DrawAction) -> DrawEvent {
    DrawEvent { seq, user_id: Uuid::new_v4(), ts_ms: 1_700_000_000_000, action }
}

fn stroke(seq: u64, color: &str) -> DrawEvent {
    event(seq, DrawAction::Stroke { x0: 0.0, y0: 0.0, x1: 10.0, y1: 10.0, color: color.into(), size: 2.0 })
}

fn erase(seq: u64) -> DrawEvent {
    event(seq, DrawAction::Erase { x0: 0.0, y0: 0.0, x1: 10.0, y1: 10.0, size: 8.0 })
}

// =============================================================================
// SNAPSHOT REPLAY
// =============================================================================

#[test]
fn snapshot_clears_before_replaying() {
    let mut reconciler = Reconciler::new(RecordingSurface::default());
    reconciler.apply_snapshot(&[stroke(0, "#ff0000"), erase(1)]);

    assert_eq!(
        reconciler.surface().calls,
        vec!["clear", "stroke(0,0,10,10,#ff0000,2)", "erase(0,0,10,10,8)"]
    );
    assert_eq!(reconciler.last_seq(), Some(1));
}

#[test]
fn empty_snapshot_still_resets_the_surface() {
    let mut reconciler = Reconciler::new(RecordingSurface::default());
    reconciler.apply_live(&stroke(5, "#ff0000"));
    reconciler.apply_snapshot(&[]);

    assert_eq!(reconciler.surface().calls.last().map(String::as_str), Some("clear"));
    assert_eq!(reconciler.last_seq(), None);
}

#[test]
fn overlapping_draw_and_erase_do_not_commute() {
    // Same two events, both orders. The committed order decides the pixels.
    let mut draw_then_erase = Reconciler::new(PixelSurface::default());
    draw_then_erase.apply_snapshot(&[stroke(0, "#ff0000"), erase(1)]);
    assert_eq!(draw_then_erase.surface().color, None);

    let mut erase_then_draw = Reconciler::new(PixelSurface::default());
    erase_then_draw.apply_snapshot(&[erase(0), stroke(1, "#ff0000")]);
    assert_eq!(erase_then_draw.surface().color.as_deref(), Some("#ff0000"));
}

#[test]
fn clear_marker_in_a_snapshot_resets_mid_replay() {
    let mut reconciler = Reconciler::new(PixelSurface::default());
    reconciler.apply_snapshot(&[
        stroke(0, "#ff0000"),
        event(1, DrawAction::Clear),
        stroke(2, "#00ff00"),
    ]);

    assert_eq!(reconciler.surface().color.as_deref(), Some("#00ff00"));
    assert_eq!(reconciler.last_seq(), Some(2));
}

#[test]
fn replaying_the_same_snapshot_is_idempotent() {
    let snapshot = [stroke(0, "#ff0000"), erase(1), stroke(2, "#0000ff")];

    let mut once = Reconciler::new(PixelSurface::default());
    once.apply_snapshot(&snapshot);
    let mut twice = Reconciler::new(PixelSurface::default());
    twice.apply_snapshot(&snapshot);
    twice.apply_snapshot(&snapshot);

    assert_eq!(once.surface().color, twice.surface().color);
    assert_eq!(once.last_seq(), twice.last_seq());
}

// =============================================================================
// LIVE EVENTS AND MESSAGES
// =============================================================================

#[test]
fn live_events_extend_the_replayed_state() {
    let mut reconciler = Reconciler::new(RecordingSurface::default());
    reconciler.apply_snapshot(&[stroke(0, "#ff0000")]);
    reconciler.apply_live(&stroke(1, "#00ff00"));

    // No extra clear between snapshot and live stream.
    assert_eq!(
        reconciler.surface().calls,
        vec!["clear", "stroke(0,0,10,10,#ff0000,2)", "stroke(0,0,10,10,#00ff00,2)"]
    );
    assert_eq!(reconciler.last_seq(), Some(1));
}

#[test]
fn drawing_messages_drive_the_surface() {
    let mut reconciler = Reconciler::new(RecordingSurface::default());
    let user_id = Uuid::new_v4();

    reconciler.apply_message(&ServerMessage::DrawingData { data: vec![stroke(0, "#ff0000")] });
    reconciler.apply_message(&ServerMessage::Draw {
        user_id,
        seq: 1,
        x0: 1.0,
        y0: 1.0,
        x1: 2.0,
        y1: 2.0,
        color: "#00ff00".into(),
        size: 4.0,
    });
    reconciler.apply_message(&ServerMessage::Erase {
        user_id,
        seq: 2,
        x0: 1.0,
        y0: 1.0,
        x1: 2.0,
        y1: 2.0,
        size: 8.0,
    });
    assert_eq!(reconciler.last_seq(), Some(2));

    reconciler.apply_message(&ServerMessage::ClearCanvas);
    assert_eq!(
        reconciler.surface().calls,
        vec![
            "clear",
            "stroke(0,0,10,10,#ff0000,2)",
            "stroke(1,1,2,2,#00ff00,4)",
            "erase(1,1,2,2,8)",
            "clear",
        ]
    );
}

#[test]
fn presence_messages_never_touch_the_surface() {
    let mut reconciler = Reconciler::new(RecordingSurface::default());
    let user_id = Uuid::new_v4();

    reconciler.apply_message(&ServerMessage::UserJoined { user_id, username: "Alice".into() });
    reconciler.apply_message(&ServerMessage::UserLeft { user_id, username: "Alice".into() });
    reconciler.apply_message(&ServerMessage::UsersUpdate { users: vec![] });
    reconciler.apply_message(&ServerMessage::CursorMove { user_id, x: 1.0, y: 2.0, username: "Alice".into() });
    reconciler.apply_message(&ServerMessage::UserConnected { user_id });

    assert!(reconciler.surface().calls.is_empty());
    assert_eq!(reconciler.last_seq(), None);
}

#[test]
fn into_surface_releases_the_canvas() {
    let mut reconciler = Reconciler::new(PixelSurface::default());
    reconciler.apply_live(&stroke(0, "#ff0000"));
    let surface = reconciler.into_surface();
    assert_eq!(surface.color.as_deref(), Some("#ff0000"));
}
