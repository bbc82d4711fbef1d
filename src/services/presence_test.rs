use super::*;

#[test]
fn register_and_unregister_round_trip() {
    let user = Uuid::new_v4();
    let mut tracker = PresenceTracker::new();
    tracker.register(user, "Alice", "#e6194b");

    assert!(tracker.contains(user));
    assert_eq!(tracker.len(), 1);
    let presence = tracker.get(user).expect("registered member");
    assert_eq!(presence.username, "Alice");
    assert_eq!(presence.cursor, (0.0, 0.0));
    assert_eq!(presence.tool, ToolState::default());

    let removed = tracker.unregister(user).expect("member present");
    assert_eq!(removed.username, "Alice");
    assert!(tracker.is_empty());
    assert!(tracker.unregister(user).is_none());
}

#[test]
fn cursor_update_is_last_write_wins() {
    let user = Uuid::new_v4();
    let mut tracker = PresenceTracker::new();
    tracker.register(user, "Alice", "#e6194b");

    assert!(tracker.update_cursor(user, 10.0, 20.0));
    assert!(tracker.update_cursor(user, 300.0, 400.0));
    assert_eq!(tracker.get(user).expect("member").cursor, (300.0, 400.0));

    assert!(!tracker.update_cursor(Uuid::new_v4(), 1.0, 1.0));
}

#[test]
fn tool_update_merges_partial_fields() {
    let user = Uuid::new_v4();
    let mut tracker = PresenceTracker::new();
    tracker.register(user, "Alice", "#e6194b");

    let color_only = ToolUpdate { color: Some("#00ff00".into()), ..ToolUpdate::default() };
    assert!(tracker.update_tool(user, &color_only));
    let presence = tracker.get(user).expect("member");
    assert_eq!(presence.tool.color, "#00ff00");
    assert_eq!(presence.tool.tool, "brush");
    assert!((presence.tool.size - 2.0).abs() < f64::EPSILON);
    // Tool color recolors the roster entry too.
    assert_eq!(presence.color, "#00ff00");

    let tool_and_size = ToolUpdate { tool: Some("eraser".into()), size: Some(16.0), ..ToolUpdate::default() };
    assert!(tracker.update_tool(user, &tool_and_size));
    let presence = tracker.get(user).expect("member");
    assert_eq!(presence.tool.tool, "eraser");
    assert!((presence.tool.size - 16.0).abs() < f64::EPSILON);
    // Earlier color merge survives unrelated updates.
    assert_eq!(presence.tool.color, "#00ff00");
}

#[test]
fn roster_lists_members_in_join_order() {
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let carol = Uuid::new_v4();
    let mut tracker = PresenceTracker::new();
    tracker.register(alice, "Alice", "#e6194b");
    tracker.register(bob, "Bob", "#3cb44b");
    tracker.register(carol, "Carol", "#4363d8");

    let names: Vec<String> = tracker.roster().into_iter().map(|e| e.username).collect();
    assert_eq!(names, vec!["Alice", "Bob", "Carol"]);

    // Leaving and rejoining moves a member to the end.
    tracker.unregister(alice);
    tracker.register(alice, "Alice", "#e6194b");
    let names: Vec<String> = tracker.roster().into_iter().map(|e| e.username).collect();
    assert_eq!(names, vec!["Bob", "Carol", "Alice"]);
}

#[test]
fn roster_entries_carry_identity_and_color() {
    let user = Uuid::new_v4();
    let mut tracker = PresenceTracker::new();
    tracker.register(user, "Alice", "#e6194b");

    let roster = tracker.roster();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].user_id, user);
    assert_eq!(roster[0].username, "Alice");
    assert_eq!(roster[0].color, "#e6194b");
}
