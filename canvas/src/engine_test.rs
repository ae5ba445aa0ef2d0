#![allow(clippy::float_cmp)]

use super::*;
use crate::presence::PresenceColor;

// =============================================================
// Helpers
// =============================================================

const VW: f64 = 800.0;
const VH: f64 = 600.0;

fn config() -> EngineConfig {
    let mut config = EngineConfig::new("board-1", 100, 100);
    config.self_id = "me".to_owned();
    config
}

/// A live 100×100 core in an 800×600 viewport, with no frame outstanding.
fn ready_core() -> EngineCore {
    ready_core_with(Vec::new())
}

fn ready_core_with(cells: Vec<Cell>) -> EngineCore {
    let mut core = EngineCore::new(config());
    core.set_viewport(VW, VH, 1.0);
    core.load_snapshot(cells);
    core.begin_frame();
    core
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn no_mods() -> Modifiers {
    Modifiers::default()
}

/// Screen point at the center of `pos` after centering the view on it.
fn aim_at(core: &mut EngineCore, pos: GridPos) -> Point {
    core.center_on(pos, None);
    core.begin_frame();
    pt(VW * 0.5, VH * 0.5)
}

fn click(core: &mut EngineCore, pos: GridPos) -> Vec<Action> {
    let at = aim_at(core, pos);
    let actions = core.on_pointer_down(at, Button::Primary, no_mods(), 0.0);
    core.on_pointer_up(at, Button::Primary);
    actions
}

fn submitted(actions: &[Action]) -> Option<(PaintTicket, Cell)> {
    actions.iter().find_map(|a| match a {
        Action::SubmitPaint { ticket, cell, .. } => Some((*ticket, *cell)),
        _ => None,
    })
}

fn render_requests(actions: &[Action]) -> usize {
    actions.iter().filter(|a| **a == Action::RenderNeeded).count()
}

fn has_notice(actions: &[Action]) -> bool {
    actions.iter().any(|a| matches!(a, Action::Notice(_)))
}

// =============================================================
// Lifecycle
// =============================================================

#[test]
fn new_core_is_loading() {
    let core = EngineCore::new(config());
    assert_eq!(*core.status(), SessionStatus::Loading);
    assert_eq!(core.raster().painted_count(), 0);
    assert_eq!(core.viewport().scale(), 12.0);
}

#[test]
fn input_ignored_while_loading() {
    let mut core = EngineCore::new(config());
    core.set_viewport(VW, VH, 1.0);
    let actions = core.on_pointer_down(pt(400.0, 300.0), Button::Primary, no_mods(), 0.0);
    assert!(actions.is_empty());
    assert!(core.on_wheel(pt(400.0, 300.0), WheelDelta { dx: 0.0, dy: -1.0 }).is_empty());
    assert_eq!(core.raster().painted_count(), 0);
}

#[test]
fn first_viewport_size_centers_grid() {
    let mut core = EngineCore::new(config());
    let actions = core.set_viewport(VW, VH, 2.0);
    assert_eq!(render_requests(&actions), 1);
    let vp = core.viewport();
    assert_eq!(vp.offset_x, (VW - 1200.0) * 0.5);
    assert_eq!(vp.offset_y, (VH - 1200.0) * 0.5);
    assert_eq!(core.dpr(), 2.0);

    // A resize afterwards keeps the user's position.
    core.set_viewport(1024.0, 768.0, 2.0);
    assert_eq!(core.viewport(), vp);
}

#[test]
fn snapshot_makes_core_ready() {
    let mut core = EngineCore::new(config());
    let actions = core.load_snapshot(vec![Cell::new(1, 1, 3), Cell::new(500, 1, 3)]);
    assert!(actions.contains(&Action::StatusChanged(SessionStatus::Ready)));
    assert_eq!(core.raster().get(GridPos::new(1, 1)), Some(3));
    assert_eq!(core.raster().painted_count(), 1);
}

#[test]
fn snapshot_failure_blanks_board() {
    let mut core = EngineCore::new(config());
    core.set_viewport(VW, VH, 1.0);
    // The loading frame has been drawn.
    core.begin_frame();
    let err = SessionError::Snapshot("503".to_owned());
    let actions = core.snapshot_failed(&err);
    assert!(matches!(core.status(), SessionStatus::Failed(msg) if msg.contains("503")));
    assert!(matches!(actions.as_slice(), [Action::StatusChanged(SessionStatus::Failed(_)), Action::RenderNeeded]));
    assert!(core.on_pointer_down(pt(400.0, 300.0), Button::Primary, no_mods(), 0.0).is_empty());
}

#[test]
fn disconnect_and_reconnect_toggle_status() {
    let mut core = ready_core();
    let actions = core.feed_disconnected();
    assert!(actions.contains(&Action::StatusChanged(SessionStatus::Disconnected)));
    assert!(core.status().shows_board());
    assert!(core.feed_disconnected().is_empty());

    let actions = core.feed_reconnected();
    assert!(actions.contains(&Action::StatusChanged(SessionStatus::Ready)));
}

#[test]
fn close_forgets_pending_paints() {
    let mut core = ready_core();
    let (ticket, _) = submitted(&click(&mut core, GridPos::new(3, 3))).expect("submit");
    core.begin_frame();
    let actions = core.close();
    assert_eq!(actions, vec![Action::StatusChanged(SessionStatus::Closed), Action::RenderNeeded]);
    assert_eq!(core.pending_paints(), 0);
    // A late answer for a closed session changes nothing.
    assert!(core.resolve_paint(ticket, Err(PaintError::Network("gone".to_owned()))).is_empty());
    assert_eq!(core.raster().get(GridPos::new(3, 3)), Some(0));
    assert!(core.close().is_empty());
}

// =============================================================
// Painting
// =============================================================

#[test]
fn paint_is_applied_before_confirmation() {
    let mut core = ready_core();
    core.set_color(2);
    let actions = click(&mut core, GridPos::new(10, 10));

    assert_eq!(core.raster().get(GridPos::new(10, 10)), Some(2));
    assert_eq!(render_requests(&actions), 1);
    let (_, cell) = submitted(&actions).expect("submit");
    assert_eq!(cell, Cell::new(10, 10, 2));
    assert!(actions.iter().any(|a| matches!(a, Action::SubmitPaint { board_id, .. } if board_id == "board-1")));
    assert_eq!(core.pending_paints(), 1);
}

#[test]
fn confirmed_paint_arms_cooldown() {
    let mut core = ready_core();
    core.set_color(2);
    let (ticket, _) = submitted(&click(&mut core, GridPos::new(10, 10))).expect("submit");

    let actions = core.resolve_paint(ticket, Ok(()));
    assert!(actions.contains(&Action::CooldownChanged { remaining_ms: 2000 }));
    assert!(actions.contains(&Action::PaintSettled { ticket, phase: PaintPhase::Confirmed }));
    assert_eq!(core.raster().get(GridPos::new(10, 10)), Some(2));
    assert_eq!(core.cooldown_remaining_ms(), 2000);
    assert_eq!(core.pending_paints(), 0);
}

#[test]
fn paint_blocked_during_cooldown() {
    let mut core = ready_core();
    let (ticket, _) = submitted(&click(&mut core, GridPos::new(10, 10))).expect("submit");
    core.resolve_paint(ticket, Ok(()));

    let actions = click(&mut core, GridPos::new(11, 10));
    assert!(submitted(&actions).is_none());
    assert_eq!(core.raster().get(GridPos::new(11, 10)), None);

    for _ in 0..20 {
        core.tick_cooldown(100);
    }
    assert_eq!(core.cooldown_remaining_ms(), 0);
    assert!(submitted(&click(&mut core, GridPos::new(11, 10))).is_some());
}

#[test]
fn cooldown_ticks_report_remaining() {
    let mut core = ready_core();
    assert!(core.tick_cooldown(100).is_empty());
    let (ticket, _) = submitted(&click(&mut core, GridPos::new(1, 1))).expect("submit");
    core.resolve_paint(ticket, Ok(()));
    assert_eq!(core.tick_cooldown(100), vec![Action::CooldownChanged { remaining_ms: 1900 }]);
}

#[test]
fn paint_outside_grid_is_ignored() {
    let mut core = ready_core();
    core.center_on(GridPos::new(0, 0), None);
    // Left of and above cell (0, 0).
    let actions = core.on_pointer_down(pt(VW * 0.5 - 30.0, VH * 0.5 - 30.0), Button::Primary, no_mods(), 0.0);
    assert!(submitted(&actions).is_none());
    assert_eq!(core.raster().painted_count(), 0);
}

#[test]
fn repainting_same_color_still_submits() {
    let mut core = ready_core_with(vec![Cell::new(4, 4, 0)]);
    let actions = click(&mut core, GridPos::new(4, 4));
    assert!(submitted(&actions).is_some());
    assert_eq!(render_requests(&actions), 0);
}

#[test]
fn rate_limited_paint_rolls_back() {
    let mut core = ready_core();
    core.set_color(2);
    let (ticket, _) = submitted(&click(&mut core, GridPos::new(10, 10))).expect("submit");

    let actions = core.resolve_paint(ticket, Err(PaintError::RateLimited { retry_after_ms: None }));
    assert_eq!(core.raster().get(GridPos::new(10, 10)), None);
    assert!(actions.contains(&Action::CooldownChanged { remaining_ms: 1500 }));
    assert!(actions.contains(&Action::PaintSettled { ticket, phase: PaintPhase::RolledBack }));
    assert!(!has_notice(&actions));
}

#[test]
fn rate_limit_honors_longer_retry_hint() {
    let mut core = ready_core();
    let (ticket, _) = submitted(&click(&mut core, GridPos::new(10, 10))).expect("submit");
    core.resolve_paint(ticket, Err(PaintError::RateLimited { retry_after_ms: Some(3000) }));
    assert_eq!(core.cooldown_remaining_ms(), 3000);
}

#[test]
fn rejection_restores_prior_color_and_notifies() {
    let mut core = ready_core_with(vec![Cell::new(10, 10, 5)]);
    core.set_color(2);
    let (ticket, _) = submitted(&click(&mut core, GridPos::new(10, 10))).expect("submit");
    assert_eq!(core.raster().get(GridPos::new(10, 10)), Some(2));

    let actions = core.resolve_paint(ticket, Err(PaintError::Validation("board closed".to_owned())));
    assert_eq!(core.raster().get(GridPos::new(10, 10)), Some(5));
    assert!(has_notice(&actions));
    assert_eq!(core.cooldown_remaining_ms(), 0);
}

#[test]
fn superseded_paint_is_not_rolled_back() {
    let mut core = ready_core();
    core.set_color(2);
    let (ticket, _) = submitted(&click(&mut core, GridPos::new(10, 10))).expect("submit");
    core.apply_mutation(Cell::new(10, 10, 7));

    core.resolve_paint(ticket, Err(PaintError::Network("timeout".to_owned())));
    assert_eq!(core.raster().get(GridPos::new(10, 10)), Some(7));
}

#[test]
fn second_local_paint_supersedes_first() {
    let mut core = ready_core();
    core.set_color(2);
    let (first, _) = submitted(&click(&mut core, GridPos::new(10, 10))).expect("submit");
    core.set_color(3);
    let (second, _) = submitted(&click(&mut core, GridPos::new(10, 10))).expect("submit");

    core.resolve_paint(first, Err(PaintError::Network("timeout".to_owned())));
    assert_eq!(core.raster().get(GridPos::new(10, 10)), Some(3));
    core.resolve_paint(second, Ok(()));
    assert_eq!(core.raster().get(GridPos::new(10, 10)), Some(3));
}

#[test]
fn rejecting_stacked_paints_restores_original() {
    let mut core = ready_core();
    core.set_color(2);
    let (first, _) = submitted(&click(&mut core, GridPos::new(10, 10))).expect("submit");
    core.set_color(3);
    let (second, _) = submitted(&click(&mut core, GridPos::new(10, 10))).expect("submit");

    core.resolve_paint(first, Err(PaintError::Validation("nope".to_owned())));
    core.resolve_paint(second, Err(PaintError::Validation("nope".to_owned())));
    assert_eq!(core.raster().get(GridPos::new(10, 10)), None);
}

#[test]
fn rejecting_stacked_paint_keeps_accepted_one_below() {
    let mut core = ready_core();
    core.set_color(2);
    let (first, _) = submitted(&click(&mut core, GridPos::new(10, 10))).expect("submit");
    core.set_color(3);
    let (second, _) = submitted(&click(&mut core, GridPos::new(10, 10))).expect("submit");

    core.resolve_paint(first, Ok(()));
    core.resolve_paint(second, Err(PaintError::Validation("nope".to_owned())));
    assert_eq!(core.raster().get(GridPos::new(10, 10)), Some(2));
}

#[test]
fn unknown_ticket_is_ignored() {
    let mut core = ready_core();
    assert!(core.resolve_paint(uuid::Uuid::new_v4(), Ok(())).is_empty());
    assert_eq!(core.cooldown_remaining_ms(), 0);
}

#[test]
fn selected_color_is_clamped_to_palette() {
    let mut core = ready_core();
    core.set_color(42);
    assert_eq!(core.selected_color(), 7);
}

// =============================================================
// Live mutations and redraw coalescing
// =============================================================

#[test]
fn mutations_are_last_write_wins() {
    let mut core = ready_core();
    core.apply_mutation(Cell::new(5, 5, 1));
    core.apply_mutation(Cell::new(5, 5, 4));
    assert_eq!(core.raster().get(GridPos::new(5, 5)), Some(4));
}

#[test]
fn out_of_bounds_mutation_is_dropped() {
    let mut core = ready_core();
    assert!(core.apply_mutation(Cell::new(-1, 5, 1)).is_empty());
    assert!(core.apply_mutation(Cell::new(100, 0, 1)).is_empty());
    assert_eq!(core.raster().painted_count(), 0);
}

#[test]
fn burst_of_mutations_requests_one_frame() {
    let mut core = ready_core();
    let mut requests = 0;
    for x in 0..50 {
        requests += render_requests(&core.apply_mutation(Cell::new(x, 0, 1)));
    }
    assert_eq!(requests, 1);
    assert!(core.begin_frame());
    assert!(!core.begin_frame());
    assert_eq!(render_requests(&core.apply_mutation(Cell::new(0, 1, 1))), 1);
}

#[test]
fn identical_mutation_needs_no_redraw() {
    let mut core = ready_core_with(vec![Cell::new(2, 2, 6)]);
    assert!(core.apply_mutation(Cell::new(2, 2, 6)).is_empty());
}

// =============================================================
// Hover and presence
// =============================================================

#[test]
fn hover_tracks_pointer_on_grid() {
    let mut core = ready_core();
    let at = aim_at(&mut core, GridPos::new(20, 30));
    let actions = core.on_pointer_move(at, 0.0);
    assert_eq!(core.hover(), Some(GridPos::new(20, 30)));
    assert_eq!(render_requests(&actions), 1);

    core.center_on(GridPos::new(0, 0), None);
    core.on_pointer_move(pt(5.0, 5.0), 1000.0);
    assert_eq!(core.hover(), None);
}

#[test]
fn pointer_leave_clears_hover() {
    let mut core = ready_core();
    let at = aim_at(&mut core, GridPos::new(1, 1));
    core.on_pointer_move(at, 0.0);
    core.begin_frame();
    assert_eq!(render_requests(&core.on_pointer_leave()), 1);
    assert_eq!(core.hover(), None);
    assert!(core.on_pointer_leave().is_empty());
}

#[test]
fn presence_publish_is_throttled() {
    let mut core = ready_core();
    let at = aim_at(&mut core, GridPos::new(20, 30));
    let publishes = |actions: &[Action]| actions.iter().filter(|a| matches!(a, Action::PublishPresence(_))).count();

    let first = core.on_pointer_move(at, 1000.0);
    assert_eq!(publishes(&first), 1);
    assert!(first.contains(&Action::PublishPresence(PresenceUpdate {
        x: 20,
        y: 30,
        color: PresenceColor::Palette(1),
        name: "user".to_owned(),
    })));
    assert_eq!(publishes(&core.on_pointer_move(at, 1100.0)), 0);
    assert_eq!(publishes(&core.on_pointer_move(at, 1150.0)), 1);
}

#[test]
fn presence_snapshot_requests_redraw() {
    let mut core = ready_core();
    let mut snapshot = HashMap::new();
    snapshot.insert(
        "peer".to_owned(),
        PresenceEntry {
            participant_id: String::new(),
            x: 3,
            y: 4,
            color: PresenceColor::Css("#ff0000".to_owned()),
            name: "Ada".to_owned(),
        },
    );
    let actions = core.apply_presence(snapshot);
    assert_eq!(render_requests(&actions), 1);
    assert_eq!(core.presence().len(), 1);
}

#[test]
fn self_entry_uses_configured_identity() {
    let core = ready_core();
    let entry = core.self_entry();
    assert_eq!(entry.participant_id, "me");
    assert_eq!(entry.name, "user");
}

// =============================================================
// Pan, zoom, minimap, share
// =============================================================

#[test]
fn shift_drag_pans() {
    let mut core = ready_core();
    let before = core.viewport();
    let shift = Modifiers { shift: true, ..Default::default() };

    let down = core.on_pointer_down(pt(100.0, 100.0), Button::Primary, shift, 0.0);
    assert_eq!(down, vec![Action::SetCursor(CURSOR_PANNING.to_owned())]);
    core.on_pointer_move(pt(130.0, 90.0), 0.0);
    let after = core.viewport();
    assert_eq!(after.offset_x, before.offset_x + 30.0);
    assert_eq!(after.offset_y, before.offset_y - 10.0);
    assert_eq!(core.raster().painted_count(), 0);

    let up = core.on_pointer_up(pt(130.0, 90.0), Button::Primary);
    assert_eq!(up, vec![Action::SetCursor(CURSOR_DEFAULT.to_owned())]);
    assert!(core.input().is_idle());
}

#[test]
fn middle_drag_pans() {
    let mut core = ready_core();
    let before = core.viewport();
    core.on_pointer_down(pt(100.0, 100.0), Button::Middle, no_mods(), 0.0);
    core.on_pointer_move(pt(90.0, 120.0), 0.0);
    assert_eq!(core.viewport().offset_x, before.offset_x - 10.0);
    assert_eq!(core.viewport().offset_y, before.offset_y + 20.0);
}

#[test]
fn wheel_zooms_around_cursor() {
    let mut core = ready_core();
    let anchor = pt(250.0, 170.0);
    let under = core.viewport().screen_to_grid(anchor);

    let actions = core.on_wheel(anchor, WheelDelta { dx: 0.0, dy: -100.0 });
    assert_eq!(render_requests(&actions), 1);
    assert_eq!(core.viewport().scale(), 13.0);
    assert_eq!(core.viewport().screen_to_grid(anchor), under);

    core.on_wheel(anchor, WheelDelta { dx: 0.0, dy: 100.0 });
    assert_eq!(core.viewport().scale(), 12.0);
}

#[test]
fn wheel_moves_hover_to_cell_under_cursor() {
    let mut core = ready_core();
    core.on_pointer_move(pt(400.0, 300.0), 0.0);
    let anchor = pt(250.0, 170.0);
    core.on_wheel(anchor, WheelDelta { dx: 0.0, dy: -100.0 });
    assert_eq!(core.hover(), Some(core.viewport().screen_to_grid(anchor)));
}

#[test]
fn pan_keeps_hover_under_pointer() {
    let mut core = ready_core();
    let shift = Modifiers { shift: true, ..Default::default() };
    core.on_pointer_down(pt(100.0, 100.0), Button::Primary, shift, 0.0);
    core.on_pointer_move(pt(160.0, 100.0), 0.0);
    assert_eq!(core.hover(), Some(core.viewport().screen_to_grid(pt(160.0, 100.0))));
}

#[test]
fn wheel_at_limit_requests_nothing() {
    let mut core = ready_core();
    core.center_on(GridPos::new(50, 50), Some(4.0));
    core.begin_frame();
    assert!(core.on_wheel(pt(400.0, 300.0), WheelDelta { dx: 0.0, dy: 50.0 }).is_empty());
    assert!(core.on_wheel(pt(400.0, 300.0), WheelDelta { dx: 30.0, dy: 0.0 }).is_empty());
}

#[test]
fn minimap_click_recenters_without_painting() {
    let mut core = ready_core();
    // 160px minimap, 100 cells: 1.6 px per cell, origin at (628, 428).
    let actions = core.on_pointer_down(pt(628.0 + 80.8, 428.0 + 80.8), Button::Primary, no_mods(), 0.0);
    assert!(submitted(&actions).is_none());
    assert_eq!(render_requests(&actions), 1);
    assert_eq!(core.raster().painted_count(), 0);
    assert_eq!(core.viewport().screen_to_grid(pt(VW * 0.5, VH * 0.5)), GridPos::new(50, 50));
    assert!(matches!(core.input(), InputState::MinimapDrag));
}

#[test]
fn minimap_navigation_drops_board_hover() {
    let mut core = ready_core();
    core.on_pointer_move(pt(400.0, 300.0), 0.0);
    assert!(core.hover().is_some());
    core.on_pointer_down(pt(628.0 + 10.0, 428.0 + 10.0), Button::Primary, no_mods(), 0.0);
    assert_eq!(core.hover(), None);
}

#[test]
fn minimap_drag_follows_pointer() {
    let mut core = ready_core();
    core.on_pointer_down(pt(628.0 + 80.8, 428.0 + 80.8), Button::Primary, no_mods(), 0.0);
    core.on_pointer_move(pt(628.0 + 16.8, 428.0 + 16.8), 0.0);
    assert_eq!(core.viewport().screen_to_grid(pt(VW * 0.5, VH * 0.5)), GridPos::new(10, 10));
    // Dragging past the minimap edge clamps to the board.
    core.on_pointer_move(pt(0.0, 0.0), 0.0);
    assert_eq!(core.viewport().screen_to_grid(pt(VW * 0.5, VH * 0.5)), GridPos::new(0, 0));
    core.on_pointer_up(pt(0.0, 0.0), Button::Primary);
    assert!(core.input().is_idle());
    assert_eq!(core.raster().painted_count(), 0);
}

#[test]
fn secondary_click_shares_location() {
    let mut core = ready_core();
    let at = aim_at(&mut core, GridPos::new(42, 7));
    let actions = core.on_pointer_down(at, Button::Secondary, no_mods(), 0.0);
    assert_eq!(actions, vec![Action::ShareLocation(ShareLink { x: 42, y: 7, scale: 12.0 })]);
}

#[test]
fn share_link_restores_location() {
    let mut core = ready_core();
    let actions = core.restore_link("?x=70&y=20&zoom=20");
    assert_eq!(render_requests(&actions), 1);
    assert_eq!(core.viewport().scale(), 20.0);
    assert_eq!(core.viewport().screen_to_grid(pt(VW * 0.5, VH * 0.5)), GridPos::new(70, 20));
    assert!(core.restore_link("x=oops").is_empty());
}
