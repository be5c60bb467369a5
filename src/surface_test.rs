#![allow(clippy::float_cmp)]

use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::payload::{HeadlessPayload, HeadlessState, KIND_CIRCULAR_GAUGE, PayloadRef};

// =============================================================
// Helpers
// =============================================================

fn edit_surface() -> LayoutSurface {
    let mut surface = LayoutSurface::new(LayoutConfig::default()).unwrap();
    surface.set_edit_mode(true);
    surface
}

fn add(surface: &mut LayoutSurface, x: f64, y: f64, w: f64, h: f64) -> (TileId, Rc<RefCell<HeadlessState>>) {
    let payload_ref = PayloadRef::new(KIND_CIRCULAR_GAUGE, "core1");
    let payload = HeadlessPayload::new(payload_ref.clone());
    let probe = payload.probe();
    let tile = Tile::new(Rect::new(x, y, w, h), payload_ref, Box::new(payload), "core1");
    let id = surface.add_tile(tile).unwrap();
    (id, probe)
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn down(surface: &mut LayoutSurface, x: f64, y: f64) -> Vec<Action> {
    surface.on_pointer_down(pt(x, y), Button::Primary, Modifiers::default())
}

fn shift_down(surface: &mut LayoutSurface, x: f64, y: f64) -> Vec<Action> {
    let modifiers = Modifiers { shift: true, ..Modifiers::default() };
    surface.on_pointer_down(pt(x, y), Button::Primary, modifiers)
}

fn drag_to(surface: &mut LayoutSurface, x: f64, y: f64) -> Vec<Action> {
    surface.on_pointer_move(pt(x, y), Modifiers::default())
}

fn up(surface: &mut LayoutSurface, x: f64, y: f64) -> Vec<Action> {
    surface.on_pointer_up(pt(x, y), Button::Primary, Modifiers::default())
}

fn committed(surface: &LayoutSurface, id: TileId) -> Rect {
    surface.tile(id).unwrap().committed()
}

fn assert_arrangement_valid(surface: &LayoutSurface) {
    let grid = surface.grid_size();
    let tiles = surface.tiles();
    for (i, a) in tiles.iter().enumerate() {
        assert!(geometry::contains(&surface.bounds(), &a.committed()), "{:?} out of bounds", a.committed());
        assert!(a.committed().is_grid_aligned(grid), "{:?} off grid", a.committed());
        for b in &tiles[i + 1..] {
            assert!(!geometry::intersects(&a.committed(), &b.committed()), "{:?} overlaps {:?}", a.committed(), b.committed());
        }
    }
}

// =============================================================
// Construction
// =============================================================

#[test]
fn new_surface_is_empty_view_mode() {
    let surface = LayoutSurface::new(LayoutConfig::default()).unwrap();
    assert!(surface.is_empty());
    assert!(!surface.is_edit_mode());
    assert_eq!(surface.bounds(), Rect::new(0.0, 0.0, 600.0, 600.0));
}

#[test]
fn new_surface_rejects_invalid_config() {
    let err = LayoutSurface::new(LayoutConfig::default().with_grid_size(-5.0)).unwrap_err();
    assert_eq!(err, ConfigError::InvalidGridSize(-5.0));
}

// =============================================================
// add / remove / clear
// =============================================================

#[test]
fn add_tile_quantizes_geometry() {
    let mut surface = edit_surface();
    let (id, probe) = add(&mut surface, 12.0, 17.0, 203.0, 178.0);
    assert_eq!(committed(&surface, id), Rect::new(10.0, 20.0, 200.0, 180.0));
    assert_eq!(probe.borrow().width, 200.0);
}

#[test]
fn add_tile_follows_edit_mode() {
    let mut surface = edit_surface();
    let (id, _) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    assert!(surface.tile(id).unwrap().is_editable());
}

#[test]
fn add_tile_rejects_overlap_and_disposes() {
    let mut surface = edit_surface();
    add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    let payload_ref = PayloadRef::new(KIND_CIRCULAR_GAUGE, "core2");
    let payload = HeadlessPayload::new(payload_ref.clone());
    let probe = payload.probe();
    let tile = Tile::new(Rect::new(50.0, 50.0, 100.0, 100.0), payload_ref, Box::new(payload), "core2");
    let err = surface.add_tile(tile).unwrap_err();
    assert!(matches!(err, LayoutError::InvalidPlacement { .. }));
    assert!(probe.borrow().disposed);
    assert_eq!(surface.len(), 1);
}

#[test]
fn add_tile_rejects_out_of_bounds() {
    let mut surface = edit_surface();
    let payload_ref = PayloadRef::new(KIND_CIRCULAR_GAUGE, "core1");
    let tile = Tile::new(
        Rect::new(550.0, 0.0, 100.0, 100.0),
        payload_ref.clone(),
        Box::new(HeadlessPayload::new(payload_ref)),
        "core1",
    );
    assert!(matches!(surface.add_tile(tile), Err(LayoutError::InvalidPlacement { .. })));
}

#[test]
fn add_tile_rejects_below_minimum() {
    let mut surface = edit_surface();
    let payload_ref = PayloadRef::new(KIND_CIRCULAR_GAUGE, "core1");
    let tile = Tile::new(
        Rect::new(0.0, 0.0, 4.0, 100.0),
        payload_ref.clone(),
        Box::new(HeadlessPayload::new(payload_ref)),
        "core1",
    );
    assert!(matches!(surface.add_tile(tile), Err(LayoutError::InvalidPlacement { .. })));
}

#[test]
fn adjacent_tiles_are_accepted() {
    let mut surface = edit_surface();
    add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    add(&mut surface, 100.0, 0.0, 100.0, 100.0);
    assert_eq!(surface.len(), 2);
}

#[test]
fn remove_tile_disposes_payload() {
    let mut surface = edit_surface();
    let (id, probe) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    surface.remove_tile(id).unwrap();
    assert!(probe.borrow().disposed);
    assert!(surface.tile(id).is_none());
}

#[test]
fn remove_unknown_tile_errors() {
    let mut surface = edit_surface();
    let id = uuid::Uuid::new_v4();
    assert!(matches!(surface.remove_tile(id), Err(LayoutError::TileNotFound(missing)) if missing == id));
}

#[test]
fn clear_disposes_every_payload() {
    let mut surface = edit_surface();
    let (_, a) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    let (_, b) = add(&mut surface, 200.0, 0.0, 100.0, 100.0);
    surface.clear();
    assert!(surface.is_empty());
    assert!(a.borrow().disposed && b.borrow().disposed);
}

#[test]
fn set_label_renames_tile() {
    let mut surface = edit_surface();
    let (id, _) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    surface.set_label(id, "CPU 1").unwrap();
    assert_eq!(surface.tile(id).unwrap().label(), "CPU 1");
}

// =============================================================
// Placement oracle
// =============================================================

#[test]
fn placement_ignores_own_geometry() {
    let mut surface = edit_surface();
    let (id, _) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    assert!(surface.is_placement_valid(id, &Rect::new(10.0, 10.0, 100.0, 100.0)));
}

#[test]
fn placement_rejects_other_tiles_and_bounds() {
    let mut surface = edit_surface();
    let (a, _) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    add(&mut surface, 100.0, 0.0, 100.0, 100.0);
    assert!(!surface.is_placement_valid(a, &Rect::new(50.0, 0.0, 100.0, 100.0)));
    assert!(!surface.is_placement_valid(a, &Rect::new(-10.0, 0.0, 100.0, 100.0)));
    assert!(surface.is_placement_valid(a, &Rect::new(0.0, 100.0, 100.0, 100.0)));
}

// =============================================================
// Gestures
// =============================================================

#[test]
fn drag_into_neighbour_rolls_back_on_commit() {
    let mut surface = edit_surface();
    let (a, _) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    let (b, _) = add(&mut surface, 100.0, 0.0, 100.0, 100.0);

    down(&mut surface, 50.0, 50.0);
    let actions = drag_to(&mut surface, 100.0, 50.0);
    assert!(actions.contains(&Action::TileRolledBack { id: a, geometry: Rect::new(0.0, 0.0, 100.0, 100.0) }));
    let actions = up(&mut surface, 100.0, 50.0);
    assert!(actions.contains(&Action::TileCommitted { id: a, geometry: Rect::new(0.0, 0.0, 100.0, 100.0) }));

    assert_eq!(committed(&surface, a).x, 0.0);
    assert_eq!(committed(&surface, b), Rect::new(100.0, 0.0, 100.0, 100.0));
}

#[test]
fn valid_drag_commits_snapped_geometry() {
    let mut surface = edit_surface();
    let (a, _) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    down(&mut surface, 50.0, 50.0);
    let actions = drag_to(&mut surface, 83.0, 176.0);
    assert!(actions.contains(&Action::TileMoved { id: a, geometry: Rect::new(30.0, 130.0, 100.0, 100.0) }));
    // Committed geometry is unchanged until release.
    assert_eq!(committed(&surface, a), Rect::new(0.0, 0.0, 100.0, 100.0));
    up(&mut surface, 83.0, 176.0);
    assert_eq!(committed(&surface, a), Rect::new(30.0, 130.0, 100.0, 100.0));
}

#[test]
fn bottom_right_resize_scenario() {
    let mut surface = edit_surface();
    let (a, probe) = add(&mut surface, 10.0, 10.0, 200.0, 180.0);
    let actions = down(&mut surface, 205.0, 185.0);
    assert!(actions.contains(&Action::SetCursor(CursorShape::SizeForwardDiagonal)));
    drag_to(&mut surface, 252.0, 208.0);
    up(&mut surface, 252.0, 208.0);
    assert_eq!(committed(&surface, a), Rect::new(10.0, 10.0, 250.0, 200.0));
    assert_eq!((probe.borrow().width, probe.borrow().height), (250.0, 200.0));
}

#[test]
fn resize_past_neighbour_rolls_back() {
    let mut surface = edit_surface();
    let (a, _) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    add(&mut surface, 150.0, 0.0, 100.0, 100.0);
    down(&mut surface, 95.0, 50.0);
    let actions = drag_to(&mut surface, 135.0, 50.0);
    assert!(actions.contains(&Action::TileMoved { id: a, geometry: Rect::new(0.0, 0.0, 140.0, 100.0) }));
    let actions = drag_to(&mut surface, 175.0, 50.0);
    assert!(actions.contains(&Action::TileRolledBack { id: a, geometry: Rect::new(0.0, 0.0, 100.0, 100.0) }));
    up(&mut surface, 175.0, 50.0);
    assert_eq!(committed(&surface, a), Rect::new(0.0, 0.0, 100.0, 100.0));
}

#[test]
fn drag_out_of_bounds_rolls_back() {
    let mut surface = edit_surface();
    let (a, _) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    down(&mut surface, 50.0, 50.0);
    drag_to(&mut surface, 20.0, 50.0);
    up(&mut surface, 20.0, 50.0);
    assert_eq!(committed(&surface, a), Rect::new(0.0, 0.0, 100.0, 100.0));
}

#[test]
fn view_mode_ignores_gestures() {
    let mut surface = LayoutSurface::new(LayoutConfig::default()).unwrap();
    let (a, _) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    assert!(down(&mut surface, 50.0, 50.0).is_empty());
    assert!(drag_to(&mut surface, 150.0, 50.0).is_empty());
    assert!(up(&mut surface, 150.0, 50.0).is_empty());
    assert_eq!(surface.tile(a).unwrap().geometry(), Rect::new(0.0, 0.0, 100.0, 100.0));
}

#[test]
fn secondary_button_starts_nothing() {
    let mut surface = edit_surface();
    add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    let actions = surface.on_pointer_down(pt(50.0, 50.0), Button::Secondary, Modifiers::default());
    assert!(actions.is_empty());
    assert!(surface.tiles().iter().all(|t| !t.state().is_gesture()));
}

#[test]
fn disabling_edit_mid_gesture_rolls_back() {
    let mut surface = edit_surface();
    let (a, _) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    down(&mut surface, 50.0, 50.0);
    drag_to(&mut surface, 80.0, 50.0);
    assert_eq!(surface.tile(a).unwrap().geometry().x, 30.0);

    let actions = surface.set_edit_mode(false);
    assert!(actions.contains(&Action::TileRolledBack { id: a, geometry: Rect::new(0.0, 0.0, 100.0, 100.0) }));
    let tile = surface.tile(a).unwrap();
    assert_eq!(tile.geometry(), Rect::new(0.0, 0.0, 100.0, 100.0));
    assert_eq!(tile.state(), crate::tile::TileState::Idle);
    assert!(!tile.is_editable());

    // A stray release after the abort does not commit anything.
    assert!(up(&mut surface, 80.0, 50.0).is_empty());
    assert_eq!(committed(&surface, a), Rect::new(0.0, 0.0, 100.0, 100.0));
}

#[test]
fn edit_mode_applies_to_every_tile() {
    let mut surface = LayoutSurface::new(LayoutConfig::default()).unwrap();
    add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    add(&mut surface, 200.0, 0.0, 100.0, 100.0);
    surface.set_edit_mode(true);
    assert!(surface.tiles().iter().all(Tile::is_editable));
    surface.set_edit_mode(false);
    assert!(surface.tiles().iter().all(|t| !t.is_editable()));
}

#[test]
fn gesture_keeps_routing_to_owning_tile() {
    let mut surface = edit_surface();
    let (a, _) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    let (b, _) = add(&mut surface, 0.0, 300.0, 100.0, 100.0);
    down(&mut surface, 50.0, 50.0);
    // Pointer passes over tile b while dragging a.
    drag_to(&mut surface, 50.0, 350.0);
    let actions = drag_to(&mut surface, 250.0, 350.0);
    assert!(actions.contains(&Action::TileMoved { id: a, geometry: Rect::new(200.0, 300.0, 100.0, 100.0) }));
    up(&mut surface, 250.0, 350.0);
    assert_eq!(committed(&surface, a), Rect::new(200.0, 300.0, 100.0, 100.0));
    assert_eq!(committed(&surface, b), Rect::new(0.0, 300.0, 100.0, 100.0));
}

#[test]
fn drag_sequence_preserves_invariants() {
    let mut surface = edit_surface();
    add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    add(&mut surface, 120.0, 0.0, 100.0, 100.0);
    add(&mut surface, 0.0, 200.0, 150.0, 100.0);
    let path = [(37.0, 12.0), (133.0, 47.0), (260.0, 260.0), (599.0, 599.0), (-40.0, 80.0), (180.0, 230.0)];
    for (start_x, start_y) in [(50.0, 50.0), (170.0, 50.0), (75.0, 250.0)] {
        down(&mut surface, start_x, start_y);
        for (x, y) in path {
            drag_to(&mut surface, x, y);
        }
        up(&mut surface, 180.0, 230.0);
        assert_arrangement_valid(&surface);
    }
}

// =============================================================
// Dispatch, z-order, hover
// =============================================================

#[test]
fn topmost_wins_on_shared_edge() {
    let mut surface = edit_surface();
    let (a, _) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    let (b, _) = add(&mut surface, 100.0, 0.0, 100.0, 100.0);
    assert_eq!(surface.topmost_at(pt(100.0, 50.0)), Some(b));
    surface.raise(a);
    assert_eq!(surface.topmost_at(pt(100.0, 50.0)), Some(a));
    assert_eq!(surface.topmost_at(pt(300.0, 300.0)), None);
}

#[test]
fn press_raises_tile() {
    let mut surface = edit_surface();
    let (a, _) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    add(&mut surface, 200.0, 0.0, 100.0, 100.0);
    down(&mut surface, 50.0, 50.0);
    assert_eq!(surface.tiles().last().unwrap().id(), a);
}

#[test]
fn hover_reports_handle_cursor() {
    let mut surface = edit_surface();
    add(&mut surface, 100.0, 100.0, 200.0, 200.0);
    assert_eq!(drag_to(&mut surface, 102.0, 102.0), vec![Action::SetCursor(CursorShape::SizeForwardDiagonal)]);
    assert_eq!(drag_to(&mut surface, 298.0, 200.0), vec![Action::SetCursor(CursorShape::SizeHorizontal)]);
    assert_eq!(drag_to(&mut surface, 200.0, 200.0), vec![Action::SetCursor(CursorShape::Arrow)]);
    assert_eq!(drag_to(&mut surface, 500.0, 500.0), vec![Action::SetCursor(CursorShape::Arrow)]);
}

#[test]
fn hover_ignored_in_view_mode() {
    let mut surface = LayoutSurface::new(LayoutConfig::default()).unwrap();
    add(&mut surface, 100.0, 100.0, 200.0, 200.0);
    assert!(drag_to(&mut surface, 102.0, 102.0).is_empty());
}

// =============================================================
// Selection
// =============================================================

#[test]
fn press_selects_single_tile() {
    let mut surface = edit_surface();
    let (a, _) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    let (b, _) = add(&mut surface, 200.0, 0.0, 100.0, 100.0);
    down(&mut surface, 50.0, 50.0);
    up(&mut surface, 50.0, 50.0);
    assert_eq!(surface.selection(), vec![a]);
    down(&mut surface, 250.0, 50.0);
    up(&mut surface, 250.0, 50.0);
    assert_eq!(surface.selection(), vec![b]);
}

#[test]
fn shift_press_extends_selection() {
    let mut surface = edit_surface();
    let (a, _) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    let (b, _) = add(&mut surface, 200.0, 0.0, 100.0, 100.0);
    down(&mut surface, 50.0, 50.0);
    up(&mut surface, 50.0, 50.0);
    shift_down(&mut surface, 250.0, 50.0);
    up(&mut surface, 250.0, 50.0);
    let selection = surface.selection();
    assert!(selection.contains(&a) && selection.contains(&b));
}

#[test]
fn dragging_one_selected_tile_leaves_others() {
    let mut surface = edit_surface();
    let (a, _) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    let (b, _) = add(&mut surface, 200.0, 0.0, 100.0, 100.0);
    surface.select(a, false);
    surface.select(b, true);
    down(&mut surface, 50.0, 50.0);
    drag_to(&mut surface, 50.0, 250.0);
    up(&mut surface, 50.0, 250.0);
    assert_eq!(committed(&surface, a), Rect::new(0.0, 200.0, 100.0, 100.0));
    assert_eq!(committed(&surface, b), Rect::new(200.0, 0.0, 100.0, 100.0));
    assert_eq!(surface.selection().len(), 2);
}

#[test]
fn rubber_band_selects_intersecting_tiles() {
    let mut surface = edit_surface();
    add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    let (b, _) = add(&mut surface, 200.0, 0.0, 100.0, 100.0);
    add(&mut surface, 0.0, 200.0, 100.0, 100.0);

    down(&mut surface, 150.0, 150.0);
    drag_to(&mut surface, 250.0, 50.0);
    assert_eq!(surface.rubber_band(), Some(Rect::new(150.0, 50.0, 100.0, 100.0)));
    let actions = up(&mut surface, 250.0, 50.0);
    assert!(actions.contains(&Action::SelectionChanged(vec![b])));
    assert_eq!(surface.rubber_band(), None);
}

#[test]
fn press_on_empty_canvas_clears_selection() {
    let mut surface = edit_surface();
    let (a, _) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    surface.select(a, false);
    let actions = down(&mut surface, 400.0, 400.0);
    assert!(actions.contains(&Action::SelectionChanged(Vec::new())));
    up(&mut surface, 400.0, 400.0);
    assert!(surface.selection().is_empty());
}

#[test]
fn leaving_edit_mode_clears_selection() {
    let mut surface = edit_surface();
    let (a, _) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    surface.select(a, false);
    surface.set_edit_mode(false);
    assert!(surface.selection().is_empty());
}

// =============================================================
// Bounds and overlays
// =============================================================

#[test]
fn set_bounds_rejects_excluding_a_tile() {
    let mut surface = edit_surface();
    add(&mut surface, 400.0, 400.0, 100.0, 100.0);
    let err = surface.set_bounds(Rect::new(0.0, 0.0, 300.0, 300.0)).unwrap_err();
    assert!(matches!(err, LayoutError::InvalidPlacement { .. }));
    assert_eq!(surface.bounds(), Rect::new(0.0, 0.0, 600.0, 600.0));
    surface.set_bounds(Rect::new(0.0, 0.0, 800.0, 500.0)).unwrap();
    assert_eq!(surface.bounds().width, 800.0);
}

#[test]
fn grow_bounds_adds_margin_and_never_shrinks() {
    let mut surface = edit_surface();
    surface.grow_bounds_to_fit(&Rect::new(0.0, 0.0, 700.0, 300.0));
    assert_eq!(surface.bounds(), Rect::new(0.0, 0.0, 800.0, 600.0));
    surface.grow_bounds_to_fit(&Rect::new(0.0, 0.0, 100.0, 100.0));
    assert_eq!(surface.bounds(), Rect::new(0.0, 0.0, 800.0, 600.0));
}

#[test]
fn minimum_size_covers_content() {
    let mut surface = edit_surface();
    assert_eq!(surface.minimum_size(), None);
    add(&mut surface, 10.0, 10.0, 200.0, 180.0);
    add(&mut surface, 220.0, 210.0, 200.0, 180.0);
    assert_eq!(surface.content_extent(), Some(Rect::new(10.0, 10.0, 410.0, 380.0)));
    assert_eq!(surface.minimum_size(), Some((430.0, 400.0)));
}

#[test]
fn grid_lines_only_in_edit_mode() {
    let mut surface = LayoutSurface::new(LayoutConfig::default()).unwrap();
    assert!(surface.grid_lines().is_empty());
    surface.set_edit_mode(true);
    assert_eq!(surface.grid_lines().len(), 120);
}

#[test]
fn handle_overlays_only_in_edit_mode() {
    let mut surface = edit_surface();
    let (a, _) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    let overlays = surface.handle_overlays();
    assert_eq!(overlays.len(), 8);
    assert!(overlays.iter().all(|(id, _, _)| *id == a));
    surface.set_edit_mode(false);
    assert!(surface.handle_overlays().is_empty());
}

// =============================================================
// Publish
// =============================================================

#[test]
fn publish_reaches_payloads_without_moving_tiles() {
    let mut surface = edit_surface();
    let (a, probe) = add(&mut surface, 0.0, 0.0, 100.0, 100.0);
    let values = MetricValues::from([("core1".to_string(), 75.0), ("core2".to_string(), 10.0)]);
    surface.publish(&values);
    assert_eq!(probe.borrow().value, 75.0);
    assert_eq!(committed(&surface, a), Rect::new(0.0, 0.0, 100.0, 100.0));
}
