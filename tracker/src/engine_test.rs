#![allow(clippy::float_cmp)]

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use super::*;
use crate::doc::FeatureKind;
use crate::shape::Shape;

// =============================================================
// Helpers
// =============================================================

const ZOOM: f64 = 10.0;

fn rect(id: &str, x: f64, y: f64, w: f64, h: f64) -> Feature {
    let ring = vec![
        Point::new(x, y),
        Point::new(x + w, y),
        Point::new(x + w, y + h),
        Point::new(x, y + h),
        Point::new(x, y),
    ];
    Feature::new(id.to_string(), FeatureKind::Table, Shape::Area(ring), serde_json::Map::new(), &TrackerConfig::default())
}

/// Session with tables A (0,0)-(4,1), B (0,2)-(4,3) and C (10,0)-(14,1),
/// viewed at 10 px per degree with the world origin at the screen origin.
fn session() -> Session {
    session_with(vec![rect("A", 0.0, 0.0, 4.0, 1.0), rect("B", 0.0, 2.0, 4.0, 1.0), rect("C", 10.0, 0.0, 4.0, 1.0)])
}

fn session_with(tables: Vec<Feature>) -> Session {
    let mut s = Session::default();
    s.set_survey(Survey::from_features(tables, Vec::new(), Vec::new(), Vec::new(), &TrackerConfig::default()));
    s.camera = Camera { pan_x: 0.0, pan_y: 0.0, zoom: ZOOM };
    s
}

/// Screen position of a world point under the test camera.
fn at(x: f64, y: f64) -> Point {
    Point::new(x * ZOOM, -y * ZOOM)
}

fn center_a() -> Point {
    at(2.0, 0.5)
}

fn center_b() -> Point {
    at(2.0, 2.5)
}

fn center_c() -> Point {
    at(12.0, 0.5)
}

fn select(s: &mut Session, ids: &[&str]) {
    s.selection.add_many(ids.iter().copied());
}

fn click(s: &mut Session, pt: Point, button: Button, now_ms: f64) -> Vec<Action> {
    s.pointer_down(pt, button);
    s.pointer_up(pt, button, now_ms)
}

fn selected(s: &Session) -> Vec<&str> {
    s.selection().iter().map(String::as_str).collect()
}

fn key(s: &mut Session, name: &str, modifiers: Modifiers) -> Vec<Action> {
    s.key_down(&Key(name.to_string()), modifiers)
}

fn ctrl() -> Modifiers {
    Modifiers { ctrl: true, ..Modifiers::default() }
}

fn lengths_rows() -> Vec<Vec<String>> {
    [["string_id", "plus", "minus"], ["A", "10", "2"], ["B", "5", ""]]
        .iter()
        .map(|r| r.iter().map(|c| (*c).to_string()).collect())
        .collect()
}

// =============================================================
// Click
// =============================================================

#[test]
fn primary_click_toggles_table() {
    let mut s = session();
    let actions = click(&mut s, center_a(), Button::Primary, 0.0);
    assert!(actions.contains(&Action::SelectionChanged));
    assert_eq!(selected(&s), vec!["A"]);
    click(&mut s, center_a(), Button::Primary, 0.0);
    assert!(s.selection().is_empty());
}

#[test]
fn secondary_click_removes_only() {
    let mut s = session();
    click(&mut s, center_a(), Button::Primary, 0.0);
    let len = s.history().history_len();

    click(&mut s, center_b(), Button::Secondary, 0.0);
    assert_eq!(s.history().history_len(), len);

    let actions = click(&mut s, center_a(), Button::Secondary, 0.0);
    assert!(actions.contains(&Action::SelectionChanged));
    assert!(s.selection().is_empty());
}

#[test]
fn click_on_empty_space_commits_nothing() {
    let mut s = session();
    let actions = click(&mut s, at(7.0, 0.5), Button::Primary, 0.0);
    assert!(!actions.contains(&Action::SelectionChanged));
    assert_eq!(s.history().history_len(), 1);
}

#[test]
fn jitter_below_threshold_is_still_a_click() {
    let mut s = session();
    s.pointer_down(center_a(), Button::Primary);
    s.pointer_move(Point::new(center_a().x + 3.0, center_a().y));
    assert!(matches!(s.input, InputState::Pressed { .. }));
    s.pointer_up(Point::new(center_a().x + 3.0, center_a().y), Button::Primary, 0.0);
    assert_eq!(selected(&s), vec!["A"]);
}

#[test]
fn release_of_other_button_is_ignored() {
    let mut s = session();
    s.pointer_down(center_a(), Button::Primary);
    assert!(s.pointer_up(center_a(), Button::Secondary, 0.0).is_empty());
    assert!(matches!(s.input, InputState::Pressed { .. }));
}

#[test]
fn second_press_during_gesture_is_ignored() {
    let mut s = session();
    s.pointer_down(center_a(), Button::Primary);
    assert!(s.pointer_down(center_b(), Button::Secondary).is_empty());
    assert_eq!(s.input.button(), Some(Button::Primary));
}

// =============================================================
// Paint strokes
// =============================================================

#[test]
fn primary_drag_from_table_paints_origin_and_hovered() {
    let mut s = session();
    s.pointer_down(center_a(), Button::Primary);
    s.pointer_move(center_b());
    assert!(matches!(s.input, InputState::Painting { mode: PaintMode::Add, .. }));
    assert_eq!(selected(&s), vec!["A", "B"]);
    s.pointer_up(center_b(), Button::Primary, 0.0);
    assert!(s.input.is_idle());
    assert_eq!(selected(&s), vec!["A", "B"]);
}

#[test]
fn paint_stroke_across_many_tables() {
    let mut s = session();
    s.pointer_down(center_a(), Button::Primary);
    s.pointer_move(at(7.0, 0.5));
    s.pointer_move(center_c());
    s.pointer_up(center_c(), Button::Primary, 0.0);
    assert_eq!(selected(&s), vec!["A", "C"]);
}

#[test]
fn paint_does_not_toggle_already_selected() {
    let mut s = session();
    click(&mut s, center_b(), Button::Primary, 0.0);
    s.pointer_down(center_a(), Button::Primary);
    s.pointer_move(center_b());
    s.pointer_move(center_a());
    s.pointer_move(center_b());
    s.pointer_up(center_b(), Button::Primary, 0.0);
    assert_eq!(selected(&s), vec!["A", "B"]);
}

#[test]
fn secondary_drag_erases() {
    let mut s = session();
    select(&mut s, &["A", "B", "C"]);
    s.pointer_down(center_a(), Button::Secondary);
    s.pointer_move(center_b());
    assert!(matches!(s.input, InputState::Painting { mode: PaintMode::Erase, .. }));
    s.pointer_up(center_b(), Button::Secondary, 0.0);
    assert_eq!(selected(&s), vec!["C"]);
}

#[test]
fn paint_stroke_is_undone_table_by_table() {
    let mut s = session();
    s.pointer_down(center_a(), Button::Primary);
    s.pointer_move(center_b());
    s.pointer_up(center_b(), Button::Primary, 0.0);
    assert!(s.undo());
    assert_eq!(selected(&s), vec!["A"]);
    assert!(s.undo());
    assert!(s.selection().is_empty());
}

// =============================================================
// Box selection
// =============================================================

#[test]
fn box_from_empty_space_adds_intersecting_tables() {
    let mut s = session();
    s.pointer_down(at(-1.0, -1.0), Button::Primary);
    s.pointer_move(at(5.0, 3.5));
    let preview = s.box_preview().expect("preview while boxing");
    assert_eq!(preview.mode, PaintMode::Add);
    assert_eq!((preview.width, preview.height), (60.0, 45.0));

    let actions = s.pointer_up(at(5.0, 3.5), Button::Primary, 1000.0);
    assert!(actions.contains(&Action::SelectionChanged));
    assert_eq!(selected(&s), vec!["A", "B"]);
    assert!(s.box_preview().is_none());
    assert_eq!(s.history().history_len(), 2);
}

#[test]
fn box_resolves_with_rectangle_at_release() {
    let mut s = session();
    s.pointer_down(at(-1.0, -1.0), Button::Primary);
    s.pointer_move(at(1.0, 0.5));
    s.pointer_up(at(15.0, 3.5), Button::Primary, 0.0);
    assert_eq!(selected(&s), vec!["A", "B", "C"]);
}

#[test]
fn secondary_box_removes() {
    let mut s = session();
    select(&mut s, &["A", "C"]);
    s.pointer_down(at(-1.0, -1.0), Button::Secondary);
    s.pointer_move(at(5.0, 1.5));
    assert_eq!(s.box_preview().map(|p| p.color), Some(style::PREVIEW_REMOVE));
    s.pointer_up(at(5.0, 1.5), Button::Secondary, 0.0);
    assert_eq!(selected(&s), vec!["C"]);
}

#[test]
fn box_over_nothing_commits_nothing() {
    let mut s = session();
    s.pointer_down(at(20.0, 20.0), Button::Primary);
    s.pointer_move(at(25.0, 25.0));
    let actions = s.pointer_up(at(25.0, 25.0), Button::Primary, 0.0);
    assert!(!actions.contains(&Action::SelectionChanged));
    assert_eq!(s.history().history_len(), 1);
}

#[test]
fn click_right_after_box_release_is_suppressed() {
    let mut s = session();
    s.pointer_down(at(-1.0, 1.5), Button::Primary);
    s.pointer_move(at(5.0, 3.5));
    s.pointer_up(at(5.0, 3.5), Button::Primary, 1000.0);
    assert_eq!(selected(&s), vec!["B"]);

    click(&mut s, center_b(), Button::Primary, 1020.0);
    assert_eq!(selected(&s), vec!["B"]);

    click(&mut s, center_b(), Button::Primary, 1100.0);
    assert!(s.selection().is_empty());
}

#[test]
fn paint_then_box_compose() {
    let mut s = session();
    s.pointer_down(center_a(), Button::Primary);
    s.pointer_move(at(7.0, 0.5));
    s.pointer_up(at(7.0, 0.5), Button::Primary, 0.0);
    s.pointer_down(at(9.0, -1.0), Button::Primary);
    s.pointer_move(at(15.0, 2.0));
    s.pointer_up(at(15.0, 2.0), Button::Primary, 0.0);
    assert_eq!(selected(&s), vec!["A", "C"]);
}

// =============================================================
// Keyboard
// =============================================================

#[test]
fn escape_cancels_box_without_commit() {
    let mut s = session();
    s.pointer_down(at(-1.0, -1.0), Button::Primary);
    s.pointer_move(at(5.0, 3.5));
    let actions = key(&mut s, "Escape", Modifiers::default());
    assert!(actions.contains(&Action::RenderNeeded));
    assert!(s.box_preview().is_none());
    assert!(s.pointer_up(at(5.0, 3.5), Button::Primary, 0.0).is_empty());
    assert!(s.selection().is_empty());
}

#[test]
fn escape_during_paint_keeps_painted_tables() {
    let mut s = session();
    s.pointer_down(center_a(), Button::Primary);
    s.pointer_move(center_b());
    key(&mut s, "Escape", Modifiers::default());
    s.pointer_move(center_c());
    assert!(s.input.is_idle());
    assert_eq!(selected(&s), vec!["A", "B"]);
}

#[test]
fn ctrl_z_undoes_and_ctrl_y_redoes() {
    let mut s = session();
    click(&mut s, center_a(), Button::Primary, 0.0);
    let actions = key(&mut s, "z", ctrl());
    assert!(actions.contains(&Action::SelectionChanged));
    assert!(s.selection().is_empty());
    key(&mut s, "y", ctrl());
    assert_eq!(selected(&s), vec!["A"]);
}

#[test]
fn ctrl_shift_z_redoes() {
    let mut s = session();
    click(&mut s, center_a(), Button::Primary, 0.0);
    key(&mut s, "z", Modifiers { meta: true, ..Modifiers::default() });
    assert!(s.selection().is_empty());
    key(&mut s, "Z", Modifiers { ctrl: true, shift: true, ..Modifiers::default() });
    assert_eq!(selected(&s), vec!["A"]);
}

#[test]
fn undo_at_start_returns_no_actions() {
    let mut s = session();
    assert!(key(&mut s, "z", ctrl()).is_empty());
    assert!(key(&mut s, "z", Modifiers::default()).is_empty());
}

// =============================================================
// Connectors
// =============================================================

#[test]
fn primary_click_on_connector_toggles_it() {
    let mut s = session();
    let actions = click(&mut s, at(3.6, 0.5), Button::Primary, 0.0);
    assert!(actions.contains(&Action::ConnectorToggled { id: "A".into(), end: ConnectorEnd::Start, installed: true }));
    assert!(s.selection().is_empty());
    assert!(s.mc4().is_installed("A", ConnectorEnd::Start));
    assert_eq!(s.connector_stats(), ConnectorStats { installed: 1, total: 6 });

    click(&mut s, at(3.6, 0.5), Button::Primary, 0.0);
    assert!(!s.mc4().is_installed("A", ConnectorEnd::Start));
}

#[test]
fn set_connector_records_status_once() {
    let mut s = session();
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    let _sub = s.subscribe(move |change| {
        if change == Change::ConnectorsChanged {
            *sink.borrow_mut() += 1;
        }
    });
    s.set_connector("B", ConnectorEnd::End, true);
    s.set_connector("B", ConnectorEnd::End, true);
    assert!(s.mc4().is_installed("B", ConnectorEnd::End));
    assert_eq!(*count.borrow(), 1);
    s.set_connector("B", ConnectorEnd::End, false);
    assert_eq!(s.connector_stats().installed, 0);
}

#[test]
fn set_connector_rejects_ids_without_a_connector() {
    let mut s = session();
    assert!(!s.set_connector("GHOST", ConnectorEnd::Start, true));
    assert!(!s.mc4().is_installed("GHOST", ConnectorEnd::Start));
    assert_eq!(s.connector_stats(), ConnectorStats { installed: 0, total: 6 });
    assert!(s.set_connector("C", ConnectorEnd::Start, true));
    assert_eq!(s.connector_stats(), ConnectorStats { installed: 1, total: 6 });
}

#[test]
fn connector_click_selects_table_when_mc4_off() {
    let mut s = session();
    s.toggle_mode(TrackMode::Mc4);
    click(&mut s, at(3.6, 0.5), Button::Primary, 0.0);
    assert_eq!(selected(&s), vec!["A"]);
    assert_eq!(s.connector_stats().installed, 0);
}

#[test]
fn secondary_click_near_connector_deselects_table() {
    let mut s = session();
    click(&mut s, center_a(), Button::Primary, 0.0);
    click(&mut s, at(3.6, 0.5), Button::Secondary, 0.0);
    assert!(s.selection().is_empty());
    assert_eq!(s.connector_stats().installed, 0);
}

// =============================================================
// Modes and camera
// =============================================================

#[test]
fn dc_off_ignores_selection_gestures() {
    let mut s = session();
    s.toggle_mode(TrackMode::Dc);
    click(&mut s, center_a(), Button::Primary, 0.0);
    assert!(s.selection().is_empty());
}

#[test]
fn dc_off_drag_pans() {
    let mut s = session();
    s.toggle_mode(TrackMode::Dc);
    s.pointer_down(center_a(), Button::Primary);
    s.pointer_move(Point::new(center_a().x + 20.0, center_a().y));
    s.pointer_move(Point::new(center_a().x + 30.0, center_a().y));
    s.pointer_up(Point::new(center_a().x + 30.0, center_a().y), Button::Primary, 0.0);
    assert_eq!(s.camera().pan_x, 30.0);
    assert!(s.selection().is_empty());
}

#[test]
fn middle_drag_pans_camera() {
    let mut s = session();
    s.pointer_down(Point::new(0.0, 0.0), Button::Middle);
    let actions = s.pointer_move(Point::new(10.0, 5.0));
    assert!(actions.contains(&Action::RenderNeeded));
    assert_eq!((s.camera().pan_x, s.camera().pan_y), (10.0, 5.0));
    s.pointer_up(Point::new(10.0, 5.0), Button::Middle, 0.0);
    assert!(s.input.is_idle());
}

#[test]
fn wheel_zooms_about_cursor() {
    let mut s = session();
    let anchor = Point::new(100.0, 50.0);
    let before = s.camera().screen_to_world(anchor);
    s.wheel(anchor, WheelDelta { dx: 0.0, dy: -100.0 });
    assert!((s.camera().zoom - ZOOM * 1.25).abs() < 1e-9);
    let after = s.camera().screen_to_world(anchor);
    assert!((before.x - after.x).abs() < 1e-9 && (before.y - after.y).abs() < 1e-9);
    assert!(s.wheel(anchor, WheelDelta { dx: 5.0, dy: 0.0 }).is_empty());
}

#[test]
fn hover_tracks_table_under_pointer() {
    let mut s = session();
    let actions = s.pointer_move(center_a());
    assert_eq!(s.hovered(), Some("A"));
    assert!(actions.contains(&Action::SetCursor("pointer".into())));
    s.pointer_move(at(7.0, 0.5));
    assert_eq!(s.hovered(), None);
}

// =============================================================
// Sticky paint mode
// =============================================================

#[test]
fn entering_paint_mode_applies_to_hovered_table() {
    let mut s = session();
    s.pointer_move(center_a());
    let actions = s.enter_paint_mode(PaintMode::Add);
    assert!(actions.contains(&Action::SelectionChanged));
    assert_eq!(selected(&s), vec!["A"]);

    s.pointer_move(center_b());
    assert_eq!(selected(&s), vec!["A", "B"]);

    s.exit_paint_mode();
    s.pointer_move(center_c());
    assert_eq!(selected(&s), vec!["A", "B"]);
}

#[test]
fn erase_paint_mode_removes_hovered() {
    let mut s = session();
    select(&mut s, &["A", "B"]);
    s.pointer_move(center_a());
    s.enter_paint_mode(PaintMode::Erase);
    s.pointer_move(center_b());
    assert!(s.selection().is_empty());
}

#[test]
fn primary_click_in_paint_mode_follows_the_mode() {
    let mut s = session();
    s.pointer_move(center_a());
    s.enter_paint_mode(PaintMode::Add);
    assert_eq!(selected(&s), vec!["A"]);
    let actions = click(&mut s, center_a(), Button::Primary, 1000.0);
    assert!(!actions.contains(&Action::SelectionChanged));
    assert_eq!(selected(&s), vec!["A"]);

    s.exit_paint_mode();
    s.enter_paint_mode(PaintMode::Erase);
    click(&mut s, center_a(), Button::Primary, 2000.0);
    assert!(s.selection().is_empty());
    click(&mut s, center_a(), Button::Primary, 3000.0);
    assert!(s.selection().is_empty());
}

#[test]
fn escape_leaves_sticky_paint_mode() {
    let mut s = session();
    s.enter_paint_mode(PaintMode::Add);
    key(&mut s, "Escape", Modifiers::default());
    assert!(s.ui.sticky_paint.is_none());
    s.pointer_move(center_a());
    assert!(s.selection().is_empty());
}

#[test]
fn exit_without_paint_mode_is_noop() {
    let mut s = session();
    assert!(s.exit_paint_mode().is_empty());
}

// =============================================================
// Groups
// =============================================================

#[test]
fn select_and_deselect_group_by_prefix() {
    let mut s = session_with(vec![
        rect("TX1-INV1-STR1", 0.0, 0.0, 1.0, 1.0),
        rect("TX1-INV1-STR2", 2.0, 0.0, 1.0, 1.0),
        rect("TX1-INV12-STR1", 4.0, 0.0, 1.0, 1.0),
        rect("TX1-INV2-STR1", 6.0, 0.0, 1.0, 1.0),
    ]);
    assert!(s.select_group("tx01_inv01"));
    assert_eq!(selected(&s), vec!["TX1-INV1-STR1", "TX1-INV1-STR2"]);
    assert!(!s.select_group("TX1-INV1"));
    assert!(s.select_group("TX1-INV2-"));
    assert_eq!(s.selection().len(), 3);
    assert!(s.deselect_group("TX1-INV1"));
    assert_eq!(selected(&s), vec!["TX1-INV2-STR1"]);
    assert!(!s.select_group(""));
}

#[test]
fn select_region_in_world_coordinates() {
    let mut s = session();
    let rect = Bounds::from_corners(Point::new(3.0, 0.5), Point::new(11.0, 2.5));
    assert!(s.select_region(&rect, PaintMode::Add));
    assert_eq!(selected(&s), vec!["A", "B", "C"]);
    assert_eq!(s.history().history_len(), 2);
    let left = Bounds::from_corners(Point::new(-1.0, -1.0), Point::new(1.0, 4.0));
    assert!(s.select_region(&left, PaintMode::Erase));
    assert_eq!(selected(&s), vec!["C"]);
    assert!(!s.select_region(&left, PaintMode::Erase));
}

// =============================================================
// Progress, submit, reset
// =============================================================

#[test]
fn progress_reflects_selection_and_lengths() {
    let mut s = session();
    s.load_lengths(&lengths_rows());
    select(&mut s, &["A", "B"]);
    assert_eq!(s.totals(), Totals { plus: 15.0, minus: 2.0 });
    let summary = s.progress();
    assert_eq!(summary.field_total, 17.0);
    assert_eq!(summary.dc_percent, 100.0);
    assert_eq!(summary.connectors.total, 6);
}

#[test]
fn submit_reports_length_added_since_last_submit() {
    let mut s = session();
    s.load_lengths(&lengths_rows());
    click(&mut s, center_a(), Button::Primary, 0.0);

    let first = s.submit("2024-05-01", "Bozkurt", 12);
    assert_eq!(first.installed_length, 12.0);
    assert_eq!(first.workers, 12);
    assert!(!s.history().can_undo());
    assert_eq!(selected(&s), vec!["A"]);

    click(&mut s, center_b(), Button::Primary, 0.0);
    let second = s.submit("2024-05-02", "Bozkurt", 10);
    assert_eq!(second.installed_length, 5.0);

    let third = s.submit("2024-05-03", "Bozkurt", 10);
    assert_eq!(third.installed_length, 0.0);
}

#[test]
fn reset_clears_selection_history_and_baseline() {
    let mut s = session();
    s.load_lengths(&lengths_rows());
    click(&mut s, center_a(), Button::Primary, 0.0);
    s.submit("2024-05-01", "X", 1);
    s.reset();
    assert!(s.selection().is_empty());
    assert!(!s.history().can_undo());
    click(&mut s, center_a(), Button::Primary, 0.0);
    assert_eq!(s.submit("2024-05-02", "X", 1).installed_length, 12.0);
}

#[test]
fn style_follows_selection() {
    let mut s = session();
    s.load_lengths(&lengths_rows());
    let a = s.survey().tables()[0].clone();
    assert_eq!(s.style_of(&a).color, style::UNSELECTED);
    click(&mut s, center_a(), Button::Primary, 0.0);
    assert_eq!(s.style_of(&a).color, style::SELECTED_MEASURED);
    let c = s.survey().tables()[2].clone();
    click(&mut s, center_c(), Button::Primary, 0.0);
    assert_eq!(s.style_of(&c).color, style::SELECTED_UNMEASURED);
}

#[test]
fn history_limit_comes_from_config() {
    let config = TrackerConfig { history_limit: 2, ..TrackerConfig::default() };
    let mut s = Session::new(config);
    s.set_survey(Survey::from_features(
        vec![rect("A", 0.0, 0.0, 4.0, 1.0), rect("B", 0.0, 2.0, 4.0, 1.0)],
        Vec::new(),
        Vec::new(),
        Vec::new(),
        &config,
    ));
    select(&mut s, &["A"]);
    select(&mut s, &["B"]);
    assert!(s.undo());
    assert!(!s.undo());
}

// =============================================================
// Loading and observers
// =============================================================

fn tables_json() -> String {
    json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": { "string_id": "str07" },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[30.0, 40.0], [30.0004, 40.0], [30.0004, 40.0001], [30.0, 40.0001], [30.0, 40.0]]]
            }
        }]
    })
    .to_string()
}

#[test]
fn load_survey_resets_state_and_fits_camera() {
    let mut s = session();
    s.set_viewport(800.0, 600.0);
    click(&mut s, center_a(), Button::Primary, 0.0);
    let text = tables_json();
    s.load_survey(&SurveySources { tables: &text, ..SurveySources::default() }).expect("load");
    assert!(s.selection().is_empty());
    assert_eq!(s.survey().table_ids().into_iter().collect::<Vec<_>>(), vec!["STR7".to_string()]);
    let center = s.camera().world_to_screen(Point::new(30.0002, 40.00005));
    assert!((center.x - 400.0).abs() < 1e-6 && (center.y - 300.0).abs() < 1e-6);
}

#[test]
fn failed_load_clears_survey() {
    let mut s = session();
    let err = s.load_survey(&SurveySources { tables: "{ not json", ..SurveySources::default() });
    assert!(matches!(err, Err(LoadError::Json { .. })));
    assert!(s.survey().is_empty());
    assert!(s.labels().is_empty());
}

#[test]
fn observers_see_changes_until_dropped() {
    let mut s = session();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let sub = s.subscribe(move |change| sink.borrow_mut().push(change));

    click(&mut s, center_a(), Button::Primary, 0.0);
    s.load_lengths(&lengths_rows());
    s.wheel(Point::new(0.0, 0.0), WheelDelta { dx: 0.0, dy: 100.0 });
    assert_eq!(*seen.borrow(), vec![Change::SelectionChanged, Change::LengthsLoaded, Change::CameraChanged]);

    drop(sub);
    click(&mut s, center_a(), Button::Primary, 0.0);
    assert_eq!(seen.borrow().len(), 3);
}

#[test]
fn box_gesture_notifies_preview_changes() {
    let mut s = session();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _sub = s.subscribe(move |change| sink.borrow_mut().push(change));

    s.pointer_down(at(-1.0, -1.0), Button::Primary);
    s.pointer_move(at(5.0, 1.5));
    s.pointer_move(at(5.0, 3.5));
    s.pointer_up(at(5.0, 3.5), Button::Primary, 0.0);
    let previews = seen.borrow().iter().filter(|c| **c == Change::PreviewChanged).count();
    assert_eq!(previews, 3);
    assert!(seen.borrow().contains(&Change::SelectionChanged));
}
