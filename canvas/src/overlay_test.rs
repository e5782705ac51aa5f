#![allow(clippy::float_cmp)]

use super::*;
use crate::transform::DisplaySize;

struct Pin {
    id: i64,
    label: String,
    spec: String,
    at: CanvasPoint,
    captured: Option<CanvasSize>,
}

impl Placed for Pin {
    fn placement_id(&self) -> i64 {
        self.id
    }
    fn label(&self) -> &str {
        &self.label
    }
    fn page_spec(&self) -> &str {
        &self.spec
    }
    fn position(&self) -> CanvasPoint {
        self.at
    }
    fn captured_canvas(&self) -> Option<CanvasSize> {
        self.captured
    }
}

const LETTER: CanvasSize = CanvasSize { width: 1224, height: 1584 };

fn pin(id: i64, spec: &str, x: u32, y: u32) -> Pin {
    Pin {
        id,
        label: format!("{{{{k{id}}}}}"),
        spec: spec.to_owned(),
        at: CanvasPoint::new(x, y),
        captured: Some(LETTER),
    }
}

fn half_size() -> Projection {
    Projection::new(LETTER, DisplaySize::new(612.0, 792.0)).unwrap()
}

// =============================================================
// Visibility filter
// =============================================================

#[test]
fn only_anchors_for_current_page_are_projected() {
    let anchors = vec![pin(1, "global", 0, 0), pin(2, "1,3", 10, 10), pin(3, "last", 20, 20), pin(4, "2", 30, 30)];
    let proj = half_size();

    let ids = |page| -> Vec<i64> {
        project_indicators(&anchors, page, 3, &proj)
            .iter()
            .map(|i| i.id)
            .collect()
    };
    assert_eq!(ids(1), vec![1, 2]);
    assert_eq!(ids(2), vec![1, 4]);
    assert_eq!(ids(3), vec![1, 2, 3]);
}

#[test]
fn malformed_page_rule_is_hidden() {
    let anchors = vec![pin(1, "one", 0, 0)];
    assert!(project_indicators(&anchors, 1, 1, &half_size()).is_empty());
}

// =============================================================
// Placement
// =============================================================

#[test]
fn indicator_lands_at_scaled_position() {
    let anchors = vec![pin(7, "global", 100, 200)];
    let out = project_indicators(&anchors, 1, 1, &half_size());
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].center, Point::new(50.0, 100.0));
    assert_eq!(out[0].label, "{{k7}}");
    assert_eq!(out[0].label_origin, Point::new(60.0, 90.0));
}

#[test]
fn marker_radius_ignores_display_scale() {
    let anchors = vec![pin(1, "global", 100, 200)];
    let small = project_indicators(&anchors, 1, 1, &half_size());
    let big = project_indicators(&anchors, 1, 1, &Projection::new(LETTER, DisplaySize::new(2448.0, 3168.0)).unwrap());
    assert_eq!(small[0].radius, MARKER_RADIUS_PX);
    assert_eq!(big[0].radius, MARKER_RADIUS_PX);
    assert_eq!(big[0].center, Point::new(200.0, 400.0));
}

#[test]
fn uses_captured_canvas_not_view_canvas() {
    let mut a = pin(1, "global", 306, 396);
    a.captured = Some(CanvasSize::new(612, 792));
    let out = project_indicators(&[a], 1, 1, &half_size());
    assert_eq!(out[0].center, Point::new(306.0, 396.0));
}

#[test]
fn missing_capture_size_falls_back_to_view_canvas() {
    let mut a = pin(1, "global", 100, 200);
    a.captured = None;
    let out = project_indicators(&[a], 1, 1, &half_size());
    assert_eq!(out[0].center, Point::new(50.0, 100.0));
}

#[test]
fn zero_capture_size_is_skipped() {
    let mut a = pin(1, "global", 100, 200);
    a.captured = Some(CanvasSize::new(0, 0));
    assert!(project_indicators(&[a], 1, 1, &half_size()).is_empty());
}

#[test]
fn preview_marker_projects_single_point() {
    let p = preview_marker(CanvasPoint::new(612, 792), LETTER, &half_size()).unwrap();
    assert_eq!(p, Point::new(306.0, 396.0));
    assert!(preview_marker(CanvasPoint::new(1, 1), CanvasSize::new(0, 5), &half_size()).is_err());
}
