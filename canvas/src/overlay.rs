//! Indicator overlay: which anchors appear on the page being shown, and where.
//!
//! DESIGN
//! ======
//! The overlay is recomputed from scratch whenever the page, the document
//! length, the anchor set, or the display size changes. Each anchor is
//! projected with the canvas dimensions it was captured against, so anchors
//! placed at a different render resolution still land on the same relative
//! spot. Markers keep a fixed on-screen radius regardless of zoom.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use crate::consts::{LABEL_OFFSET_PX, MARKER_RADIUS_PX};
use crate::pages::should_show;
use crate::transform::{CanvasPoint, CanvasSize, Point, Projection, TransformError};

/// Something placed on a page: an anchor as far as the overlay is concerned.
pub trait Placed {
    /// Stable identifier, used to key indicators.
    fn placement_id(&self) -> i64;
    /// Text drawn beside the marker.
    fn label(&self) -> &str;
    /// Raw page rule as stored.
    fn page_spec(&self) -> &str;
    /// Position in canvas space.
    fn position(&self) -> CanvasPoint;
    /// Canvas dimensions at capture time, if recorded.
    fn captured_canvas(&self) -> Option<CanvasSize>;
}

/// A marker ready to draw at display coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Indicator {
    pub id: i64,
    pub label: String,
    /// Marker center in display space.
    pub center: Point,
    pub radius: f64,
    /// Top-left of the label text in display space.
    pub label_origin: Point,
}

/// Project every anchor visible on `current_page` into display space.
///
/// Anchors whose page rule does not select the page are skipped. So are
/// anchors whose captured canvas size is zero; anchors with no recorded size
/// fall back to the view's own canvas.
#[must_use]
pub fn project_indicators<P: Placed>(
    anchors: &[P],
    current_page: u32,
    total_pages: u32,
    projection: &Projection,
) -> Vec<Indicator> {
    anchors
        .iter()
        .filter(|a| should_show(a.page_spec(), current_page, total_pages))
        .filter_map(|a| {
            let captured = a.captured_canvas().unwrap_or_else(|| projection.canvas());
            let Ok(center) = projection.to_display(a.position(), captured) else {
                return None;
            };
            Some(Indicator {
                id: a.placement_id(),
                label: a.label().to_owned(),
                center,
                radius: MARKER_RADIUS_PX,
                label_origin: Point::new(center.x + LABEL_OFFSET_PX, center.y - LABEL_OFFSET_PX),
            })
        })
        .collect()
}

/// Center of the single marker shown in the placement preview.
///
/// # Errors
///
/// Returns [`TransformError::EmptyCanvas`] if `captured` has a zero dimension.
pub fn preview_marker(
    position: CanvasPoint,
    captured: CanvasSize,
    projection: &Projection,
) -> Result<Point, TransformError> {
    projection.to_display(position, captured)
}
