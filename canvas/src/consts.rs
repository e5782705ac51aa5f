//! Shared numeric constants for the canvas crate.

// ── Rendering ───────────────────────────────────────────────────

/// Multiplier applied when rasterizing a PDF page. Independent of UI zoom.
pub const RENDER_SCALE: f64 = 2.0;

/// The editor lays the surface out at `canvas / (RENDER_SCALE / EDITOR_DISPLAY_RATIO)`
/// CSS pixels until the host reports a real layout size.
pub const EDITOR_DISPLAY_RATIO: f64 = 1.5;

/// Canvas size of a US-Letter page at [`RENDER_SCALE`], used when nothing else is recorded.
pub const DEFAULT_CANVAS_WIDTH: u32 = 1224;

/// See [`DEFAULT_CANVAS_WIDTH`].
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1584;

// ── Zoom preview ────────────────────────────────────────────────

/// Smallest preview zoom factor.
pub const ZOOM_MIN: f64 = 0.5;

/// Largest preview zoom factor.
pub const ZOOM_MAX: f64 = 2.5;

/// Increment applied by a single zoom-in / zoom-out.
pub const ZOOM_STEP: f64 = 0.25;

/// Width in CSS pixels the preview fits a page into before zoom is applied.
pub const PREVIEW_BASE_WIDTH: f64 = 500.0;

// ── Indicators ──────────────────────────────────────────────────

/// Radius of the placement dot in screen pixels. Does not scale with zoom.
pub const MARKER_RADIUS_PX: f64 = 6.0;

/// Offset of the anchor label from its dot, in screen pixels.
pub const LABEL_OFFSET_PX: f64 = 10.0;

// ── Validation ──────────────────────────────────────────────────

/// Largest accepted canvas-space coordinate on either axis.
pub const MAX_COORDINATE: u32 = 10_000;
