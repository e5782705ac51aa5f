//! Conversions between display space and canvas space.
//!
//! Canvas space is the pixel grid of the raster surface at the fixed render
//! scale. Display space is the CSS size the surface is laid out at, which
//! differs from canvas space under responsive layout and zoom. Clicks arrive
//! in client coordinates, are stored in canvas space, and are projected back
//! into whatever display size a view currently has using the same ratio.
//!
//! Both directions refuse to compute against a zero-sized surface instead of
//! dividing by zero; callers drop the event and wait for layout.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use serde::{Deserialize, Serialize};

/// A point in display or client space, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An integer pixel position on the raster surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasPoint {
    pub x: u32,
    pub y: u32,
}

impl CanvasPoint {
    #[must_use]
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Pixel dimensions of a raster surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True if either dimension is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// On-screen size of a surface in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySize {
    pub width: f64,
    pub height: f64,
}

impl DisplaySize {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True once the surface has a positive, finite size on both axes.
    #[must_use]
    pub fn is_laid_out(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// This size multiplied by `factor` on both axes.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self { width: self.width * factor, height: self.height * factor }
    }
}

/// Top-left corner of the surface's bounding rectangle, in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceRect {
    pub left: f64,
    pub top: f64,
}

impl SurfaceRect {
    #[must_use]
    pub fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }
}

/// Reasons a transform refuses to compute.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("display surface is not laid out ({width}x{height})")]
    DisplayNotLaidOut { width: f64, height: f64 },
    #[error("canvas surface is empty ({width}x{height})")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("pointer at ({x}, {y}) is outside the surface")]
    OutsideSurface { x: f64, y: f64 },
}

fn check_sizes(canvas: CanvasSize, display: DisplaySize) -> Result<(), TransformError> {
    if !display.is_laid_out() {
        return Err(TransformError::DisplayNotLaidOut { width: display.width, height: display.height });
    }
    if canvas.is_empty() {
        return Err(TransformError::EmptyCanvas { width: canvas.width, height: canvas.height });
    }
    Ok(())
}

/// Convert a pointer position in client coordinates into canvas pixels.
///
/// `x = round((client.x - rect.left) * canvas.width / display.width)`, and the
/// same for `y`.
///
/// # Errors
///
/// Returns [`TransformError`] if either surface has no size, or if the pointer
/// lies outside the displayed surface.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_canvas_space(
    client: Point,
    rect: SurfaceRect,
    canvas: CanvasSize,
    display: DisplaySize,
) -> Result<CanvasPoint, TransformError> {
    check_sizes(canvas, display)?;

    let local_x = client.x - rect.left;
    let local_y = client.y - rect.top;
    let inside = (0.0..=display.width).contains(&local_x) && (0.0..=display.height).contains(&local_y);
    if !inside {
        return Err(TransformError::OutsideSurface { x: local_x, y: local_y });
    }

    // Bounded by canvas dimensions since local offsets are within the display size.
    let x = (local_x * f64::from(canvas.width) / display.width).round() as u32;
    let y = (local_y * f64::from(canvas.height) / display.height).round() as u32;
    Ok(CanvasPoint { x: x.min(canvas.width), y: y.min(canvas.height) })
}

/// Project a stored canvas-space point into display space.
///
/// `x = point.x * display.width / canvas.width`, and the same for `y`. The
/// result is left unrounded so indicators land on sub-pixel CSS positions.
///
/// # Errors
///
/// Returns [`TransformError`] if either surface has no size.
pub fn to_display_space(
    point: CanvasPoint,
    canvas: CanvasSize,
    display: DisplaySize,
) -> Result<Point, TransformError> {
    check_sizes(canvas, display)?;
    Ok(Point {
        x: f64::from(point.x) * display.width / f64::from(canvas.width),
        y: f64::from(point.y) * display.height / f64::from(canvas.height),
    })
}

/// A validated canvas/display pair that a view converts through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    canvas: CanvasSize,
    display: DisplaySize,
}

impl Projection {
    /// # Errors
    ///
    /// Returns [`TransformError`] if either surface has no size.
    pub fn new(canvas: CanvasSize, display: DisplaySize) -> Result<Self, TransformError> {
        check_sizes(canvas, display)?;
        Ok(Self { canvas, display })
    }

    #[must_use]
    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    #[must_use]
    pub fn display(&self) -> DisplaySize {
        self.display
    }

    /// See [`to_canvas_space`].
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::OutsideSurface`] for clicks off the surface.
    pub fn to_canvas(&self, client: Point, rect: SurfaceRect) -> Result<CanvasPoint, TransformError> {
        to_canvas_space(client, rect, self.canvas, self.display)
    }

    /// Project `point`, captured against `captured` canvas dimensions, into this
    /// view's display space. The anchor's own canvas size is used for the ratio.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::EmptyCanvas`] if `captured` has a zero dimension.
    pub fn to_display(&self, point: CanvasPoint, captured: CanvasSize) -> Result<Point, TransformError> {
        to_display_space(point, captured, self.display)
    }
}
