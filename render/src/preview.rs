//! ZoomPreviewController — the anchor-placement preview.
//!
//! DESIGN
//! ======
//! The preview renders through its own pipeline at the same fixed render
//! scale as the editor; zoom never re-rasterizes. Instead the surface is laid
//! out at a base size fitted to a constant width (computed once per rendered
//! page) multiplied by the current zoom level. Clicks are converted against
//! that effective size, and the marker is projected into it while keeping a
//! fixed on-screen radius.

use std::sync::Arc;

use canvas::consts::MARKER_RADIUS_PX;
use canvas::overlay::preview_marker;
use canvas::pages::PageSpec;
use canvas::transform::{CanvasPoint, CanvasSize, DisplaySize, Point, Projection, SurfaceRect, TransformError};
use canvas::zoom::{ZoomLevel, preview_base_size, zoomed_size};

use crate::backend::PdfBackend;
use crate::error::RenderError;
use crate::pipeline::{PdfRenderingPipeline, RenderOutcome};

/// Where the placement marker is drawn in the preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerView {
    pub center: Point,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy)]
struct Marker {
    position: CanvasPoint,
    captured: Option<CanvasSize>,
}

pub struct ZoomPreviewController {
    pipeline: PdfRenderingPipeline,
    render_scale: f64,
    page: u32,
    canvas: Option<CanvasSize>,
    base: Option<DisplaySize>,
    zoom: ZoomLevel,
    marker: Option<Marker>,
}

impl ZoomPreviewController {
    /// # Errors
    ///
    /// [`RenderError::Decode`] for unreadable bytes.
    pub fn load(backend: Arc<dyn PdfBackend>, bytes: &[u8], render_scale: f64) -> Result<Self, RenderError> {
        Ok(Self {
            pipeline: PdfRenderingPipeline::load(backend, bytes)?,
            render_scale,
            page: 1,
            canvas: None,
            base: None,
            zoom: ZoomLevel::ONE,
            marker: None,
        })
    }

    /// Render the page an anchor with `spec` should be previewed on.
    ///
    /// # Errors
    ///
    /// Any non-cancellation render error.
    pub async fn open_for(&mut self, spec: &PageSpec) -> Result<RenderOutcome, RenderError> {
        let page = spec.preview_page(self.pipeline.page_count());
        self.show_page(page).await
    }

    /// Render `page`, clamped into the document, and recompute the base size.
    ///
    /// # Errors
    ///
    /// Any non-cancellation render error.
    pub async fn show_page(&mut self, page: u32) -> Result<RenderOutcome, RenderError> {
        self.page = page.clamp(1, self.pipeline.page_count().max(1));
        let outcome = self.pipeline.render_page(self.page, self.render_scale).await?;
        if let RenderOutcome::Rendered(size) = outcome {
            self.canvas = Some(size);
            self.base = preview_base_size(size);
        }
        Ok(outcome)
    }

    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub fn total_pages(&self) -> u32 {
        self.pipeline.page_count()
    }

    #[must_use]
    pub fn canvas_size(&self) -> Option<CanvasSize> {
        self.canvas
    }

    // ── Zoom ────────────────────────────────────────────────────

    #[must_use]
    pub fn zoom(&self) -> ZoomLevel {
        self.zoom
    }

    pub fn zoom_in(&mut self) {
        self.zoom = self.zoom.zoomed_in();
    }

    pub fn zoom_out(&mut self) {
        self.zoom = self.zoom.zoomed_out();
    }

    /// Snap to the nearest allowed level.
    pub fn set_zoom(&mut self, factor: f64) {
        self.zoom = ZoomLevel::from_factor(factor);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = ZoomLevel::ONE;
    }

    #[must_use]
    pub fn can_zoom_in(&self) -> bool {
        self.zoom.can_zoom_in()
    }

    #[must_use]
    pub fn can_zoom_out(&self) -> bool {
        self.zoom.can_zoom_out()
    }

    #[must_use]
    pub fn zoom_percent(&self) -> u32 {
        self.zoom.percent()
    }

    /// Base display size of the current page, before zoom.
    #[must_use]
    pub fn base_size(&self) -> Option<DisplaySize> {
        self.base
    }

    /// Effective display size: base size times zoom.
    #[must_use]
    pub fn display_size(&self) -> Option<DisplaySize> {
        self.base.map(|base| zoomed_size(base, self.zoom))
    }

    fn projection(&self) -> Result<Projection, TransformError> {
        let canvas = self.canvas.ok_or(TransformError::EmptyCanvas { width: 0, height: 0 })?;
        let display = self.display_size().ok_or(TransformError::DisplayNotLaidOut { width: 0.0, height: 0.0 })?;
        Projection::new(canvas, display)
    }

    // ── Marker ──────────────────────────────────────────────────

    /// Place the marker at a stored anchor position.
    pub fn set_marker(&mut self, position: CanvasPoint, captured: Option<CanvasSize>) {
        self.marker = Some(Marker { position, captured });
    }

    /// Current marker position in canvas space.
    #[must_use]
    pub fn marker_position(&self) -> Option<CanvasPoint> {
        self.marker.map(|m| m.position)
    }

    /// Marker projected into the effective display size.
    #[must_use]
    pub fn marker_view(&self) -> Option<MarkerView> {
        let marker = self.marker?;
        let Ok(projection) = self.projection() else {
            return None;
        };
        let captured = marker.captured.unwrap_or_else(|| projection.canvas());
        match preview_marker(marker.position, captured, &projection) {
            Ok(center) => Some(MarkerView { center, radius: MARKER_RADIUS_PX }),
            Err(_) => None,
        }
    }

    /// Move the marker to a click, converted against the zoomed display size.
    ///
    /// # Errors
    ///
    /// [`TransformError`] before the first render or for clicks off the surface.
    pub fn click(&mut self, client: Point, rect: SurfaceRect) -> Result<CanvasPoint, TransformError> {
        let projection = self.projection()?;
        let position = projection.to_canvas(client, rect)?;
        self.marker = Some(Marker { position, captured: Some(projection.canvas()) });
        Ok(position)
    }

    pub fn close(&self) {
        self.pipeline.close();
    }
}

#[cfg(test)]
#[path = "preview_test.rs"]
mod preview_test;
