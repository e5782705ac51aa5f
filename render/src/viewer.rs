//! Editor viewer: a pipeline plus the page/display state of one editor view.
//!
//! DESIGN
//! ======
//! The viewer is what the presentation layer drives. It owns its own
//! pipeline, tracks the current page, converts clicks into canvas space and
//! reports exactly three things back through [`ViewerEvents`]: a click in
//! canvas space, new canvas dimensions after a render, and the document's
//! page count once it is known.
//!
//! Until the host reports a real layout size, the surface is assumed to be
//! laid out at `canvas / (render_scale / EDITOR_DISPLAY_RATIO)` CSS pixels.

use std::sync::Arc;

use canvas::consts::EDITOR_DISPLAY_RATIO;
use canvas::overlay::{Indicator, Placed, project_indicators};
use canvas::transform::{CanvasPoint, CanvasSize, DisplaySize, Point, Projection, SurfaceRect, TransformError};
use image::RgbaImage;

use crate::backend::PdfBackend;
use crate::error::RenderError;
use crate::pipeline::{PdfRenderingPipeline, RenderOutcome};

/// Callbacks from the core to the presentation layer.
pub trait ViewerEvents: Send + Sync {
    fn on_canvas_click(&self, x: u32, y: u32, page: u32);
    fn on_dimensions_change(&self, canvas_width: u32, canvas_height: u32);
    fn on_pages_loaded(&self, total_pages: u32);
}

pub struct PdfViewer<E: ViewerEvents> {
    pipeline: PdfRenderingPipeline,
    events: E,
    render_scale: f64,
    current_page: u32,
    canvas: Option<CanvasSize>,
    display: Option<DisplaySize>,
    rect: SurfaceRect,
}

impl<E: ViewerEvents> PdfViewer<E> {
    /// Decode `bytes`, announce the page count and render page 1.
    ///
    /// # Errors
    ///
    /// [`RenderError::Decode`] for unreadable bytes, or any error from the first render.
    pub async fn open(
        backend: Arc<dyn PdfBackend>,
        bytes: &[u8],
        render_scale: f64,
        events: E,
    ) -> Result<Self, RenderError> {
        let pipeline = PdfRenderingPipeline::load(backend, bytes)?;
        events.on_pages_loaded(pipeline.page_count());
        let mut viewer = Self {
            pipeline,
            events,
            render_scale,
            current_page: 1,
            canvas: None,
            display: None,
            rect: SurfaceRect::default(),
        };
        viewer.render_page(1).await?;
        Ok(viewer)
    }

    #[must_use]
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    #[must_use]
    pub fn total_pages(&self) -> u32 {
        self.pipeline.page_count()
    }

    /// Canvas dimensions of the last completed render.
    #[must_use]
    pub fn canvas_size(&self) -> Option<CanvasSize> {
        self.canvas
    }

    /// Size the surface is laid out at: the host-reported size, or the
    /// editor's default ratio of the canvas.
    #[must_use]
    pub fn display_size(&self) -> Option<DisplaySize> {
        if let Some(display) = self.display {
            return Some(display);
        }
        let canvas = self.canvas?;
        let ratio = EDITOR_DISPLAY_RATIO / self.render_scale;
        Some(DisplaySize::new(f64::from(canvas.width) * ratio, f64::from(canvas.height) * ratio))
    }

    /// Record the surface's on-screen size and position after layout.
    pub fn set_display_size(&mut self, display: DisplaySize, rect: SurfaceRect) {
        self.display = Some(display);
        self.rect = rect;
    }

    #[must_use]
    pub fn pipeline(&self) -> &PdfRenderingPipeline {
        &self.pipeline
    }

    /// Show `page`, clamped into the document. The current page only changes
    /// once the page has actually been drawn.
    ///
    /// # Errors
    ///
    /// Any non-cancellation error from the render.
    pub async fn go_to_page(&mut self, page: u32) -> Result<RenderOutcome, RenderError> {
        self.render_page(page.clamp(1, self.total_pages().max(1))).await
    }

    /// # Errors
    ///
    /// See [`go_to_page`](Self::go_to_page).
    pub async fn next_page(&mut self) -> Result<RenderOutcome, RenderError> {
        self.go_to_page(self.current_page.saturating_add(1)).await
    }

    /// # Errors
    ///
    /// See [`go_to_page`](Self::go_to_page).
    pub async fn previous_page(&mut self) -> Result<RenderOutcome, RenderError> {
        self.go_to_page(self.current_page.saturating_sub(1)).await
    }

    async fn render_page(&mut self, page: u32) -> Result<RenderOutcome, RenderError> {
        let outcome = self.pipeline.render_page(page, self.render_scale).await?;
        if let RenderOutcome::Rendered(size) = outcome {
            self.current_page = page;
            self.canvas = Some(size);
            self.events.on_dimensions_change(size.width, size.height);
        }
        Ok(outcome)
    }

    fn projection(&self) -> Result<Projection, TransformError> {
        let canvas = self.canvas.ok_or(TransformError::EmptyCanvas { width: 0, height: 0 })?;
        let display = self.display_size().ok_or(TransformError::DisplayNotLaidOut { width: 0.0, height: 0.0 })?;
        Projection::new(canvas, display)
    }

    /// Convert a pointer position to canvas space and report it.
    ///
    /// # Errors
    ///
    /// [`TransformError`] while the surface has no size or when the click is
    /// off the surface; the caller drops the event.
    pub fn click(&self, client: Point) -> Result<CanvasPoint, TransformError> {
        let point = self.projection()?.to_canvas(client, self.rect)?;
        self.events.on_canvas_click(point.x, point.y, self.current_page);
        Ok(point)
    }

    /// Indicators for the anchors visible on the current page.
    #[must_use]
    pub fn indicators<P: Placed>(&self, anchors: &[P]) -> Vec<Indicator> {
        match self.projection() {
            Ok(projection) => project_indicators(anchors, self.current_page, self.total_pages(), &projection),
            Err(_) => Vec::new(),
        }
    }

    /// Copy of the pixels drawn for the current page.
    #[must_use]
    pub fn snapshot(&self) -> Option<RgbaImage> {
        self.pipeline.with_surface(|surface| surface.pixels().cloned())
    }

    /// Tear down: cancel any render in flight and release the document.
    pub fn close(&self) {
        self.pipeline.close();
    }
}

#[cfg(test)]
#[path = "viewer_test.rs"]
mod viewer_test;
