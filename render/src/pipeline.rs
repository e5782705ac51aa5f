//! PdfRenderingPipeline — one decoded document and its raster surface.
//!
//! DESIGN
//! ======
//! Each view owns its own pipeline: the document handle and the surface are
//! never shared across views. Only one render may be in flight per surface.
//! Starting a render claims the surface's [`RenderSlot`], which cancels the
//! previous claim; the superseded render notices its token and resolves to
//! [`RenderOutcome::Cancelled`] without touching the surface.
//!
//! Rasterization runs on tokio's blocking pool so the caller's task only
//! suspends while the backend works. A corrupt content stream is terminal for
//! the document: every later render returns the same error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use canvas::transform::CanvasSize;
use image::RgbaImage;

use crate::backend::{DocumentHandle, PdfBackend};
use crate::cancel::{CancellationToken, RenderSlot};
use crate::error::RenderError;

// =============================================================================
// TYPES
// =============================================================================

/// How a render request ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The page was drawn; the surface now has these pixel dimensions.
    Rendered(CanvasSize),
    /// A newer render or teardown superseded this one.
    Cancelled,
}

impl RenderOutcome {
    /// Canvas size for a completed render.
    #[must_use]
    pub fn rendered(self) -> Option<CanvasSize> {
        match self {
            Self::Rendered(size) => Some(size),
            Self::Cancelled => None,
        }
    }
}

/// The pixel buffer a page is drawn into.
#[derive(Debug, Default)]
pub struct RasterSurface {
    size: Option<CanvasSize>,
    pixels: Option<RgbaImage>,
    page: Option<u32>,
}

impl RasterSurface {
    /// Pixel dimensions, set as soon as a render starts.
    #[must_use]
    pub fn size(&self) -> Option<CanvasSize> {
        self.size
    }

    /// Pixels of the last completed render.
    #[must_use]
    pub fn pixels(&self) -> Option<&RgbaImage> {
        self.pixels.as_ref()
    }

    /// Page shown by the last completed render.
    #[must_use]
    pub fn page(&self) -> Option<u32> {
        self.page
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

pub struct PdfRenderingPipeline {
    backend: Arc<dyn PdfBackend>,
    doc: DocumentHandle,
    page_count: u32,
    slot: RenderSlot,
    surface: Mutex<RasterSurface>,
    terminal: Mutex<Option<RenderError>>,
    closed: AtomicBool,
}

impl PdfRenderingPipeline {
    /// Decode `bytes` into a new document owned by this pipeline.
    ///
    /// # Errors
    ///
    /// [`RenderError::Decode`] when the bytes are not a valid PDF.
    pub fn load(backend: Arc<dyn PdfBackend>, bytes: &[u8]) -> Result<Self, RenderError> {
        let doc = backend.open(bytes)?;
        let page_count = match backend.page_count(doc) {
            Ok(count) => count,
            Err(e) => {
                backend.close(doc);
                return Err(e);
            }
        };
        tracing::info!(handle = doc.raw(), page_count, "document loaded");
        Ok(Self {
            backend,
            doc,
            page_count,
            slot: RenderSlot::new(),
            surface: Mutex::new(RasterSurface::default()),
            terminal: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    #[must_use]
    pub fn document(&self) -> DocumentHandle {
        self.doc
    }

    /// Current surface dimensions, if a render has started.
    #[must_use]
    pub fn surface_size(&self) -> Option<CanvasSize> {
        self.lock_surface().size
    }

    /// Run `f` against the raster surface.
    pub fn with_surface<R>(&self, f: impl FnOnce(&RasterSurface) -> R) -> R {
        f(&self.lock_surface())
    }

    /// True while a render holds the surface.
    #[must_use]
    pub fn is_rendering(&self) -> bool {
        self.slot.is_busy()
    }

    /// Render `page` (1-based) at `scale`, cancelling any render in flight.
    ///
    /// # Errors
    ///
    /// [`RenderError::InvalidPage`] for a page outside the document,
    /// [`RenderError::CorruptStream`] once the document is known to be corrupt,
    /// [`RenderError::Backend`] after [`close`](Self::close) or for a bad scale.
    pub async fn render_page(&self, page: u32, scale: f64) -> Result<RenderOutcome, RenderError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RenderError::Backend("document is closed".to_owned()));
        }
        if let Some(err) = self.lock_terminal().clone() {
            return Err(err);
        }
        if page == 0 || page > self.page_count {
            return Err(RenderError::InvalidPage { page, page_count: self.page_count });
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(RenderError::Backend(format!("invalid render scale {scale}")));
        }

        let token = self.slot.claim();
        let result = self.draw(page, scale, &token).await;
        self.slot.release(&token);
        result
    }

    async fn draw(&self, page: u32, scale: f64, token: &CancellationToken) -> Result<RenderOutcome, RenderError> {
        let viewport = self.backend.page_size(self.doc, page)?.viewport(scale);
        self.lock_surface().size = Some(viewport);

        let backend = Arc::clone(&self.backend);
        let doc = self.doc;
        let worker_token = token.clone();
        let joined =
            tokio::task::spawn_blocking(move || backend.rasterize(doc, page, viewport, &worker_token)).await;
        let drawn = joined.map_err(|e| RenderError::Backend(format!("render task failed: {e}")))?;

        match drawn {
            Ok(Some(pixels)) if !token.is_cancelled() => {
                let mut surface = self.lock_surface();
                surface.pixels = Some(pixels);
                surface.page = Some(page);
                tracing::debug!(page, width = viewport.width, height = viewport.height, "page rendered");
                Ok(RenderOutcome::Rendered(viewport))
            }
            Ok(_) => {
                tracing::debug!(page, "render cancelled");
                Ok(RenderOutcome::Cancelled)
            }
            Err(err @ RenderError::CorruptStream { .. }) => {
                tracing::warn!(page, error = %err, "document marked corrupt");
                *self.lock_terminal() = Some(err.clone());
                if token.is_cancelled() { Ok(RenderOutcome::Cancelled) } else { Err(err) }
            }
            Err(_) if token.is_cancelled() => Ok(RenderOutcome::Cancelled),
            Err(err) => Err(err),
        }
    }

    /// Cancel the render in flight, if any.
    pub fn cancel(&self) {
        self.slot.cancel();
    }

    /// Cancel the render in flight and release the document. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.slot.cancel();
        self.backend.close(self.doc);
        tracing::debug!(handle = self.doc.raw(), "pipeline closed");
    }

    fn lock_surface(&self) -> MutexGuard<'_, RasterSurface> {
        self.surface.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_terminal(&self) -> MutexGuard<'_, Option<RenderError>> {
        self.terminal.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PdfRenderingPipeline {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
