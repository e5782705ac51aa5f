//! Pixel rendering through pdfium.
//!
//! Page lookup, page sizes and the content-stream check stay with
//! [`LopdfBackend`], so both backends agree on geometry and on which pages are
//! corrupt. Pdfium only paints the pixels. The library is bound from the
//! working directory first, then from the system library path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use canvas::transform::CanvasSize;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use pdfium_render::prelude::*;

use crate::backend::{DocumentHandle, LopdfBackend, PageSize, PdfBackend};
use crate::cancel::CancellationToken;
use crate::error::RenderError;

/// Backend that draws page content with pdfium.
pub struct PdfiumBackend {
    pdfium: Pdfium,
    geometry: LopdfBackend,
    sources: Mutex<HashMap<DocumentHandle, Arc<Vec<u8>>>>,
}

impl PdfiumBackend {
    /// # Errors
    ///
    /// [`RenderError::Backend`] if no pdfium library can be bound.
    pub fn bind() -> Result<Self, RenderError> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| RenderError::Backend(format!("failed to bind pdfium: {e}")))?;
        Ok(Self { pdfium: Pdfium::new(bindings), geometry: LopdfBackend::new(), sources: Mutex::default() })
    }

    fn source(&self, doc: DocumentHandle) -> Result<Arc<Vec<u8>>, RenderError> {
        self.sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&doc)
            .cloned()
            .ok_or_else(|| RenderError::Backend(format!("unknown document handle {}", doc.raw())))
    }
}

impl PdfBackend for PdfiumBackend {
    fn open(&self, bytes: &[u8]) -> Result<DocumentHandle, RenderError> {
        let handle = self.geometry.open(bytes)?;
        self.sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, Arc::new(bytes.to_vec()));
        Ok(handle)
    }

    fn page_count(&self, doc: DocumentHandle) -> Result<u32, RenderError> {
        self.geometry.page_count(doc)
    }

    fn page_size(&self, doc: DocumentHandle, page: u32) -> Result<PageSize, RenderError> {
        self.geometry.page_size(doc, page)
    }

    fn rasterize(
        &self,
        doc: DocumentHandle,
        page: u32,
        viewport: CanvasSize,
        cancel: &CancellationToken,
    ) -> Result<Option<RgbaImage>, RenderError> {
        self.geometry.check_page(doc, page)?;
        if cancel.is_cancelled() {
            return Ok(None);
        }

        let bytes = self.source(doc)?;
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(&bytes, None)
            .map_err(|e| RenderError::Decode(e.to_string()))?;
        let index = u16::try_from(page - 1).map_err(|e| RenderError::Backend(e.to_string()))?;
        let pdf_page = document.pages().get(index).map_err(|e| RenderError::Backend(e.to_string()))?;

        let (width, height) = (viewport.width.max(1), viewport.height.max(1));
        let config = PdfRenderConfig::new()
            .set_target_width(i32::try_from(width).map_err(|e| RenderError::Backend(e.to_string()))?)
            .set_target_height(i32::try_from(height).map_err(|e| RenderError::Backend(e.to_string()))?);
        let bitmap = pdf_page
            .render_with_config(&config)
            .map_err(|e| RenderError::CorruptStream { page, detail: e.to_string() })?;
        if cancel.is_cancelled() {
            return Ok(None);
        }

        let drawn_width = u32::try_from(bitmap.width()).map_err(|e| RenderError::Backend(e.to_string()))?;
        let drawn_height = u32::try_from(bitmap.height()).map_err(|e| RenderError::Backend(e.to_string()))?;
        let drawn = RgbaImage::from_raw(drawn_width, drawn_height, bitmap.as_rgba_bytes().to_vec())
            .ok_or_else(|| RenderError::Backend("pdfium bitmap is shorter than its dimensions".to_owned()))?;
        if drawn.dimensions() == (width, height) {
            return Ok(Some(drawn));
        }
        Ok(Some(imageops::resize(&drawn, width, height, FilterType::Triangle)))
    }

    fn close(&self, doc: DocumentHandle) {
        self.sources.lock().unwrap_or_else(PoisonError::into_inner).remove(&doc);
        self.geometry.close(doc);
    }
}

#[cfg(test)]
#[path = "pdfium_test.rs"]
mod pdfium_test;
