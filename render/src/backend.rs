//! PDF decode/render backend.
//!
//! DESIGN
//! ======
//! `PdfBackend` is the seam between the render pipeline and whatever library
//! actually rasterizes pages, so pipelines can be driven by a mock in tests.
//! `LopdfBackend` parses page geometry and content streams with `lopdf` and
//! rasterizes a blank page of the right size: enough to drive click capture
//! and indicator projection, which only depend on geometry. With the `pdfium`
//! feature, `PdfiumBackend` draws the page content on top of that geometry.
//!
//! One backend instance is shared by every view through [`shared_backend`],
//! initialized once on first use. It is pdfium when the feature is on and a
//! library can be bound, lopdf otherwise. Documents are not shared: each view
//! opens its own handle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use canvas::transform::CanvasSize;
use image::{Rgba, RgbaImage};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use crate::cancel::CancellationToken;
use crate::error::RenderError;

/// US-Letter, used when a page carries no readable `MediaBox`.
const DEFAULT_MEDIA_BOX: MediaBox = MediaBox { x0: 0.0, y0: 0.0, x1: 612.0, y1: 792.0 };

const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);
const EDGE: Rgba<u8> = Rgba([220, 220, 220, 255]);

// =============================================================================
// TYPES
// =============================================================================

/// Opaque reference to a document opened by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    /// Wrap a backend-assigned identifier.
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Page dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f64,
    pub height_pt: f64,
}

impl PageSize {
    /// Raster surface size for this page at `scale`: each dimension floored,
    /// never below one pixel.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn viewport(&self, scale: f64) -> CanvasSize {
        let width = (self.width_pt * scale).floor().max(1.0) as u32;
        let height = (self.height_pt * scale).floor().max(1.0) as u32;
        CanvasSize::new(width, height)
    }
}

/// A page's `MediaBox` rectangle in default user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MediaBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl MediaBox {
    pub(crate) fn size(&self) -> PageSize {
        PageSize { width_pt: (self.x1 - self.x0).abs(), height_pt: (self.y1 - self.y0).abs() }
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Decode and rasterize PDF documents. Page numbers are 1-based.
pub trait PdfBackend: Send + Sync {
    /// # Errors
    ///
    /// [`RenderError::Decode`] if `bytes` are not a usable PDF.
    fn open(&self, bytes: &[u8]) -> Result<DocumentHandle, RenderError>;

    /// # Errors
    ///
    /// [`RenderError::Backend`] for an unknown handle.
    fn page_count(&self, doc: DocumentHandle) -> Result<u32, RenderError>;

    /// # Errors
    ///
    /// [`RenderError::InvalidPage`] for a page outside the document.
    fn page_size(&self, doc: DocumentHandle, page: u32) -> Result<PageSize, RenderError>;

    /// Draw `page` into a surface of `viewport` pixels. Returns `Ok(None)`
    /// when `cancel` fires before the draw completes.
    ///
    /// # Errors
    ///
    /// [`RenderError::CorruptStream`] if the page content cannot be decoded.
    fn rasterize(
        &self,
        doc: DocumentHandle,
        page: u32,
        viewport: CanvasSize,
        cancel: &CancellationToken,
    ) -> Result<Option<RgbaImage>, RenderError>;

    /// Release a document. Unknown handles are ignored.
    fn close(&self, doc: DocumentHandle);
}

// =============================================================================
// LOPDF BACKEND
// =============================================================================

struct OpenDocument {
    doc: Document,
    pages: Vec<ObjectId>,
    sizes: Vec<PageSize>,
}

/// Geometry-only backend built on `lopdf`.
#[derive(Default)]
pub struct LopdfBackend {
    next_handle: AtomicU64,
    docs: Mutex<HashMap<DocumentHandle, Arc<OpenDocument>>>,
}

impl LopdfBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently open.
    #[must_use]
    pub fn open_documents(&self) -> usize {
        self.docs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn get(&self, handle: DocumentHandle) -> Result<Arc<OpenDocument>, RenderError> {
        self.docs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle)
            .cloned()
            .ok_or_else(|| RenderError::Backend(format!("unknown document handle {}", handle.raw())))
    }

    /// Fail with [`RenderError::CorruptStream`] if `page` has content that cannot be decoded.
    pub(crate) fn check_page(&self, doc: DocumentHandle, page: u32) -> Result<(), RenderError> {
        let open = self.get(doc)?;
        let idx = page_index(&open, page)?;
        check_content(&open.doc, open.pages[idx], page)
    }
}

fn page_index(open: &OpenDocument, page: u32) -> Result<usize, RenderError> {
    let count = u32::try_from(open.pages.len()).unwrap_or(u32::MAX);
    if page == 0 || page > count {
        return Err(RenderError::InvalidPage { page, page_count: count });
    }
    usize::try_from(page - 1).map_err(|e| RenderError::Backend(e.to_string()))
}

impl PdfBackend for LopdfBackend {
    fn open(&self, bytes: &[u8]) -> Result<DocumentHandle, RenderError> {
        let doc = Document::load_mem(bytes)?;
        if doc.trailer.get(b"Encrypt").is_ok() {
            return Err(RenderError::Decode("encrypted PDFs are not supported".to_owned()));
        }
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err(RenderError::Decode("document has no pages".to_owned()));
        }
        let sizes = pages.iter().map(|id| media_box(&doc, *id).size()).collect();

        let handle = DocumentHandle(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1);
        self.docs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, Arc::new(OpenDocument { doc, pages, sizes }));
        tracing::debug!(handle = handle.raw(), "document opened");
        Ok(handle)
    }

    fn page_count(&self, doc: DocumentHandle) -> Result<u32, RenderError> {
        let open = self.get(doc)?;
        u32::try_from(open.pages.len()).map_err(|e| RenderError::Backend(e.to_string()))
    }

    fn page_size(&self, doc: DocumentHandle, page: u32) -> Result<PageSize, RenderError> {
        let open = self.get(doc)?;
        let idx = page_index(&open, page)?;
        Ok(open.sizes[idx])
    }

    fn rasterize(
        &self,
        doc: DocumentHandle,
        page: u32,
        viewport: CanvasSize,
        cancel: &CancellationToken,
    ) -> Result<Option<RgbaImage>, RenderError> {
        self.page_size(doc, page)?;
        if cancel.is_cancelled() {
            return Ok(None);
        }
        self.check_page(doc, page)?;
        if cancel.is_cancelled() {
            return Ok(None);
        }

        let (width, height) = (viewport.width.max(1), viewport.height.max(1));
        let mut surface = RgbaImage::from_pixel(width, height, PAPER);
        if width >= 4 && height >= 4 {
            for x in 0..width {
                surface.put_pixel(x, 0, EDGE);
                surface.put_pixel(x, height - 1, EDGE);
            }
            for y in 0..height {
                surface.put_pixel(0, y, EDGE);
                surface.put_pixel(width - 1, y, EDGE);
            }
        }
        if cancel.is_cancelled() {
            return Ok(None);
        }
        Ok(Some(surface))
    }

    fn close(&self, doc: DocumentHandle) {
        if self
            .docs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&doc)
            .is_some()
        {
            tracing::debug!(handle = doc.raw(), "document closed");
        }
    }
}

/// Decode every content stream of a page, failing on the first that cannot be read.
fn check_content(doc: &Document, page_id: ObjectId, page: u32) -> Result<(), RenderError> {
    let corrupt = |detail: String| RenderError::CorruptStream { page, detail };
    let mut data = Vec::new();
    for stream_id in doc.get_page_contents(page_id) {
        let stream = doc
            .get_object(stream_id)
            .and_then(Object::as_stream)
            .map_err(|e| corrupt(format!("contents object {stream_id:?}: {e}")))?;
        if stream.dict.has(b"Filter") {
            let decoded = stream.decompressed_content().map_err(|e| corrupt(e.to_string()))?;
            data.extend_from_slice(&decoded);
        } else {
            data.extend_from_slice(&stream.content);
        }
        data.push(b'\n');
    }
    Content::decode(&data).map_err(|e| corrupt(e.to_string()))?;
    Ok(())
}

// =============================================================================
// PAGE GEOMETRY
// =============================================================================

#[allow(clippy::cast_precision_loss)]
fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(target) => target,
            Err(_) => obj,
        },
        _ => obj,
    }
}

/// Look `key` up on the page, then up its `Parent` chain.
pub(crate) fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = Some(page_id);
    // Bounded walk in case of a cyclic Parent chain.
    for _ in 0..32 {
        let id = current?;
        let Ok(dict) = doc.get_dictionary(id) else {
            return None;
        };
        if let Ok(value) = dict.get(key) {
            return Some(resolve(doc, value));
        }
        current = match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => Some(*parent),
            _ => None,
        };
    }
    None
}

/// The page's `MediaBox`, inherited if necessary, defaulting to US-Letter.
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> MediaBox {
    let Some(Object::Array(items)) = inherited(doc, page_id, b"MediaBox") else {
        return DEFAULT_MEDIA_BOX;
    };
    let values: Vec<f64> = items.iter().filter_map(|o| number(resolve(doc, o))).collect();
    match values.as_slice() {
        [x0, y0, x1, y1] => MediaBox { x0: x0.min(*x1), y0: y0.min(*y1), x1: x0.max(*x1), y1: y0.max(*y1) },
        _ => DEFAULT_MEDIA_BOX,
    }
}

// =============================================================================
// SHARED INSTANCE
// =============================================================================

/// The process-wide backend, created on first call.
pub fn shared_backend() -> Arc<dyn PdfBackend> {
    static BACKEND: OnceLock<Arc<dyn PdfBackend>> = OnceLock::new();
    Arc::clone(BACKEND.get_or_init(init_backend))
}

#[cfg(feature = "pdfium")]
fn init_backend() -> Arc<dyn PdfBackend> {
    match crate::pdfium::PdfiumBackend::bind() {
        Ok(backend) => {
            tracing::info!(backend = "pdfium", "initializing PDF backend");
            Arc::new(backend)
        }
        Err(e) => {
            tracing::warn!(error = %e, "pdfium unavailable; pages render blank");
            Arc::new(LopdfBackend::new())
        }
    }
}

#[cfg(not(feature = "pdfium"))]
fn init_backend() -> Arc<dyn PdfBackend> {
    tracing::info!(backend = "lopdf", "initializing PDF backend");
    Arc::new(LopdfBackend::new())
}

#[cfg(test)]
#[path = "backend_test.rs"]
mod backend_test;
