//! In-memory PDFs for tests.

use lopdf::{Document, Object, ObjectId, Stream, dictionary};

fn finish(mut doc: Document, pages_id: ObjectId, kids: Vec<Object>, pages_extra: lopdf::Dictionary) -> Vec<u8> {
    let count = i64::try_from(kids.len()).unwrap();
    let mut pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
    };
    for (key, value) in pages_extra.iter() {
        pages.set(key.clone(), value.clone());
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

fn text_stream(doc: &mut Document, text: &str) -> ObjectId {
    let body = format!("BT /F1 12 Tf 72 700 Td ({text}) Tj ET");
    doc.add_object(Stream::new(lopdf::Dictionary::new(), body.into_bytes()))
}

/// One page per entry, sized `(width_pt, height_pt)`, each with a little text.
pub fn pdf_with_sizes(sizes: &[(i64, i64)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let mut kids = Vec::new();
    for (i, (w, h)) in sizes.iter().enumerate() {
        let content_id = text_stream(&mut doc, &format!("Page {}", i + 1));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), (*w).into(), (*h).into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        kids.push(page_id.into());
    }
    finish(doc, pages_id, kids, lopdf::Dictionary::new())
}

/// `count` US-Letter pages.
pub fn pdf_with_pages(count: usize) -> Vec<u8> {
    pdf_with_sizes(&vec![(612, 792); count])
}

/// Pages that carry neither `MediaBox` nor `Resources`; both live on the page tree node.
pub fn pdf_with_inherited_attributes(count: usize, size: (i64, i64)) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for i in 0..count {
        let content_id = text_stream(&mut doc, &format!("Inherited {}", i + 1));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }
    let extra = dictionary! {
        "MediaBox" => vec![0.into(), 0.into(), size.0.into(), size.1.into()],
        "Resources" => dictionary! {},
    };
    finish(doc, pages_id, kids, extra)
}

/// One US-Letter page showing `text` as a string operand.
pub fn pdf_with_text(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = text_stream(&mut doc, text);
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {},
    });
    finish(doc, pages_id, vec![page_id.into()], lopdf::Dictionary::new())
}

/// A page whose trailer names a standard security handler the reader cannot satisfy.
pub fn pdf_with_encrypt_entry() -> Vec<u8> {
    let mut doc = Document::load_mem(&pdf_with_pages(1)).unwrap();
    doc.trailer.set(
        "Encrypt",
        dictionary! {
            "Filter" => "Standard",
            "V" => 1_i64,
            "R" => 2_i64,
            "O" => Object::string_literal(vec![0u8; 32]),
            "U" => Object::string_literal(vec![0u8; 32]),
            "P" => -4_i64,
        },
    );
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// A single page whose `Contents` points at a number instead of a stream.
pub fn pdf_with_broken_contents() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let bogus_id = doc.add_object(Object::Integer(42));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => bogus_id,
    });
    finish(doc, pages_id, vec![page_id.into()], lopdf::Dictionary::new())
}

// =============================================================
// Gated backend
// =============================================================

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use canvas::transform::CanvasSize;
use image::RgbaImage;

use crate::backend::{DocumentHandle, PageSize, PdfBackend};
use crate::cancel::CancellationToken;
use crate::error::RenderError;

/// Backend whose rasterize blocks until the gate opens or the render is cancelled.
pub struct GatedBackend {
    pages: Vec<PageSize>,
    gate_open: AtomicBool,
    pub started: AtomicUsize,
    pub corrupt_page: Option<u32>,
    pub closed: Mutex<Vec<DocumentHandle>>,
}

impl GatedBackend {
    pub fn letter(pages: usize) -> Self {
        Self {
            pages: vec![PageSize { width_pt: 612.0, height_pt: 792.0 }; pages],
            gate_open: AtomicBool::new(true),
            started: AtomicUsize::new(0),
            corrupt_page: None,
            closed: Mutex::new(Vec::new()),
        }
    }

    pub fn hold(&self) {
        self.gate_open.store(false, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.gate_open.store(true, Ordering::SeqCst);
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

impl PdfBackend for GatedBackend {
    fn open(&self, bytes: &[u8]) -> Result<DocumentHandle, RenderError> {
        if bytes.starts_with(b"%PDF") {
            Ok(DocumentHandle::new(7))
        } else {
            Err(RenderError::Decode("missing header".into()))
        }
    }

    fn page_count(&self, _doc: DocumentHandle) -> Result<u32, RenderError> {
        Ok(u32::try_from(self.pages.len()).unwrap())
    }

    fn page_size(&self, _doc: DocumentHandle, page: u32) -> Result<PageSize, RenderError> {
        self.pages
            .get(page as usize - 1)
            .copied()
            .ok_or(RenderError::InvalidPage { page, page_count: u32::try_from(self.pages.len()).unwrap() })
    }

    fn rasterize(
        &self,
        _doc: DocumentHandle,
        page: u32,
        viewport: CanvasSize,
        cancel: &CancellationToken,
    ) -> Result<Option<RgbaImage>, RenderError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        loop {
            if cancel.is_cancelled() {
                return Ok(None);
            }
            if self.gate_open.load(Ordering::SeqCst) {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        if self.corrupt_page == Some(page) {
            return Err(RenderError::CorruptStream { page, detail: "bad operator".into() });
        }
        Ok(Some(RgbaImage::new(viewport.width, viewport.height)))
    }

    fn close(&self, doc: DocumentHandle) {
        self.closed.lock().unwrap().push(doc);
    }
}
