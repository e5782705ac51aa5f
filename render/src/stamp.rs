//! Autofill burn-in: draw each anchor's text onto the pages its rule selects.
//!
//! DESIGN
//! ======
//! Anchors are stored in canvas pixels with a top-left origin. Each is mapped
//! into the target page's `MediaBox` proportionally, `x * page_width /
//! canvas_width` and likewise for `y`, then flipped into PDF's bottom-left
//! user space. The existing page content is wrapped in `q`/`Q` so the stamp
//! draws in a clean graphics state, and a Helvetica resource is added under a
//! name that cannot collide with the document's own fonts.
//!
//! Page selection uses the same parsed `PageSpec` as on-screen visibility.

use std::collections::BTreeMap;

use canvas::overlay::Placed;
use canvas::pages::PageSpec;
use canvas::transform::CanvasSize;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use crate::backend::{inherited, media_box};
use crate::error::RenderError;

/// Point size of stamped text.
pub const STAMP_FONT_SIZE: f32 = 10.0;

const FONT_RESOURCE: &str = "AnchorStampHelv";

/// Stamp colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ink {
    /// Red, for reviewing placement.
    Preview,
    /// White, for the delivered document.
    Final,
}

impl Ink {
    #[must_use]
    pub fn from_preview(preview: bool) -> Self {
        if preview { Self::Preview } else { Self::Final }
    }

    #[must_use]
    pub fn rgb(self) -> [f32; 3] {
        match self {
            Self::Preview => [1.0, 0.0, 0.0],
            Self::Final => [1.0, 1.0, 1.0],
        }
    }
}

/// Burn every anchor's text into `bytes` and return the new document.
///
/// An anchor without a usable captured canvas size falls back to `canvas`;
/// if that is empty too, or its page rule does not parse, the anchor is
/// skipped with a warning.
///
/// # Errors
///
/// [`RenderError::Decode`] if `bytes` are not a PDF, [`RenderError::Backend`]
/// if the result cannot be written.
pub fn burn_in<P: Placed>(bytes: &[u8], anchors: &[P], canvas: CanvasSize, ink: Ink) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::load_mem(bytes)?;
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let total = u32::try_from(pages.len()).map_err(|e| RenderError::Backend(e.to_string()))?;

    let mut per_page: BTreeMap<usize, Vec<Operation>> = BTreeMap::new();
    let mut stamped = 0usize;
    for anchor in anchors {
        let spec: PageSpec = match anchor.page_spec().parse() {
            Ok(spec) => spec,
            Err(e) => {
                tracing::warn!(anchor_id = anchor.placement_id(), error = %e, "skipping anchor with bad page rule");
                continue;
            }
        };
        let captured = anchor.captured_canvas().filter(|c| !c.is_empty()).unwrap_or(canvas);
        if captured.is_empty() {
            tracing::warn!(anchor_id = anchor.placement_id(), "skipping anchor without canvas dimensions");
            continue;
        }

        for page in spec.pages(total) {
            let idx = (page - 1) as usize;
            let Some(page_id) = pages.get(idx) else {
                continue;
            };
            let (x, y) = page_position(&doc, *page_id, anchor, captured);
            per_page.entry(idx).or_default().extend(text_ops(anchor.label(), x, y, ink));
            stamped += 1;
        }
    }

    if !per_page.is_empty() {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        for (idx, operations) in per_page {
            let page_id = pages[idx];
            install_font(&mut doc, page_id, font_id)?;
            append_content(&mut doc, page_id, operations)?;
        }
    }

    tracing::info!(anchors = anchors.len(), stamps = stamped, ?ink, "burn-in complete");
    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(|e| RenderError::Backend(format!("write failed: {e}")))?;
    Ok(out)
}

/// Anchor position in PDF user space (bottom-left origin) on `page_id`.
#[allow(clippy::cast_possible_truncation)]
fn page_position<P: Placed>(doc: &Document, page_id: ObjectId, anchor: &P, captured: CanvasSize) -> (f32, f32) {
    let mb = media_box(doc, page_id);
    let size = mb.size();
    let at = anchor.position();
    let x = f64::from(at.x) * size.width_pt / f64::from(captured.width);
    let from_top = f64::from(at.y) * size.height_pt / f64::from(captured.height);
    ((mb.x0 + x) as f32, (mb.y1 - from_top) as f32)
}

fn text_ops(text: &str, x: f32, y: f32, ink: Ink) -> Vec<Operation> {
    let [r, g, b] = ink.rgb();
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(FONT_RESOURCE.as_bytes().to_vec()), Object::Real(STAMP_FONT_SIZE)]),
        Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
        Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

/// Give the page its own `Resources` carrying the stamp font, keeping every
/// resource it already had or inherited.
fn install_font(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> Result<(), RenderError> {
    let mut resources = match inherited(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => match doc.get_dictionary(*id) {
            Ok(dict) => dict.clone(),
            Err(_) => Dictionary::new(),
        },
        _ => Dictionary::new(),
    };
    fonts.set(FONT_RESOURCE, font_id);
    resources.set("Font", fonts);

    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| RenderError::Backend(format!("page {page_id:?}: {e}")))?
        .set("Resources", resources);
    Ok(())
}

/// Wrap the page's existing content in `q`/`Q` and append the stamp stream.
fn append_content(doc: &mut Document, page_id: ObjectId, operations: Vec<Operation>) -> Result<(), RenderError> {
    let existing: Vec<Object> = {
        let page = doc
            .get_dictionary(page_id)
            .map_err(|e| RenderError::Backend(format!("page {page_id:?}: {e}")))?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    };

    let mut body = b"\nQ\n".to_vec();
    let encoded = Content { operations }
        .encode()
        .map_err(|e| RenderError::Backend(format!("encode stamp: {e}")))?;
    body.extend_from_slice(&encoded);

    let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let stamp_id = doc.add_object(Stream::new(Dictionary::new(), body));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(stamp_id));

    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| RenderError::Backend(format!("page {page_id:?}: {e}")))?
        .set("Contents", contents);
    Ok(())
}

#[cfg(test)]
#[path = "stamp_test.rs"]
mod stamp_test;
