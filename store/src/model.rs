//! Provider → PDF → Anchor hierarchy as it arrives from the backend.
//!
//! DESIGN
//! ======
//! Wire fields are camelCase. Counts and the provider's flattened anchor view
//! are derived data: [`Provider::reindex`] recomputes all of them from the
//! PDF lists by filtering, never by incrementing, and is called after every
//! mirror mutation.

use std::collections::HashSet;

use canvas::overlay::Placed;
use canvas::transform::{CanvasPoint, CanvasSize};
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// ENTITIES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    pub id: i64,
    #[serde(default)]
    pub pdf_id: Option<i64>,
    /// Placeholder token, `{{key}}`.
    pub text: String,
    pub x: u32,
    pub y: u32,
    /// Page rule in its stored string form.
    #[serde(default = "default_page")]
    pub page: String,
    #[serde(default)]
    pub canvas_width: Option<u32>,
    #[serde(default)]
    pub canvas_height: Option<u32>,
    /// Owning PDF's filename; only set on the provider's flattened view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_filename: Option<String>,
}

fn default_page() -> String {
    "1".to_owned()
}

impl Anchor {
    /// Canvas size recorded at capture, if both dimensions are present.
    #[must_use]
    pub fn canvas(&self) -> Option<CanvasSize> {
        Some(CanvasSize::new(self.canvas_width?, self.canvas_height?))
    }
}

impl Placed for Anchor {
    fn placement_id(&self) -> i64 {
        self.id
    }

    fn label(&self) -> &str {
        &self.text
    }

    fn page_spec(&self) -> &str {
        &self.page
    }

    fn position(&self) -> CanvasPoint {
        CanvasPoint::new(self.x, self.y)
    }

    fn captured_canvas(&self) -> Option<CanvasSize> {
        self.canvas()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderPdf {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_id")]
    pub provider_id: String,
    pub filename: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub canvas_width: Option<u32>,
    #[serde(default)]
    pub canvas_height: Option<u32>,
    #[serde(default)]
    pub content_hash: Option<String>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub anchors: Vec<Anchor>,
    #[serde(default)]
    pub anchor_count: usize,
}

fn active_by_default() -> bool {
    true
}

impl ProviderPdf {
    /// Canvas size recorded for this PDF's anchor set, if any.
    #[must_use]
    pub fn canvas(&self) -> Option<CanvasSize> {
        let size = CanvasSize::new(self.canvas_width?, self.canvas_height?);
        (!size.is_empty()).then_some(size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    pub name: String,
    #[serde(default = "active_by_default")]
    pub active: bool,
    #[serde(default)]
    pub pdfs: Vec<ProviderPdf>,
    #[serde(default)]
    pub pdf_count: usize,
    /// Every anchor of every PDF, in PDF order.
    #[serde(default)]
    pub anchors: Vec<Anchor>,
}

impl Provider {
    /// Re-derive counts, ownership links and the flattened anchor view.
    pub fn reindex(&mut self) {
        let mut seen = HashSet::new();
        let mut flattened = Vec::new();
        for pdf in &mut self.pdfs {
            pdf.provider_id.clone_from(&self.id);
            for anchor in &mut pdf.anchors {
                anchor.pdf_id = Some(pdf.id);
                anchor.pdf_filename = None;
            }
            pdf.anchor_count = pdf.anchors.len();
            for anchor in &pdf.anchors {
                if seen.insert(anchor.id) {
                    flattened.push(Anchor { pdf_filename: Some(pdf.filename.clone()), ..anchor.clone() });
                }
            }
        }
        self.pdf_count = self.pdfs.len();
        self.anchors = flattened;
    }
}

/// Provider ids arrive as strings from provider routes and as numbers on PDFs.
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(n) => n.to_string(),
    })
}

// =============================================================================
// REQUEST / RESPONSE SHAPES
// =============================================================================

/// How a PDF is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Mark inactive; the PDF and its anchors are kept.
    Soft,
    /// Remove the PDF and cascade to its anchors.
    Hard,
}

/// Answer to a duplicate-upload probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    #[serde(default)]
    pub existing_pdf_id: Option<i64>,
    #[serde(default)]
    pub existing_provider_id: Option<String>,
    #[serde(default)]
    pub existing_provider_name: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Fields a provider update may change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Fields a PDF update may change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// One autofill call: the anchors of a template burned into `pdf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutofillRequest {
    pub pdf: Vec<u8>,
    pub filename: String,
    pub anchors: Vec<Anchor>,
    pub canvas: CanvasSize,
    pub preview: bool,
}

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;
