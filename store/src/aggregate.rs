//! AnchorAggregateStore — in-memory mirror of the Provider → PDF → Anchor tree.
//!
//! DESIGN
//! ======
//! Every mutation calls the backend first and touches the mirror only after
//! it succeeds, so a failure leaves local state exactly as it was. After each
//! mirror change the affected provider is reindexed: `anchorCount` and
//! `pdfCount` are recomputed from the lists, and the provider's flattened
//! anchor view is rebuilt as the union of its PDFs' anchors.
//!
//! Anchor ids are unique across the whole store, so anchor operations locate
//! their PDF by id alone.
//!
//! ERROR HANDLING
//! ==============
//! Validation runs before any remote call. Remote failures are logged at
//! `warn` and returned unchanged inside [`StoreError::Remote`].

use std::sync::Arc;

use canvas::consts::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};
use canvas::transform::CanvasSize;
use tracing::{info, warn};

use crate::model::{
    Anchor, AutofillRequest, DeleteMode, DuplicateCheck, PdfUpdate, Provider, ProviderPdf, ProviderUpdate,
};
use crate::remote::{Remote, RemoteError};
use crate::validate::{AnchorDraft, AnchorPatch, ValidationError, provider_name};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("provider not found: {0}")]
    UnknownProvider(String),
    #[error("pdf not found: {0}")]
    UnknownPdf(i64),
    #[error("anchor not found: {0}")]
    UnknownAnchor(i64),
    #[error("pdf {0} is inactive")]
    InactivePdf(i64),
}

impl canvas::error::ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.error_code(),
            Self::Remote(e) => e.error_code(),
            Self::UnknownProvider(_) => "E_PROVIDER_NOT_FOUND",
            Self::UnknownPdf(_) => "E_PDF_NOT_FOUND",
            Self::UnknownAnchor(_) => "E_ANCHOR_NOT_FOUND",
            Self::InactivePdf(_) => "E_PDF_INACTIVE",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Remote(e) => e.retryable(),
            _ => false,
        }
    }
}

/// Position of a PDF in the mirror: (provider index, pdf index).
type PdfSlot = (usize, usize);

pub struct AnchorAggregateStore {
    remote: Arc<dyn Remote>,
    providers: Vec<Provider>,
}

fn logged<T>(op: &'static str, result: Result<T, RemoteError>) -> Result<T, StoreError> {
    result.map_err(|e| {
        warn!(op, error = %e, "remote call failed");
        StoreError::Remote(e)
    })
}

impl AnchorAggregateStore {
    /// An empty mirror; call [`refresh`](Self::refresh) to load it.
    #[must_use]
    pub fn new(remote: Arc<dyn Remote>) -> Self {
        Self { remote, providers: Vec::new() }
    }

    /// Replace the mirror with the backend's provider list.
    ///
    /// # Errors
    ///
    /// [`StoreError::Remote`]; the previous mirror is kept.
    pub async fn refresh(&mut self) -> Result<(), StoreError> {
        let mut providers = logged("list_providers", self.remote.list_providers().await)?;
        for provider in &mut providers {
            provider.reindex();
        }
        info!(providers = providers.len(), "store refreshed");
        self.providers = providers;
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────

    #[must_use]
    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    #[must_use]
    pub fn active_providers(&self) -> Vec<&Provider> {
        self.providers.iter().filter(|p| p.active).collect()
    }

    #[must_use]
    pub fn provider(&self, provider_id: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.id == provider_id)
    }

    #[must_use]
    pub fn pdf(&self, pdf_id: i64) -> Option<&ProviderPdf> {
        self.locate_pdf(pdf_id).map(|(p, d)| &self.providers[p].pdfs[d])
    }

    #[must_use]
    pub fn anchor(&self, anchor_id: i64) -> Option<&Anchor> {
        self.providers
            .iter()
            .flat_map(|p| &p.pdfs)
            .flat_map(|pdf| &pdf.anchors)
            .find(|a| a.id == anchor_id)
    }

    /// PDFs of a provider that may be edited or autofilled.
    #[must_use]
    pub fn editable_pdfs(&self, provider_id: &str) -> Vec<&ProviderPdf> {
        self.provider(provider_id)
            .map(|p| p.pdfs.iter().filter(|pdf| pdf.is_active).collect())
            .unwrap_or_default()
    }

    fn provider_index(&self, provider_id: &str) -> Result<usize, StoreError> {
        self.providers
            .iter()
            .position(|p| p.id == provider_id)
            .ok_or_else(|| StoreError::UnknownProvider(provider_id.to_owned()))
    }

    fn locate_pdf(&self, pdf_id: i64) -> Option<PdfSlot> {
        self.providers.iter().enumerate().find_map(|(p, provider)| {
            provider
                .pdfs
                .iter()
                .position(|pdf| pdf.id == pdf_id)
                .map(|d| (p, d))
        })
    }

    fn pdf_slot(&self, pdf_id: i64) -> Result<PdfSlot, StoreError> {
        self.locate_pdf(pdf_id).ok_or(StoreError::UnknownPdf(pdf_id))
    }

    fn active_pdf_slot(&self, pdf_id: i64) -> Result<PdfSlot, StoreError> {
        let (p, d) = self.pdf_slot(pdf_id)?;
        if !self.providers[p].pdfs[d].is_active {
            return Err(StoreError::InactivePdf(pdf_id));
        }
        Ok((p, d))
    }

    fn anchor_slot(&self, anchor_id: i64) -> Result<PdfSlot, StoreError> {
        self.providers
            .iter()
            .enumerate()
            .find_map(|(p, provider)| {
                provider
                    .pdfs
                    .iter()
                    .position(|pdf| pdf.anchors.iter().any(|a| a.id == anchor_id))
                    .map(|d| (p, d))
            })
            .ok_or(StoreError::UnknownAnchor(anchor_id))
    }

    /// Locate an anchor whose owning PDF still accepts edits.
    fn active_anchor_slot(&self, anchor_id: i64) -> Result<PdfSlot, StoreError> {
        let (p, d) = self.anchor_slot(anchor_id)?;
        let pdf = &self.providers[p].pdfs[d];
        if !pdf.is_active {
            return Err(StoreError::InactivePdf(pdf.id));
        }
        Ok((p, d))
    }

    // ── Providers ───────────────────────────────────────────────

    /// # Errors
    ///
    /// [`ValidationError::ProviderName`] for a blank name, or [`StoreError::Remote`].
    pub async fn create_provider(&mut self, name: &str) -> Result<&Provider, StoreError> {
        let name = provider_name(name)?;
        let mut provider = logged("create_provider", self.remote.create_provider(name).await)?;
        provider.reindex();
        info!(provider_id = %provider.id, "provider created");
        self.providers.push(provider);
        Ok(&self.providers[self.providers.len() - 1])
    }

    /// # Errors
    ///
    /// Blank name, unknown provider, or [`StoreError::Remote`].
    pub async fn rename_provider(&mut self, provider_id: &str, name: &str) -> Result<(), StoreError> {
        let name = provider_name(name)?;
        let index = self.provider_index(provider_id)?;
        let update = ProviderUpdate { name: Some(name.to_owned()), active: None };
        logged("update_provider", self.remote.update_provider(provider_id, &update).await)?;
        self.providers[index].name = name.to_owned();
        info!(%provider_id, "provider renamed");
        Ok(())
    }

    /// Flip the active flag and return the new value.
    ///
    /// # Errors
    ///
    /// Unknown provider or [`StoreError::Remote`].
    pub async fn toggle_provider_active(&mut self, provider_id: &str) -> Result<bool, StoreError> {
        let index = self.provider_index(provider_id)?;
        let active = !self.providers[index].active;
        let update = ProviderUpdate { name: None, active: Some(active) };
        logged("update_provider", self.remote.update_provider(provider_id, &update).await)?;
        self.providers[index].active = active;
        info!(%provider_id, active, "provider toggled");
        Ok(active)
    }

    /// # Errors
    ///
    /// Unknown provider or [`StoreError::Remote`].
    pub async fn delete_provider(&mut self, provider_id: &str) -> Result<(), StoreError> {
        let index = self.provider_index(provider_id)?;
        logged("delete_provider", self.remote.delete_provider(provider_id).await)?;
        self.providers.remove(index);
        info!(%provider_id, "provider deleted");
        Ok(())
    }

    // ── PDFs ────────────────────────────────────────────────────

    /// Upload a template under `provider_id`.
    ///
    /// # Errors
    ///
    /// Unknown provider, or [`StoreError::Remote`] ([`RemoteError::Conflict`]
    /// for content that was uploaded before).
    pub async fn upload_pdf(
        &mut self,
        provider_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<&ProviderPdf, StoreError> {
        let index = self.provider_index(provider_id)?;
        let size = bytes.len();
        let pdf = logged("upload_pdf", self.remote.upload_pdf(provider_id, filename, bytes).await)?;
        info!(%provider_id, pdf_id = pdf.id, size, "pdf uploaded");
        let provider = &mut self.providers[index];
        provider.pdfs.push(pdf);
        provider.reindex();
        Ok(&provider.pdfs[provider.pdfs.len() - 1])
    }

    /// # Errors
    ///
    /// [`StoreError::Remote`].
    pub async fn check_duplicate(&self, filename: &str, bytes: Vec<u8>) -> Result<DuplicateCheck, StoreError> {
        logged("check_duplicate", self.remote.check_duplicate(filename, bytes).await)
    }

    /// Flip the PDF's active flag and return the new value.
    ///
    /// # Errors
    ///
    /// Unknown PDF or [`StoreError::Remote`].
    pub async fn toggle_pdf_active(&mut self, pdf_id: i64) -> Result<bool, StoreError> {
        let (p, d) = self.pdf_slot(pdf_id)?;
        let active = !self.providers[p].pdfs[d].is_active;
        let update = PdfUpdate { filename: None, is_active: Some(active) };
        logged("update_pdf", self.remote.update_pdf(pdf_id, &update).await)?;
        self.providers[p].pdfs[d].is_active = active;
        info!(pdf_id, active, "pdf toggled");
        Ok(active)
    }

    /// Soft delete keeps the PDF and its anchors but marks it inactive; hard
    /// delete removes it and every anchor it owns.
    ///
    /// # Errors
    ///
    /// Unknown PDF or [`StoreError::Remote`].
    pub async fn delete_pdf(&mut self, pdf_id: i64, mode: DeleteMode) -> Result<(), StoreError> {
        let (p, d) = self.pdf_slot(pdf_id)?;
        logged("delete_pdf", self.remote.delete_pdf(pdf_id, mode).await)?;
        let provider = &mut self.providers[p];
        match mode {
            DeleteMode::Soft => provider.pdfs[d].is_active = false,
            DeleteMode::Hard => {
                provider.pdfs.remove(d);
            }
        }
        provider.reindex();
        info!(pdf_id, ?mode, "pdf deleted");
        Ok(())
    }

    /// Fetch the PDF's bytes. Each view downloads its own copy.
    ///
    /// # Errors
    ///
    /// [`StoreError::Remote`].
    pub async fn download(&self, pdf_id: i64) -> Result<Vec<u8>, StoreError> {
        let bytes = logged("download", self.remote.download(pdf_id).await)?;
        info!(pdf_id, size = bytes.len(), "pdf downloaded");
        Ok(bytes)
    }

    // ── Anchors ─────────────────────────────────────────────────

    /// Create an anchor on an active PDF.
    ///
    /// The first anchor placed on a PDF without recorded canvas dimensions
    /// records its own dimensions on the PDF.
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`], unknown or inactive PDF, or [`StoreError::Remote`].
    pub async fn create_anchor(&mut self, pdf_id: i64, draft: &AnchorDraft) -> Result<Anchor, StoreError> {
        draft.validate()?;
        let (p, d) = self.active_pdf_slot(pdf_id)?;
        let mut anchor = logged("create_anchor", self.remote.create_anchor(pdf_id, draft).await)?;
        anchor.pdf_id = Some(pdf_id);

        let provider = &mut self.providers[p];
        let pdf = &mut provider.pdfs[d];
        if pdf.canvas().is_none() {
            if let Some(canvas) = anchor.canvas().filter(|c| !c.is_empty()) {
                pdf.canvas_width = Some(canvas.width);
                pdf.canvas_height = Some(canvas.height);
            }
        }
        match pdf.anchors.iter_mut().find(|a| a.id == anchor.id) {
            Some(existing) => {
                warn!(pdf_id, anchor_id = anchor.id, "create returned a known anchor id; replacing");
                *existing = anchor.clone();
            }
            None => pdf.anchors.push(anchor.clone()),
        }
        provider.reindex();
        info!(pdf_id, anchor_id = anchor.id, text = %anchor.text, "anchor created");
        Ok(anchor)
    }

    /// # Errors
    ///
    /// [`StoreError::Validation`], unknown anchor, [`StoreError::InactivePdf`]
    /// for an anchor on an inactive PDF, or [`StoreError::Remote`].
    pub async fn update_anchor(&mut self, anchor_id: i64, patch: &AnchorPatch) -> Result<Anchor, StoreError> {
        patch.validate()?;
        let (p, d) = self.active_anchor_slot(anchor_id)?;
        let mut updated = logged("update_anchor", self.remote.update_anchor(anchor_id, patch).await)?;

        let provider = &mut self.providers[p];
        let pdf = &mut provider.pdfs[d];
        updated.pdf_id = Some(pdf.id);
        for anchor in pdf.anchors.iter_mut().filter(|a| a.id == anchor_id) {
            *anchor = updated.clone();
        }
        provider.reindex();
        info!(anchor_id, "anchor updated");
        Ok(updated)
    }

    /// # Errors
    ///
    /// Unknown anchor, [`StoreError::InactivePdf`], or [`StoreError::Remote`].
    pub async fn delete_anchor(&mut self, anchor_id: i64) -> Result<(), StoreError> {
        let (p, d) = self.active_anchor_slot(anchor_id)?;
        logged("delete_anchor", self.remote.delete_anchor(anchor_id).await)?;
        let provider = &mut self.providers[p];
        provider.pdfs[d].anchors.retain(|a| a.id != anchor_id);
        provider.reindex();
        info!(anchor_id, "anchor deleted");
        Ok(())
    }

    // ── Autofill ────────────────────────────────────────────────

    /// Canvas size an autofill of `pdf` is sent with: the PDF's recorded size,
    /// else its first anchor's, else US-Letter at the render scale.
    #[must_use]
    pub fn autofill_canvas(pdf: &ProviderPdf) -> CanvasSize {
        pdf.canvas()
            .or_else(|| pdf.anchors.iter().find_map(|a| a.canvas().filter(|c| !c.is_empty())))
            .unwrap_or(CanvasSize::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT))
    }

    /// Burn the template's anchors into `bytes` through the backend.
    ///
    /// # Errors
    ///
    /// Unknown or inactive PDF, or [`StoreError::Remote`].
    pub async fn autofill(
        &self,
        pdf_id: i64,
        filename: &str,
        bytes: Vec<u8>,
        preview: bool,
    ) -> Result<Vec<u8>, StoreError> {
        let (p, d) = self.active_pdf_slot(pdf_id)?;
        let pdf = &self.providers[p].pdfs[d];
        let request = AutofillRequest {
            pdf: bytes,
            filename: filename.to_owned(),
            anchors: pdf.anchors.clone(),
            canvas: Self::autofill_canvas(pdf),
            preview,
        };
        let anchors = request.anchors.len();
        let out = logged("autofill", self.remote.autofill(request).await)?;
        info!(pdf_id, anchors, preview, size = out.len(), "autofill complete");
        Ok(out)
    }
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod aggregate_test;
