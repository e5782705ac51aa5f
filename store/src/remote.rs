//! Persistence collaborator: the REST backend that owns providers, PDFs and
//! anchors. The store only ever talks to it through [`Remote`].

use crate::model::{
    Anchor, AutofillRequest, DeleteMode, DuplicateCheck, PdfUpdate, Provider, ProviderPdf, ProviderUpdate,
};
use crate::validate::{AnchorDraft, AnchorPatch};

// =============================================================================
// ERROR
// =============================================================================

/// Failures talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Request(String),

    /// Non-success status other than 404 / 409.
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The backend already holds this content.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A body could not be encoded or decoded.
    #[error("body decode failed: {0}")]
    Decode(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl canvas::error::ErrorCode for RemoteError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_REMOTE_REQUEST",
            Self::Status { .. } => "E_REMOTE_STATUS",
            Self::Conflict(_) => "E_REMOTE_CONFLICT",
            Self::NotFound(_) => "E_REMOTE_NOT_FOUND",
            Self::Decode(_) => "E_REMOTE_DECODE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Backend operations the store consumes.
#[async_trait::async_trait]
pub trait Remote: Send + Sync {
    async fn list_providers(&self) -> Result<Vec<Provider>, RemoteError>;

    async fn create_provider(&self, name: &str) -> Result<Provider, RemoteError>;

    async fn update_provider(&self, provider_id: &str, update: &ProviderUpdate) -> Result<Provider, RemoteError>;

    async fn delete_provider(&self, provider_id: &str) -> Result<(), RemoteError>;

    /// Returns the created PDF with an empty anchor list.
    ///
    /// # Errors
    ///
    /// [`RemoteError::Conflict`] if the same content was uploaded before.
    async fn upload_pdf(&self, provider_id: &str, filename: &str, bytes: Vec<u8>) -> Result<ProviderPdf, RemoteError>;

    async fn check_duplicate(&self, filename: &str, bytes: Vec<u8>) -> Result<DuplicateCheck, RemoteError>;

    async fn update_pdf(&self, pdf_id: i64, update: &PdfUpdate) -> Result<ProviderPdf, RemoteError>;

    async fn delete_pdf(&self, pdf_id: i64, mode: DeleteMode) -> Result<(), RemoteError>;

    async fn download(&self, pdf_id: i64) -> Result<Vec<u8>, RemoteError>;

    async fn create_anchor(&self, pdf_id: i64, draft: &AnchorDraft) -> Result<Anchor, RemoteError>;

    async fn update_anchor(&self, anchor_id: i64, patch: &AnchorPatch) -> Result<Anchor, RemoteError>;

    async fn delete_anchor(&self, anchor_id: i64) -> Result<(), RemoteError>;

    /// Burn the request's anchors into its PDF and return the new document.
    async fn autofill(&self, request: AutofillRequest) -> Result<Vec<u8>, RemoteError>;
}
