//! Render errors.
//!
//! Cancellation is deliberately absent: a superseded render resolves to
//! [`crate::pipeline::RenderOutcome::Cancelled`] and never reaches callers as
//! a failure.

use canvas::error::ErrorCode;

/// Errors produced while decoding or rasterizing a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The bytes are not a readable PDF. Terminal for the document.
    #[error("PDF decode failed: {0}")]
    Decode(String),

    /// A page outside `1..=page_count` was requested.
    #[error("page {page} out of range (document has {page_count} pages)")]
    InvalidPage { page: u32, page_count: u32 },

    /// A page content stream could not be decoded. Terminal for the document.
    #[error("corrupt content stream on page {page}: {detail}")]
    CorruptStream { page: u32, detail: String },

    /// The backend failed for a reason unrelated to the document bytes.
    #[error("render backend error: {0}")]
    Backend(String),
}

impl From<lopdf::Error> for RenderError {
    fn from(err: lopdf::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl ErrorCode for RenderError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "E_PDF_DECODE",
            Self::InvalidPage { .. } => "E_INVALID_PAGE",
            Self::CorruptStream { .. } => "E_CORRUPT_STREAM",
            Self::Backend(_) => "E_RENDER_BACKEND",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}
