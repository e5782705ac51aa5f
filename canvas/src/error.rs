//! Stable error codes shared by every crate in the workspace.

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for surfacing errors to an operator.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

impl ErrorCode for crate::pages::PageSpecError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Empty => "E_PAGE_SPEC_EMPTY",
            Self::InvalidToken(_) => "E_PAGE_SPEC_TOKEN",
            Self::ZeroPage => "E_PAGE_SPEC_ZERO",
            Self::ReversedRange { .. } => "E_PAGE_SPEC_RANGE",
        }
    }
}

impl ErrorCode for crate::transform::TransformError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DisplayNotLaidOut { .. } => "E_DISPLAY_NOT_LAID_OUT",
            Self::EmptyCanvas { .. } => "E_EMPTY_CANVAS",
            Self::OutsideSurface { .. } => "E_OUTSIDE_SURFACE",
        }
    }

    /// A surface that has not laid out yet will, so the click may be retried.
    fn retryable(&self) -> bool {
        matches!(self, Self::DisplayNotLaidOut { .. })
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;
