//! Input validation for anchor drafts and patches.
//!
//! DESIGN
//! ======
//! Everything here runs before a remote call is issued, so a rejected draft
//! never reaches the backend and never touches the mirror. Anchor text is
//! always stored in its braced form (`{{key}}`); callers may pass either the
//! bare key or the braced token.

use canvas::consts::MAX_COORDINATE;
use canvas::pages::{PageSpec, PageSpecError};
use canvas::transform::CanvasSize;
use serde::{Serialize, Serializer};

// =============================================================================
// ERRORS
// =============================================================================

/// Which coordinate failed a range check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::X => "x",
            Self::Y => "y",
        })
    }
}

/// A field rejected before any remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid anchor key `{0}` (letters, digits and underscores only)")]
    Key(String),
    #[error("{axis} = {value} is outside 0..={max}", max = MAX_COORDINATE)]
    Coordinate { axis: Axis, value: u32 },
    #[error("invalid page rule: {0}")]
    PageSpec(#[from] PageSpecError),
    #[error("canvas dimensions must be non-zero, got {width}x{height}")]
    CanvasDimension { width: u32, height: u32 },
    #[error("provider name is required")]
    ProviderName,
}

impl canvas::error::ErrorCode for ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Key(_) => "E_ANCHOR_KEY",
            Self::Coordinate { .. } => "E_ANCHOR_COORDINATE",
            Self::PageSpec(_) => "E_ANCHOR_PAGE_SPEC",
            Self::CanvasDimension { .. } => "E_ANCHOR_CANVAS",
            Self::ProviderName => "E_PROVIDER_NAME",
        }
    }
}

// =============================================================================
// ANCHOR TEXT
// =============================================================================

/// Wrap a key in the placeholder braces: `day` → `{{day}}`.
#[must_use]
pub fn format_anchor_text(key: &str) -> String {
    format!("{{{{{key}}}}}")
}

/// Strip the placeholder braces if present: `{{day}}` → `day`.
#[must_use]
pub fn extract_anchor_key(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("{{")
        .and_then(|rest| rest.strip_suffix("}}"))
        .unwrap_or(trimmed)
}

/// A validated placeholder key, `[A-Za-z0-9_]+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnchorKey(String);

impl AnchorKey {
    /// Accepts `day` or `{{day}}`.
    ///
    /// # Errors
    ///
    /// [`ValidationError::Key`] for an empty key or any other character.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let key = extract_anchor_key(raw);
        if key.is_empty() || !key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(ValidationError::Key(raw.to_owned()));
        }
        Ok(Self(key.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The braced text stored on the anchor.
    #[must_use]
    pub fn text(&self) -> String {
        format_anchor_text(&self.0)
    }
}

impl std::fmt::Display for AnchorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text())
    }
}

impl Serialize for AnchorKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text())
    }
}

/// Reject coordinates past [`MAX_COORDINATE`].
///
/// # Errors
///
/// [`ValidationError::Coordinate`] naming the axis.
pub fn check_coordinate(axis: Axis, value: u32) -> Result<u32, ValidationError> {
    if value > MAX_COORDINATE {
        return Err(ValidationError::Coordinate { axis, value });
    }
    Ok(value)
}

fn check_canvas(canvas: Option<CanvasSize>) -> Result<(), ValidationError> {
    match canvas {
        Some(c) if c.is_empty() => Err(ValidationError::CanvasDimension { width: c.width, height: c.height }),
        _ => Ok(()),
    }
}

// =============================================================================
// DRAFT / PATCH
// =============================================================================

/// A new anchor, validated field by field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorDraft {
    pub key: AnchorKey,
    pub x: u32,
    pub y: u32,
    pub page: PageSpec,
    /// Canvas size the position was captured against.
    pub canvas: Option<CanvasSize>,
}

impl AnchorDraft {
    /// Parse raw form input into a draft.
    ///
    /// # Errors
    ///
    /// The first field that fails validation.
    pub fn parse(text: &str, x: u32, y: u32, page: &str, canvas: Option<CanvasSize>) -> Result<Self, ValidationError> {
        let draft = Self { key: AnchorKey::parse(text)?, x, y, page: page.parse()?, canvas };
        draft.validate()?;
        Ok(draft)
    }

    /// # Errors
    ///
    /// [`ValidationError::Coordinate`] or [`ValidationError::CanvasDimension`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_coordinate(Axis::X, self.x)?;
        check_coordinate(Axis::Y, self.y)?;
        check_canvas(self.canvas)
    }
}

/// A partial anchor update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorPatch {
    pub key: Option<AnchorKey>,
    pub x: Option<u32>,
    pub y: Option<u32>,
    pub page: Option<PageSpec>,
    pub canvas: Option<CanvasSize>,
}

impl AnchorPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// # Errors
    ///
    /// [`ValidationError::Coordinate`] or [`ValidationError::CanvasDimension`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(x) = self.x {
            check_coordinate(Axis::X, x)?;
        }
        if let Some(y) = self.y {
            check_coordinate(Axis::Y, y)?;
        }
        check_canvas(self.canvas)
    }
}

/// Trimmed, non-empty provider name.
///
/// # Errors
///
/// [`ValidationError::ProviderName`] for a blank name.
pub fn provider_name(raw: &str) -> Result<&str, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::ProviderName);
    }
    Ok(name)
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod validate_test;
