//! Stepped zoom for the anchor-placement preview.
//!
//! The preview fits every page to a constant base width before zoom is
//! applied, so its base display size depends only on the page's aspect
//! ratio. Zoom is kept as an integer number of steps away from 1.0 rather
//! than an accumulated float, so returning to 1.0 restores the base size
//! exactly no matter how many steps were taken.

#[cfg(test)]
#[path = "zoom_test.rs"]
mod zoom_test;

use crate::consts::{PREVIEW_BASE_WIDTH, ZOOM_MAX, ZOOM_MIN, ZOOM_STEP};
use crate::transform::{CanvasSize, DisplaySize};

/// Lowest step index: `1.0 + MIN_STEPS * ZOOM_STEP == ZOOM_MIN`.
#[allow(clippy::cast_possible_truncation)]
const MIN_STEPS: i32 = ((ZOOM_MIN - 1.0) / ZOOM_STEP) as i32;

/// Highest step index: `1.0 + MAX_STEPS * ZOOM_STEP == ZOOM_MAX`.
#[allow(clippy::cast_possible_truncation)]
const MAX_STEPS: i32 = ((ZOOM_MAX - 1.0) / ZOOM_STEP) as i32;

/// A zoom factor constrained to `[ZOOM_MIN, ZOOM_MAX]` in `ZOOM_STEP` increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZoomLevel {
    steps: i32,
}

impl ZoomLevel {
    /// The unzoomed level (factor 1.0).
    pub const ONE: Self = Self { steps: 0 };

    /// The level nearest to `factor`, clamped into range. Non-finite input maps to 1.0.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_factor(factor: f64) -> Self {
        if !factor.is_finite() {
            return Self::ONE;
        }
        let clamped = factor.clamp(ZOOM_MIN, ZOOM_MAX);
        let steps = ((clamped - 1.0) / ZOOM_STEP).round() as i32;
        Self { steps: steps.clamp(MIN_STEPS, MAX_STEPS) }
    }

    /// The multiplicative zoom factor.
    #[must_use]
    pub fn factor(self) -> f64 {
        1.0 + f64::from(self.steps) * ZOOM_STEP
    }

    /// Factor as a rounded percentage, for labels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn percent(self) -> u32 {
        // Factor is bounded by ZOOM_MAX, so the product is small and positive.
        (self.factor() * 100.0).round().max(0.0) as u32
    }

    /// One step in, saturating at the maximum.
    #[must_use]
    pub fn zoomed_in(self) -> Self {
        Self { steps: (self.steps + 1).min(MAX_STEPS) }
    }

    /// One step out, saturating at the minimum.
    #[must_use]
    pub fn zoomed_out(self) -> Self {
        Self { steps: (self.steps - 1).max(MIN_STEPS) }
    }

    #[must_use]
    pub fn can_zoom_in(self) -> bool {
        self.steps < MAX_STEPS
    }

    #[must_use]
    pub fn can_zoom_out(self) -> bool {
        self.steps > MIN_STEPS
    }
}

/// Base display size of the preview for a page rendered at `canvas`:
/// `PREVIEW_BASE_WIDTH` wide, height proportioned to the canvas.
///
/// Returns `None` for an empty canvas.
#[must_use]
pub fn preview_base_size(canvas: CanvasSize) -> Option<DisplaySize> {
    if canvas.is_empty() {
        return None;
    }
    let scale = PREVIEW_BASE_WIDTH / f64::from(canvas.width);
    Some(DisplaySize::new(PREVIEW_BASE_WIDTH, f64::from(canvas.height) * scale))
}

/// Display size after applying `zoom` to `base`.
#[must_use]
pub fn zoomed_size(base: DisplaySize, zoom: ZoomLevel) -> DisplaySize {
    base.scaled(zoom.factor())
}
