//! Coordinate and page-visibility model for PDF anchor placement.
//!
//! Anchors are captured by clicking on a raster surface that was rendered at a
//! fixed scale but laid out at some other on-screen size. This crate owns the
//! pure math that keeps every view in agreement about where an anchor is:
//! converting clicks into resolution-independent canvas pixels, projecting
//! stored anchors back onto whatever display size a view currently has, the
//! independent zoom used by the placement preview, and the rule that decides
//! which pages an anchor appears on. Nothing here performs I/O.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`pages`] | `PageSpec` grammar and page visibility |
//! | [`transform`] | Canvas space ⇄ display space conversions |
//! | [`zoom`] | Stepped zoom factor and base/effective display sizes for the preview |
//! | [`overlay`] | Projects anchors into indicator positions for the page being shown |
//! | [`error`] | `ErrorCode` trait: stable codes for every error surfaced to an operator |
//! | [`consts`] | Shared numeric constants (render scale, zoom limits, marker size, etc.) |

pub mod consts;
pub mod error;
pub mod overlay;
pub mod pages;
pub mod transform;
pub mod zoom;
