//! PDF rendering pipeline for anchor placement.
//!
//! Decodes a document once per view, renders pages into a raster surface at a
//! fixed render scale, and cancels superseded renders cooperatively. On top of
//! the pipeline sit the two views that capture anchors: the editor viewer and
//! the zoomable placement preview. The autofill burn-in lives here too since
//! it shares the page geometry code.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`backend`] | `PdfBackend` trait, lopdf backend, shared backend instance |
//! | `pdfium` | `PdfiumBackend`: page pixels via pdfium (feature `pdfium`) |
//! | [`cancel`] | Cancellation tokens and the per-surface render slot |
//! | [`pipeline`] | `PdfRenderingPipeline`: load, render, cancel, close |
//! | [`viewer`] | Editor view: navigation, clicks, indicators, UI callbacks |
//! | [`preview`] | `ZoomPreviewController`: stepped zoom and the placement marker |
//! | [`stamp`] | Burns anchor text into a PDF |
//! | [`error`] | `RenderError` |

pub mod backend;
pub mod cancel;
pub mod error;
#[cfg(feature = "pdfium")]
pub mod pdfium;
pub mod pipeline;
pub mod preview;
pub mod stamp;
pub mod viewer;

#[cfg(test)]
#[path = "fixtures_test.rs"]
pub(crate) mod fixtures;

pub use backend::{DocumentHandle, LopdfBackend, PageSize, PdfBackend, shared_backend};
pub use cancel::CancellationToken;
pub use error::RenderError;
#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumBackend;
pub use pipeline::{PdfRenderingPipeline, RenderOutcome};
pub use preview::ZoomPreviewController;
pub use stamp::{Ink, burn_in};
pub use viewer::{PdfViewer, ViewerEvents};
