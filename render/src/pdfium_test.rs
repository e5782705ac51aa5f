use super::*;
use crate::fixtures;

/// Bound backend, or `None` on hosts without a pdfium library.
fn backend() -> Option<PdfiumBackend> {
    PdfiumBackend::bind().ok()
}

#[test]
fn draws_page_text_at_viewport_size() {
    let Some(backend) = backend() else { return };
    let doc = backend.open(&fixtures::pdf_with_pages(2)).unwrap();
    let image = backend
        .rasterize(doc, 2, CanvasSize::new(306, 396), &CancellationToken::new())
        .unwrap()
        .unwrap();
    assert_eq!(image.dimensions(), (306, 396));
    assert!(image.pixels().any(|p| p.0[0] < 128 && p.0[3] > 0), "page text should leave dark pixels");
}

#[test]
fn shares_geometry_with_lopdf() {
    let Some(backend) = backend() else { return };
    let bytes = fixtures::pdf_with_sizes(&[(612, 792), (842, 595)]);
    let doc = backend.open(&bytes).unwrap();
    assert_eq!(backend.page_count(doc).unwrap(), 2);
    assert_eq!(backend.page_size(doc, 2).unwrap(), PageSize { width_pt: 842.0, height_pt: 595.0 });
}

#[test]
fn corrupt_page_is_reported_before_drawing() {
    let Some(backend) = backend() else { return };
    let doc = backend.open(&fixtures::pdf_with_broken_contents()).unwrap();
    let err = backend
        .rasterize(doc, 1, CanvasSize::new(10, 10), &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, RenderError::CorruptStream { page: 1, .. }));
}

#[test]
fn close_forgets_source_bytes() {
    let Some(backend) = backend() else { return };
    let doc = backend.open(&fixtures::pdf_with_pages(1)).unwrap();
    backend.close(doc);
    assert!(matches!(backend.page_count(doc), Err(RenderError::Backend(_))));
    let err = backend
        .rasterize(doc, 1, CanvasSize::new(10, 10), &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, RenderError::Backend(_)));
}
