use super::*;
use crate::mock::MockRemote;
use canvas::error::ErrorCode;

const LETTER: CanvasSize = CanvasSize { width: 1224, height: 1584 };

async fn store_with_pdf() -> (Arc<MockRemote>, AnchorAggregateStore, String, i64) {
    let remote = Arc::new(MockRemote::default());
    let mut store = AnchorAggregateStore::new(remote.clone());
    let provider_id = store.create_provider("Acme Energy").await.unwrap().id.clone();
    let pdf_id = store
        .upload_pdf(&provider_id, "contract.pdf", b"%PDF-template".to_vec())
        .await
        .unwrap()
        .id;
    (remote, store, provider_id, pdf_id)
}

fn draft(key: &str, page: &str) -> AnchorDraft {
    AnchorDraft::parse(key, 100, 200, page, Some(LETTER)).unwrap()
}

/// Invariants that must hold after every operation.
fn assert_consistent(store: &AnchorAggregateStore) {
    for provider in store.providers() {
        assert_eq!(provider.pdf_count, provider.pdfs.len());
        let mut union = Vec::new();
        for pdf in &provider.pdfs {
            assert_eq!(pdf.anchor_count, pdf.anchors.len(), "pdf {}", pdf.id);
            union.extend(pdf.anchors.iter().map(|a| a.id));
        }
        let flattened: Vec<i64> = provider.anchors.iter().map(|a| a.id).collect();
        assert_eq!(flattened, union, "provider {}", provider.id);
    }
}

// =============================================================================
// Providers
// =============================================================================

#[tokio::test]
async fn refresh_loads_and_reindexes() {
    let (remote, _, provider_id, pdf_id) = store_with_pdf().await;
    {
        let mut state = remote.state.lock().unwrap();
        let pdf = &mut state.providers[0].pdfs[0];
        pdf.anchor_count = 42;
        assert_eq!(pdf.id, pdf_id);
    }
    let mut fresh = AnchorAggregateStore::new(remote.clone());
    fresh.refresh().await.unwrap();
    assert_eq!(fresh.provider(&provider_id).unwrap().pdfs[0].anchor_count, 0);
    assert_consistent(&fresh);
}

#[tokio::test]
async fn blank_provider_name_never_reaches_remote() {
    let remote = Arc::new(MockRemote::default());
    let mut store = AnchorAggregateStore::new(remote.clone());
    let err = store.create_provider("   ").await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(ValidationError::ProviderName)));
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn toggle_and_rename_provider() {
    let (_, mut store, provider_id, _) = store_with_pdf().await;
    assert!(!store.toggle_provider_active(&provider_id).await.unwrap());
    assert!(store.active_providers().is_empty());
    store.rename_provider(&provider_id, " Beta ").await.unwrap();
    assert_eq!(store.provider(&provider_id).unwrap().name, "Beta");
}

#[tokio::test]
async fn delete_provider_removes_from_mirror() {
    let (_, mut store, provider_id, pdf_id) = store_with_pdf().await;
    store.delete_provider(&provider_id).await.unwrap();
    assert!(store.provider(&provider_id).is_none());
    assert!(store.pdf(pdf_id).is_none());
}

#[tokio::test]
async fn unknown_provider_is_rejected_locally() {
    let (remote, mut store, _, _) = store_with_pdf().await;
    let before = remote.calls().len();
    let err = store.upload_pdf("nope", "a.pdf", b"x".to_vec()).await.unwrap_err();
    assert!(matches!(err, StoreError::UnknownProvider(_)));
    assert_eq!(err.error_code(), "E_PROVIDER_NOT_FOUND");
    assert_eq!(remote.calls().len(), before);
}

// =============================================================================
// PDFs
// =============================================================================

#[tokio::test]
async fn upload_returns_empty_pdf_and_counts_it() {
    let (_, store, provider_id, pdf_id) = store_with_pdf().await;
    let pdf = store.pdf(pdf_id).unwrap();
    assert!(pdf.anchors.is_empty());
    assert_eq!(pdf.anchor_count, 0);
    assert_eq!(pdf.provider_id, provider_id);
    assert_eq!(store.provider(&provider_id).unwrap().pdf_count, 1);
}

#[tokio::test]
async fn duplicate_upload_surfaces_conflict() {
    let (_, mut store, provider_id, _) = store_with_pdf().await;
    let err = store
        .upload_pdf(&provider_id, "again.pdf", b"%PDF-template".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Remote(RemoteError::Conflict(_))));
    assert_eq!(store.provider(&provider_id).unwrap().pdfs.len(), 1);

    let probe = store.check_duplicate("again.pdf", b"%PDF-template".to_vec()).await.unwrap();
    assert!(probe.is_duplicate);
}

#[tokio::test]
async fn inactive_pdf_is_not_editable() {
    let (remote, mut store, provider_id, pdf_id) = store_with_pdf().await;
    let kept = store.create_anchor(pdf_id, &draft("day", "1")).await.unwrap();
    assert!(!store.toggle_pdf_active(pdf_id).await.unwrap());
    assert!(store.editable_pdfs(&provider_id).is_empty());
    let calls_before = remote.calls().len();

    let err = store.create_anchor(pdf_id, &draft("month", "1")).await.unwrap_err();
    assert!(matches!(err, StoreError::InactivePdf(id) if id == pdf_id));

    let patch = AnchorPatch { x: Some(5), ..AnchorPatch::default() };
    let err = store.update_anchor(kept.id, &patch).await.unwrap_err();
    assert!(matches!(err, StoreError::InactivePdf(id) if id == pdf_id));

    let err = store.delete_anchor(kept.id).await.unwrap_err();
    assert!(matches!(err, StoreError::InactivePdf(id) if id == pdf_id));

    let err = store.autofill(pdf_id, "new.pdf", b"%PDF".to_vec(), true).await.unwrap_err();
    assert!(matches!(err, StoreError::InactivePdf(_)));

    assert_eq!(remote.calls().len(), calls_before);
    assert_eq!(store.anchor(kept.id).map(|a| a.x), Some(kept.x));
    let pdf = store.pdf(pdf_id).unwrap();
    assert_eq!(pdf.anchors.len(), 1);
    assert_eq!(pdf.anchors[0].x, kept.x);
    assert_consistent(&store);
}

#[tokio::test]
async fn reactivated_pdf_is_editable_again() {
    let (_, mut store, _, pdf_id) = store_with_pdf().await;
    let anchor = store.create_anchor(pdf_id, &draft("day", "1")).await.unwrap();
    assert!(!store.toggle_pdf_active(pdf_id).await.unwrap());
    assert!(store.toggle_pdf_active(pdf_id).await.unwrap());

    let patch = AnchorPatch { x: Some(5), ..AnchorPatch::default() };
    assert_eq!(store.update_anchor(anchor.id, &patch).await.unwrap().x, 5);
    store.delete_anchor(anchor.id).await.unwrap();
    assert_eq!(store.pdf(pdf_id).unwrap().anchor_count, 0);
    assert_consistent(&store);
}

#[tokio::test]
async fn repeated_create_id_replaces_instead_of_duplicating() {
    let (remote, mut store, _, pdf_id) = store_with_pdf().await;
    let first = store.create_anchor(pdf_id, &draft("day", "1")).await.unwrap();
    remote.state.lock().unwrap().next_id -= 1;
    let second = store.create_anchor(pdf_id, &draft("month", "2")).await.unwrap();
    assert_eq!(second.id, first.id);

    let pdf = store.pdf(pdf_id).unwrap();
    assert_eq!(pdf.anchors.len(), 1);
    assert_eq!(pdf.anchor_count, 1);
    assert_eq!(pdf.anchors[0].text, "{{month}}");
    assert_consistent(&store);
}

#[tokio::test]
async fn soft_delete_keeps_anchors() {
    let (_, mut store, _, pdf_id) = store_with_pdf().await;
    store.create_anchor(pdf_id, &draft("day", "1")).await.unwrap();
    store.delete_pdf(pdf_id, DeleteMode::Soft).await.unwrap();
    let pdf = store.pdf(pdf_id).unwrap();
    assert!(!pdf.is_active);
    assert_eq!(pdf.anchor_count, 1);
    assert_consistent(&store);
}

#[tokio::test]
async fn hard_delete_cascades_to_anchors() {
    let (_, mut store, provider_id, pdf_id) = store_with_pdf().await;
    let anchor = store.create_anchor(pdf_id, &draft("day", "1")).await.unwrap();
    store.delete_pdf(pdf_id, DeleteMode::Hard).await.unwrap();
    assert!(store.pdf(pdf_id).is_none());
    assert!(store.anchor(anchor.id).is_none());
    let provider = store.provider(&provider_id).unwrap();
    assert_eq!(provider.pdf_count, 0);
    assert!(provider.anchors.is_empty());
}

#[tokio::test]
async fn download_returns_uploaded_bytes() {
    let (_, store, _, pdf_id) = store_with_pdf().await;
    assert_eq!(store.download(pdf_id).await.unwrap(), b"%PDF-template");
}

// =============================================================================
// Anchors
// =============================================================================

#[tokio::test]
async fn create_appends_to_pdf_and_flattened_view() {
    let (_, mut store, provider_id, pdf_id) = store_with_pdf().await;
    let anchor = store.create_anchor(pdf_id, &draft("{{day}}", "1,3")).await.unwrap();
    assert_eq!(anchor.text, "{{day}}");
    assert_eq!(anchor.pdf_id, Some(pdf_id));

    let provider = store.provider(&provider_id).unwrap();
    assert_eq!(provider.pdfs[0].anchor_count, 1);
    assert_eq!(provider.anchors.len(), 1);
    assert_eq!(provider.anchors[0].pdf_filename.as_deref(), Some("contract.pdf"));
    assert_consistent(&store);
}

#[tokio::test]
async fn first_anchor_records_pdf_canvas() {
    let (_, mut store, _, pdf_id) = store_with_pdf().await;
    assert_eq!(store.pdf(pdf_id).unwrap().canvas(), None);
    store.create_anchor(pdf_id, &draft("day", "1")).await.unwrap();
    assert_eq!(store.pdf(pdf_id).unwrap().canvas(), Some(LETTER));

    let other = AnchorDraft::parse("month", 1, 1, "1", Some(CanvasSize::new(612, 792))).unwrap();
    store.create_anchor(pdf_id, &other).await.unwrap();
    assert_eq!(store.pdf(pdf_id).unwrap().canvas(), Some(LETTER));
}

#[tokio::test]
async fn update_replaces_everywhere() {
    let (_, mut store, provider_id, pdf_id) = store_with_pdf().await;
    let anchor = store.create_anchor(pdf_id, &draft("day", "1")).await.unwrap();
    let patch = AnchorPatch { x: Some(300), page: Some("last".parse().unwrap()), ..AnchorPatch::default() };
    let updated = store.update_anchor(anchor.id, &patch).await.unwrap();

    assert_eq!(updated.x, 300);
    assert_eq!(store.anchor(anchor.id).unwrap().page, "last");
    let flattened = &store.provider(&provider_id).unwrap().anchors[0];
    assert_eq!((flattened.x, flattened.page.as_str()), (300, "last"));
    assert_consistent(&store);
}

#[tokio::test]
async fn invalid_patch_never_reaches_remote() {
    let (remote, mut store, _, pdf_id) = store_with_pdf().await;
    let anchor = store.create_anchor(pdf_id, &draft("day", "1")).await.unwrap();
    let before = remote.calls().len();
    let patch = AnchorPatch { x: Some(10_001), ..AnchorPatch::default() };
    assert!(matches!(store.update_anchor(anchor.id, &patch).await, Err(StoreError::Validation(_))));
    assert_eq!(remote.calls().len(), before);
}

#[tokio::test]
async fn unknown_anchor_is_rejected() {
    let (_, mut store, _, _) = store_with_pdf().await;
    assert!(matches!(store.delete_anchor(999).await, Err(StoreError::UnknownAnchor(999))));
}

#[tokio::test]
async fn anchor_count_tracks_creates_minus_deletes() {
    let (remote, mut store, _, pdf_id) = store_with_pdf().await;
    let mut live = Vec::new();
    let mut created = 0;
    let mut deleted = 0;
    // Interleave: create three, delete the middle, create two, delete the first.
    for step in ["c", "c", "c", "d1", "c", "c", "d0"] {
        match step {
            "c" => {
                let key = format!("k{created}");
                live.push(store.create_anchor(pdf_id, &draft(&key, "global")).await.unwrap().id);
                created += 1;
            }
            d => {
                let index: usize = d[1..].parse().unwrap();
                store.delete_anchor(live.remove(index)).await.unwrap();
                deleted += 1;
            }
        }
        let pdf = store.pdf(pdf_id).unwrap();
        assert_eq!(pdf.anchor_count, created - deleted);
        assert_eq!(pdf.anchor_count, pdf.anchors.len());
        assert_consistent(&store);
    }
    assert_eq!(store.pdf(pdf_id).unwrap().anchors, remote.anchors_of(pdf_id));
}

// =============================================================================
// Remote failures
// =============================================================================

#[tokio::test]
async fn failed_remote_call_leaves_mirror_unchanged() {
    let (remote, mut store, provider_id, pdf_id) = store_with_pdf().await;
    let anchor = store.create_anchor(pdf_id, &draft("day", "1")).await.unwrap();
    let before = store.providers().to_vec();

    remote.fail_next(RemoteError::Status { status: 500, message: "boom".into() });
    let err = store.create_anchor(pdf_id, &draft("month", "2")).await.unwrap_err();
    assert!(err.retryable());

    remote.fail_next(RemoteError::Request("reset".into()));
    assert!(store.delete_anchor(anchor.id).await.is_err());

    remote.fail_next(RemoteError::Request("reset".into()));
    assert!(store.toggle_provider_active(&provider_id).await.is_err());

    remote.fail_next(RemoteError::Request("reset".into()));
    assert!(store.delete_pdf(pdf_id, DeleteMode::Hard).await.is_err());

    assert_eq!(store.providers(), before.as_slice());
}

#[tokio::test]
async fn failed_refresh_keeps_previous_mirror() {
    let (remote, mut store, provider_id, _) = store_with_pdf().await;
    remote.fail_next(RemoteError::Request("offline".into()));
    assert!(store.refresh().await.is_err());
    assert!(store.provider(&provider_id).is_some());
}

// =============================================================================
// Autofill
// =============================================================================

#[tokio::test]
async fn autofill_sends_template_anchors_and_canvas() {
    let (remote, mut store, _, pdf_id) = store_with_pdf().await;
    store.create_anchor(pdf_id, &draft("day", "1,3")).await.unwrap();
    let out = store.autofill(pdf_id, "new.pdf", b"%PDF-new".to_vec(), true).await.unwrap();
    assert_eq!(out, b"%PDF-filled");

    let sent = &remote.autofills()[0];
    assert_eq!(sent.canvas, LETTER);
    assert!(sent.preview);
    assert_eq!(sent.anchors.len(), 1);
    assert_eq!(sent.anchors[0].page, "1,3");
}

#[test]
fn autofill_canvas_falls_back_in_order() {
    let mut pdf: ProviderPdf = serde_json::from_value(serde_json::json!({ "id": 1, "filename": "a.pdf" })).unwrap();
    assert_eq!(AnchorAggregateStore::autofill_canvas(&pdf), LETTER);

    pdf.anchors = serde_json::from_value(serde_json::json!([
        { "id": 1, "text": "{{a}}", "x": 0, "y": 0, "page": "1" },
        { "id": 2, "text": "{{b}}", "x": 0, "y": 0, "page": "1", "canvasWidth": 612, "canvasHeight": 792 }
    ]))
    .unwrap();
    assert_eq!(AnchorAggregateStore::autofill_canvas(&pdf), CanvasSize::new(612, 792));

    pdf.canvas_width = Some(800);
    pdf.canvas_height = Some(1000);
    assert_eq!(AnchorAggregateStore::autofill_canvas(&pdf), CanvasSize::new(800, 1000));
}
