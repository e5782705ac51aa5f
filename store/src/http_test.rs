use super::*;
use canvas::error::ErrorCode;
use canvas::transform::CanvasSize;
use serde_json::json;

// =============================================================================
// URLs
// =============================================================================

#[test]
fn api_url_joins_under_api_prefix() {
    assert_eq!(api_url("http://localhost:5001", "/providers"), "http://localhost:5001/api/providers");
    assert_eq!(api_url("http://host/", "/pdfs/3"), "http://host/api/pdfs/3");
}

#[test]
fn delete_mode_selects_route() {
    assert_eq!(delete_pdf_path(4, DeleteMode::Soft), "/pdfs/4");
    assert_eq!(delete_pdf_path(4, DeleteMode::Hard), "/pdfs/4/hard-delete");
}

#[test]
fn client_trims_trailing_slash() {
    let remote = HttpRemote::new("http://localhost:5001/", HttpTimeouts::default()).unwrap();
    assert_eq!(remote.base_url(), "http://localhost:5001");
}

// =============================================================================
// Status classification
// =============================================================================

#[test]
fn duplicate_upload_is_conflict() {
    let err = status_error(409, br#"{"error": "This PDF already exists", "existingPdfId": 3}"#);
    assert_eq!(err, RemoteError::Conflict("This PDF already exists".into()));
    assert_eq!(err.error_code(), "E_REMOTE_CONFLICT");
}

#[test]
fn missing_resource_is_not_found() {
    assert_eq!(status_error(404, br#"{"message": "gone"}"#), RemoteError::NotFound("gone".into()));
}

#[test]
fn other_status_keeps_code_and_text_body() {
    let err = status_error(502, b"<html>bad gateway</html>");
    assert_eq!(err, RemoteError::Status { status: 502, message: "<html>bad gateway</html>".into() });
    assert!(err.retryable());
}

#[test]
fn empty_body_gets_generic_message() {
    assert_eq!(status_error(400, b""), RemoteError::Status { status: 400, message: "request failed".into() });
}

#[test]
fn client_errors_are_not_retryable() {
    assert!(!status_error(400, b"{}").retryable());
    assert!(status_error(429, b"{}").retryable());
    assert!(RemoteError::Request("reset".into()).retryable());
    assert!(!RemoteError::Decode("eof".into()).retryable());
}

// =============================================================================
// Wire bodies
// =============================================================================

#[test]
fn draft_body_carries_every_field() {
    let draft = AnchorDraft::parse("day", 100, 200, "1, 3", Some(CanvasSize::new(1224, 1584))).unwrap();
    let body = serde_json::to_value(AnchorBody::from(&draft)).unwrap();
    assert_eq!(
        body,
        json!({ "text": "{{day}}", "x": 100, "y": 200, "page": "1,3", "canvasWidth": 1224, "canvasHeight": 1584 })
    );
}

#[test]
fn patch_body_omits_unchanged_fields() {
    let patch = AnchorPatch { x: Some(5), page: Some("last".parse().unwrap()), ..AnchorPatch::default() };
    let body = serde_json::to_value(AnchorBody::from(&patch)).unwrap();
    assert_eq!(body, json!({ "x": 5, "page": "last" }));
}
