//! reqwest client for the persistence backend.
//!
//! Thin HTTP wrapper over `{base}/api/...`. Status classification and error
//! message extraction are pure functions for testability.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::model::{
    Anchor, AutofillRequest, DeleteMode, DuplicateCheck, PdfUpdate, Provider, ProviderPdf, ProviderUpdate,
};
use crate::remote::{Remote, RemoteError};
use crate::validate::{AnchorDraft, AnchorKey, AnchorPatch};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

const PDF_MIME: &str = "application/pdf";
const MAX_ERROR_BODY_CHARS: usize = 200;

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

pub struct HttpRemote {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRemote {
    /// # Errors
    ///
    /// [`RemoteError::HttpClientBuild`] if the TLS backend cannot initialize.
    pub fn new(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| RemoteError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, RemoteError> {
        let response = request.send().await.map_err(|e| RemoteError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(status_error(status, &body));
        }
        Ok(body.to_vec())
    }

    async fn json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, RemoteError> {
        let body = self.send(request).await?;
        serde_json::from_slice(&body).map_err(|e| RemoteError::Decode(e.to_string()))
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.get(api_url(&self.base_url, path))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.post(api_url(&self.base_url, path))
    }

    fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.put(api_url(&self.base_url, path))
    }

    fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.delete(api_url(&self.base_url, path))
    }
}

#[async_trait::async_trait]
impl Remote for HttpRemote {
    async fn list_providers(&self) -> Result<Vec<Provider>, RemoteError> {
        self.json(self.get("/providers?include_inactive=true")).await
    }

    async fn create_provider(&self, name: &str) -> Result<Provider, RemoteError> {
        self.json(self.post("/providers").json(&serde_json::json!({ "name": name })))
            .await
    }

    async fn update_provider(&self, provider_id: &str, update: &ProviderUpdate) -> Result<Provider, RemoteError> {
        self.json(self.put(&format!("/providers/{provider_id}")).json(update))
            .await
    }

    async fn delete_provider(&self, provider_id: &str) -> Result<(), RemoteError> {
        self.send(self.delete(&format!("/providers/{provider_id}")))
            .await
            .map(drop)
    }

    async fn upload_pdf(&self, provider_id: &str, filename: &str, bytes: Vec<u8>) -> Result<ProviderPdf, RemoteError> {
        let form = Form::new().part("pdf", pdf_part(filename, bytes)?);
        self.json(self.post(&format!("/providers/{provider_id}/pdfs")).multipart(form))
            .await
    }

    async fn check_duplicate(&self, filename: &str, bytes: Vec<u8>) -> Result<DuplicateCheck, RemoteError> {
        let form = Form::new().part("pdf", pdf_part(filename, bytes)?);
        self.json(self.post("/pdf/check-duplicate").multipart(form)).await
    }

    async fn update_pdf(&self, pdf_id: i64, update: &PdfUpdate) -> Result<ProviderPdf, RemoteError> {
        self.json(self.put(&format!("/pdfs/{pdf_id}")).json(update)).await
    }

    async fn delete_pdf(&self, pdf_id: i64, mode: DeleteMode) -> Result<(), RemoteError> {
        self.send(self.delete(&delete_pdf_path(pdf_id, mode)))
            .await
            .map(drop)
    }

    async fn download(&self, pdf_id: i64) -> Result<Vec<u8>, RemoteError> {
        self.send(self.get(&format!("/pdfs/{pdf_id}"))).await
    }

    async fn create_anchor(&self, pdf_id: i64, draft: &AnchorDraft) -> Result<Anchor, RemoteError> {
        self.json(self.post(&format!("/pdfs/{pdf_id}/anchors")).json(&AnchorBody::from(draft)))
            .await
    }

    async fn update_anchor(&self, anchor_id: i64, patch: &AnchorPatch) -> Result<Anchor, RemoteError> {
        self.json(self.put(&format!("/anchors/{anchor_id}")).json(&AnchorBody::from(patch)))
            .await
    }

    async fn delete_anchor(&self, anchor_id: i64) -> Result<(), RemoteError> {
        self.send(self.delete(&format!("/anchors/{anchor_id}")))
            .await
            .map(drop)
    }

    async fn autofill(&self, request: AutofillRequest) -> Result<Vec<u8>, RemoteError> {
        let anchors = serde_json::to_string(&request.anchors).map_err(|e| RemoteError::Decode(e.to_string()))?;
        let form = Form::new()
            .part("pdf", pdf_part(&request.filename, request.pdf)?)
            .text("anchors", anchors)
            .text("canvasWidth", request.canvas.width.to_string())
            .text("canvasHeight", request.canvas.height.to_string())
            .text("preview", request.preview.to_string());
        self.send(self.post("/autofill").multipart(form)).await
    }
}

fn pdf_part(filename: &str, bytes: Vec<u8>) -> Result<Part, RemoteError> {
    Part::bytes(bytes)
        .file_name(filename.to_owned())
        .mime_str(PDF_MIME)
        .map_err(|e| RemoteError::Request(e.to_string()))
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Anchor create / update body. Unset fields are omitted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnchorBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a AnchorKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    x: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    y: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    canvas_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    canvas_height: Option<u32>,
}

impl<'a> From<&'a AnchorDraft> for AnchorBody<'a> {
    fn from(draft: &'a AnchorDraft) -> Self {
        Self {
            text: Some(&draft.key),
            x: Some(draft.x),
            y: Some(draft.y),
            page: Some(draft.page.to_string()),
            canvas_width: draft.canvas.map(|c| c.width),
            canvas_height: draft.canvas.map(|c| c.height),
        }
    }
}

impl<'a> From<&'a AnchorPatch> for AnchorBody<'a> {
    fn from(patch: &'a AnchorPatch) -> Self {
        Self {
            text: patch.key.as_ref(),
            x: patch.x,
            y: patch.y,
            page: patch.page.as_ref().map(ToString::to_string),
            canvas_width: patch.canvas.map(|c| c.width),
            canvas_height: patch.canvas.map(|c| c.height),
        }
    }
}

// =============================================================================
// PARSING
// =============================================================================

pub(crate) fn api_url(base_url: &str, path: &str) -> String {
    format!("{}/api{path}", base_url.trim_end_matches('/'))
}

pub(crate) fn delete_pdf_path(pdf_id: i64, mode: DeleteMode) -> String {
    match mode {
        DeleteMode::Soft => format!("/pdfs/{pdf_id}"),
        DeleteMode::Hard => format!("/pdfs/{pdf_id}/hard-delete"),
    }
}

/// Map a non-success response onto the error taxonomy.
pub(crate) fn status_error(status: u16, body: &[u8]) -> RemoteError {
    let message = error_message(body);
    match status {
        404 => RemoteError::NotFound(message),
        409 => RemoteError::Conflict(message),
        _ => RemoteError::Status { status, message },
    }
}

/// The backend reports failures as `{"error": ...}` or `{"message": ...}`.
fn error_message(body: &[u8]) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_slice::<serde_json::Value>(body) {
        for key in ["error", "message"] {
            if let Some(serde_json::Value::String(text)) = map.get(key) {
                return text.clone();
            }
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return "request failed".to_owned();
    }
    text.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;
