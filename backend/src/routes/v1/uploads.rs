use std::collections::HashMap;
use std::sync::Arc;

use axum::{body::Bytes, http::HeaderMap, Extension};
use tracing::instrument;

use crate::{
    gateway::{self, GatewayResponse, UploadResponse},
    ingest::IngestionPipeline,
    payload::UploadEvent,
    types::AppError,
};

/// Maximum accepted request body, 15 MiB
pub const MAX_UPLOAD_SIZE_BYTES: usize = 15 * 1024 * 1024;

/// Header announcing a base64-encoded body
pub const BODY_ENCODING_HEADER: &str = "x-body-encoding";

/// Builds an upload event from raw HTTP parts
///
/// Headers with non-ASCII values are dropped; clients percent-encode `X-Filename`.
#[must_use]
pub fn upload_event(headers: &HeaderMap, body: Bytes) -> UploadEvent {
    let is_base64_encoded = headers
        .get(BODY_ENCODING_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("base64"));

    let headers: HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    UploadEvent {
        body: Some(body),
        is_base64_encoded,
        headers,
    }
}

/// Uploads a file
///
/// The raw request body is stored under `uploads/`. Set `X-Filename` to choose the
/// object name (directory components are stripped) and `Content-Type` to record
/// the MIME type. When the body is an image, a thumbnail of at most 200x200 pixels
/// is stored under `thumbnails/` with the same name; thumbnail failures do not
/// fail the upload.
///
/// Responds with `{"key": "uploads/<name>"}`.
#[instrument(skip_all)]
pub async fn create_upload(
    Extension(pipeline): Extension<Arc<IngestionPipeline>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<GatewayResponse<UploadResponse>, AppError> {
    gateway::upload(&pipeline, upload_event(&headers, body)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_upload_event_from_http_parts() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("image/png"));
        headers.insert("x-filename", HeaderValue::from_static("a%20b.png"));
        headers.insert(BODY_ENCODING_HEADER, HeaderValue::from_static("Base64"));

        let event = upload_event(&headers, Bytes::from_static(b"iVBORw=="));

        assert!(event.is_base64_encoded);
        assert_eq!(event.body.as_deref(), Some(&b"iVBORw=="[..]));
        assert_eq!(event.headers["content-type"], "image/png");
        assert_eq!(event.headers["x-filename"], "a%20b.png");
    }

    #[test]
    fn test_plain_body_is_not_flagged() {
        let event = upload_event(&HeaderMap::new(), Bytes::new());
        assert!(!event.is_base64_encoded);
        assert_eq!(event.body.as_deref(), Some(&[][..]));
    }
}
