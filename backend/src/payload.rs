//! Turns a transport-level upload description into raw bytes and a content type

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use thiserror::Error;

/// Content type assumed when the request carries none
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Header carrying the client's original filename
pub const FILENAME_HEADER: &str = "x-filename";

/// An upload as handed over by the transport
#[derive(Debug, Clone, Default)]
pub struct UploadEvent {
    /// Request body, base64 text when `is_base64_encoded` is set
    pub body: Option<Bytes>,
    /// Whether the transport base64-encoded the body
    pub is_base64_encoded: bool,
    /// Request headers, names in any case
    pub headers: HashMap<String, String>,
}

/// Result of decoding an [`UploadEvent`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    /// Raw object bytes
    pub data: Bytes,
    /// Resolved content type
    pub content_type: String,
    /// Percent-encoded filename hint, if the client sent one
    pub filename_hint: Option<String>,
}

/// Errors raised while decoding a payload
#[derive(Debug, Error)]
pub enum PayloadError {
    /// Body flagged as base64 could not be decoded
    #[error("Malformed base64 body: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
}

/// Lower-cases header names so lookups are case-insensitive
///
/// When two headers differ only by case, the one whose original name sorts
/// first (byte order, so `Content-Type` before `content-type`) wins.
#[must_use]
pub fn normalize_headers(headers: &HashMap<String, String>) -> HashMap<String, String> {
    let mut names: Vec<&String> = headers.keys().collect();
    names.sort_unstable();

    let mut normalized = HashMap::with_capacity(headers.len());
    for name in names {
        normalized
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| headers[name].clone());
    }
    normalized
}

/// Decodes the body and resolves the content type and filename hint
///
/// # Errors
///
/// Returns `PayloadError::InvalidEncoding` if the body is flagged as base64 but is not
pub fn decode(event: UploadEvent) -> Result<DecodedPayload, PayloadError> {
    let body = event.body.unwrap_or_default();

    let data = if event.is_base64_encoded {
        let compact: Vec<u8> = body
            .iter()
            .copied()
            .filter(|byte| !byte.is_ascii_whitespace())
            .collect();
        Bytes::from(STANDARD.decode(compact)?)
    } else {
        body
    };

    let mut headers = normalize_headers(&event.headers);
    let content_type = headers
        .remove("content-type")
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
    let filename_hint = headers.remove(FILENAME_HEADER);

    Ok(DecodedPayload {
        data,
        content_type,
        filename_hint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn event(body: Option<&[u8]>, encoded: bool, headers: &[(&str, &str)]) -> UploadEvent {
        UploadEvent {
            body: body.map(Bytes::copy_from_slice),
            is_base64_encoded: encoded,
            headers: headers
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_raw_body_is_used_verbatim() {
        let decoded = decode(event(Some(b"\x00\xffraw"), false, &[])).unwrap();
        assert_eq!(decoded.data, b"\x00\xffraw".to_vec());
        assert_eq!(decoded.content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(decoded.filename_hint, None);
    }

    #[test]
    fn test_raw_body_is_not_copied() {
        let body = Bytes::from(vec![7u8; 1024]);
        let ptr = body.as_ptr();

        let decoded = decode(UploadEvent {
            body: Some(body),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(decoded.data.as_ptr(), ptr);
        assert_eq!(decoded.data.len(), 1024);
    }

    #[test]
    fn test_base64_body_is_decoded() {
        let decoded = decode(event(Some(b"aGVs\nbG8="), true, &[])).unwrap();
        assert_eq!(decoded.data, b"hello".to_vec());
    }

    #[test]
    fn test_absent_body_is_empty() {
        assert!(decode(event(None, false, &[])).unwrap().data.is_empty());
        assert!(decode(event(None, true, &[])).unwrap().data.is_empty());
    }

    #[test]
    fn test_malformed_base64_is_rejected() {
        let result = decode(event(Some(b"not base64!!"), true, &[]));
        assert!(matches!(result, Err(PayloadError::InvalidEncoding(_))));
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let decoded = decode(event(
            Some(b"x"),
            false,
            &[("Content-Type", "image/png"), ("X-Filename", "cat%20pic.png")],
        ))
        .unwrap();
        assert_eq!(decoded.content_type, "image/png");
        assert_eq!(decoded.filename_hint.as_deref(), Some("cat%20pic.png"));
    }

    #[test]
    fn test_case_colliding_headers_resolve_deterministically() {
        for _ in 0..16 {
            let decoded = decode(event(
                Some(b"x"),
                false,
                &[
                    ("content-type", "text/plain"),
                    ("CONTENT-TYPE", "image/gif"),
                    ("Content-Type", "image/png"),
                ],
            ))
            .unwrap();
            assert_eq!(decoded.content_type, "image/gif");
        }
    }
}
