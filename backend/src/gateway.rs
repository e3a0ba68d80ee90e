//! Transport-neutral entry points
//!
//! Each function takes an already-parsed request description and returns the full
//! response description (status, headers, JSON body). The HTTP routes are thin
//! adapters around these.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use aide::OperationOutput;
use axum::{
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    catalog::{CatalogEntry, CatalogPipeline, CatalogQuery},
    ingest::IngestionPipeline,
    payload::UploadEvent,
    types::AppError,
};

/// Body returned by a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UploadResponse {
    /// Full storage key of the original, e.g. `uploads/cat.png`
    pub key: String,
}

/// A complete response description
///
/// `T` is the type serialized into `body`; it only feeds the OpenAPI schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse<T> {
    /// HTTP status code
    pub status_code: u16,
    /// Response headers
    pub headers: BTreeMap<String, String>,
    /// JSON-encoded body
    pub body: String,
    #[serde(skip)]
    body_type: PhantomData<fn() -> T>,
}

impl<T: Serialize> GatewayResponse<T> {
    /// A 200 response with `value` as its JSON body
    ///
    /// # Errors
    ///
    /// Returns `AppError` if `value` cannot be serialized
    pub fn ok_json(value: &T) -> Result<Self, AppError> {
        let body = serde_json::to_string(value)?;
        let headers = BTreeMap::from([
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        ]);

        Ok(Self {
            status_code: StatusCode::OK.as_u16(),
            headers,
            body,
            body_type: PhantomData,
        })
    }
}

impl<T> IntoResponse for GatewayResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, self.body).into_response();

        let headers = response.headers_mut();
        headers.remove(header::CONTENT_TYPE);
        for (name, value) in self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                headers.insert(name, value);
            }
        }

        response
    }
}

impl<T: JsonSchema> OperationOutput for GatewayResponse<T> {
    type Inner = T;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<T>::operation_response(ctx, operation)
    }
}

/// Ingestion entry point
///
/// # Errors
///
/// Returns `AppError` if the body cannot be decoded or the original cannot be stored.
/// Thumbnail failures never surface here.
#[instrument(skip_all)]
pub async fn upload(
    pipeline: &IngestionPipeline,
    event: UploadEvent,
) -> Result<GatewayResponse<UploadResponse>, AppError> {
    let outcome = pipeline.ingest(event).await?;
    GatewayResponse::ok_json(&UploadResponse { key: outcome.key })
}

/// Catalog entry point
///
/// # Errors
///
/// Returns `AppError` if the store cannot be listed or URLs cannot be signed
#[instrument(skip(pipeline))]
pub async fn list_images(
    pipeline: &CatalogPipeline,
    query: &CatalogQuery,
) -> Result<GatewayResponse<Vec<CatalogEntry>>, AppError> {
    let entries = pipeline.list(query).await?;
    GatewayResponse::ok_json(&entries)
}
