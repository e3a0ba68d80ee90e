use std::sync::Arc;

use axum::{Extension, Json};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{catalog::CatalogPipeline, ingest::IngestionPipeline, routes::v1::uploads};

/// Limits a client should respect before uploading
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ConfigResponse {
    /// Maximum upload size in bytes
    pub max_upload_size_bytes: usize,
    /// Maximum thumbnail width and height in pixels
    pub thumbnail_max_dimension: u32,
    /// Lifetime of presigned URLs in seconds
    pub presigned_url_expiry_secs: u64,
}

/// Upload limits and URL lifetimes
pub async fn get_config(
    Extension(ingestion): Extension<Arc<IngestionPipeline>>,
    Extension(catalog): Extension<Arc<CatalogPipeline>>,
) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        max_upload_size_bytes: uploads::MAX_UPLOAD_SIZE_BYTES,
        thumbnail_max_dimension: ingestion.thumbnails().max_dimension(),
        presigned_url_expiry_secs: catalog.presigned_url_expiry_secs(),
    })
}
