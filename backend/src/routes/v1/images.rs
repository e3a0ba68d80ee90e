use std::sync::Arc;

use axum::{extract::Query, Extension};
use tracing::instrument;

use crate::{
    catalog::{CatalogEntry, CatalogPipeline, CatalogQuery},
    gateway::{self, GatewayResponse},
    types::AppError,
};

/// Lists uploaded files
///
/// Returns every original under `uploads/` with its size, last modification time
/// and presigned URLs for the original and its thumbnail. URLs expire after one
/// hour by default.
///
/// The thumbnail URL is always present but returns 404 when no thumbnail was
/// generated, e.g. for non-image uploads.
///
/// Optional sorting: `sort` is one of `size`, `name`, `lastModified` (any other
/// value is ignored) and `order` is `asc` (default) or `desc`. Results are not
/// paginated.
#[instrument(skip(pipeline))]
pub async fn list_images(
    Extension(pipeline): Extension<Arc<CatalogPipeline>>,
    Query(query): Query<CatalogQuery>,
) -> Result<GatewayResponse<Vec<CatalogEntry>>, AppError> {
    gateway::list_images(&pipeline, &query).await
}
