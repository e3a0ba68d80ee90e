/// Service limits
pub mod config;
/// Listing of stored files
pub mod images;
/// File uploads
pub mod uploads;

use aide::axum::{
    routing::{get, get_with, post_with},
    ApiRouter,
};
use axum::extract::DefaultBodyLimit;

use crate::{
    catalog::CatalogEntry,
    gateway::{GatewayResponse, UploadResponse},
};

/// Creates the v1 API router with all v1 handler routes
pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/uploads",
            post_with(uploads::create_upload, |op| {
                op.response::<200, GatewayResponse<UploadResponse>>()
            }),
        )
        .api_route(
            "/images",
            get_with(images::list_images, |op| {
                op.response::<200, GatewayResponse<Vec<CatalogEntry>>>()
            }),
        )
        .api_route("/config", get(config::get_config))
        .layer(DefaultBodyLimit::max(uploads::MAX_UPLOAD_SIZE_BYTES))
}
