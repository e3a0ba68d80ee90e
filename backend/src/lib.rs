//! Image Gallery backend service
//!
//! Stores uploaded files under `uploads/` in an object store, generates bounded
//! thumbnails for images under `thumbnails/`, and lists stored originals with
//! presigned download URLs.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Listing of stored originals
pub mod catalog;

/// Transport-neutral request entry points
pub mod gateway;

/// Upload ingestion pipeline
pub mod ingest;

/// Object store abstraction and S3 implementation
pub mod media_storage;

/// Storage key derivation
pub mod naming;

/// Upload body decoding
pub mod payload;

/// HTTP routes
pub mod routes;

/// HTTP server
pub mod server;

/// Thumbnail generation
pub mod thumbnail;

/// Configuration and error types
pub mod types;
