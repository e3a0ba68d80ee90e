//! Object storage for originals and thumbnails

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
mod s3;

use bytes::Bytes;
use chrono::{DateTime, Utc};

pub use error::{BucketError, BucketResult};
pub use s3::S3ObjectStore;

/// Presigned URL with expiration information
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL for GET operations
    pub url: String,
    /// ISO-8601 UTC timestamp when the URL expires
    pub expires_at: DateTime<Utc>,
}

/// Access control applied to a written object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Readable only with bucket credentials or a presigned URL
    Private,
}

/// Metadata for one object returned by a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Full object key, including its prefix
    pub key: String,
    /// Object size in bytes
    pub size: u64,
    /// Last modification time reported by the store
    pub last_modified: DateTime<Utc>,
}

/// Blob storage used by the ingestion and catalog pipelines
///
/// Implementations perform exactly one store call per method and never retry.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes `body` under `key`, replacing any existing object
    ///
    /// # Errors
    ///
    /// Returns `BucketError` if the store rejects or fails the write
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
        access_policy: AccessPolicy,
    ) -> BucketResult<()>;

    /// Lists objects whose key starts with `prefix`
    ///
    /// Only a single page is requested, so very large prefixes may be truncated.
    ///
    /// # Errors
    ///
    /// Returns `BucketError` if the store cannot be enumerated
    async fn list_objects(&self, prefix: &str) -> BucketResult<Vec<ObjectSummary>>;

    /// Mints a time-limited read URL for `key`
    ///
    /// The object is not required to exist.
    ///
    /// # Errors
    ///
    /// Returns `BucketError::ConfigError` if the expiry is not accepted
    /// Returns `BucketError::S3Error` if signing fails
    async fn presigned_get_url(&self, key: &str, expires_in_secs: u64)
        -> BucketResult<PresignedUrl>;
}
