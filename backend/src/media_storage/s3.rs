//! S3-backed object store

use std::sync::Arc;
use std::time::Duration;

use aws_sdk_s3::{
    presigning::PresigningConfig,
    primitives::{ByteStream, DateTime as S3DateTime},
    types::ObjectCannedAcl,
    Client as S3Client,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::{AccessPolicy, BucketError, BucketResult, ObjectStore, ObjectSummary, PresignedUrl};

/// Object store client for S3 operations
pub struct S3ObjectStore {
    s3_client: Arc<S3Client>,
    bucket_name: String,
}

impl S3ObjectStore {
    /// Creates a new object store client
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `bucket_name` - S3 bucket holding originals and thumbnails
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>, bucket_name: String) -> Self {
        Self {
            s3_client,
            bucket_name,
        }
    }

    /// Name of the bucket this store writes to
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }
}

impl From<AccessPolicy> for ObjectCannedAcl {
    fn from(policy: AccessPolicy) -> Self {
        match policy {
            AccessPolicy::Private => Self::Private,
        }
    }
}

fn to_chrono(timestamp: &S3DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

#[async_trait::async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
        access_policy: AccessPolicy,
    ) -> BucketResult<()> {
        debug!(key, content_type, size = body.len(), "Writing object");

        self.s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .acl(access_policy.into())
            .send()
            .await?;

        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> BucketResult<Vec<ObjectSummary>> {
        let output = self
            .s3_client
            .list_objects_v2()
            .bucket(&self.bucket_name)
            .prefix(prefix)
            .send()
            .await?;

        if output.is_truncated().unwrap_or(false) {
            tracing::warn!(prefix, "Listing truncated to a single page");
        }

        output
            .contents()
            .iter()
            .map(|object| {
                let key = object
                    .key()
                    .ok_or_else(|| BucketError::S3Error("Listed object has no key".to_string()))?;
                let size = u64::try_from(object.size().unwrap_or_default()).map_err(|_| {
                    BucketError::S3Error(format!("Listed object {key} has a negative size"))
                })?;
                let last_modified = object
                    .last_modified()
                    .and_then(to_chrono)
                    .ok_or_else(|| {
                        BucketError::S3Error(format!("Listed object {key} has no timestamp"))
                    })?;

                Ok(ObjectSummary {
                    key: key.to_string(),
                    size,
                    last_modified,
                })
            })
            .collect()
    }

    async fn presigned_get_url(
        &self,
        key: &str,
        expires_in_secs: u64,
    ) -> BucketResult<PresignedUrl> {
        let presigned_config = PresigningConfig::expires_in(Duration::from_secs(expires_in_secs))
            .map_err(|e| {
                BucketError::ConfigError(format!("Failed to create presigning config: {e}"))
            })?;

        let presigned_request = self
            .s3_client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(presigned_config)
            .await
            .map_err(|e| BucketError::S3Error(format!("Failed to generate presigned URL: {e}")))?;

        let expires_at: DateTime<Utc> = Utc::now() + Duration::from_secs(expires_in_secs);

        Ok(PresignedUrl {
            url: presigned_request.uri().to_string(),
            expires_at,
        })
    }
}
