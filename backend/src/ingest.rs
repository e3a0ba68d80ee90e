//! Upload ingestion
//!
//! `decode -> derive name -> store original -> thumbnail -> store thumbnail`.
//! Only the steps up to and including the original write can fail the request.
//! Thumbnailing and the thumbnail write are best-effort.

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::{
    media_storage::{AccessPolicy, BucketError, ObjectStore},
    naming,
    payload::{self, PayloadError, UploadEvent},
    thumbnail::{ThumbnailError, ThumbnailGenerator},
};

/// Errors that fail an upload
#[derive(Debug, Error)]
pub enum IngestError {
    /// The request body could not be decoded
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// The original could not be written
    #[error("Failed to store original {key}: {source}")]
    StoreOriginal {
        /// Key of the original
        key: String,
        /// Store failure
        #[source]
        source: BucketError,
    },
}

/// What happened to the thumbnail of a successful upload
#[derive(Debug)]
pub enum ThumbnailStatus {
    /// Thumbnail written under `key`
    Stored {
        /// Key of the thumbnail
        key: String,
    },
    /// No thumbnail was produced, usually because the upload is not an image
    Skipped(ThumbnailError),
    /// A thumbnail was produced but could not be written
    StoreFailed {
        /// Key of the thumbnail
        key: String,
        /// Store failure
        error: BucketError,
    },
}

/// A successful upload
#[derive(Debug)]
pub struct IngestOutcome {
    /// Key of the stored original
    pub key: String,
    /// Thumbnail result
    pub thumbnail: ThumbnailStatus,
}

/// Stores originals and their thumbnails
pub struct IngestionPipeline {
    store: Arc<dyn ObjectStore>,
    thumbnails: ThumbnailGenerator,
}

impl IngestionPipeline {
    /// Creates a pipeline writing to `store`
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, thumbnails: ThumbnailGenerator) -> Self {
        Self { store, thumbnails }
    }

    /// Thumbnail generator used for uploads
    #[must_use]
    pub const fn thumbnails(&self) -> &ThumbnailGenerator {
        &self.thumbnails
    }

    /// Ingests one upload
    ///
    /// Performs one or two store writes: the original always, the thumbnail when one
    /// could be generated.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Payload` if the body cannot be decoded; nothing is written
    /// Returns `IngestError::StoreOriginal` if the original cannot be written; no
    /// thumbnail is attempted
    #[instrument(skip(self, event), fields(key = tracing::field::Empty))]
    pub async fn ingest(&self, event: UploadEvent) -> Result<IngestOutcome, IngestError> {
        let payload = payload::decode(event)?;

        let name = naming::derive_object_name(payload.filename_hint.as_deref(), &payload.content_type);
        let key = naming::original_key(&name);
        tracing::Span::current().record("key", key.as_str());

        self.store
            .put_object(
                &key,
                payload.data.clone(),
                &payload.content_type,
                AccessPolicy::Private,
            )
            .await
            .map_err(|source| IngestError::StoreOriginal {
                key: key.clone(),
                source,
            })?;

        info!(
            content_type = %payload.content_type,
            size = payload.data.len(),
            "Stored original"
        );

        let thumbnail = self.store_thumbnail(&name, payload.data).await;

        Ok(IngestOutcome { key, thumbnail })
    }

    async fn store_thumbnail(&self, name: &str, data: Bytes) -> ThumbnailStatus {
        let thumbnail = match self.thumbnails.generate_async(data).await {
            Ok(thumbnail) => thumbnail,
            Err(err @ ThumbnailError::Worker(_)) => {
                error!(error = %err, "Thumbnail worker failed, continuing without thumbnail");
                return ThumbnailStatus::Skipped(err);
            }
            Err(err) => {
                warn!(error = %err, "Skipping thumbnail");
                return ThumbnailStatus::Skipped(err);
            }
        };

        let key = naming::thumbnail_key(name);
        let content_type = thumbnail.content_type();

        match self
            .store
            .put_object(
                &key,
                Bytes::from(thumbnail.data),
                &content_type,
                AccessPolicy::Private,
            )
            .await
        {
            Ok(()) => {
                info!(
                    thumbnail_key = %key,
                    width = thumbnail.width,
                    height = thumbnail.height,
                    "Stored thumbnail"
                );
                ThumbnailStatus::Stored { key }
            }
            Err(error) => {
                error!(thumbnail_key = %key, %error, "Failed to store thumbnail");
                ThumbnailStatus::StoreFailed { key, error }
            }
        }
    }
}
