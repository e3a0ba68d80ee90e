//! Listing of stored originals
//!
//! Every call enumerates `uploads/` afresh and mints new presigned URLs. The
//! thumbnail URL is derived from the name alone; the thumbnail object may not
//! exist, in which case fetching the URL returns 404.

use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, instrument};

use crate::{
    media_storage::{BucketResult, ObjectStore},
    naming::{self, UPLOADS_PREFIX},
};

/// Default presigned URL lifetime in seconds
pub const DEFAULT_PRESIGNED_URL_EXPIRY_SECS: u64 = 60 * 60;

/// Field a listing can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum SortKey {
    /// Object size in bytes
    #[strum(serialize = "size")]
    Size,
    /// Object name
    #[strum(serialize = "name")]
    Name,
    /// Last modification time
    #[strum(serialize = "lastModified")]
    LastModified,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    /// Smallest first
    #[default]
    Asc,
    /// Largest first
    Desc,
}

/// Query parameters accepted by the listing
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct CatalogQuery {
    /// One of `size`, `name` or `lastModified`; anything else leaves store order
    pub sort: Option<String>,
    /// `asc` (default) or `desc`, case-insensitive
    pub order: Option<String>,
}

impl CatalogQuery {
    /// Recognised sort key, if any
    #[must_use]
    pub fn sort_key(&self) -> Option<SortKey> {
        self.sort.as_deref().and_then(|s| SortKey::from_str(s).ok())
    }

    /// Requested order, defaulting to ascending
    #[must_use]
    pub fn sort_order(&self) -> SortOrder {
        self.order
            .as_deref()
            .and_then(|s| SortOrder::from_str(s).ok())
            .unwrap_or_default()
    }
}

/// One stored original as returned by the listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Object name, without the `uploads/` prefix
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub last_modified: DateTime<Utc>,
    /// Presigned URL of the thumbnail; may return 404 when no thumbnail was generated
    pub thumbnail_url: String,
    /// Presigned URL of the original
    pub image_url: String,
}

/// Lists originals with presigned URLs
pub struct CatalogPipeline {
    store: Arc<dyn ObjectStore>,
    presigned_url_expiry_secs: u64,
}

impl CatalogPipeline {
    /// Creates a pipeline reading from `store`
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, presigned_url_expiry_secs: u64) -> Self {
        Self {
            store,
            presigned_url_expiry_secs,
        }
    }

    /// Lifetime of minted URLs in seconds
    #[must_use]
    pub const fn presigned_url_expiry_secs(&self) -> u64 {
        self.presigned_url_expiry_secs
    }

    /// Lists every original, optionally sorted
    ///
    /// # Errors
    ///
    /// Returns `BucketError` if the store cannot be listed or a URL cannot be signed
    #[instrument(skip(self))]
    pub async fn list(&self, query: &CatalogQuery) -> BucketResult<Vec<CatalogEntry>> {
        let objects = self.store.list_objects(UPLOADS_PREFIX).await?;
        let mut entries = Vec::with_capacity(objects.len());

        for object in objects {
            let Some(name) = object.key.strip_prefix(UPLOADS_PREFIX) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }

            let image_url = self
                .store
                .presigned_get_url(&object.key, self.presigned_url_expiry_secs)
                .await?;
            let thumbnail_url = self
                .store
                .presigned_get_url(&naming::thumbnail_key(name), self.presigned_url_expiry_secs)
                .await?;

            entries.push(CatalogEntry {
                name: name.to_string(),
                size: object.size,
                last_modified: object.last_modified,
                thumbnail_url: thumbnail_url.url,
                image_url: image_url.url,
            });
        }

        if let Some(key) = query.sort_key() {
            sort_entries(&mut entries, key, query.sort_order());
        }

        debug!(count = entries.len(), "Listed originals");
        Ok(entries)
    }
}

/// Stable sort of `entries` by `key`
///
/// Entries that compare equal keep their relative order in both directions.
pub fn sort_entries(entries: &mut [CatalogEntry], key: SortKey, order: SortOrder) {
    let compare = |a: &CatalogEntry, b: &CatalogEntry| -> Ordering {
        match key {
            SortKey::Size => a.size.cmp(&b.size),
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::LastModified => a.last_modified.cmp(&b.last_modified),
        }
    };

    match order {
        SortOrder::Asc => entries.sort_by(compare),
        SortOrder::Desc => entries.sort_by(|a, b| compare(b, a)),
    }
}
