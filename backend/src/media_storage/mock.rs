//! In-memory object store for tests

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};

use super::{AccessPolicy, BucketError, BucketResult, ObjectStore, ObjectSummary, PresignedUrl};

const URL_SCHEME: &str = "memory://";

/// An object held by [`InMemoryObjectStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object bytes
    pub body: Vec<u8>,
    /// Content type recorded at write time
    pub content_type: String,
    /// Access policy recorded at write time
    pub access_policy: AccessPolicy,
    /// Write timestamp
    pub last_modified: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<String, StoredObject>,
    failing_prefixes: HashSet<String>,
    listing_unavailable: bool,
    put_calls: usize,
}

/// Object store that keeps everything in a `BTreeMap`
///
/// Listings come back in lexicographic key order, like S3. Presigned URLs use a
/// `memory://` scheme and can be resolved with [`InMemoryObjectStore::fetch_presigned`].
pub struct InMemoryObjectStore {
    bucket_name: String,
    state: Mutex<State>,
}

impl InMemoryObjectStore {
    /// Creates an empty store
    #[must_use]
    pub fn new(bucket_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every write to a key under `prefix` fail
    pub fn fail_writes_under(&self, prefix: &str) {
        self.state().failing_prefixes.insert(prefix.to_string());
    }

    /// Makes every listing fail as if the store were unreachable
    pub fn make_listing_unavailable(&self) {
        self.state().listing_unavailable = true;
    }

    /// Inserts an object directly, bypassing failure injection
    pub fn insert(&self, key: &str, body: Vec<u8>, content_type: &str, last_modified: DateTime<Utc>) {
        self.state().objects.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
                access_policy: AccessPolicy::Private,
                last_modified,
            },
        );
    }

    /// Returns the object stored under `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.state().objects.get(key).cloned()
    }

    /// All keys currently stored
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.state().objects.keys().cloned().collect()
    }

    /// Number of `put_object` calls received, including failed ones
    #[must_use]
    pub fn put_calls(&self) -> usize {
        self.state().put_calls
    }

    /// Resolves a URL minted by this store, as an HTTP GET on a presigned URL would
    ///
    /// Returns `None` for foreign URLs and for keys with no object behind them.
    #[must_use]
    pub fn fetch_presigned(&self, url: &str) -> Option<StoredObject> {
        let rest = url.strip_prefix(URL_SCHEME)?;
        let (bucket, rest) = rest.split_once('/')?;
        if bucket != self.bucket_name {
            return None;
        }
        let key = rest.split_once('?').map_or(rest, |(key, _)| key);
        self.get(key)
    }
}

#[async_trait::async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
        access_policy: AccessPolicy,
    ) -> BucketResult<()> {
        let mut state = self.state();
        state.put_calls += 1;

        if state
            .failing_prefixes
            .iter()
            .any(|prefix| key.starts_with(prefix.as_str()))
        {
            return Err(BucketError::S3Error(format!("Injected write failure for {key}")));
        }

        state.objects.insert(
            key.to_string(),
            StoredObject {
                body: body.to_vec(),
                content_type: content_type.to_string(),
                access_policy,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> BucketResult<Vec<ObjectSummary>> {
        let state = self.state();
        if state.listing_unavailable {
            return Err(BucketError::UpstreamError("Injected listing failure".to_string()));
        }

        Ok(state
            .objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| ObjectSummary {
                key: key.clone(),
                size: object.body.len() as u64,
                last_modified: object.last_modified,
            })
            .collect())
    }

    async fn presigned_get_url(
        &self,
        key: &str,
        expires_in_secs: u64,
    ) -> BucketResult<PresignedUrl> {
        let lifetime = i64::try_from(expires_in_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                BucketError::ConfigError(format!("Unsupported expiry: {expires_in_secs}s"))
            })?;

        Ok(PresignedUrl {
            url: format!(
                "{URL_SCHEME}{}/{key}?X-Amz-Expires={expires_in_secs}",
                self.bucket_name
            ),
            expires_at: Utc::now() + lifetime,
        })
    }
}
