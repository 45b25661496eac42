//! Blob store: image payloads addressed by storage key

use crate::domain::{storage_key, EntryId, ImageLimits, ImagePayload, StorageKey, UserId};
use crate::error::{BlobError, BlobResult};
use crate::infrastructure::deadline::within;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Object storage backend holding raw image bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a payload under `key`. Never overwrites: an existing key is a
    /// `Conflict`.
    async fn put(&self, key: &StorageKey, payload: &ImagePayload) -> BlobResult<()>;

    /// Permanently delete a blob. Missing keys may be reported as `NotFound`.
    async fn remove(&self, key: &StorageKey) -> BlobResult<()>;

    /// Address under which the blob is publicly retrievable
    fn public_url_for(&self, key: &StorageKey) -> String;
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedBlob {
    pub public_url: String,
    pub storage_key: StorageKey,
}

/// Upload/remove front end used by the coordinators: enforces payload limits,
/// generates namespaced keys and bounds every call with a deadline.
#[derive(Clone)]
pub struct BlobClient {
    store: Arc<dyn BlobStore>,
    limits: ImageLimits,
    timeout: Duration,
}

impl BlobClient {
    pub fn new(store: Arc<dyn BlobStore>, limits: ImageLimits, timeout: Duration) -> Self {
        BlobClient {
            store,
            limits,
            timeout,
        }
    }

    pub fn limits(&self) -> &ImageLimits {
        &self.limits
    }

    pub async fn upload(
        &self,
        owner: &UserId,
        entry: &EntryId,
        payload: &ImagePayload,
    ) -> BlobResult<UploadedBlob> {
        self.limits.check(payload)?;

        let ext = storage_key::extension_for(&payload.file_name, &payload.content_type);
        let key = StorageKey::generate(owner, entry, &ext);
        debug!(key = %key, bytes = payload.len(), "uploading image");

        within(self.timeout, "blob upload", self.store.put(&key, payload)).await?;

        Ok(UploadedBlob {
            public_url: self.store.public_url_for(&key),
            storage_key: key,
        })
    }

    /// Remove one blob; a blob that is already gone counts as removed
    pub async fn remove(&self, key: &StorageKey) -> BlobResult<()> {
        match within(self.timeout, "blob remove", self.store.remove(key)).await {
            Ok(()) => Ok(()),
            Err(BlobError::NotFound(_)) => {
                debug!(key = %key, "blob already absent");
                Ok(())
            }
            Err(e) => {
                warn!(key = %key, error = %e, "blob removal failed");
                Err(e)
            }
        }
    }

    /// Remove many blobs concurrently, reporting each outcome
    pub async fn remove_all(&self, keys: &[StorageKey]) -> Vec<(StorageKey, BlobResult<()>)> {
        let results = join_all(keys.iter().map(|key| self.remove(key))).await;
        keys.iter().cloned().zip(results).collect()
    }
}
