//! Deleting entries and single images
//!
//! Blobs always go first. A blob left behind after its row is gone is lost
//! storage; a row left behind after its blob is gone is a dead link that the
//! owner can still delete. The row store's cascade never reaches the blob
//! store, so entry deletion removes every blob explicitly.

use crate::application::refresh::{RefreshClock, RefreshToken};
use crate::domain::{EntryId, Image, ImageId, StorageKey, UserId};
use crate::error::{Result, StoreResult, VjourError};
use crate::infrastructure::deadline::within;
use crate::infrastructure::Backend;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDeletion {
    pub entry: EntryId,
    pub images_removed: usize,
    /// Blobs whose removal failed; they stay in storage
    pub leaked_blobs: Vec<StorageKey>,
    pub refresh: RefreshToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDeletion {
    pub image: Image,
    pub blob_leaked: bool,
    pub refresh: RefreshToken,
}

pub struct DeletionService {
    backend: Backend,
    refresh: RefreshClock,
}

impl DeletionService {
    pub fn new(backend: Backend, refresh: RefreshClock) -> Self {
        DeletionService { backend, refresh }
    }

    /// Delete an entry, its image rows and (best effort) its blobs
    pub async fn delete_entry(&self, owner: &UserId, entry_id: &EntryId) -> Result<EntryDeletion> {
        let backend = &self.backend;
        let entry = within(backend.timeout, "get entry", backend.records.get_entry(entry_id)).await?;
        if !entry.is_owned_by(owner) {
            return Err(VjourError::NotOwner(format!(
                "entry {} belongs to another user",
                entry_id
            )));
        }

        let images = within(
            backend.timeout,
            "list images",
            backend.records.images_for_entry(entry_id),
        )
        .await?;
        let keys: Vec<StorageKey> = images.iter().map(|img| img.storage_path.clone()).collect();

        let leaked_blobs: Vec<StorageKey> = backend
            .blobs
            .remove_all(&keys)
            .await
            .into_iter()
            .filter_map(|(key, result)| result.err().map(|_| key))
            .collect();
        if !leaked_blobs.is_empty() {
            warn!(
                entry = %entry_id,
                leaked = leaked_blobs.len(),
                "deleting entry despite blob removal failures"
            );
        }

        // Cascade removes the image rows
        within(backend.timeout, "delete entry", backend.records.delete_entry(entry_id)).await?;
        info!(entry = %entry_id, images = images.len(), "entry deleted");

        Ok(EntryDeletion {
            entry: *entry_id,
            images_removed: images.len(),
            leaked_blobs,
            refresh: self.refresh.bump(),
        })
    }

    /// Delete one image of an entry; the entry and its other images stay
    pub async fn delete_image(&self, owner: &UserId, image_id: &ImageId) -> Result<ImageDeletion> {
        let backend = &self.backend;
        let image = within(backend.timeout, "get image", backend.records.get_image(image_id)).await?;
        let entry = within(
            backend.timeout,
            "get entry",
            backend.records.get_entry(&image.entry_id),
        )
        .await?;
        if !entry.is_owned_by(owner) {
            return Err(VjourError::NotOwner(format!(
                "image {} belongs to another user",
                image_id
            )));
        }

        let blob_removed = remove_image(backend, &image).await?;
        info!(image = %image_id, entry = %entry.id, "image deleted");

        Ok(ImageDeletion {
            image,
            blob_leaked: !blob_removed,
            refresh: self.refresh.bump(),
        })
    }
}

/// Blob first, then row. Returns whether the blob went away; a blob failure
/// is logged and does not stop the row deletion.
pub(crate) async fn remove_image(backend: &Backend, image: &Image) -> StoreResult<bool> {
    let blob_removed = match backend.blobs.remove(&image.storage_path).await {
        Ok(()) => true,
        Err(e) => {
            warn!(image = %image.id, key = %image.storage_path, error = %e, "image blob left behind");
            false
        }
    };

    within(
        backend.timeout,
        "delete image row",
        backend.records.delete_image(&image.id),
    )
    .await?;

    Ok(blob_removed)
}
