//! In-memory record and blob stores
//!
//! Intended for tests and embedding. State lives behind `RwLock`s that are
//! never held across an await point.

use crate::domain::{
    Entry, EntryFilter, EntryId, EntryPatch, EntryWithDetails, Image, ImageId, ImagePayload,
    NewEntry, NewImage, Profile, StorageKey, UserId,
};
use crate::error::{BlobError, BlobResult, StoreResult};
use crate::infrastructure::blob_store::BlobStore;
use crate::infrastructure::record_store::{RecordStore, Tables};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// `Tables` behind a lock
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    tables: RwLock<Tables>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current tables, for assertions
    pub fn snapshot(&self) -> Tables {
        self.tables.read().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert_entry(&self, entry: NewEntry) -> StoreResult<Entry> {
        Ok(self.tables.write().expect("lock poisoned").insert_entry(entry))
    }

    async fn update_entry(&self, id: &EntryId, patch: EntryPatch) -> StoreResult<()> {
        self.tables
            .write()
            .expect("lock poisoned")
            .update_entry(id, &patch)
    }

    async fn delete_entry(&self, id: &EntryId) -> StoreResult<()> {
        self.tables.write().expect("lock poisoned").delete_entry(id)
    }

    async fn get_entry(&self, id: &EntryId) -> StoreResult<Entry> {
        self.tables.read().expect("lock poisoned").entry(id)
    }

    async fn insert_images(&self, images: Vec<NewImage>) -> StoreResult<Vec<Image>> {
        self.tables
            .write()
            .expect("lock poisoned")
            .insert_images(images)
    }

    async fn get_image(&self, id: &ImageId) -> StoreResult<Image> {
        self.tables.read().expect("lock poisoned").image(id)
    }

    async fn delete_image(&self, id: &ImageId) -> StoreResult<()> {
        self.tables.write().expect("lock poisoned").delete_image(id)
    }

    async fn images_for_entry(&self, entry: &EntryId) -> StoreResult<Vec<Image>> {
        Ok(self.tables.read().expect("lock poisoned").images_for(entry))
    }

    async fn select_entries(&self, filter: &EntryFilter) -> StoreResult<Vec<EntryWithDetails>> {
        Ok(self.tables.read().expect("lock poisoned").select(filter))
    }

    async fn upsert_profile(&self, profile: Profile) -> StoreResult<Profile> {
        Ok(self
            .tables
            .write()
            .expect("lock poisoned")
            .upsert_profile(profile))
    }

    async fn get_profile(&self, id: &UserId) -> StoreResult<Profile> {
        self.tables.read().expect("lock poisoned").profile(id)
    }
}

/// HashMap-backed blob store
#[derive(Debug)]
pub struct InMemoryBlobStore {
    base_url: String,
    blobs: RwLock<HashMap<StorageKey, ImagePayload>>,
}

impl InMemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        InMemoryBlobStore {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            blobs: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    pub fn contains(&self, key: &StorageKey) -> bool {
        self.blobs.read().expect("lock poisoned").contains_key(key)
    }

    /// Sorted list of all stored keys
    pub fn keys(&self) -> Vec<StorageKey> {
        let mut keys: Vec<StorageKey> = self
            .blobs
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &StorageKey, payload: &ImagePayload) -> BlobResult<()> {
        let mut blobs = self.blobs.write().expect("lock poisoned");
        if blobs.contains_key(key) {
            return Err(BlobError::Conflict(key.to_string()));
        }
        blobs.insert(key.clone(), payload.clone());
        Ok(())
    }

    async fn remove(&self, key: &StorageKey) -> BlobResult<()> {
        match self.blobs.write().expect("lock poisoned").remove(key) {
            Some(_) => Ok(()),
            None => Err(BlobError::NotFound(key.to_string())),
        }
    }

    fn public_url_for(&self, key: &StorageKey) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_record_store_round_trip() {
        let store = InMemoryRecordStore::new();
        let user = UserId::new();
        let entry = store
            .insert_entry(NewEntry {
                user_id: user,
                content: "hello".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 1, 17).unwrap(),
            })
            .await
            .unwrap();

        store
            .update_entry(
                &entry.id,
                EntryPatch {
                    content: Some("bye".to_string()),
                    date: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(store.get_entry(&entry.id).await.unwrap().content, "bye");
        assert_eq!(store.snapshot().entries.len(), 1);
    }

    #[tokio::test]
    async fn test_blob_put_never_overwrites() {
        let store = InMemoryBlobStore::new("https://cdn.test/");
        let key = StorageKey::generate(&UserId::new(), &EntryId::new(), "png");
        let payload = ImagePayload::new("a.png", "image/png", vec![1]);

        store.put(&key, &payload).await.unwrap();
        assert!(matches!(
            store.put(&key, &payload).await,
            Err(BlobError::Conflict(_))
        ));
        assert_eq!(store.public_url_for(&key), format!("https://cdn.test/{}", key));
    }

    #[tokio::test]
    async fn test_blob_remove_missing_reports_not_found() {
        let store = InMemoryBlobStore::new("https://cdn.test");
        let key = StorageKey::generate(&UserId::new(), &EntryId::new(), "png");
        assert!(matches!(
            store.remove(&key).await,
            Err(BlobError::NotFound(_))
        ));
    }
}
