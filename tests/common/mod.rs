#![allow(dead_code)]

use assert_cmd::Command;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use vjour::domain::{
    Entry, EntryFilter, EntryId, EntryPatch, EntryWithDetails, Image, ImageId, ImagePayload,
    NewEntry, NewImage, PendingImage, Profile, StorageKey, UserId,
};
use vjour::error::{BlobError, BlobResult, StoreError, StoreResult};
use vjour::infrastructure::{
    Backend, BlobStore, InMemoryBlobStore, InMemoryRecordStore, RecordStore,
};

pub fn vjour_cmd() -> Command {
    let mut cmd = Command::cargo_bin("vjour").unwrap();
    cmd.env_remove("VJOUR_ROOT");
    cmd.env_remove("VJOUR_USER");
    cmd.env_remove("VJOUR_LOG");
    cmd
}

pub fn png(name: &str) -> PendingImage {
    PendingImage::New(ImagePayload::new(name, "image/png", vec![0x89, b'P', b'N', b'G']))
}

/// Blob store wrapper that fails chosen uploads and removals
pub struct FlakyBlobStore {
    pub inner: InMemoryBlobStore,
    failing_uploads: Mutex<HashSet<String>>,
    failing_removals: Mutex<HashSet<StorageKey>>,
    pub removal_attempts: AtomicUsize,
}

impl FlakyBlobStore {
    pub fn new() -> Self {
        FlakyBlobStore {
            inner: InMemoryBlobStore::new("https://cdn.test"),
            failing_uploads: Mutex::new(HashSet::new()),
            failing_removals: Mutex::new(HashSet::new()),
            removal_attempts: AtomicUsize::new(0),
        }
    }

    /// Uploads of payloads with this file name fail
    pub fn fail_upload_of(&self, file_name: &str) {
        self.failing_uploads
            .lock()
            .unwrap()
            .insert(file_name.to_string());
    }

    pub fn fail_removal_of(&self, key: &StorageKey) {
        self.failing_removals.lock().unwrap().insert(key.clone());
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn put(&self, key: &StorageKey, payload: &ImagePayload) -> BlobResult<()> {
        if self.failing_uploads.lock().unwrap().contains(&payload.file_name) {
            return Err(BlobError::Unavailable(format!("upload of {} failed", payload.file_name)));
        }
        self.inner.put(key, payload).await
    }

    async fn remove(&self, key: &StorageKey) -> BlobResult<()> {
        self.removal_attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing_removals.lock().unwrap().contains(key) {
            return Err(BlobError::Unavailable(format!("removal of {} failed", key)));
        }
        self.inner.remove(key).await
    }

    fn public_url_for(&self, key: &StorageKey) -> String {
        self.inner.public_url_for(key)
    }
}

/// Record store wrapper that counts calls and fails chosen operations
#[derive(Default)]
pub struct FlakyRecordStore {
    pub inner: InMemoryRecordStore,
    pub calls: AtomicUsize,
    pub fail_image_insert: AtomicBool,
    pub fail_image_delete: AtomicBool,
    pub fail_entry_update: AtomicBool,
    pub fail_select: AtomicBool,
}

impl FlakyRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn call(&self, flag: Option<&AtomicBool>, operation: &str) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match flag {
            Some(flag) if flag.load(Ordering::SeqCst) => {
                Err(StoreError::Unavailable(format!("{} failed", operation)))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for FlakyRecordStore {
    async fn insert_entry(&self, entry: NewEntry) -> StoreResult<Entry> {
        self.call(None, "insert entry")?;
        self.inner.insert_entry(entry).await
    }

    async fn update_entry(&self, id: &EntryId, patch: EntryPatch) -> StoreResult<()> {
        self.call(Some(&self.fail_entry_update), "update entry")?;
        self.inner.update_entry(id, patch).await
    }

    async fn delete_entry(&self, id: &EntryId) -> StoreResult<()> {
        self.call(None, "delete entry")?;
        self.inner.delete_entry(id).await
    }

    async fn get_entry(&self, id: &EntryId) -> StoreResult<Entry> {
        self.call(None, "get entry")?;
        self.inner.get_entry(id).await
    }

    async fn insert_images(&self, images: Vec<NewImage>) -> StoreResult<Vec<Image>> {
        self.call(Some(&self.fail_image_insert), "insert images")?;
        self.inner.insert_images(images).await
    }

    async fn get_image(&self, id: &ImageId) -> StoreResult<Image> {
        self.call(None, "get image")?;
        self.inner.get_image(id).await
    }

    async fn delete_image(&self, id: &ImageId) -> StoreResult<()> {
        self.call(Some(&self.fail_image_delete), "delete image")?;
        self.inner.delete_image(id).await
    }

    async fn images_for_entry(&self, entry: &EntryId) -> StoreResult<Vec<Image>> {
        self.call(None, "list images")?;
        self.inner.images_for_entry(entry).await
    }

    async fn select_entries(&self, filter: &EntryFilter) -> StoreResult<Vec<EntryWithDetails>> {
        self.call(Some(&self.fail_select), "select entries")?;
        self.inner.select_entries(filter).await
    }

    async fn upsert_profile(&self, profile: Profile) -> StoreResult<Profile> {
        self.call(None, "upsert profile")?;
        self.inner.upsert_profile(profile).await
    }

    async fn get_profile(&self, id: &UserId) -> StoreResult<Profile> {
        self.call(None, "get profile")?;
        self.inner.get_profile(id).await
    }
}

/// Backend over the two fault-injecting stores
pub struct Harness {
    pub records: Arc<FlakyRecordStore>,
    pub blobs: Arc<FlakyBlobStore>,
    pub backend: Backend,
    pub owner: UserId,
}

impl Harness {
    pub fn new() -> Self {
        let records = Arc::new(FlakyRecordStore::new());
        let blobs = Arc::new(FlakyBlobStore::new());
        let backend = Backend::with_defaults(records.clone(), blobs.clone());
        Harness {
            records,
            blobs,
            backend,
            owner: UserId::new(),
        }
    }
}
