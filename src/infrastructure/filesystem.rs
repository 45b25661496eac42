//! File system backed stores living under `.vjour/`

use crate::domain::{
    Entry, EntryFilter, EntryId, EntryPatch, EntryWithDetails, Image, ImageId, ImagePayload,
    NewEntry, NewImage, Profile, StorageKey, UserId,
};
use crate::error::{BlobError, BlobResult, StoreError, StoreResult};
use crate::infrastructure::blob_store::BlobStore;
use crate::infrastructure::record_store::{RecordStore, Tables};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// All rows in one TOML file, rewritten on every mutation
#[derive(Debug)]
pub struct FileSystemRecordStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSystemRecordStore {
    pub fn new(path: PathBuf) -> Self {
        FileSystemRecordStore {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> StoreResult<Tables> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => toml::from_str(&contents).map_err(|e| {
                StoreError::Corrupt(format!("{}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Tables::default()),
            Err(e) => Err(StoreError::Unavailable(e.to_string())),
        }
    }

    /// Write to a temp file next to the target, then rename into place
    async fn save(&self, tables: &Tables) -> StoreResult<()> {
        let contents = toml::to_string_pretty(tables)
            .map_err(|e| StoreError::Corrupt(format!("cannot serialize records: {}", e)))?;

        let tmp_path = self
            .path
            .with_extension(format!("toml.vjour-tmp-{}", std::process::id()));
        fs::write(&tmp_path, contents)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn read<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Tables) -> StoreResult<T> + Send,
    {
        let _guard = self.lock.lock().await;
        let tables = self.load().await?;
        f(&tables)
    }

    async fn write<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Tables) -> StoreResult<T> + Send,
        T: Send,
    {
        let _guard = self.lock.lock().await;
        let mut tables = self.load().await?;
        let out = f(&mut tables)?;
        self.save(&tables).await?;
        Ok(out)
    }
}

#[async_trait]
impl RecordStore for FileSystemRecordStore {
    async fn insert_entry(&self, entry: NewEntry) -> StoreResult<Entry> {
        self.write(|t| Ok(t.insert_entry(entry))).await
    }

    async fn update_entry(&self, id: &EntryId, patch: EntryPatch) -> StoreResult<()> {
        self.write(|t| t.update_entry(id, &patch)).await
    }

    async fn delete_entry(&self, id: &EntryId) -> StoreResult<()> {
        self.write(|t| t.delete_entry(id)).await
    }

    async fn get_entry(&self, id: &EntryId) -> StoreResult<Entry> {
        self.read(|t| t.entry(id)).await
    }

    async fn insert_images(&self, images: Vec<NewImage>) -> StoreResult<Vec<Image>> {
        self.write(|t| t.insert_images(images)).await
    }

    async fn get_image(&self, id: &ImageId) -> StoreResult<Image> {
        self.read(|t| t.image(id)).await
    }

    async fn delete_image(&self, id: &ImageId) -> StoreResult<()> {
        self.write(|t| t.delete_image(id)).await
    }

    async fn images_for_entry(&self, entry: &EntryId) -> StoreResult<Vec<Image>> {
        self.read(|t| Ok(t.images_for(entry))).await
    }

    async fn select_entries(&self, filter: &EntryFilter) -> StoreResult<Vec<EntryWithDetails>> {
        self.read(|t| Ok(t.select(filter))).await
    }

    async fn upsert_profile(&self, profile: Profile) -> StoreResult<Profile> {
        self.write(|t| Ok(t.upsert_profile(profile))).await
    }

    async fn get_profile(&self, id: &UserId) -> StoreResult<Profile> {
        self.read(|t| t.profile(id)).await
    }
}

/// One file per blob, at `<root>/<storage key>`
#[derive(Debug, Clone)]
pub struct FileSystemBlobStore {
    root: PathBuf,
    base_url: String,
}

impl FileSystemBlobStore {
    /// Without a base URL, blobs are addressed with `file://` URLs
    pub fn new(root: PathBuf, base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("file://{}", root.display()));
        FileSystemBlobStore { root, base_url }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &StorageKey) -> BlobResult<PathBuf> {
        StorageKey::parse(key.as_str()).map_err(BlobError::InvalidKey)?;
        Ok(key.as_str().split('/').fold(self.root.clone(), |p, s| p.join(s)))
    }
}

fn unavailable(e: std::io::Error) -> BlobError {
    BlobError::Unavailable(e.to_string())
}

#[async_trait]
impl BlobStore for FileSystemBlobStore {
    async fn put(&self, key: &StorageKey, payload: &ImagePayload) -> BlobResult<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(unavailable)?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => BlobError::Conflict(key.to_string()),
                _ => unavailable(e),
            })?;
        file.write_all(&payload.bytes).await.map_err(unavailable)?;
        file.flush().await.map_err(unavailable)?;

        debug!(path = %path.display(), "blob written");
        Ok(())
    }

    async fn remove(&self, key: &StorageKey) -> BlobResult<()> {
        let path = self.path_for(key)?;
        fs::remove_file(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => BlobError::NotFound(key.to_string()),
            _ => unavailable(e),
        })
    }

    fn public_url_for(&self, key: &StorageKey) -> String {
        format!("{}/{}", self.base_url, key)
    }
}
