//! Wiring of the two stores used by the coordinators

use crate::domain::ImageLimits;
use crate::infrastructure::blob_store::{BlobClient, BlobStore};
use crate::infrastructure::config::Config;
use crate::infrastructure::deadline::DEFAULT_STORE_TIMEOUT;
use crate::infrastructure::filesystem::{FileSystemBlobStore, FileSystemRecordStore};
use crate::infrastructure::record_store::RecordStore;
use crate::infrastructure::repository::FileSystemRepository;
use std::sync::Arc;
use std::time::Duration;

/// Record store plus blob client, sharing one per-call deadline
#[derive(Clone)]
pub struct Backend {
    pub records: Arc<dyn RecordStore>,
    pub blobs: BlobClient,
    pub timeout: Duration,
}

impl Backend {
    pub fn new(
        records: Arc<dyn RecordStore>,
        blob_store: Arc<dyn BlobStore>,
        limits: ImageLimits,
        timeout: Duration,
    ) -> Self {
        Backend {
            records,
            blobs: BlobClient::new(blob_store, limits, timeout),
            timeout,
        }
    }

    /// Default limits and deadline
    pub fn with_defaults(records: Arc<dyn RecordStore>, blob_store: Arc<dyn BlobStore>) -> Self {
        Self::new(records, blob_store, ImageLimits::default(), DEFAULT_STORE_TIMEOUT)
    }

    /// Stores kept inside a journal directory
    pub fn open(repo: &FileSystemRepository, config: &Config) -> Self {
        let records = Arc::new(FileSystemRecordStore::new(repo.records_path()));
        let blobs = Arc::new(FileSystemBlobStore::new(
            repo.blobs_dir(),
            config.storage.public_base_url.clone(),
        ));
        Self::new(records, blobs, config.image_limits(), config.store_timeout())
    }
}
