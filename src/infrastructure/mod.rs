//! Infrastructure layer - Stores, configuration and identity

pub mod backend;
pub mod blob_store;
pub mod config;
pub mod deadline;
pub mod filesystem;
pub mod identity;
pub mod memory;
pub mod record_store;
pub mod repository;

pub use backend::Backend;
pub use blob_store::{BlobClient, BlobStore, UploadedBlob};
pub use config::Config;
pub use filesystem::{FileSystemBlobStore, FileSystemRecordStore};
pub use identity::{ConfigIdentity, CurrentUser, IdentityProvider, StaticIdentity};
pub use memory::{InMemoryBlobStore, InMemoryRecordStore};
pub use record_store::{RecordStore, Tables};
pub use repository::{FileSystemRepository, JournalRepository};
