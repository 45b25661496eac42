//! Application layer - Use cases and orchestration

pub mod delete_entry;
pub mod feed;
pub mod init;
pub mod manage_config;
pub mod refresh;
pub mod submit_entry;

pub use delete_entry::{DeletionService, EntryDeletion, ImageDeletion};
pub use feed::{FeedLoader, FeedView};
pub use manage_config::ConfigService;
pub use refresh::{RefreshClock, RefreshToken};
pub use submit_entry::{SubmitEntryService, SubmitOutcome, SubmitWarning, UploadFailure};

use crate::infrastructure::Backend;

/// The coordinators over one backend, sharing a refresh clock
pub struct Journal {
    pub submit: SubmitEntryService,
    pub deletion: DeletionService,
    pub feed: FeedLoader,
    pub refresh: RefreshClock,
}

impl Journal {
    pub fn new(backend: Backend) -> Self {
        let refresh = RefreshClock::new();
        Journal {
            submit: SubmitEntryService::new(backend.clone(), refresh.clone()),
            deletion: DeletionService::new(backend.clone(), refresh.clone()),
            feed: FeedLoader::new(&backend),
            refresh,
        }
    }
}
