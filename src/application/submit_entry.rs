//! Creating and editing entries together with their images
//!
//! Ordering rules: the entry row exists before any blob is uploaded (keys are
//! namespaced by entry id), a blob exists before its image row, and blobs are
//! removed before their image rows. Every failure after the first successful
//! mutation is reported as partial success rather than rolled back.

use crate::application::delete_entry::remove_image;
use crate::application::refresh::{RefreshClock, RefreshToken};
use crate::domain::{
    reconcile, Draft, Entry, EntryId, EntryPatch, EntryWithDetails, Image, ImageId, ImagePayload, NewEntry,
    NewImage, StorageKey, SubmitMode, SubmitRequest, UserId,
};
use crate::error::{BlobError, Result, StoreError, VjourError};
use crate::infrastructure::deadline::within;
use crate::infrastructure::{Backend, UploadedBlob};
use futures::future::join_all;
use tracing::{info, warn};

/// A new image that did not make it into the blob store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    pub file_name: String,
    pub error: BlobError,
}

/// Non-fatal problems after the entry itself was saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitWarning {
    /// Uploaded blobs whose rows could not be inserted. The blobs listed in
    /// `leaked` could not be cleaned up either.
    ImageRowsNotSaved {
        uploaded: usize,
        leaked: Vec<StorageKey>,
        error: StoreError,
    },
    /// An image dropped from the draft is still attached to the entry
    ImageNotRemoved { image: ImageId, error: StoreError },
    /// An image row is gone but its blob stayed in storage
    BlobLeftBehind { image: ImageId, key: StorageKey },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub entry: Entry,
    pub added: Vec<Image>,
    pub removed: Vec<ImageId>,
    pub upload_failures: Vec<UploadFailure>,
    pub warnings: Vec<SubmitWarning>,
    pub refresh: RefreshToken,
}

impl SubmitOutcome {
    /// Everything the draft asked for was persisted
    pub fn is_complete(&self) -> bool {
        self.upload_failures.is_empty()
            && !self
                .warnings
                .iter()
                .any(|w| !matches!(w, SubmitWarning::BlobLeftBehind { .. }))
    }

    /// Whether an edit retry could save what is missing. Rejected payloads
    /// (wrong type, too large) fail the same way again.
    pub fn worth_retrying(&self) -> bool {
        self.upload_failures.iter().any(|f| f.error.is_transient())
            || self
                .warnings
                .iter()
                .any(|w| !matches!(w, SubmitWarning::BlobLeftBehind { .. }))
    }

    /// Mode for a retry: the entry exists now, so further attempts edit it
    pub fn next_mode(&self) -> SubmitMode {
        SubmitMode::Edit(self.entry.id)
    }
}

#[derive(Default)]
struct Attached {
    images: Vec<Image>,
    failures: Vec<UploadFailure>,
    warnings: Vec<SubmitWarning>,
}

pub struct SubmitEntryService {
    backend: Backend,
    refresh: RefreshClock,
}

impl SubmitEntryService {
    pub fn new(backend: Backend, refresh: RefreshClock) -> Self {
        SubmitEntryService { backend, refresh }
    }

    /// Draft prefilled from a persisted entry, for editing
    pub async fn draft_for(&self, entry_id: &EntryId) -> Result<Draft> {
        let backend = &self.backend;
        let entry = within(backend.timeout, "get entry", backend.records.get_entry(entry_id)).await?;
        let images = within(
            backend.timeout,
            "list images",
            backend.records.images_for_entry(entry_id),
        )
        .await?;

        Ok(Draft::from_entry(&EntryWithDetails {
            entry,
            profile: None,
            images,
        }))
    }

    /// Persist a draft. Validation happens before any store is touched.
    pub async fn submit(&self, owner: &UserId, request: SubmitRequest) -> Result<SubmitOutcome> {
        let limits = *self.backend.blobs.limits();
        request.draft.validate(request.mode, &limits)?;

        match request.mode {
            SubmitMode::Create => self.create(owner, &request.draft).await,
            SubmitMode::Edit(entry_id) => self.edit(owner, &entry_id, &request.draft).await,
        }
    }

    async fn create(&self, owner: &UserId, draft: &Draft) -> Result<SubmitOutcome> {
        let backend = &self.backend;
        let new_entry = NewEntry {
            user_id: *owner,
            content: draft.trimmed_content().to_string(),
            date: draft.date,
        };
        let entry = within(backend.timeout, "insert entry", backend.records.insert_entry(new_entry))
            .await?;
        info!(entry = %entry.id, date = %entry.date, "entry created");

        let attached = self.attach(owner, &entry.id, &draft.new_payloads()).await;

        Ok(SubmitOutcome {
            entry,
            added: attached.images,
            removed: Vec::new(),
            upload_failures: attached.failures,
            warnings: attached.warnings,
            refresh: self.refresh.bump(),
        })
    }

    async fn edit(&self, owner: &UserId, entry_id: &EntryId, draft: &Draft) -> Result<SubmitOutcome> {
        let backend = &self.backend;
        let mut entry = within(backend.timeout, "get entry", backend.records.get_entry(entry_id)).await?;
        if !entry.is_owned_by(owner) {
            return Err(VjourError::NotOwner(format!(
                "entry {} belongs to another user",
                entry_id
            )));
        }

        let persisted = within(
            backend.timeout,
            "list images",
            backend.records.images_for_entry(entry_id),
        )
        .await?;
        let plan = reconcile(&persisted, draft)?;

        let patch = EntryPatch {
            content: Some(draft.trimmed_content().to_string()),
            date: Some(draft.date),
        };
        within(
            backend.timeout,
            "update entry",
            backend.records.update_entry(entry_id, patch.clone()),
        )
        .await?;
        patch.apply(&mut entry);
        info!(entry = %entry.id, "entry updated");

        let mut removed = Vec::new();
        let mut warnings = Vec::new();
        let removals = join_all(plan.removals.iter().map(|img| remove_image(backend, img))).await;
        for (image, result) in plan.removals.iter().zip(removals) {
            match result {
                Ok(blob_removed) => {
                    removed.push(image.id);
                    if !blob_removed {
                        warnings.push(SubmitWarning::BlobLeftBehind {
                            image: image.id,
                            key: image.storage_path.clone(),
                        });
                    }
                }
                Err(error) => {
                    warn!(image = %image.id, error = %error, "image removal failed during edit");
                    warnings.push(SubmitWarning::ImageNotRemoved {
                        image: image.id,
                        error,
                    });
                }
            }
        }

        let mut attached = self.attach(owner, entry_id, &plan.uploads).await;
        warnings.append(&mut attached.warnings);

        Ok(SubmitOutcome {
            entry,
            added: attached.images,
            removed,
            upload_failures: attached.failures,
            warnings,
            refresh: self.refresh.bump(),
        })
    }

    /// Upload payloads concurrently, then insert one row per successful
    /// upload in a single batch. If the batch fails the fresh blobs are
    /// removed again so nothing unreferenced stays in storage.
    async fn attach(&self, owner: &UserId, entry_id: &EntryId, payloads: &[&ImagePayload]) -> Attached {
        let mut attached = Attached::default();
        if payloads.is_empty() {
            return attached;
        }

        let backend = &self.backend;
        let results = join_all(
            payloads
                .iter()
                .map(|payload| backend.blobs.upload(owner, entry_id, payload)),
        )
        .await;

        let mut uploaded: Vec<UploadedBlob> = Vec::new();
        for (payload, result) in payloads.iter().zip(results) {
            match result {
                Ok(blob) => uploaded.push(blob),
                Err(error) => {
                    warn!(entry = %entry_id, file = %payload.file_name, error = %error, "image upload failed");
                    attached.failures.push(UploadFailure {
                        file_name: payload.file_name.clone(),
                        error,
                    });
                }
            }
        }
        if uploaded.is_empty() {
            return attached;
        }

        let rows: Vec<NewImage> = uploaded
            .iter()
            .map(|blob| NewImage {
                entry_id: *entry_id,
                url: blob.public_url.clone(),
                storage_path: blob.storage_key.clone(),
            })
            .collect();

        match within(backend.timeout, "insert images", backend.records.insert_images(rows)).await {
            Ok(images) => {
                info!(entry = %entry_id, count = images.len(), "images attached");
                attached.images = images;
            }
            Err(error) => {
                warn!(entry = %entry_id, error = %error, "image rows not saved, removing uploaded blobs");
                let keys: Vec<StorageKey> = uploaded.into_iter().map(|b| b.storage_key).collect();
                let leaked = backend
                    .blobs
                    .remove_all(&keys)
                    .await
                    .into_iter()
                    .filter_map(|(key, result)| result.err().map(|_| key))
                    .collect();
                attached.warnings.push(SubmitWarning::ImageRowsNotSaved {
                    uploaded: keys.len(),
                    leaked,
                    error,
                });
            }
        }

        attached
    }
}
