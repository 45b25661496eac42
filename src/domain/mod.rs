//! Domain layer - Journal records, drafts and pure helpers

pub mod draft;
pub mod linkify;
pub mod record;
pub mod storage_key;
pub mod time_ref;

pub use draft::{
    reconcile, Draft, ImageLimits, ImagePayload, ImagePlan, PendingImage, SubmitMode,
    SubmitRequest,
};
pub use record::{
    Entry, EntryFilter, EntryId, EntryPatch, EntryWithDetails, Image, ImageId, NewEntry, NewImage,
    Profile, UserId,
};
pub use storage_key::StorageKey;
pub use time_ref::{day_label, TimeReference};
