//! Drafts of entries being created or edited, and image reconciliation

use crate::domain::{EntryId, EntryWithDetails, Image, ImageId, StorageKey};
use crate::error::{BlobError, Result, VjourError};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

/// Default ceiling for a single image (10 MiB)
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Default number of images allowed on one entry
pub const DEFAULT_MAX_IMAGES: usize = 9;

/// Raw bytes of an image that has not been uploaded yet
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        ImagePayload {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, guessing its content type from the extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(ImagePayload::new(file_name, content_type, bytes))
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Upload constraints applied to every payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLimits {
    pub max_bytes: u64,
    pub max_images: usize,
}

impl Default for ImageLimits {
    fn default() -> Self {
        ImageLimits {
            max_bytes: DEFAULT_MAX_IMAGE_BYTES,
            max_images: DEFAULT_MAX_IMAGES,
        }
    }
}

impl ImageLimits {
    pub fn check(&self, payload: &ImagePayload) -> std::result::Result<(), BlobError> {
        if !payload.is_image() {
            return Err(BlobError::NotAnImage {
                file_name: payload.file_name.clone(),
                content_type: payload.content_type.clone(),
            });
        }
        if payload.len() > self.max_bytes {
            return Err(BlobError::TooLarge {
                size: payload.len(),
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// An image in a draft: either new bytes or a reference to a persisted image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingImage {
    New(ImagePayload),
    Existing { id: ImageId, storage_path: StorageKey },
}

impl PendingImage {
    pub fn existing(image: &Image) -> Self {
        PendingImage::Existing {
            id: image.id,
            storage_path: image.storage_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    Create,
    Edit(EntryId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub content: String,
    pub date: NaiveDate,
    pub images: Vec<PendingImage>,
}

impl Draft {
    pub fn new(content: impl Into<String>, date: NaiveDate) -> Self {
        Draft {
            content: content.into(),
            date,
            images: Vec::new(),
        }
    }

    /// Prefill a draft from a persisted entry, for editing
    pub fn from_entry(details: &EntryWithDetails) -> Self {
        Draft {
            content: details.entry.content.clone(),
            date: details.entry.date,
            images: details.images.iter().map(PendingImage::existing).collect(),
        }
    }

    pub fn with_image(mut self, image: PendingImage) -> Self {
        self.images.push(image);
        self
    }

    /// Drop an existing image from the draft; returns whether it was present
    pub fn remove_image(&mut self, id: &ImageId) -> bool {
        let before = self.images.len();
        self.images
            .retain(|img| !matches!(img, PendingImage::Existing { id: existing, .. } if existing == id));
        self.images.len() != before
    }

    pub fn trimmed_content(&self) -> &str {
        self.content.trim()
    }

    /// No text and no images: nothing worth persisting
    pub fn is_blank(&self) -> bool {
        self.trimmed_content().is_empty() && self.images.is_empty()
    }

    /// Checks that need no remote call
    pub fn validate(&self, mode: SubmitMode, limits: &ImageLimits) -> Result<()> {
        if self.is_blank() {
            return Err(VjourError::Validation(
                "Entry needs some text or at least one image".to_string(),
            ));
        }
        if self.images.len() > limits.max_images {
            return Err(VjourError::Validation(format!(
                "Too many images: {} (at most {})",
                self.images.len(),
                limits.max_images
            )));
        }
        if mode == SubmitMode::Create
            && self
                .images
                .iter()
                .any(|img| matches!(img, PendingImage::Existing { .. }))
        {
            return Err(VjourError::Validation(
                "A new entry cannot reference existing images".to_string(),
            ));
        }
        Ok(())
    }

    pub fn new_payloads(&self) -> Vec<&ImagePayload> {
        self.images
            .iter()
            .filter_map(|img| match img {
                PendingImage::New(payload) => Some(payload),
                PendingImage::Existing { .. } => None,
            })
            .collect()
    }
}

/// A draft submission together with its mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub mode: SubmitMode,
    pub draft: Draft,
}

impl SubmitRequest {
    pub fn create(draft: Draft) -> Self {
        SubmitRequest {
            mode: SubmitMode::Create,
            draft,
        }
    }

    pub fn edit(entry_id: EntryId, draft: Draft) -> Self {
        SubmitRequest {
            mode: SubmitMode::Edit(entry_id),
            draft,
        }
    }
}

/// What has to happen to an entry's images to match a draft
#[derive(Debug)]
pub struct ImagePlan<'a> {
    pub uploads: Vec<&'a ImagePayload>,
    pub removals: Vec<Image>,
    pub kept: Vec<ImageId>,
}

/// Diff the persisted images of an entry against a draft.
///
/// Every `Existing` image in the draft must be one of `persisted`; anything
/// persisted but absent from the draft is scheduled for removal.
pub fn reconcile<'a>(persisted: &[Image], draft: &'a Draft) -> Result<ImagePlan<'a>> {
    let known: HashSet<ImageId> = persisted.iter().map(|img| img.id).collect();
    let mut kept = Vec::new();
    let mut uploads = Vec::new();

    for image in &draft.images {
        match image {
            PendingImage::New(payload) => uploads.push(payload),
            PendingImage::Existing { id, .. } => {
                if !known.contains(id) {
                    return Err(VjourError::Validation(format!(
                        "Image {} does not belong to this entry",
                        id
                    )));
                }
                if !kept.contains(id) {
                    kept.push(*id);
                }
            }
        }
    }

    let removals = persisted
        .iter()
        .filter(|img| !kept.contains(&img.id))
        .cloned()
        .collect();

    Ok(ImagePlan {
        uploads,
        removals,
        kept,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use chrono::Utc;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 17).unwrap()
    }

    fn png(name: &str) -> ImagePayload {
        ImagePayload::new(name, "image/png", vec![0x89, b'P', b'N', b'G'])
    }

    fn persisted_image(entry: EntryId) -> Image {
        let id = ImageId::new();
        Image {
            id,
            entry_id: entry,
            url: format!("https://cdn.test/{}", id),
            storage_path: StorageKey::generate(&UserId::new(), &entry, "jpg"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_blank_draft_is_rejected() {
        let draft = Draft::new("   \n\t", day());
        let err = draft
            .validate(SubmitMode::Create, &ImageLimits::default())
            .unwrap_err();
        assert!(matches!(err, VjourError::Validation(_)));
    }

    #[test]
    fn test_images_only_draft_is_valid() {
        let draft = Draft::new("", day()).with_image(PendingImage::New(png("a.png")));
        assert!(draft.validate(SubmitMode::Create, &ImageLimits::default()).is_ok());
    }

    #[test]
    fn test_too_many_images_rejected() {
        let limits = ImageLimits {
            max_bytes: DEFAULT_MAX_IMAGE_BYTES,
            max_images: 2,
        };
        let draft = (0..3).fold(Draft::new("x", day()), |d, i| {
            d.with_image(PendingImage::New(png(&format!("{}.png", i))))
        });
        assert!(draft.validate(SubmitMode::Create, &limits).is_err());
    }

    #[test]
    fn test_create_rejects_existing_images() {
        let image = persisted_image(EntryId::new());
        let draft = Draft::new("x", day()).with_image(PendingImage::existing(&image));
        assert!(draft.validate(SubmitMode::Create, &ImageLimits::default()).is_err());
        assert!(draft
            .validate(SubmitMode::Edit(image.entry_id), &ImageLimits::default())
            .is_ok());
    }

    #[test]
    fn test_limits_check_type_and_size() {
        let limits = ImageLimits {
            max_bytes: 3,
            max_images: 9,
        };
        let text = ImagePayload::new("notes.txt", "text/plain", b"hi".to_vec());
        assert!(matches!(limits.check(&text), Err(BlobError::NotAnImage { .. })));
        assert!(matches!(
            limits.check(&png("big.png")),
            Err(BlobError::TooLarge { size: 4, limit: 3 })
        ));
        assert!(ImageLimits::default().check(&png("ok.png")).is_ok());
    }

    #[test]
    fn test_reconcile_splits_adds_keeps_and_removals() {
        let entry = EntryId::new();
        let keep = persisted_image(entry);
        let drop = persisted_image(entry);

        let draft = Draft::new("x", day())
            .with_image(PendingImage::existing(&keep))
            .with_image(PendingImage::New(png("new.png")));

        let plan = reconcile(&[keep.clone(), drop.clone()], &draft).unwrap();
        assert_eq!(plan.kept, vec![keep.id]);
        assert_eq!(plan.removals, vec![drop]);
        assert_eq!(plan.uploads.len(), 1);
        assert_eq!(plan.uploads[0].file_name, "new.png");
    }

    #[test]
    fn test_reconcile_untouched_images_is_noop() {
        let entry = EntryId::new();
        let images = vec![persisted_image(entry), persisted_image(entry)];
        let details = EntryWithDetails {
            entry: crate::domain::Entry {
                id: entry,
                user_id: UserId::new(),
                content: "before".to_string(),
                date: day(),
                created_at: Utc::now(),
            },
            profile: None,
            images: images.clone(),
        };
        let mut draft = Draft::from_entry(&details);
        draft.content = "after".to_string();

        let plan = reconcile(&images, &draft).unwrap();
        assert!(plan.removals.is_empty());
        assert!(plan.uploads.is_empty());
        assert_eq!(plan.kept.len(), 2);
    }

    #[test]
    fn test_reconcile_rejects_foreign_image() {
        let foreign = persisted_image(EntryId::new());
        let draft = Draft::new("x", day()).with_image(PendingImage::existing(&foreign));
        assert!(reconcile(&[], &draft).is_err());
    }

    #[test]
    fn test_remove_image_from_draft() {
        let image = persisted_image(EntryId::new());
        let mut draft = Draft::new("", day()).with_image(PendingImage::existing(&image));
        assert!(draft.remove_image(&image.id));
        assert!(!draft.remove_image(&image.id));
        assert!(draft.is_blank());
    }
}
