//! Record store: entry, image and profile rows

use crate::domain::{
    Entry, EntryFilter, EntryId, EntryPatch, EntryWithDetails, Image, ImageId, NewEntry, NewImage,
    Profile, UserId,
};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Relational backend holding entries, images and profiles.
///
/// Implementations must behave like the hosted row store the journal was
/// designed against:
/// - ids and `created_at` are assigned on insert
/// - deleting an entry cascades to its image rows (never to blobs)
/// - a batch image insert is all-or-nothing
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_entry(&self, entry: NewEntry) -> StoreResult<Entry>;

    async fn update_entry(&self, id: &EntryId, patch: EntryPatch) -> StoreResult<()>;

    /// Delete an entry row and, by cascade, its image rows
    async fn delete_entry(&self, id: &EntryId) -> StoreResult<()>;

    async fn get_entry(&self, id: &EntryId) -> StoreResult<Entry>;

    async fn insert_images(&self, images: Vec<NewImage>) -> StoreResult<Vec<Image>>;

    async fn get_image(&self, id: &ImageId) -> StoreResult<Image>;

    async fn delete_image(&self, id: &ImageId) -> StoreResult<()>;

    /// Image rows of one entry, oldest first
    async fn images_for_entry(&self, entry: &EntryId) -> StoreResult<Vec<Image>>;

    /// Joined read: entries with owner profile and images, newest first
    async fn select_entries(&self, filter: &EntryFilter) -> StoreResult<Vec<EntryWithDetails>>;

    async fn upsert_profile(&self, profile: Profile) -> StoreResult<Profile>;

    async fn get_profile(&self, id: &UserId) -> StoreResult<Profile>;
}

/// The three tables, with the row semantics shared by every local backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub images: Vec<Image>,
}

impl Tables {
    pub fn insert_entry(&mut self, new: NewEntry) -> Entry {
        let entry = Entry {
            id: EntryId::new(),
            user_id: new.user_id,
            content: new.content,
            date: new.date,
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        entry
    }

    pub fn update_entry(&mut self, id: &EntryId, patch: &EntryPatch) -> StoreResult<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == *id)
            .ok_or_else(|| StoreError::NotFound(format!("entry {}", id)))?;
        patch.apply(entry);
        Ok(())
    }

    pub fn delete_entry(&mut self, id: &EntryId) -> StoreResult<()> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != *id);
        if self.entries.len() == before {
            return Err(StoreError::NotFound(format!("entry {}", id)));
        }
        self.images.retain(|img| img.entry_id != *id);
        Ok(())
    }

    pub fn entry(&self, id: &EntryId) -> StoreResult<Entry> {
        self.entries
            .iter()
            .find(|e| e.id == *id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("entry {}", id)))
    }

    pub fn insert_images(&mut self, rows: Vec<NewImage>) -> StoreResult<Vec<Image>> {
        // Validate the whole batch before touching the table
        let mut paths: HashSet<&str> = self.images.iter().map(|i| i.storage_path.as_str()).collect();
        for row in &rows {
            if !self.entries.iter().any(|e| e.id == row.entry_id) {
                return Err(StoreError::NotFound(format!("entry {}", row.entry_id)));
            }
            if !paths.insert(row.storage_path.as_str()) {
                return Err(StoreError::Conflict(format!(
                    "storage path {} already referenced",
                    row.storage_path
                )));
            }
        }

        let now = Utc::now();
        let inserted: Vec<Image> = rows
            .into_iter()
            .map(|row| Image {
                id: ImageId::new(),
                entry_id: row.entry_id,
                url: row.url,
                storage_path: row.storage_path,
                created_at: now,
            })
            .collect();
        self.images.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    pub fn image(&self, id: &ImageId) -> StoreResult<Image> {
        self.images
            .iter()
            .find(|img| img.id == *id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("image {}", id)))
    }

    pub fn delete_image(&mut self, id: &ImageId) -> StoreResult<()> {
        let before = self.images.len();
        self.images.retain(|img| img.id != *id);
        if self.images.len() == before {
            return Err(StoreError::NotFound(format!("image {}", id)));
        }
        Ok(())
    }

    pub fn images_for(&self, entry: &EntryId) -> Vec<Image> {
        let mut images: Vec<Image> = self
            .images
            .iter()
            .filter(|img| img.entry_id == *entry)
            .cloned()
            .collect();
        images.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        images
    }

    pub fn select(&self, filter: &EntryFilter) -> Vec<EntryWithDetails> {
        // Reverse insertion order first so ties on created_at stay newest-first
        let mut entries: Vec<&Entry> = self.entries.iter().rev().filter(|e| filter.matches(e)).collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        entries
            .into_iter()
            .map(|entry| EntryWithDetails {
                entry: entry.clone(),
                profile: self.profiles.iter().find(|p| p.id == entry.user_id).cloned(),
                images: self.images_for(&entry.id),
            })
            .collect()
    }

    pub fn upsert_profile(&mut self, profile: Profile) -> Profile {
        match self.profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => {
                existing.display_name = profile.display_name;
                existing.avatar_url = profile.avatar_url;
                existing.clone()
            }
            None => {
                self.profiles.push(profile.clone());
                profile
            }
        }
    }

    pub fn profile(&self, id: &UserId) -> StoreResult<Profile> {
        self.profiles
            .iter()
            .find(|p| p.id == *id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", id)))
    }
}
