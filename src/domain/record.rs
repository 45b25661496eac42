//! Persisted rows: entries, images and profiles

use crate::domain::StorageKey;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier
            pub fn new() -> Self {
                $name(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                $name(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map($name)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a user (and of their profile row)
    UserId
);
uuid_id!(
    /// Store-assigned identifier of an entry row
    EntryId
);
uuid_id!(
    /// Store-assigned identifier of an image row
    ImageId
);

/// A dated journal post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub user_id: UserId,
    pub content: String,
    /// Logical day the entry is filed under, independent of `created_at`
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.user_id == *user
    }
}

/// A single uploaded picture attached to an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: ImageId,
    pub entry_id: EntryId,
    pub url: String,
    /// Blob store key; needed to delete the blob later
    pub storage_path: StorageKey,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Profile {
            id,
            display_name: display_name.into(),
            avatar_url: None,
            created_at: Utc::now(),
        }
    }

    /// Single-letter fallback shown when there is no avatar
    pub fn initial(&self) -> String {
        self.display_name
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "?".to_string())
    }
}

/// An entry joined with its owner profile and image rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryWithDetails {
    pub entry: Entry,
    pub profile: Option<Profile>,
    pub images: Vec<Image>,
}

impl EntryWithDetails {
    /// Name shown next to the entry; falls back to the owner id
    pub fn author(&self) -> String {
        self.profile
            .as_ref()
            .map(|p| p.display_name.clone())
            .unwrap_or_else(|| self.entry.user_id.to_string())
    }
}

/// Row data for a new entry; the store assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub user_id: UserId,
    pub content: String,
    pub date: NaiveDate,
}

/// Partial update of an entry row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub content: Option<String>,
    pub date: Option<NaiveDate>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.date.is_none()
    }

    pub fn apply(&self, entry: &mut Entry) {
        if let Some(content) = &self.content {
            entry.content = content.clone();
        }
        if let Some(date) = self.date {
            entry.date = date;
        }
    }
}

/// Row data for a new image; the store assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImage {
    pub entry_id: EntryId,
    pub url: String,
    pub storage_path: StorageKey,
}

/// Row filter for entry reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub date: Option<NaiveDate>,
    pub owner: Option<UserId>,
}

impl EntryFilter {
    pub fn on(date: NaiveDate) -> Self {
        EntryFilter {
            date: Some(date),
            owner: None,
        }
    }

    pub fn owned_by(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        self.date.is_none_or(|d| entry.date == d) && self.owner.is_none_or(|o| entry.user_id == o)
    }
}
