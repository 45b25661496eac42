//! Blob storage keys
//!
//! Keys are laid out as `{user_id}/{entry_id}/{unix_millis}-{token}.{ext}`.
//! The first segment scopes every blob to its owner; the timestamp plus random
//! token keeps concurrent uploads for the same entry from colliding.

use crate::domain::{EntryId, UserId};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

const TOKEN_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Generate a fresh key for a new upload
    pub fn generate(owner: &UserId, entry: &EntryId, ext: &str) -> Self {
        Self::from_parts(owner, entry, Utc::now().timestamp_millis(), &random_token(), ext)
    }

    fn from_parts(owner: &UserId, entry: &EntryId, millis: i64, token: &str, ext: &str) -> Self {
        StorageKey(format!("{}/{}/{}-{}.{}", owner, entry, millis, token, ext))
    }

    /// Parse an existing key, rejecting anything that could escape its namespace
    pub fn parse(raw: &str) -> Result<Self, String> {
        let segments: Vec<&str> = raw.split('/').collect();
        if segments.len() != 3 {
            return Err(format!("expected owner/entry/file, got '{}'", raw));
        }
        if segments
            .iter()
            .any(|s| s.is_empty() || *s == "." || *s == ".." || s.contains('\\'))
        {
            return Err(format!("invalid segment in '{}'", raw));
        }
        Ok(StorageKey(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key lives under `owner/entry/`
    pub fn belongs_to(&self, owner: &UserId, entry: &EntryId) -> bool {
        let mut segments = self.0.split('/');
        segments.next() == Some(owner.to_string().as_str())
            && segments.next() == Some(entry.to_string().as_str())
    }

    /// The file name part (last segment)
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Pick a file extension for an upload: the file name's own extension when it
/// looks sane, otherwise one derived from the content type, otherwise `jpg`.
pub fn extension_for(file_name: &str, content_type: &str) -> String {
    let from_name = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    if let Some(ext) = from_name {
        return ext;
    }

    mime_guess::get_mime_extensions_str(content_type)
        .and_then(|exts| exts.iter().find(|e| **e == "jpg").or_else(|| exts.first()))
        .map(|e| e.to_string())
        .unwrap_or_else(|| "jpg".to_string())
}
