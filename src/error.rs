//! Error types for vjour

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the record store (entries, images, profiles).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Conflicting record: {0}")]
    Conflict(String),

    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    #[error("Record store data is corrupt: {0}")]
    Corrupt(String),
}

/// Errors from the blob store (image payloads).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobError {
    #[error("Not an image: {file_name} ({content_type})")]
    NotAnImage {
        file_name: String,
        content_type: String,
    },

    #[error("Image too large: {size} bytes (limit {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Blob already exists: {0}")]
    Conflict(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Blob store unavailable: {0}")]
    Unavailable(String),
}

impl BlobError {
    /// Whether retrying the same payload could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, BlobError::Unavailable(_) | BlobError::Conflict(_))
    }
}

/// Main error type for vjour application
#[derive(Debug, Error)]
pub enum VjourError {
    #[error("Not a vjour directory: {0}")]
    NotVjourDirectory(PathBuf),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Permission denied: {0}")]
    NotOwner(String),

    #[error("Record store error: {0}")]
    RowStore(#[from] StoreError),

    #[error("Blob store error: {0}")]
    BlobStore(#[from] BlobError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl VjourError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            VjourError::NotVjourDirectory(_) => 2,
            VjourError::InvalidDate(_) => 3,
            VjourError::Validation(_) => 4,
            VjourError::NotSignedIn | VjourError::NotOwner(_) => 5,
            VjourError::RowStore(StoreError::NotFound(_)) => 6,
            _ => 1,
        }
    }

    /// Whether the failure is worth a plain retry by the user.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VjourError::RowStore(StoreError::Unavailable(_))
                | VjourError::BlobStore(BlobError::Unavailable(_))
                | VjourError::Io(_)
        )
    }

    /// Get a user-friendly error message with suggestions
    pub fn display_with_suggestions(&self) -> String {
        match self {
            VjourError::NotVjourDirectory(path) => {
                format!(
                    "Not a vjour directory: {}\n\n\
                    Suggestions:\n\
                    • Run 'vjour init' in this directory to create a new journal\n\
                    • Navigate to an existing vjour directory\n\
                    • Set VJOUR_ROOT environment variable to your journal path",
                    path.display()
                )
            }
            VjourError::InvalidDate(input) => {
                format!(
                    "Invalid date: '{}'\n\n\
                    Valid dates:\n\
                    • today, yesterday, tomorrow\n\
                    • monday, tuesday, ..., sunday (most recent)\n\
                    • last monday, next friday, etc.\n\
                    • Specific dates: YYYY-MM-DD (e.g., 2025-01-17)\n\n\
                    Examples:\n\
                    vjour feed yesterday\n\
                    vjour post --date 2025-01-15 \"Lunch\"",
                    input
                )
            }
            VjourError::Validation(msg) => {
                format!(
                    "{}\n\n\
                    Suggestions:\n\
                    • Write some text or attach at least one image\n\
                    • Images must be image files of at most 10 MiB",
                    msg
                )
            }
            VjourError::NotSignedIn => "Not signed in\n\n\
                Suggestions:\n\
                • Set user.id in .vjour/config.toml\n\
                • Or export VJOUR_USER=<user id>"
                .to_string(),
            _ if self.is_retryable() => {
                format!("{}\n\nSomething went wrong while saving. Please try again.", self)
            }
            _ => self.to_string(),
        }
    }
}

/// Result type using VjourError
pub type Result<T> = std::result::Result<T, VjourError>;

/// Result alias for record store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result alias for blob store operations.
pub type BlobResult<T> = std::result::Result<T, BlobError>;
