//! Configuration management

use crate::domain::draft::{DEFAULT_MAX_IMAGES, DEFAULT_MAX_IMAGE_BYTES};
use crate::domain::{ImageLimits, UserId};
use crate::error::{Result, VjourError};
use crate::infrastructure::deadline::DEFAULT_STORE_TIMEOUT;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const VJOUR_DIR: &str = ".vjour";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    pub id: UserId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Prefix for public image URLs; `file://` paths when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
    #[serde(default = "default_max_images")]
    pub max_images: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_image_bytes() -> u64 {
    DEFAULT_MAX_IMAGE_BYTES
}

fn default_max_images() -> usize {
    DEFAULT_MAX_IMAGES
}

fn default_timeout_secs() -> u64 {
    DEFAULT_STORE_TIMEOUT.as_secs()
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            public_base_url: None,
            max_image_bytes: default_max_image_bytes(),
            max_images: default_max_images(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub created: DateTime<Utc>,
    pub user: UserConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Create a new config for a freshly generated user
    pub fn new(display_name: impl Into<String>) -> Self {
        Config {
            created: Utc::now(),
            user: UserConfig {
                id: UserId::new(),
                display_name: display_name.into(),
                email: None,
                avatar_url: None,
            },
            storage: StorageConfig::default(),
        }
    }

    /// Load config from .vjour/config.toml in the given directory
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let config_path = path.join(VJOUR_DIR).join(CONFIG_FILE);

        let contents = fs::read_to_string(&config_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VjourError::NotVjourDirectory(path.to_path_buf())
            } else {
                VjourError::Io(e)
            }
        })?;

        toml::from_str(&contents)
            .map_err(|e| VjourError::Config(format!("Failed to parse config.toml: {}", e)))
    }

    /// Save config to .vjour/config.toml in the given directory
    pub fn save_to_dir(&self, path: &Path) -> Result<()> {
        let vjour_dir = path.join(VJOUR_DIR);

        if !vjour_dir.exists() {
            fs::create_dir(&vjour_dir)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| VjourError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(vjour_dir.join(CONFIG_FILE), contents)?;

        Ok(())
    }

    pub fn image_limits(&self) -> ImageLimits {
        ImageLimits {
            max_bytes: self.storage.max_image_bytes,
            max_images: self.storage.max_images,
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.storage.timeout_secs.max(1))
    }

    /// Default display name for a new journal user
    pub fn detect_display_name() -> String {
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "me".to_string())
    }
}
