//! Config management use case

use crate::error::{Result, VjourError};
use crate::infrastructure::{Config, FileSystemRepository, JournalRepository};

/// Keys accepted by `get`/`set`, in display order
pub const CONFIG_KEYS: &[&str] = &[
    "created",
    "user.id",
    "user.display_name",
    "user.email",
    "user.avatar_url",
    "storage.public_base_url",
    "storage.max_image_bytes",
    "storage.max_images",
    "storage.timeout_secs",
];

const READ_ONLY_KEYS: &[&str] = &["created", "user.id"];

/// Service for managing journal configuration
pub struct ConfigService {
    repository: FileSystemRepository,
}

impl ConfigService {
    pub fn new(repository: FileSystemRepository) -> Self {
        ConfigService { repository }
    }

    /// Get a single config value; unset optional values read as ""
    pub fn get(&self, key: &str) -> Result<String> {
        let config = self.repository.load_config()?;
        read_key(&config, key)
    }

    /// Set a config value and return the updated config
    pub fn set(&self, key: &str, value: &str) -> Result<Config> {
        if READ_ONLY_KEYS.contains(&key) {
            return Err(VjourError::Config(format!(
                "Cannot modify '{}' field (read-only)",
                key
            )));
        }

        let mut config = self.repository.load_config()?;
        write_key(&mut config, key, value)?;
        self.repository.save_config(&config)?;
        Ok(config)
    }

    /// All keys with their values
    pub fn list(&self) -> Result<Vec<(&'static str, String)>> {
        let config = self.repository.load_config()?;
        CONFIG_KEYS
            .iter()
            .map(|key| read_key(&config, key).map(|value| (*key, value)))
            .collect()
    }
}

/// Whether changing `key` affects the profile row
pub fn touches_profile(key: &str) -> bool {
    matches!(key, "user.display_name" | "user.avatar_url")
}

fn read_key(config: &Config, key: &str) -> Result<String> {
    let optional = |value: &Option<String>| value.clone().unwrap_or_default();

    match key {
        "created" => Ok(config.created.to_rfc3339()),
        "user.id" => Ok(config.user.id.to_string()),
        "user.display_name" => Ok(config.user.display_name.clone()),
        "user.email" => Ok(optional(&config.user.email)),
        "user.avatar_url" => Ok(optional(&config.user.avatar_url)),
        "storage.public_base_url" => Ok(optional(&config.storage.public_base_url)),
        "storage.max_image_bytes" => Ok(config.storage.max_image_bytes.to_string()),
        "storage.max_images" => Ok(config.storage.max_images.to_string()),
        "storage.timeout_secs" => Ok(config.storage.timeout_secs.to_string()),
        _ => Err(unknown_key(key)),
    }
}

fn write_key(config: &mut Config, key: &str, value: &str) -> Result<()> {
    // Empty clears optional values
    let optional = |value: &str| (!value.is_empty()).then(|| value.to_string());

    match key {
        "user.display_name" => {
            if value.trim().is_empty() {
                return Err(VjourError::Config("Display name cannot be empty".to_string()));
            }
            config.user.display_name = value.trim().to_string();
        }
        "user.email" => config.user.email = optional(value),
        "user.avatar_url" => config.user.avatar_url = optional(value),
        "storage.public_base_url" => {
            config.storage.public_base_url = optional(value.trim_end_matches('/'))
        }
        "storage.max_image_bytes" => config.storage.max_image_bytes = parse_positive(key, value)?,
        "storage.max_images" => config.storage.max_images = parse_positive(key, value)?,
        "storage.timeout_secs" => config.storage.timeout_secs = parse_positive(key, value)?,
        _ => return Err(unknown_key(key)),
    }
    Ok(())
}

fn parse_positive<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(VjourError::Config(format!(
            "'{}' must be a positive number, got '{}'",
            key, value
        ))),
    }
}

fn unknown_key(key: &str) -> VjourError {
    VjourError::Config(format!(
        "Unknown config key: '{}'. Valid keys are: {}",
        key,
        CONFIG_KEYS.join(", ")
    ))
}
