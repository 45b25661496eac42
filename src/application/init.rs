//! Initialize journal use case

use crate::domain::Profile;
use crate::error::Result;
use crate::infrastructure::deadline::within;
use crate::infrastructure::{Backend, Config, FileSystemRepository, JournalRepository, RecordStore};
use std::fs;
use std::path::Path;
use tracing::info;

/// Initialize a new journal at the specified path.
///
/// Creates the directory layout, a config with a fresh user id and the
/// user's profile row.
pub async fn init(path: &Path, display_name: &str) -> Result<Config> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }

    let repo = FileSystemRepository::new(path.to_path_buf());
    repo.initialize()?;

    let config = Config::new(display_name);
    repo.save_config(&config)?;

    let backend = Backend::open(&repo, &config);
    sync_profile(backend.records.as_ref(), &config).await?;
    info!(root = %path.display(), user = %config.user.id, "journal initialized");

    Ok(config)
}

/// Write the configured user's profile row
pub async fn sync_profile(records: &dyn RecordStore, config: &Config) -> Result<Profile> {
    let mut profile = Profile::new(config.user.id, config.user.display_name.clone());
    profile.avatar_url = config.user.avatar_url.clone();

    let timeout = config.store_timeout();
    Ok(within(timeout, "upsert profile", records.upsert_profile(profile)).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_writes_config_and_profile() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("journal");

        let config = init(&root, "Mia").await.unwrap();

        let repo = FileSystemRepository::new(root.clone());
        assert!(repo.is_initialized());
        assert_eq!(repo.load_config().unwrap().user.id, config.user.id);

        let backend = Backend::open(&repo, &config);
        let profile = backend.records.get_profile(&config.user.id).await.unwrap();
        assert_eq!(profile.display_name, "Mia");
    }

    #[tokio::test]
    async fn test_init_twice_fails() {
        let temp = TempDir::new().unwrap();
        init(temp.path(), "Mia").await.unwrap();
        assert!(init(temp.path(), "Mia").await.is_err());
    }
}
