//! Journal directory discovery and layout

use crate::error::{Result, VjourError};
use crate::infrastructure::config::{Config, VJOUR_DIR};
use std::fs;
use std::path::{Path, PathBuf};

pub const ROOT_ENV: &str = "VJOUR_ROOT";
const RECORDS_FILE: &str = "records.toml";
const BLOBS_DIR: &str = "blobs";

/// Abstract repository for journal directories
pub trait JournalRepository {
    /// Get the root directory of this repository
    fn root(&self) -> &Path;

    /// Load configuration from .vjour/config.toml
    fn load_config(&self) -> Result<Config>;

    /// Save configuration to .vjour/config.toml
    fn save_config(&self, config: &Config) -> Result<()>;

    /// Check if .vjour directory exists
    fn is_initialized(&self) -> bool;

    /// Create the .vjour directory structure
    fn initialize(&self) -> Result<()>;
}

/// File system implementation of JournalRepository
#[derive(Debug, Clone)]
pub struct FileSystemRepository {
    pub root: PathBuf,
}

impl FileSystemRepository {
    pub fn new(root: PathBuf) -> Self {
        FileSystemRepository { root }
    }

    /// Discover the journal root: VJOUR_ROOT first, then walk up from the
    /// current directory
    pub fn discover() -> Result<Self> {
        if let Ok(root_path) = std::env::var(ROOT_ENV) {
            let path = PathBuf::from(root_path);
            if Self::has_vjour_dir(&path) {
                return Ok(FileSystemRepository::new(path));
            }
            return Err(VjourError::Config(format!(
                "VJOUR_ROOT is set to '{}' but no .vjour directory found. \
                Run 'vjour init' in that directory or unset VJOUR_ROOT.",
                path.display()
            )));
        }

        let current_dir = std::env::current_dir()?;
        Self::discover_from(&current_dir)
    }

    /// Discover journal root by walking up from a specific starting directory
    pub fn discover_from(start: &Path) -> Result<Self> {
        start
            .ancestors()
            .find(|dir| Self::has_vjour_dir(dir))
            .map(|dir| FileSystemRepository::new(dir.to_path_buf()))
            .ok_or_else(|| VjourError::NotVjourDirectory(start.to_path_buf()))
    }

    fn has_vjour_dir(path: &Path) -> bool {
        path.join(VJOUR_DIR).is_dir()
    }

    pub fn vjour_dir(&self) -> PathBuf {
        self.root.join(VJOUR_DIR)
    }

    pub fn records_path(&self) -> PathBuf {
        self.vjour_dir().join(RECORDS_FILE)
    }

    pub fn blobs_dir(&self) -> PathBuf {
        self.vjour_dir().join(BLOBS_DIR)
    }
}

impl JournalRepository for FileSystemRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    fn load_config(&self) -> Result<Config> {
        Config::load_from_dir(&self.root)
    }

    fn save_config(&self, config: &Config) -> Result<()> {
        config.save_to_dir(&self.root)
    }

    fn is_initialized(&self) -> bool {
        Self::has_vjour_dir(&self.root)
    }

    fn initialize(&self) -> Result<()> {
        let vjour_dir = self.vjour_dir();

        if vjour_dir.exists() {
            return Err(VjourError::Config(format!(
                "Directory already initialized: {}",
                self.root.display()
            )));
        }

        fs::create_dir(&vjour_dir)?;
        fs::create_dir(self.blobs_dir())?;
        Ok(())
    }
}
