//! Filesystem layout of the application data directory.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".pocket-player";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "media.sqlite";
/// Subdirectory holding imported audio copies.
const AUDIO_DIR_NAME: &str = "audio";
/// Subdirectory holding imported cover images.
const IMAGES_DIR_NAME: &str = "images";
const LOG_FILE_NAME: &str = "pocket-player.log";
/// Environment variable that relocates the whole data directory.
pub const HOME_ENV: &str = "POCKET_PLAYER_HOME";

/// Resolved locations of everything the app writes to disk.
#[derive(Debug, Clone)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    /// Use `POCKET_PLAYER_HOME` when set, otherwise `~/.pocket-player`.
    pub fn resolve() -> Result<Self> {
        if let Some(root) = env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
            return Ok(Self::at(root));
        }
        let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
        Ok(Self::at(base_dirs.home_dir().join(DATA_DIR_NAME)))
    }

    /// Root the layout at an explicit directory.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory. Media subdirectories are created on demand by
    /// the importer.
    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create data directory {}", self.root.display()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn database(&self) -> PathBuf {
        self.root.join(DB_FILE_NAME)
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.root.join(AUDIO_DIR_NAME)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGES_DIR_NAME)
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join(LOG_FILE_NAME)
    }
}
