//! Centralized path resolution.

use norae_core::error::{NoraeError, Result};
use std::path::PathBuf;

/// Resolves the directories NORAE reads and writes.
pub struct NoraePaths;

impl NoraePaths {
    /// The configuration directory (`~/.config/norae`).
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("norae"))
            .ok_or_else(|| NoraeError::config("could not determine the config directory"))
    }

    /// The configuration file (`~/.config/norae/config.toml`).
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// The data directory holding room, session and history records.
    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join("norae"))
            .ok_or_else(|| NoraeError::config("could not determine the data directory"))
    }
}
