//! Configuration loading.

use crate::paths::NoraePaths;
use norae_core::config::{FloorConfig, default_rooms};
use norae_core::error::{NoraeError, Result};
use std::fs;

/// Loads the floor configuration from the default config file path.
///
/// The path is `~/.config/norae/config.toml`. A missing or empty file yields
/// the default configuration; a present-but-unparsable file is an error. A
/// config that defines no rooms falls back to the default floor.
pub fn load_floor_config() -> Result<FloorConfig> {
    let path = NoraePaths::config_file()?;
    if !path.exists() {
        return Ok(FloorConfig::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| NoraeError::config(format!("failed to read {}: {}", path.display(), e)))?;
    if content.trim().is_empty() {
        return Ok(FloorConfig::default());
    }

    let mut config: FloorConfig = toml::from_str(&content)
        .map_err(|e| NoraeError::config(format!("failed to parse {}: {}", path.display(), e)))?;
    if config.rooms.is_empty() {
        config.rooms = default_rooms();
    }
    Ok(config)
}
