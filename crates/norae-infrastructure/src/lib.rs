//! Storage and platform integrations for the rental floor.
//!
//! Provides the directory-backed TOML implementation of the store contract,
//! configuration loading, path resolution, and the system alarm sink.

pub mod config;
pub mod dir_floor_repository;
pub mod paths;
pub mod system_alarm;

pub use config::load_floor_config;
pub use dir_floor_repository::DirFloorRepository;
pub use paths::NoraePaths;
pub use system_alarm::{SilentAlarmSink, SystemAlarmSink};
