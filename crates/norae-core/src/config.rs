//! Floor configuration.

use crate::room::Room;
use serde::{Deserialize, Serialize};

fn default_tick_interval_secs() -> u64 {
    1
}

fn default_sound() -> bool {
    true
}

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct FloorConfig {
    /// Seconds between ticker firings
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// Whether the watch command plays audible alarms
    #[serde(default = "default_sound")]
    pub sound: bool,
    #[serde(rename = "room", default)]
    pub rooms: Vec<RoomConfig>,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            sound: default_sound(),
            rooms: default_rooms(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RoomConfig {
    pub id: String,
    pub name: String,
    pub capacity: u32,
}

impl RoomConfig {
    /// Converts the config entry into a fresh `Available` room row.
    pub fn into_room(self) -> Room {
        Room::new(self.id, self.name, self.capacity)
    }
}

/// The floor used when no rooms are configured.
pub fn default_rooms() -> Vec<RoomConfig> {
    vec![
        RoomConfig {
            id: "101".to_string(),
            name: "Room 101".to_string(),
            capacity: 4,
        },
        RoomConfig {
            id: "102".to_string(),
            name: "Room 102".to_string(),
            capacity: 6,
        },
        RoomConfig {
            id: "103".to_string(),
            name: "Room 103".to_string(),
            capacity: 8,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let config: FloorConfig = toml::from_str(
            r#"
            [[room]]
            id = "201"
            name = "Big Room"
            capacity = 12
            "#,
        )
        .unwrap();

        assert_eq!(config.tick_interval_secs, 1);
        assert!(config.sound);
        assert_eq!(config.rooms.len(), 1);
        assert_eq!(config.rooms[0].capacity, 12);
    }

    #[test]
    fn empty_config_has_no_rooms() {
        let config: FloorConfig = toml::from_str("").unwrap();
        assert!(config.rooms.is_empty());
    }
}
