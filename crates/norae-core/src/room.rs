//! Room domain model.

use serde::{Deserialize, Serialize};

/// Occupancy status of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Available,
    Occupied,
}

/// A rentable karaoke room.
///
/// Rooms are owned by the remote store; the engine reads them to gate
/// commands (existence, capacity) and writes `status` as a side effect of
/// starting or ending a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Unique room identifier (e.g. "101")
    pub id: String,
    /// Human-readable room name
    pub name: String,
    /// Maximum party size the room accommodates
    pub capacity: u32,
    /// Current occupancy status
    pub status: RoomStatus,
}

impl Room {
    pub fn new(id: impl Into<String>, name: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capacity,
            status: RoomStatus::Available,
        }
    }
}
