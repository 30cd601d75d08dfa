//! Floor repository trait.
//!
//! Defines the interface for the remote persisted store the engine is
//! driven by. The engine only depends on this contract, never on a concrete
//! storage mechanism.

use crate::error::Result;
use crate::history::{HistoryInsert, HistoryRecord};
use crate::room::{Room, RoomStatus};
use crate::session::Session;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// An opaque change notification from the store.
///
/// The engine does not interpret the payload; its only reaction to any
/// change event is to trigger a full resync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    Sessions,
    History,
}

/// An abstract repository for the rental floor's persisted state.
///
/// This trait decouples the lifecycle engine from the specific storage
/// mechanism (directory of TOML files, database, remote API). The store is
/// independently mutable - other writers may change it at any time - and
/// last-write-wins at the storage layer; the engine reconciles through
/// full-snapshot resyncs.
///
/// # Implementation Notes
///
/// Implementations should:
/// - Keep at most one session row per room
/// - Treat `delete_session` of an unknown id as success
/// - Enforce the one-`Completed`-record-per-session invariant inside
///   `insert_history` via an existence check, reporting
///   [`HistoryInsert::DuplicateSkip`] instead of failing
#[async_trait]
pub trait FloorRepository: Send + Sync {
    /// Lists all rooms on the floor.
    async fn list_rooms(&self) -> Result<Vec<Room>>;

    /// Lists all session rows (at most one per room).
    async fn list_sessions(&self) -> Result<Vec<Session>>;

    /// Lists the most recent history records, newest first.
    async fn list_history(&self, limit: usize) -> Result<Vec<HistoryRecord>>;

    /// Creates or replaces the session row for `session.room_id`.
    async fn upsert_session(&self, session: &Session) -> Result<()>;

    /// Deletes a session row by session id. Deleting an unknown id is not
    /// an error.
    async fn delete_session(&self, session_id: &str) -> Result<()>;

    /// Updates a room's occupancy status.
    async fn update_room_status(&self, room_id: &str, status: RoomStatus) -> Result<()>;

    /// Appends a history record unless one already exists for the same
    /// session and event.
    async fn insert_history(&self, record: &HistoryRecord) -> Result<HistoryInsert>;

    /// Subscribes to the store's change-notification feed.
    fn subscribe_changes(&self) -> broadcast::Receiver<StoreChange>;
}
