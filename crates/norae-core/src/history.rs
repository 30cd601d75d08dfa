//! Append-only rental history records.

use crate::session::Session;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event type of a history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryEvent {
    Completed,
}

/// An immutable audit record of a finished rental.
///
/// At most one `Completed` record exists per session identifier. The store
/// enforces this with an existence check before insert, not a uniqueness
/// constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub session_id: String,
    pub event: HistoryEvent,
    pub room_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_min: i64,
    pub pax: u32,
    /// The operator who ended the session
    pub actor: String,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Builds the `Completed` record for a session, snapshotting its timing
    /// and party-size fields.
    pub fn completed(session: &Session, actor: impl Into<String>, recorded_at: DateTime<Utc>) -> Self {
        Self {
            session_id: session.id.clone(),
            event: HistoryEvent::Completed,
            room_id: session.room_id.clone(),
            start_time: session.start_time,
            end_time: session.end_time,
            duration_min: session.duration_min,
            pax: session.pax,
            actor: actor.into(),
            recorded_at,
        }
    }
}

/// Outcome of a history insert.
///
/// `DuplicateSkip` is not a failure: the store found an existing record for
/// the same session and event and intentionally skipped the insert. This is
/// what makes `end_session` safe to retry and to double-submit.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryInsert {
    Inserted(HistoryRecord),
    DuplicateSkip,
}

impl HistoryInsert {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateSkip)
    }
}
