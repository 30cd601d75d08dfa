//! Session domain model.
//!
//! A session is a single room rental occupying a time window with a party
//! size and a lifecycle status. A room has zero or one session at any time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a session.
///
/// Variant order defines promotion order: a session only ever moves forward
/// (`Scheduled` → `Ongoing` → `Expired`), except that an extend revives an
/// ongoing-or-expired session back to `Ongoing` by advancing its end time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    Ongoing,
    Expired,
}

/// Fingerprint of a distinct expiry event.
///
/// Distinct end times (e.g. after an extend) produce distinct keys, allowing
/// the expiry alarm to fire again for the new expiry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlarmKey {
    pub room_id: String,
    pub session_id: String,
    pub end_time: DateTime<Utc>,
}

/// A room rental session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// The room this session occupies (1:1 - at most one session per room)
    pub room_id: String,
    /// When the rental window opens
    pub start_time: DateTime<Utc>,
    /// When the paid duration elapses
    pub end_time: DateTime<Utc>,
    /// Paid duration in minutes; consistent with `end - start` except
    /// transiently after an extend before resync
    pub duration_min: i64,
    /// Party size
    pub pax: u32,
    /// Current lifecycle status
    pub status: SessionStatus,
    /// Timestamp when the session was created
    pub created_at: DateTime<Utc>,
    /// Timestamp when the session was last updated
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Creates a new session starting at `start_time` for `duration_min`
    /// minutes.
    ///
    /// Initial status is `Ongoing` when the start time has already passed,
    /// `Scheduled` otherwise.
    pub fn new(
        room_id: impl Into<String>,
        start_time: DateTime<Utc>,
        duration_min: i64,
        pax: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let status = if start_time <= now {
            SessionStatus::Ongoing
        } else {
            SessionStatus::Scheduled
        };

        Self {
            id: Uuid::new_v4().to_string(),
            room_id: room_id.into(),
            start_time,
            end_time: start_time + Duration::minutes(duration_min),
            duration_min,
            pax,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    /// The status this session should have at `now`, inferred purely from
    /// wall-clock comparisons.
    pub fn status_at(&self, now: DateTime<Utc>) -> SessionStatus {
        if now >= self.end_time {
            SessionStatus::Expired
        } else if now >= self.start_time {
            SessionStatus::Ongoing
        } else {
            SessionStatus::Scheduled
        }
    }

    /// Whether the paid duration has elapsed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_time
    }

    /// The dedupe key for this session's current expiry event.
    pub fn alarm_key(&self) -> AlarmKey {
        AlarmKey {
            room_id: self.room_id.clone(),
            session_id: self.id.clone(),
            end_time: self.end_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(now: DateTime<Utc>) -> Session {
        Session::new("101", now, 30, 2, now)
    }

    #[test]
    fn starts_ongoing_when_start_time_passed() {
        let now = Utc::now();
        assert_eq!(session(now).status, SessionStatus::Ongoing);
    }

    #[test]
    fn starts_scheduled_when_start_time_in_future() {
        let now = Utc::now();
        let s = Session::new("101", now + Duration::minutes(10), 30, 2, now);
        assert_eq!(s.status, SessionStatus::Scheduled);
    }

    #[test]
    fn end_time_follows_duration() {
        let now = Utc::now();
        assert_eq!(session(now).end_time, now + Duration::minutes(30));
    }

    #[test]
    fn status_at_boundaries() {
        let now = Utc::now();
        let s = Session::new("101", now + Duration::minutes(10), 30, 2, now);
        assert_eq!(s.status_at(now), SessionStatus::Scheduled);
        // the exact start instant counts as ongoing
        assert_eq!(s.status_at(s.start_time), SessionStatus::Ongoing);
        // the exact end instant counts as expired
        assert_eq!(s.status_at(s.end_time), SessionStatus::Expired);
        assert_eq!(
            s.status_at(s.end_time - Duration::seconds(1)),
            SessionStatus::Ongoing
        );
    }

    #[test]
    fn alarm_key_changes_with_end_time() {
        let now = Utc::now();
        let mut s = session(now);
        let before = s.alarm_key();
        s.end_time += Duration::minutes(15);
        assert_ne!(before, s.alarm_key());
        assert_eq!(before.session_id, s.alarm_key().session_id);
    }
}
