//! Locally derived floor state.
//!
//! `FloorState` is the single source of truth for the presentation layer.
//! It is merged from the last remote snapshot and locally promoted by the
//! ticker; the merge rule makes the two update paths commutative, so a
//! resync racing a tick never loses a promotion.

use chrono::{DateTime, Utc};
use norae_core::alert::Alert;
use norae_core::room::Room;
use norae_core::session::Session;
use std::collections::HashMap;

/// The room → session / alert mapping the engine owns.
///
/// Owned exclusively by the engine behind a lock; no external writer may
/// mutate it directly. The store client can only trigger a resync.
#[derive(Debug, Clone)]
pub struct FloorState {
    /// All rooms, keyed by room id
    pub rooms: HashMap<String, Room>,
    /// Active sessions, keyed by room id (at most one per room)
    pub sessions: HashMap<String, Session>,
    /// Raised expiry alerts, keyed by room id
    pub alerts: HashMap<String, Alert>,
    /// Timestamp of the most recent tick
    pub now: DateTime<Utc>,
}

impl FloorState {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            sessions: HashMap::new(),
            alerts: HashMap::new(),
            now: Utc::now(),
        }
    }

    /// Replaces the state from a remote snapshot.
    ///
    /// Each incoming session is merged against the local row for the same
    /// room via [`merge_session`], so a snapshot read before a tick-local
    /// promotion landed cannot revert it. Alerts survive only while the
    /// session they were raised for is still on the floor.
    pub fn apply_snapshot(&mut self, rooms: Vec<Room>, sessions: Vec<Session>) {
        self.rooms = rooms.into_iter().map(|r| (r.id.clone(), r)).collect();

        let mut merged = HashMap::with_capacity(sessions.len());
        for remote in sessions {
            let local = self.sessions.get(&remote.room_id);
            let session = merge_session(local, remote);
            merged.insert(session.room_id.clone(), session);
        }
        self.sessions = merged;

        let sessions = &self.sessions;
        self.alerts.retain(|room_id, alert| {
            sessions
                .get(room_id)
                .is_some_and(|s| s.id == alert.session.id)
        });
    }
}

impl Default for FloorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Merges a remote session row with the local row for the same room.
///
/// The remote value wins wholesale unless it describes the same expiry
/// window (same session id, same end time) as a local row whose status is
/// further along the `Scheduled` → `Ongoing` → `Expired` promotion order:
/// then the local promotion is kept. A remote row with a new end time (an
/// extend from any writer) always replaces the local one.
pub fn merge_session(local: Option<&Session>, remote: Session) -> Session {
    match local {
        Some(local)
            if local.id == remote.id
                && local.end_time == remote.end_time
                && local.status > remote.status =>
        {
            let mut kept = remote;
            kept.status = local.status;
            kept
        }
        _ => remote,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use norae_core::session::SessionStatus;

    fn ongoing_session(now: DateTime<Utc>) -> Session {
        Session::new("101", now, 30, 2, now)
    }

    #[test]
    fn merge_keeps_local_promotion_over_stale_remote() {
        let now = Utc::now();
        let remote = ongoing_session(now);
        let mut local = remote.clone();
        local.status = SessionStatus::Expired;

        let merged = merge_session(Some(&local), remote);
        assert_eq!(merged.status, SessionStatus::Expired);
    }

    #[test]
    fn merge_prefers_remote_with_new_end_time() {
        let now = Utc::now();
        let mut local = ongoing_session(now);
        local.status = SessionStatus::Expired;

        // an extend landed remotely: same id, later end, ongoing again
        let mut remote = local.clone();
        remote.end_time += Duration::minutes(15);
        remote.duration_min += 15;
        remote.status = SessionStatus::Ongoing;

        let merged = merge_session(Some(&local), remote.clone());
        assert_eq!(merged, remote);
    }

    #[test]
    fn merge_replaces_different_session_wholesale() {
        let now = Utc::now();
        let mut local = ongoing_session(now);
        local.status = SessionStatus::Expired;

        let replacement = ongoing_session(now);
        let merged = merge_session(Some(&local), replacement.clone());
        assert_eq!(merged, replacement);
    }

    #[test]
    fn merge_never_demotes_within_same_window() {
        let now = Utc::now();
        let remote = ongoing_session(now);
        let mut local = remote.clone();
        local.status = SessionStatus::Ongoing;

        let mut stale_remote = remote.clone();
        stale_remote.status = SessionStatus::Scheduled;

        let merged = merge_session(Some(&local), stale_remote);
        assert_eq!(merged.status, SessionStatus::Ongoing);
    }

    #[test]
    fn snapshot_prunes_alert_when_session_replaced() {
        let now = Utc::now();
        let mut state = FloorState::new();
        let session = ongoing_session(now);
        let room = Room::new("101", "Room 101", 4);

        state.apply_snapshot(vec![room.clone()], vec![session.clone()]);
        state
            .alerts
            .insert("101".to_string(), Alert::new(session, now));

        // a different session took over the room remotely
        let replacement = ongoing_session(now);
        state.apply_snapshot(vec![room], vec![replacement]);
        assert!(state.alerts.is_empty());
    }
}
