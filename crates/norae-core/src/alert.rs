//! Expiry alert model.

use crate::session::Session;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A transient, locally derived alert raised when a session's expiry is
/// first observed by the ticker.
///
/// Alerts are keyed by room in the floor state and embed a snapshot of the
/// session as observed at expiry, so the presentation layer can render the
/// alert even after the session row changes remotely. Cleared by extend,
/// end, or explicit acknowledgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub room_id: String,
    pub session: Session,
    /// The moment expiry was first observed locally
    pub raised_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(session: Session, raised_at: DateTime<Utc>) -> Self {
        Self {
            room_id: session.room_id.clone(),
            session,
            raised_at,
        }
    }
}
