//! The session lifecycle engine.
//!
//! `FloorEngine` wires the floor state store, the clock ticker, the alarm
//! deduper and the session commands together on top of a
//! [`FloorRepository`]. A single cooperative loop drives ticks and
//! change-feed resyncs; commands may run concurrently with ticks and are
//! reconciled through the full-snapshot resync that follows every command.

use crate::floor::deduper::AlarmDeduper;
use crate::floor::state::FloorState;
use chrono::{DateTime, Duration, Utc};
use norae_core::alarm::AlarmSink;
use norae_core::alert::Alert;
use norae_core::error::{NoraeError, Result};
use norae_core::history::HistoryRecord;
use norae_core::repository::FloorRepository;
use norae_core::room::{Room, RoomStatus};
use norae_core::session::{Session, SessionStatus};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, RwLock};

/// Parameters for [`FloorEngine::start_session`].
#[derive(Debug, Clone)]
pub struct StartSession {
    /// When the rental window opens; `None` means now
    pub start_time: Option<DateTime<Utc>>,
    pub duration_min: i64,
    pub pax: u32,
}

pub struct FloorEngine {
    /// The remote persisted store
    repository: Arc<dyn FloorRepository>,
    /// Locally derived floor state, the UI's single source of truth
    state: RwLock<FloorState>,
    /// At-most-once expiry alarms
    deduper: Mutex<AlarmDeduper>,
    /// Session ids whose remote expiry write has been issued. Added before
    /// the write, removed on failure so the next tick retries (no backoff,
    /// no cap), rebuilt from every snapshot.
    expiry_writes: Mutex<HashSet<String>>,
    /// The operator recorded on history records
    actor: String,
    tick_interval: std::time::Duration,
    /// Set by shutdown; late-landing remote results are ignored after this
    closed: AtomicBool,
}

impl FloorEngine {
    pub fn new(
        repository: Arc<dyn FloorRepository>,
        sink: Arc<dyn AlarmSink>,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            state: RwLock::new(FloorState::new()),
            deduper: Mutex::new(AlarmDeduper::new(sink)),
            expiry_writes: Mutex::new(HashSet::new()),
            actor: actor.into(),
            tick_interval: std::time::Duration::from_secs(1),
            closed: AtomicBool::new(false),
        }
    }

    pub fn with_tick_interval(mut self, interval: std::time::Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    // ========================================================================
    // Upward-facing state snapshots
    // ========================================================================

    /// All rooms, sorted by id.
    pub async fn rooms(&self) -> Vec<Room> {
        let state = self.state.read().await;
        let mut rooms: Vec<Room> = state.rooms.values().cloned().collect();
        rooms.sort_by(|a, b| a.id.cmp(&b.id));
        rooms
    }

    /// Active sessions, keyed by room id.
    pub async fn sessions(&self) -> HashMap<String, Session> {
        self.state.read().await.sessions.clone()
    }

    /// Raised expiry alerts, keyed by room id.
    pub async fn active_alerts(&self) -> HashMap<String, Alert> {
        self.state.read().await.alerts.clone()
    }

    /// Timestamp of the most recent tick.
    pub async fn now(&self) -> DateTime<Utc> {
        self.state.read().await.now
    }

    // ========================================================================
    // Resync
    // ========================================================================

    /// Pulls a full snapshot from the store and merges it into the floor
    /// state.
    ///
    /// This is the authoritative reconciliation point: it runs after every
    /// command and on every change-feed event. The expiry-write marker set
    /// is rebuilt from the snapshot, so a session whose end time moved (an
    /// extend) becomes eligible for a fresh expiry write.
    pub async fn resync(&self) -> Result<()> {
        let rooms = self.repository.list_rooms().await?;
        let sessions = self.repository.list_sessions().await?;

        // a teardown may have happened while the reads were in flight
        if self.closed.load(Ordering::SeqCst) {
            tracing::debug!("[FloorEngine] dropping resync result after shutdown");
            return Ok(());
        }

        {
            let mut in_flight = self.expiry_writes.lock().await;
            *in_flight = sessions
                .iter()
                .filter(|s| s.status == SessionStatus::Expired)
                .map(|s| s.id.clone())
                .collect();
        }

        let mut state = self.state.write().await;
        state.apply_snapshot(rooms, sessions);
        tracing::debug!(
            "[FloorEngine] resynced: {} rooms, {} sessions",
            state.rooms.len(),
            state.sessions.len()
        );
        Ok(())
    }

    // ========================================================================
    // Ticker
    // ========================================================================

    /// Runs one tick of the lifecycle engine at the given instant.
    ///
    /// Promotes session status from wall-clock comparisons, issues the
    /// at-most-once remote expiry write, and raises alerts/alarms for newly
    /// observed expiries.
    pub async fn tick_at(&self, now: DateTime<Utc>) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }

        let mut expired: Vec<Session> = Vec::new();
        {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            state.now = now;

            for session in state.sessions.values_mut() {
                let inferred = session.status_at(now);
                if inferred > session.status {
                    tracing::debug!(
                        "[FloorEngine] promoting session {} in room {}: {:?} -> {:?}",
                        session.id,
                        session.room_id,
                        session.status,
                        inferred
                    );
                    session.status = inferred;
                }
                if session.is_expired_at(now) {
                    expired.push(session.clone());
                }
            }
        }

        for session in &expired {
            self.write_expired_once(session, now).await;
        }

        for session in &expired {
            self.raise_alert_once(session, now).await;
        }
    }

    /// Issues the remote `Expired` status update at most once per session.
    async fn write_expired_once(&self, session: &Session, now: DateTime<Utc>) {
        {
            let mut in_flight = self.expiry_writes.lock().await;
            if !in_flight.insert(session.id.clone()) {
                return;
            }
        }

        let mut update = session.clone();
        update.status = SessionStatus::Expired;
        update.updated_at = now;

        if let Err(err) = self.repository.upsert_session(&update).await {
            // drop the marker so the next tick retries
            tracing::warn!(
                "[FloorEngine] expiry write for session {} failed, retrying next tick: {}",
                session.id,
                err
            );
            self.expiry_writes.lock().await.remove(&session.id);
        }
    }

    /// Creates the alert and fires the alarm on the first tick observing
    /// this expiry. Acknowledged expiries stay acknowledged: the dedupe
    /// mark, not the alert's absence, decides whether this one is new.
    async fn raise_alert_once(&self, session: &Session, now: DateTime<Utc>) {
        let key = session.alarm_key();
        if self.deduper.lock().await.has_fired(&key) {
            return;
        }

        {
            let mut state = self.state.write().await;
            if state.alerts.contains_key(&session.room_id) {
                return;
            }
            state
                .alerts
                .insert(session.room_id.clone(), Alert::new(session.clone(), now));
        }

        tracing::info!(
            "[FloorEngine] session expired in room {} (party of {})",
            session.room_id,
            session.pax
        );
        self.deduper.lock().await.notify(session);
    }

    /// Drives the engine: a fixed-interval ticker cooperatively selected
    /// against the store's change feed. Returns when the engine is shut
    /// down or the feed closes.
    pub async fn run(&self) {
        let mut changes = self.repository.subscribe_changes();
        let mut ticker = tokio::time::interval(self.tick_interval);

        loop {
            if self.closed.load(Ordering::SeqCst) {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    self.tick_at(Utc::now()).await;
                }
                changed = changes.recv() => match changed {
                    Ok(_) | Err(RecvError::Lagged(_)) => {
                        // payload is opaque; any change means resync
                        if let Err(err) = self.resync().await {
                            tracing::warn!("[FloorEngine] feed-triggered resync failed: {}", err);
                        }
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
    }

    // ========================================================================
    // Session commands
    // ========================================================================

    /// Starts a rental session for a room.
    ///
    /// Any stale session row for the room is defensively removed first.
    /// Validation happens synchronously before any remote call; no local
    /// mutation survives a failed remote write.
    ///
    /// # Errors
    ///
    /// - `Validation`: non-positive duration, zero party size, or party
    ///   size over room capacity
    /// - `NotFound`: unknown room
    /// - `Persistence`: a remote write failed
    pub async fn start_session(&self, room_id: &str, request: StartSession) -> Result<Session> {
        if request.duration_min <= 0 {
            return Err(NoraeError::validation("duration must be positive"));
        }
        if request.pax == 0 {
            return Err(NoraeError::validation("party size must be positive"));
        }

        let room = self
            .state
            .read()
            .await
            .rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| NoraeError::not_found("Room", room_id))?;
        if request.pax > room.capacity {
            return Err(NoraeError::validation(format!(
                "party of {} exceeds capacity {} of room {}",
                request.pax, room.capacity, room.id
            )));
        }

        // covers prior inconsistent state: a leftover row must not survive
        let stale = self.state.read().await.sessions.get(room_id).cloned();
        if let Some(stale) = stale {
            tracing::warn!(
                "[FloorEngine] removing stale session {} before starting room {}",
                stale.id,
                room_id
            );
            self.repository.delete_session(&stale.id).await?;
        }

        let now = Utc::now();
        let start_time = request.start_time.unwrap_or(now);
        let session = Session::new(room_id, start_time, request.duration_min, request.pax, now);

        self.repository.upsert_session(&session).await?;
        self.repository
            .update_room_status(room_id, RoomStatus::Occupied)
            .await?;
        self.resync().await?;

        tracing::info!(
            "[FloorEngine] started session {} in room {} until {}",
            session.id,
            room_id,
            session.end_time
        );
        Ok(session)
    }

    /// Extends the session for a room by `minutes`, reviving it to
    /// `Ongoing` if it had expired. The room's alarm mark and alert are
    /// cleared so the new expiry can fire again.
    ///
    /// # Errors
    ///
    /// - `Validation`: non-positive minutes
    /// - `NotFound`: no session for the room
    /// - `Persistence`: the remote write failed (local state unchanged)
    pub async fn extend_session(&self, room_id: &str, minutes: i64) -> Result<Session> {
        if minutes <= 0 {
            return Err(NoraeError::validation("extension must be positive"));
        }

        let current = self
            .state
            .read()
            .await
            .sessions
            .get(room_id)
            .cloned()
            .ok_or_else(|| NoraeError::not_found("Session", room_id))?;

        let mut updated = current.clone();
        updated.end_time = current.end_time + Duration::minutes(minutes);
        updated.duration_min = current.duration_min + minutes;
        updated.status = SessionStatus::Ongoing;
        updated.updated_at = Utc::now();

        self.repository.upsert_session(&updated).await?;

        self.deduper.lock().await.reset(room_id);
        self.state.write().await.alerts.remove(room_id);
        self.resync().await?;

        tracing::info!(
            "[FloorEngine] extended session {} in room {} by {}min until {}",
            updated.id,
            room_id,
            minutes,
            updated.end_time
        );
        Ok(updated)
    }

    /// Ends the session for a room, recording the `Completed` history entry
    /// (skipped when one already exists) and freeing the room.
    ///
    /// Local alert/alarm state for the room is cleared even when the remote
    /// operation fails, so the alarm nuisance stops immediately - but the
    /// error is still returned and a retry is safe: the history existence
    /// check prevents duplicate records.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no session for the room
    /// - `Persistence`: a remote write failed (retry with another call)
    pub async fn end_session(&self, room_id: &str) -> Result<()> {
        let current = self
            .state
            .read()
            .await
            .sessions
            .get(room_id)
            .cloned()
            .ok_or_else(|| NoraeError::not_found("Session", room_id))?;

        let result = self.end_session_remote(&current).await;

        // resilience clear: runs regardless of the remote outcome
        self.state.write().await.alerts.remove(room_id);
        self.deduper.lock().await.reset(room_id);

        if let Err(err) = &result {
            tracing::warn!(
                "[FloorEngine] ending session {} in room {} failed (local state cleared): {}",
                current.id,
                room_id,
                err
            );
        } else {
            tracing::info!(
                "[FloorEngine] ended session {} in room {}",
                current.id,
                room_id
            );
        }
        result
    }

    async fn end_session_remote(&self, session: &Session) -> Result<()> {
        let record = HistoryRecord::completed(session, &self.actor, Utc::now());
        let insert = self.repository.insert_history(&record).await?;
        if insert.is_duplicate() {
            tracing::debug!(
                "[FloorEngine] completed record for session {} already exists, skipping",
                session.id
            );
        }

        self.repository.delete_session(&session.id).await?;
        self.repository
            .update_room_status(&session.room_id, RoomStatus::Available)
            .await?;
        self.resync().await
    }

    /// Dismisses the alert for a room and stops playback. The dedupe mark
    /// stays, so the same expiry does not re-raise.
    pub async fn acknowledge_alert(&self, room_id: &str) {
        self.state.write().await.alerts.remove(room_id);
        self.deduper.lock().await.stop(room_id);
    }

    /// Signals a user interaction, replaying an alarm that was blocked by
    /// platform playback policy.
    pub async fn notify_user_interaction(&self) {
        self.deduper.lock().await.retry_pending();
    }

    /// Tears the engine down: silences and clears all local alarm/alert
    /// state and detaches the run loop. In-flight remote calls are not
    /// cancelled; their results are ignored when they land.
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.deduper.lock().await.silence_all();
        self.state.write().await.alerts.clear();
        tracing::debug!("[FloorEngine] shut down");
    }
}
