//! At-most-once expiry alarms.

use norae_core::alarm::{AlarmSink, PlaybackAttempt};
use norae_core::session::{AlarmKey, Session};
use std::collections::HashSet;
use std::sync::Arc;

/// Tracks which (room, session, end-time) triples have already triggered an
/// alarm, ensuring at-most-once firing per distinct expiry event.
///
/// Playback is best-effort: when the sink reports `Blocked` the key is
/// still marked (the expiry event was observed), and a single pending
/// fallback is kept to be replayed on the next user interaction.
pub struct AlarmDeduper {
    sink: Arc<dyn AlarmSink>,
    fired: HashSet<AlarmKey>,
    /// One-shot fallback awaiting an audio unlock
    pending: Option<AlarmKey>,
}

impl AlarmDeduper {
    pub fn new(sink: Arc<dyn AlarmSink>) -> Self {
        Self {
            sink,
            fired: HashSet::new(),
            pending: None,
        }
    }

    /// Whether this expiry event has already triggered.
    pub fn has_fired(&self, key: &AlarmKey) -> bool {
        self.fired.contains(key)
    }

    /// Fires the alarm for a session's expiry unless its key is already
    /// marked.
    pub fn notify(&mut self, session: &Session) {
        let key = session.alarm_key();
        if !self.fired.insert(key.clone()) {
            return;
        }

        match self.sink.try_play() {
            PlaybackAttempt::Started => {
                tracing::debug!(
                    "[AlarmDeduper] alarm fired for room {} session {}",
                    key.room_id,
                    key.session_id
                );
            }
            PlaybackAttempt::Blocked => {
                // platform denied playback; retry once on the next interaction
                tracing::debug!(
                    "[AlarmDeduper] playback blocked for room {}, deferring",
                    key.room_id
                );
                self.pending = Some(key);
            }
        }
    }

    /// Replays the pending blocked alarm, if any. One-shot: the fallback is
    /// unregistered whether or not playback succeeds this time.
    pub fn retry_pending(&mut self) {
        if let Some(key) = self.pending.take() {
            tracing::debug!("[AlarmDeduper] retrying alarm for room {}", key.room_id);
            let _ = self.sink.try_play();
        }
    }

    /// Halts any playing indication for a room without clearing its dedupe
    /// marks - replay requires a new key (new end time).
    pub fn stop(&mut self, room_id: &str) {
        if self
            .pending
            .as_ref()
            .is_some_and(|key| key.room_id == room_id)
        {
            self.pending = None;
        }
        self.sink.stop();
    }

    /// Drops every mark for a room and halts playback, allowing the room's
    /// next expiry to fire again. Used by extend and by the end-session
    /// resilience clear.
    pub fn reset(&mut self, room_id: &str) {
        self.fired.retain(|key| key.room_id != room_id);
        if self
            .pending
            .as_ref()
            .is_some_and(|key| key.room_id == room_id)
        {
            self.pending = None;
        }
        self.sink.stop();
    }

    /// Clears all marks and stops playback. Used for global teardown.
    pub fn silence_all(&mut self) {
        self.fired.clear();
        self.pending = None;
        self.sink.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingSink {
        plays: AtomicUsize,
        stops: AtomicUsize,
        blocked: AtomicBool,
    }

    impl RecordingSink {
        fn blocked() -> Self {
            Self {
                blocked: AtomicBool::new(true),
                ..Default::default()
            }
        }

        fn unlock(&self) {
            self.blocked.store(false, Ordering::SeqCst);
        }

        fn play_count(&self) -> usize {
            self.plays.load(Ordering::SeqCst)
        }
    }

    impl AlarmSink for RecordingSink {
        fn try_play(&self) -> PlaybackAttempt {
            if self.blocked.load(Ordering::SeqCst) {
                return PlaybackAttempt::Blocked;
            }
            self.plays.fetch_add(1, Ordering::SeqCst);
            PlaybackAttempt::Started
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn session() -> Session {
        let now = Utc::now();
        Session::new("101", now, 30, 2, now)
    }

    #[test]
    fn fires_once_per_key() {
        let sink = Arc::new(RecordingSink::default());
        let mut deduper = AlarmDeduper::new(sink.clone());
        let s = session();

        deduper.notify(&s);
        deduper.notify(&s);
        deduper.notify(&s);
        assert_eq!(sink.play_count(), 1);
    }

    #[test]
    fn new_end_time_fires_again() {
        let sink = Arc::new(RecordingSink::default());
        let mut deduper = AlarmDeduper::new(sink.clone());
        let mut s = session();

        deduper.notify(&s);
        s.end_time += chrono::Duration::minutes(15);
        deduper.notify(&s);
        assert_eq!(sink.play_count(), 2);
    }

    #[test]
    fn stop_keeps_the_mark() {
        let sink = Arc::new(RecordingSink::default());
        let mut deduper = AlarmDeduper::new(sink.clone());
        let s = session();

        deduper.notify(&s);
        deduper.stop("101");
        deduper.notify(&s);
        assert_eq!(sink.play_count(), 1);
        assert_eq!(sink.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reset_allows_same_key_to_fire_again() {
        let sink = Arc::new(RecordingSink::default());
        let mut deduper = AlarmDeduper::new(sink.clone());
        let s = session();

        deduper.notify(&s);
        deduper.reset("101");
        deduper.notify(&s);
        assert_eq!(sink.play_count(), 2);
    }

    #[test]
    fn reset_only_touches_the_given_room() {
        let sink = Arc::new(RecordingSink::default());
        let mut deduper = AlarmDeduper::new(sink.clone());
        let now = Utc::now();
        let a = Session::new("101", now, 30, 2, now);
        let b = Session::new("102", now, 30, 2, now);

        deduper.notify(&a);
        deduper.notify(&b);
        deduper.reset("101");
        deduper.notify(&b);
        assert_eq!(sink.play_count(), 2);
    }

    #[test]
    fn blocked_playback_retries_once_on_interaction() {
        let sink = Arc::new(RecordingSink::blocked());
        let mut deduper = AlarmDeduper::new(sink.clone());
        let s = session();

        deduper.notify(&s);
        assert_eq!(sink.play_count(), 0);

        sink.unlock();
        deduper.retry_pending();
        assert_eq!(sink.play_count(), 1);

        // the fallback is one-shot
        deduper.retry_pending();
        assert_eq!(sink.play_count(), 1);
    }

    #[test]
    fn silence_all_clears_every_mark() {
        let sink = Arc::new(RecordingSink::default());
        let mut deduper = AlarmDeduper::new(sink.clone());
        let s = session();

        deduper.notify(&s);
        deduper.silence_all();
        deduper.notify(&s);
        assert_eq!(sink.play_count(), 2);
    }
}
