//! Audio/visual notification seam.

/// Result of attempting to start alarm playback.
///
/// `Blocked` models platform playback restrictions (no audio device, no
/// prior user interaction unlocking sound). The caller may retry on the
/// next user interaction; delivery is best-effort only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackAttempt {
    Started,
    Blocked,
}

/// The audio/visual notification subsystem the engine triggers on expiry.
///
/// The engine calls this but does not implement it; infrastructure provides
/// a system-sound implementation and tests substitute a recording mock.
pub trait AlarmSink: Send + Sync {
    /// Attempts to start the expiry indication immediately.
    fn try_play(&self) -> PlaybackAttempt;

    /// Halts any playing indication. Idempotent.
    fn stop(&self);
}
