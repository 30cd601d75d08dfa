//! System sound alarm sink.
//!
//! Emits a terminal bell and plays a system alarm sound through whatever
//! player the platform provides. Playback is spawned detached so it never
//! blocks the ticker.

use norae_core::alarm::{AlarmSink, PlaybackAttempt};
use std::io::{self, Write};
use std::process::{Child, Command};
use std::sync::Mutex;

/// Plays the expiry alarm through the platform's sound player.
///
/// On macOS this uses `afplay` with a system sound; on Linux, `paplay`
/// (PulseAudio) falling back to `aplay` (ALSA). When no player can be
/// spawned the attempt reports `Blocked` and the caller may retry on the
/// next user interaction.
pub struct SystemAlarmSink {
    playing: Mutex<Option<Child>>,
}

impl SystemAlarmSink {
    pub fn new() -> Self {
        Self {
            playing: Mutex::new(None),
        }
    }

    fn emit_bell() {
        let mut stdout = io::stdout();
        let _ = stdout.write_all(b"\x07");
        let _ = stdout.flush();
    }
}

impl Default for SystemAlarmSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmSink for SystemAlarmSink {
    fn try_play(&self) -> PlaybackAttempt {
        Self::emit_bell();

        match spawn_player() {
            Some(child) => {
                let mut playing = self.playing.lock().unwrap();
                if let Some(mut previous) = playing.replace(child) {
                    let _ = previous.kill();
                }
                PlaybackAttempt::Started
            }
            None => {
                tracing::debug!("[SystemAlarmSink] no audio player available");
                PlaybackAttempt::Blocked
            }
        }
    }

    fn stop(&self) {
        if let Some(mut child) = self.playing.lock().unwrap().take() {
            let _ = child.kill();
        }
    }
}

#[cfg(target_os = "macos")]
fn spawn_player() -> Option<Child> {
    Command::new("afplay")
        .arg("/System/Library/Sounds/Sosumi.aiff")
        .arg("-v")
        .arg("0.5")
        .spawn()
        .ok()
}

#[cfg(target_os = "linux")]
fn spawn_player() -> Option<Child> {
    let candidates = [
        "/usr/share/sounds/freedesktop/stereo/alarm-clock-elapsed.oga",
        "/usr/share/sounds/freedesktop/stereo/complete.oga",
    ];
    let sound = candidates
        .iter()
        .find(|path| std::path::Path::new(path).exists())?;

    Command::new("paplay")
        .arg(sound)
        .spawn()
        .or_else(|_| Command::new("aplay").arg("-q").arg(sound).spawn())
        .ok()
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn spawn_player() -> Option<Child> {
    None
}

/// Sink that acknowledges every play without making a sound. Used for
/// `--no-sound` runs and one-shot commands.
pub struct SilentAlarmSink;

impl AlarmSink for SilentAlarmSink {
    fn try_play(&self) -> PlaybackAttempt {
        PlaybackAttempt::Started
    }

    fn stop(&self) {}
}
