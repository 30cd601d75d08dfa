//! Foreground floor watcher.
//!
//! Runs the engine's tick/resync loop and mirrors alerts to the terminal.
//! Input lines double as the user interaction that unlocks blocked audio:
//! an empty line replays a pending alarm, `ack <room>` dismisses an alert,
//! `q` (or Ctrl-C) tears down.

use anyhow::Result;
use norae_core::session::AlarmKey;
use std::collections::HashSet;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(no_sound: bool) -> Result<()> {
    let (engine, config) = super::open_engine(!no_sound).await?;

    let runner = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.run().await })
    };

    println!(
        "watching the floor (tick every {}s) - 'ack <room>' dismisses, 'q' quits",
        config.tick_interval_secs
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut poll = tokio::time::interval(Duration::from_millis(500));
    let mut announced: HashSet<AlarmKey> = HashSet::new();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        let line = line.trim().to_string();
                        if line == "q" {
                            break;
                        }
                        if let Some(room) = line.strip_prefix("ack ") {
                            engine.acknowledge_alert(room.trim()).await;
                            println!("acknowledged room {}", room.trim());
                        }
                        // any input counts as an interaction for audio unlock
                        engine.notify_user_interaction().await;
                    }
                    None => break,
                }
            }
            _ = poll.tick() => {
                for (room_id, alert) in engine.active_alerts().await {
                    let key = alert.session.alarm_key();
                    if announced.insert(key) {
                        println!(
                            "ALERT room {}: session expired at {} ({} pax) - extend or end",
                            room_id,
                            alert.session.end_time.format("%H:%M"),
                            alert.session.pax
                        );
                    }
                }
            }
        }
    }

    engine.shutdown().await;
    runner.abort();
    println!("floor watcher stopped");
    Ok(())
}
