use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use norae_application::StartSession;

pub async fn run(room: &str, minutes: i64, pax: u32, at: Option<&str>) -> Result<()> {
    let start_time = at
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .with_context(|| format!("invalid start time '{s}' (expected RFC 3339)"))
        })
        .transpose()?;

    let (engine, _) = super::open_engine(false).await?;
    let session = engine
        .start_session(
            room,
            StartSession {
                start_time,
                duration_min: minutes,
                pax,
            },
        )
        .await?;

    println!(
        "started session in room {}: {} - {} ({} pax)",
        room,
        session.start_time.format("%H:%M"),
        session.end_time.format("%H:%M"),
        session.pax
    );
    Ok(())
}
