use anyhow::Result;

pub async fn run(room: &str, minutes: i64) -> Result<()> {
    let (engine, _) = super::open_engine(false).await?;
    let session = engine.extend_session(room, minutes).await?;

    println!(
        "extended room {} by {}min, now until {}",
        room,
        minutes,
        session.end_time.format("%H:%M")
    );
    Ok(())
}
