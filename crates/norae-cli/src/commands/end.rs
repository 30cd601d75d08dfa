use anyhow::Result;

pub async fn run(room: &str) -> Result<()> {
    let (engine, _) = super::open_engine(false).await?;
    engine.end_session(room).await?;

    println!("ended session in room {room}");
    Ok(())
}
