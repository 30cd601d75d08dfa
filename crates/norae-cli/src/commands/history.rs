use anyhow::Result;
use norae_core::repository::FloorRepository;
use norae_infrastructure::{DirFloorRepository, NoraePaths, load_floor_config};

pub async fn run(limit: usize) -> Result<()> {
    let config = load_floor_config()?;
    let repository = DirFloorRepository::open(NoraePaths::data_dir()?, &config).await?;
    let records = repository.list_history(limit).await?;

    if records.is_empty() {
        println!("no completed rentals yet");
        return Ok(());
    }

    for record in records {
        println!(
            "{}  room {}  {} - {}  {:>3}min  {} pax  by {}",
            record.recorded_at.format("%Y-%m-%d %H:%M"),
            record.room_id,
            record.start_time.format("%H:%M"),
            record.end_time.format("%H:%M"),
            record.duration_min,
            record.pax,
            record.actor
        );
    }
    Ok(())
}
