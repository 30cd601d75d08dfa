use anyhow::Result;
use chrono::Utc;
use norae_core::room::RoomStatus;
use norae_core::session::SessionStatus;

pub async fn run() -> Result<()> {
    let (engine, _) = super::open_engine(false).await?;
    let rooms = engine.rooms().await;
    let sessions = engine.sessions().await;
    let now = Utc::now();

    println!("{:<6} {:<16} {:<4} {:<10} SESSION", "ROOM", "NAME", "CAP", "STATUS");
    for room in rooms {
        let status = match room.status {
            RoomStatus::Available => "available",
            RoomStatus::Occupied => "occupied",
        };

        let session = match sessions.get(&room.id) {
            Some(session) => {
                let remaining = (session.end_time - now).num_minutes();
                match session.status {
                    SessionStatus::Scheduled => format!(
                        "scheduled {} ({} pax)",
                        session.start_time.format("%H:%M"),
                        session.pax
                    ),
                    SessionStatus::Ongoing => format!(
                        "until {} ({} pax, {}min left)",
                        session.end_time.format("%H:%M"),
                        session.pax,
                        remaining.max(0)
                    ),
                    SessionStatus::Expired => format!(
                        "EXPIRED {}min ago ({} pax)",
                        -remaining,
                        session.pax
                    ),
                }
            }
            None => "-".to_string(),
        };

        println!(
            "{:<6} {:<16} {:<4} {:<10} {}",
            room.id, room.name, room.capacity, status, session
        );
    }

    Ok(())
}
