use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "norae")]
#[command(about = "NORAE - karaoke room rental floor operations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show rooms and active sessions
    Status,
    /// Start a rental session for a room
    Start {
        /// Room id (e.g. 101)
        room: String,
        /// Paid duration in minutes
        #[arg(long)]
        minutes: i64,
        /// Party size
        #[arg(long)]
        pax: u32,
        /// Start time (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<String>,
    },
    /// Extend the session for a room
    Extend {
        room: String,
        /// Additional minutes
        minutes: i64,
    },
    /// End the session for a room
    End { room: String },
    /// Show completed rental history
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Run the floor watcher (ticker + alarms) in the foreground
    Watch {
        /// Disable audible alarms
        #[arg(long)]
        no_sound: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("NORAE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Status => commands::status::run().await?,
        Commands::Start {
            room,
            minutes,
            pax,
            at,
        } => commands::start::run(&room, minutes, pax, at.as_deref()).await?,
        Commands::Extend { room, minutes } => commands::extend::run(&room, minutes).await?,
        Commands::End { room } => commands::end::run(&room).await?,
        Commands::History { limit } => commands::history::run(limit).await?,
        Commands::Watch { no_sound } => commands::watch::run(no_sound).await?,
    }

    Ok(())
}
