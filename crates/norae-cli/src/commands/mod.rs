pub mod end;
pub mod extend;
pub mod history;
pub mod start;
pub mod status;
pub mod watch;

use anyhow::Result;
use norae_application::FloorEngine;
use norae_core::alarm::AlarmSink;
use norae_core::config::FloorConfig;
use norae_infrastructure::{
    DirFloorRepository, NoraePaths, SilentAlarmSink, SystemAlarmSink, load_floor_config,
};
use std::sync::Arc;
use std::time::Duration;

/// Builds an engine on the configured store and pulls the initial snapshot.
///
/// `audible` requests audible alarms; the config's `sound` switch can still
/// veto them.
pub(crate) async fn open_engine(audible: bool) -> Result<(Arc<FloorEngine>, FloorConfig)> {
    let config = load_floor_config()?;
    let data_dir = NoraePaths::data_dir()?;
    let repository = Arc::new(DirFloorRepository::open(&data_dir, &config).await?);

    let sink: Arc<dyn AlarmSink> = if audible && config.sound {
        Arc::new(SystemAlarmSink::new())
    } else {
        Arc::new(SilentAlarmSink)
    };

    let actor = std::env::var("USER").unwrap_or_else(|_| "operator".to_string());
    let engine = Arc::new(
        FloorEngine::new(repository, sink, actor)
            .with_tick_interval(Duration::from_secs(config.tick_interval_secs)),
    );
    engine.resync().await?;

    Ok((engine, config))
}
