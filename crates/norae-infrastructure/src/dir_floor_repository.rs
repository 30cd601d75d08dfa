//! Directory-backed floor repository.
//!
//! Stands in for the remote store: one TOML file per record, fully async
//! I/O, and an in-process broadcast feed that emits an opaque change event
//! on every session or history mutation.

use anyhow::Context;
use async_trait::async_trait;
use norae_core::config::FloorConfig;
use norae_core::error::{NoraeError, Result};
use norae_core::history::{HistoryInsert, HistoryRecord};
use norae_core::repository::{FloorRepository, StoreChange};
use norae_core::room::{Room, RoomStatus};
use norae_core::session::Session;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::broadcast;

/// TOML-file-per-record store.
///
/// Directory structure:
/// ```text
/// base_dir/
/// ├── rooms/
/// │   ├── 101.toml
/// │   └── 102.toml
/// ├── sessions/
/// │   └── 101.toml          (named by room id - one session per room)
/// └── history/
///     └── <session-id>.toml (named by session id - one completed record)
/// ```
///
/// The file naming carries two invariants: a room cannot hold two session
/// rows, and `insert_history` is an existence check away from idempotent.
pub struct DirFloorRepository {
    rooms_dir: PathBuf,
    sessions_dir: PathBuf,
    history_dir: PathBuf,
    changes: broadcast::Sender<StoreChange>,
}

impl DirFloorRepository {
    /// Opens (and on first run seeds) the store under `base_dir`.
    ///
    /// Rooms are seeded from the configuration when the rooms directory is
    /// empty; existing room rows are left untouched so their occupancy
    /// status survives restarts.
    pub async fn open(base_dir: impl AsRef<Path>, config: &FloorConfig) -> anyhow::Result<Self> {
        let base_dir = base_dir.as_ref();
        let rooms_dir = base_dir.join("rooms");
        let sessions_dir = base_dir.join("sessions");
        let history_dir = base_dir.join("history");

        for dir in [&rooms_dir, &sessions_dir, &history_dir] {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }

        let (changes, _) = broadcast::channel(64);
        let repo = Self {
            rooms_dir,
            sessions_dir,
            history_dir,
            changes,
        };

        if repo.list_rooms().await?.is_empty() {
            tracing::info!(
                "[DirFloorRepository] seeding {} rooms from config",
                config.rooms.len()
            );
            for room_config in config.rooms.iter().cloned() {
                let room = room_config.into_room();
                repo.write_record(&repo.rooms_dir, &room.id, &room).await?;
            }
        }

        Ok(repo)
    }

    fn record_path(dir: &Path, id: &str) -> PathBuf {
        dir.join(format!("{id}.toml"))
    }

    async fn read_record<T: DeserializeOwned>(path: &Path) -> Result<T> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            NoraeError::persistence(format!("failed to read {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&content)?)
    }

    async fn write_record<T: Serialize>(&self, dir: &Path, id: &str, record: &T) -> Result<()> {
        let path = Self::record_path(dir, id);
        let content = toml::to_string_pretty(record)?;
        fs::write(&path, content).await.map_err(|e| {
            NoraeError::persistence(format!("failed to write {}: {}", path.display(), e))
        })?;
        Ok(())
    }

    /// Reads every record in a directory, skipping files that fail to
    /// parse (logged, not fatal).
    async fn read_dir_records<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
        let mut entries = fs::read_dir(dir).await.map_err(|e| {
            NoraeError::persistence(format!("failed to list {}: {}", dir.display(), e))
        })?;

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            NoraeError::persistence(format!("failed to list {}: {}", dir.display(), e))
        })? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "toml") {
                continue;
            }
            match Self::read_record(&path).await {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!(
                        "[DirFloorRepository] skipping unreadable record {}: {}",
                        path.display(),
                        err
                    );
                }
            }
        }
        Ok(records)
    }

    fn publish(&self, change: StoreChange) {
        // no receivers is fine
        let _ = self.changes.send(change);
    }
}

#[async_trait]
impl FloorRepository for DirFloorRepository {
    async fn list_rooms(&self) -> Result<Vec<Room>> {
        let mut rooms: Vec<Room> = Self::read_dir_records(&self.rooms_dir).await?;
        rooms.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rooms)
    }

    async fn list_sessions(&self) -> Result<Vec<Session>> {
        Self::read_dir_records(&self.sessions_dir).await
    }

    async fn list_history(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        let mut records: Vec<HistoryRecord> = Self::read_dir_records(&self.history_dir).await?;
        records.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        records.truncate(limit);
        Ok(records)
    }

    async fn upsert_session(&self, session: &Session) -> Result<()> {
        self.write_record(&self.sessions_dir, &session.room_id, session)
            .await?;
        self.publish(StoreChange::Sessions);
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        // session files are named by room id; find the row by its id
        let sessions: Vec<Session> = Self::read_dir_records(&self.sessions_dir).await?;
        let Some(session) = sessions.into_iter().find(|s| s.id == session_id) else {
            return Ok(());
        };

        let path = Self::record_path(&self.sessions_dir, &session.room_id);
        fs::remove_file(&path).await.map_err(|e| {
            NoraeError::persistence(format!("failed to delete {}: {}", path.display(), e))
        })?;
        self.publish(StoreChange::Sessions);
        Ok(())
    }

    async fn update_room_status(&self, room_id: &str, status: RoomStatus) -> Result<()> {
        let path = Self::record_path(&self.rooms_dir, room_id);
        if !path.exists() {
            return Err(NoraeError::not_found("Room", room_id));
        }

        let mut room: Room = Self::read_record(&path).await?;
        room.status = status;
        self.write_record(&self.rooms_dir, room_id, &room).await
    }

    async fn insert_history(&self, record: &HistoryRecord) -> Result<HistoryInsert> {
        let path = Self::record_path(&self.history_dir, &record.session_id);
        if path.exists() {
            return Ok(HistoryInsert::DuplicateSkip);
        }

        self.write_record(&self.history_dir, &record.session_id, record)
            .await?;
        self.publish(StoreChange::History);
        Ok(HistoryInsert::Inserted(record.clone()))
    }

    fn subscribe_changes(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use norae_core::config::RoomConfig;

    fn test_config() -> FloorConfig {
        FloorConfig {
            tick_interval_secs: 1,
            sound: false,
            rooms: vec![
                RoomConfig {
                    id: "101".to_string(),
                    name: "Room 101".to_string(),
                    capacity: 4,
                },
                RoomConfig {
                    id: "102".to_string(),
                    name: "Room 102".to_string(),
                    capacity: 6,
                },
            ],
        }
    }

    async fn open_repo(dir: &tempfile::TempDir) -> DirFloorRepository {
        DirFloorRepository::open(dir.path(), &test_config())
            .await
            .unwrap()
    }

    fn sample_session() -> Session {
        let now = Utc::now();
        Session::new("101", now, 30, 2, now)
    }

    #[tokio::test]
    async fn seeds_rooms_from_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_repo(&dir).await;

        let rooms = repo.list_rooms().await.unwrap();
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].id, "101");
        assert_eq!(rooms[0].status, RoomStatus::Available);

        // re-opening must not clobber mutated room rows
        repo.update_room_status("101", RoomStatus::Occupied)
            .await
            .unwrap();
        let repo = open_repo(&dir).await;
        assert_eq!(
            repo.list_rooms().await.unwrap()[0].status,
            RoomStatus::Occupied
        );
    }

    #[tokio::test]
    async fn session_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_repo(&dir).await;
        let session = sample_session();

        repo.upsert_session(&session).await.unwrap();
        let listed = repo.list_sessions().await.unwrap();
        assert_eq!(listed, vec![session.clone()]);

        repo.delete_session(&session.id).await.unwrap();
        assert!(repo.list_sessions().await.unwrap().is_empty());

        // deleting an unknown id is not an error
        repo.delete_session(&session.id).await.unwrap();
    }

    #[tokio::test]
    async fn upsert_replaces_the_rooms_session_row() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_repo(&dir).await;
        let session = sample_session();

        repo.upsert_session(&session).await.unwrap();
        let mut extended = session.clone();
        extended.end_time += Duration::minutes(15);
        extended.duration_min += 15;
        repo.upsert_session(&extended).await.unwrap();

        let listed = repo.list_sessions().await.unwrap();
        assert_eq!(listed, vec![extended]);
    }

    #[tokio::test]
    async fn history_insert_is_idempotent_per_session() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_repo(&dir).await;
        let session = sample_session();
        let record = HistoryRecord::completed(&session, "tester", Utc::now());

        let first = repo.insert_history(&record).await.unwrap();
        assert_eq!(first, HistoryInsert::Inserted(record.clone()));

        let second = repo.insert_history(&record).await.unwrap();
        assert!(second.is_duplicate());

        assert_eq!(repo.list_history(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn history_lists_newest_first_with_limit() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_repo(&dir).await;
        let now = Utc::now();

        for i in 0..3 {
            let session = Session::new("101", now, 30, 2, now);
            let record =
                HistoryRecord::completed(&session, "tester", now + Duration::minutes(i));
            repo.insert_history(&record).await.unwrap();
        }

        let records = repo.list_history(2).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].recorded_at > records[1].recorded_at);
    }

    #[tokio::test]
    async fn mutations_emit_change_events() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_repo(&dir).await;
        let mut changes = repo.subscribe_changes();
        let session = sample_session();

        repo.upsert_session(&session).await.unwrap();
        assert_eq!(changes.recv().await.unwrap(), StoreChange::Sessions);

        let record = HistoryRecord::completed(&session, "tester", Utc::now());
        repo.insert_history(&record).await.unwrap();
        assert_eq!(changes.recv().await.unwrap(), StoreChange::History);
    }

    #[tokio::test]
    async fn update_room_status_requires_the_room() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_repo(&dir).await;

        let err = repo
            .update_room_status("999", RoomStatus::Occupied)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
