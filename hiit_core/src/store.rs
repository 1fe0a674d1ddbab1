//! Workout log store and the completion commit.
//!
//! Completed workouts are appended to a JSONL (JSON Lines) file with file
//! locking. The commit path checks the store for a record from the same user
//! inside the duplicate window before writing, so a retried or doubled
//! submission is counted once. The CSV archive counts as part of the store,
//! so a rollup between two submissions doesn't reopen the window.

use crate::{Error, Result, WorkoutLog};
use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use uuid::Uuid;

/// Records for the same user closer together than this are duplicates
pub const DUPLICATE_WINDOW_SECS: i64 = 30;

/// Where completion records are kept
pub trait StatsStore {
    fn append(&self, log: &WorkoutLog) -> Result<()>;

    /// Records for `user_id` completed at or after `since`
    fn recent_logs(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<Vec<WorkoutLog>>;
}

/// JSONL-based workout log with file locking
#[derive(Clone, Debug)]
pub struct JsonlStore {
    path: PathBuf,
    archive: Option<PathBuf>,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            archive: None,
        }
    }

    /// Also read the CSV archive the log is rolled up into
    pub fn with_archive(mut self, csv_path: impl Into<PathBuf>) -> Self {
        self.archive = Some(csv_path.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl StatsStore for JsonlStore {
    fn append(&self, log: &WorkoutLog) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(log)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended workout {} to log", log.id);
        Ok(())
    }

    fn recent_logs(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<Vec<WorkoutLog>> {
        let logs = match &self.archive {
            Some(csv_path) => crate::stats::load_workout_logs(&self.path, csv_path)?,
            None => read_logs(&self.path)?,
        };
        Ok(logs
            .into_iter()
            .filter(|log| log.user_id == user_id && log.completed_at >= since)
            .collect())
    }
}

/// Read all records from a workout log file
pub fn read_logs(path: &Path) -> Result<Vec<WorkoutLog>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut logs = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<WorkoutLog>(&line) {
            Ok(log) => logs.push(log),
            Err(e) => {
                tracing::warn!("Failed to parse workout at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} workouts from log", logs.len());
    Ok(logs)
}

/// Result of submitting one completion record
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    Saved,
    /// A record for this user already landed inside the duplicate window
    DuplicateSuppressed,
}

/// Persist a completion record unless one was just written for the user.
///
/// Not retried on failure; the caller reports the error and moves on.
pub fn commit_completion(
    store: &dyn StatsStore,
    log: &WorkoutLog,
    now: DateTime<Utc>,
) -> Result<CommitOutcome> {
    let since = now - Duration::seconds(DUPLICATE_WINDOW_SECS);
    let recent = store.recent_logs(log.user_id, since)?;

    if let Some(existing) = recent.first() {
        tracing::info!(
            "Workout already recorded at {} for user {}; skipping duplicate",
            existing.completed_at,
            log.user_id
        );
        return Ok(CommitOutcome::DuplicateSuppressed);
    }

    store.append(log)?;
    tracing::info!(
        "Recorded {} minute workout for user {}",
        log.duration_minutes,
        log.user_id
    );
    Ok(CommitOutcome::Saved)
}

/// Run [`commit_completion`] on a background thread
pub fn spawn_commit(
    store: Arc<dyn StatsStore + Send + Sync>,
    log: WorkoutLog,
) -> Result<JoinHandle<Result<CommitOutcome>>> {
    std::thread::Builder::new()
        .name("workout-commit".into())
        .spawn(move || commit_completion(store.as_ref(), &log, Utc::now()))
        .map_err(|e| Error::Store(format!("Failed to start commit thread: {}", e)))
}


#[cfg(test)]
mod tests {
    use super::testing::MemoryStore;
    use super::*;

    #[test]
    fn test_append_and_read_single_log() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("wal").join("workouts.wal");

        let log = WorkoutLog::new(Uuid::new_v4(), 20, Utc::now());
        let store = JsonlStore::new(&path);
        store.append(&log).unwrap();

        let logs = read_logs(&path).unwrap();
        assert_eq!(logs, vec![log]);
    }

    #[test]
    fn test_read_missing_log() {
        let temp_dir = tempfile::tempdir().unwrap();
        let logs = read_logs(&temp_dir.path().join("nonexistent.wal")).unwrap();
        assert!(logs.is_empty());
    }

    #[test]
    fn test_corrupt_lines_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.wal");
        let store = JsonlStore::new(&path);
        store
            .append(&WorkoutLog::new(Uuid::new_v4(), 10, Utc::now()))
            .unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{ not json").unwrap();

        assert_eq!(read_logs(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_recent_logs_filters_user_and_time() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::new(temp_dir.path().join("workouts.wal"));
        let me = Uuid::new_v4();
        let now = Utc::now();

        store.append(&WorkoutLog::new(me, 10, now - Duration::minutes(5))).unwrap();
        store.append(&WorkoutLog::new(me, 10, now - Duration::seconds(5))).unwrap();
        store
            .append(&WorkoutLog::new(Uuid::new_v4(), 10, now))
            .unwrap();

        let recent = store.recent_logs(me, now - Duration::seconds(30)).unwrap();
        assert_eq!(recent.len(), 1);
    }

    #[test]
    fn test_duplicate_window_survives_rollup() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("wal").join("workouts.wal");
        let csv_path = temp_dir.path().join("workouts.csv");
        let store = JsonlStore::new(&wal_path).with_archive(&csv_path);
        let user = Uuid::new_v4();
        let now = Utc::now();

        let first = commit_completion(&store, &WorkoutLog::new(user, 20, now), now).unwrap();
        assert_eq!(first, CommitOutcome::Saved);

        crate::csv_rollup::wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert!(!wal_path.exists());

        let later = now + Duration::seconds(5);
        let second =
            commit_completion(&store, &WorkoutLog::new(user, 20, later), later).unwrap();
        assert_eq!(second, CommitOutcome::DuplicateSuppressed);

        let logs = crate::stats::load_workout_logs(&wal_path, &csv_path).unwrap();
        assert_eq!(logs.iter().filter(|l| l.user_id == user).count(), 1);
    }

    #[test]
    fn test_archived_record_outside_window_allows_commit() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("workouts.wal");
        let csv_path = temp_dir.path().join("workouts.csv");
        let store = JsonlStore::new(&wal_path).with_archive(&csv_path);
        let user = Uuid::new_v4();
        let now = Utc::now();

        store
            .append(&WorkoutLog::new(user, 20, now - Duration::minutes(10)))
            .unwrap();
        crate::csv_rollup::wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();

        let outcome = commit_completion(&store, &WorkoutLog::new(user, 20, now), now).unwrap();
        assert_eq!(outcome, CommitOutcome::Saved);
    }

    #[test]
    fn test_commit_saves_first_record() {
        let store = MemoryStore::default();
        let now = Utc::now();
        let log = WorkoutLog::new(Uuid::new_v4(), 15, now);

        let outcome = commit_completion(&store, &log, now).unwrap();
        assert_eq!(outcome, CommitOutcome::Saved);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_commit_suppresses_duplicate_in_window() {
        let store = MemoryStore::default();
        let user = Uuid::new_v4();
        let now = Utc::now();

        commit_completion(&store, &WorkoutLog::new(user, 15, now), now).unwrap();
        let later = now + Duration::seconds(10);
        let outcome =
            commit_completion(&store, &WorkoutLog::new(user, 15, later), later).unwrap();

        assert_eq!(outcome, CommitOutcome::DuplicateSuppressed);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_commit_allows_record_after_window() {
        let store = MemoryStore::default();
        let user = Uuid::new_v4();
        let now = Utc::now();

        commit_completion(&store, &WorkoutLog::new(user, 15, now), now).unwrap();
        let later = now + Duration::seconds(DUPLICATE_WINDOW_SECS + 1);
        let outcome =
            commit_completion(&store, &WorkoutLog::new(user, 15, later), later).unwrap();

        assert_eq!(outcome, CommitOutcome::Saved);
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_other_users_do_not_block_commit() {
        let store = MemoryStore::default();
        let now = Utc::now();

        commit_completion(&store, &WorkoutLog::new(Uuid::new_v4(), 15, now), now).unwrap();
        let outcome =
            commit_completion(&store, &WorkoutLog::new(Uuid::new_v4(), 15, now), now).unwrap();

        assert_eq!(outcome, CommitOutcome::Saved);
    }

    #[test]
    fn test_commit_failure_is_reported() {
        let store = MemoryStore::failing();
        let log = WorkoutLog::new(Uuid::new_v4(), 15, Utc::now());
        let err = commit_completion(&store, &log, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::Store(_)));
    }

    #[test]
    fn test_spawn_commit_writes_in_background() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.wal");
        let store: Arc<dyn StatsStore + Send + Sync> = Arc::new(JsonlStore::new(&path));

        let log = WorkoutLog::new(Uuid::new_v4(), 5, Utc::now());
        let handle = spawn_commit(store, log).unwrap();
        let outcome = handle.join().unwrap().unwrap();

        assert_eq!(outcome, CommitOutcome::Saved);
        assert_eq!(read_logs(&path).unwrap().len(), 1);
    }
}
