//! CSV rollup for archiving the workout log.
//!
//! The JSONL log is appended to `workouts.csv` and then renamed to
//! `.wal.processed`, so the CSV is always written before the log goes away.

use crate::{Result, WorkoutLog};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV archive
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CsvRow {
    pub id: String,
    pub user_id: String,
    pub duration_minutes: u32,
    pub workout_type: String,
    pub completed_at: String,
}

impl From<&WorkoutLog> for CsvRow {
    fn from(log: &WorkoutLog) -> Self {
        CsvRow {
            id: log.id.to_string(),
            user_id: log.user_id.to_string(),
            duration_minutes: log.duration_minutes,
            workout_type: log.workout_type.clone(),
            completed_at: log.completed_at.to_rfc3339(),
        }
    }
}

/// Roll up the workout log into CSV and archive it
///
/// This function:
/// 1. Reads all records from the log
/// 2. Appends them to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Renames the log to .wal.processed
/// 5. Returns the number of records processed
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    let logs = crate::store::read_logs(wal_path)?;

    if logs.is_empty() {
        tracing::info!("No workouts in log to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Headers only for a fresh file
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for log in &logs {
        writer.serialize(CsvRow::from(log))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} workouts to CSV", logs.len());

    let processed_path = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &processed_path)?;

    tracing::info!("Archived workout log to {:?}", processed_path);

    Ok(logs.len())
}

/// Remove all .wal.processed files in the given directory
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed log: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed logs", count);
    }

    Ok(count)
}
