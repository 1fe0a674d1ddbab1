//! Workout history loading and stats aggregation.
//!
//! History comes from both the live JSONL log and the CSV archive. Stats
//! (total minutes, streaks) feed the progression model.

use crate::csv_rollup::CsvRow;
use crate::{Error, Result, UserStats, WorkoutLog};
use chrono::{DateTime, NaiveDate, Utc};
use csv::ReaderBuilder;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use uuid::Uuid;

impl TryFrom<CsvRow> for WorkoutLog {
    type Error = Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| Error::Other(format!("Invalid UUID: {}", e)))?;
        let user_id = Uuid::parse_str(&row.user_id)
            .map_err(|e| Error::Other(format!("Invalid user UUID: {}", e)))?;
        let completed_at = DateTime::parse_from_rfc3339(&row.completed_at)
            .map_err(|e| Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);

        Ok(WorkoutLog {
            id,
            user_id,
            duration_minutes: row.duration_minutes,
            workout_type: row.workout_type,
            completed_at,
        })
    }
}

/// Load every workout from the log and the CSV archive
///
/// Returns workouts sorted newest first, deduplicated by id.
pub fn load_workout_logs(wal_path: &Path, csv_path: &Path) -> Result<Vec<WorkoutLog>> {
    let mut logs = Vec::new();
    let mut seen_ids = HashSet::new();

    if wal_path.exists() {
        for log in crate::store::read_logs(wal_path)? {
            if seen_ids.insert(log.id) {
                logs.push(log);
            }
        }
        tracing::debug!("Loaded {} workouts from log", logs.len());
    }

    if csv_path.exists() {
        let mut csv_count = 0;
        for log in load_logs_from_csv(csv_path)? {
            if seen_ids.insert(log.id) {
                logs.push(log);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} workouts from CSV", csv_count);
    }

    logs.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    Ok(logs)
}

fn load_logs_from_csv(path: &Path) -> Result<Vec<WorkoutLog>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut logs = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result.map_err(Error::from).and_then(WorkoutLog::try_from) {
            Ok(log) => logs.push(log),
            Err(e) => tracing::warn!("Skipping bad CSV row: {}", e),
        }
    }
    Ok(logs)
}

/// Totals and streaks for one user as of `today` (UTC date)
pub fn compute_stats(logs: &[WorkoutLog], user_id: Uuid, today: NaiveDate) -> UserStats {
    let mine: Vec<&WorkoutLog> = logs.iter().filter(|l| l.user_id == user_id).collect();

    let total_minutes = mine.iter().map(|l| l.duration_minutes as i64).sum();
    let last_workout_at = mine.iter().map(|l| l.completed_at).max();
    let days: BTreeSet<NaiveDate> = mine.iter().map(|l| l.completed_at.date_naive()).collect();

    UserStats {
        total_workouts: mine.len() as u32,
        total_minutes,
        current_streak_days: current_streak(&days, today),
        longest_streak_days: longest_streak(&days),
        last_workout_at,
    }
}

/// Consecutive days ending today, or yesterday if today has no workout yet
fn current_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut day = if days.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    while days.contains(&day) {
        streak += 1;
        day = match day.pred_opt() {
            Some(previous) => previous,
            None => break,
        };
    }
    streak
}

fn longest_streak(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for &day in days {
        run = match previous {
            Some(p) if p.succ_opt() == Some(day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }
    longest
}
