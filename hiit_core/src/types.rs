//! Core domain types for the HIIT workout system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercises and their equipment/category tags
//! - Workout settings and generated plans
//! - Completion records written to the stats store
//! - Aggregated user stats

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Workout type written into every completion record.
pub const WORKOUT_TYPE_HIIT: &str = "hiit";

// ============================================================================
// Exercise Types
// ============================================================================

/// Equipment an exercise needs. `None` means bodyweight only.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    None,
    Dumbbell,
    Kettlebell,
    ResistanceBand,
    JumpRope,
    PullupBar,
}

impl Equipment {
    pub const ALL: [Equipment; 6] = [
        Equipment::None,
        Equipment::Dumbbell,
        Equipment::Kettlebell,
        Equipment::ResistanceBand,
        Equipment::JumpRope,
        Equipment::PullupBar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Equipment::None => "none",
            Equipment::Dumbbell => "dumbbell",
            Equipment::Kettlebell => "kettlebell",
            Equipment::ResistanceBand => "resistance_band",
            Equipment::JumpRope => "jump_rope",
            Equipment::PullupBar => "pullup_bar",
        }
    }
}

impl fmt::Display for Equipment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Equipment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "none" | "bodyweight" => Ok(Equipment::None),
            "dumbbell" | "dumbbells" => Ok(Equipment::Dumbbell),
            "kettlebell" | "kettlebells" => Ok(Equipment::Kettlebell),
            "resistance_band" | "band" | "bands" => Ok(Equipment::ResistanceBand),
            "jump_rope" | "rope" => Ok(Equipment::JumpRope),
            "pullup_bar" | "pull_up_bar" => Ok(Equipment::PullupBar),
            other => Err(Error::Other(format!("Unknown equipment: {}", other))),
        }
    }
}

/// Body area an exercise targets
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    UpperBody,
    LowerBody,
    Core,
    Cardio,
    FullBody,
}

impl ExerciseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseCategory::UpperBody => "upper_body",
            ExerciseCategory::LowerBody => "lower_body",
            ExerciseCategory::Core => "core",
            ExerciseCategory::Cardio => "cardio",
            ExerciseCategory::FullBody => "full_body",
        }
    }
}

impl fmt::Display for ExerciseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ExerciseCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "upper_body" | "upper" => Ok(ExerciseCategory::UpperBody),
            "lower_body" | "lower" | "legs" => Ok(ExerciseCategory::LowerBody),
            "core" | "abs" => Ok(ExerciseCategory::Core),
            "cardio" => Ok(ExerciseCategory::Cardio),
            "full_body" | "full" => Ok(ExerciseCategory::FullBody),
            other => Err(Error::Other(format!("Unknown category: {}", other))),
        }
    }
}

/// An exercise from the video library
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exercise {
    pub name: String,
    pub equipment: Equipment,
    pub category: ExerciseCategory,
    /// Relative path of the demonstration video in object storage
    pub media_ref: String,
}

impl Exercise {
    pub fn new(
        name: &str,
        equipment: Equipment,
        category: ExerciseCategory,
        media_ref: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            equipment,
            category,
            media_ref: media_ref.to_string(),
        }
    }
}

// ============================================================================
// Workout Plan Types
// ============================================================================

/// Interval timing for a workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutSettings {
    pub rounds: u32,
    pub exercise_time_seconds: u32,
    pub rest_time_seconds: u32,
    /// Always 0: the normal rest leads straight into the next round.
    #[serde(default)]
    pub round_rest_time_seconds: u32,
}

/// A generated workout. Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutPlan {
    pub id: Uuid,
    pub exercises: Vec<Exercise>,
    pub settings: WorkoutSettings,
    /// Requested minutes × 60. Informational; the phases decide actual time.
    pub total_duration_seconds: u32,
    pub created_at: DateTime<Utc>,
}

impl WorkoutPlan {
    pub fn new(exercises: Vec<Exercise>, settings: WorkoutSettings, total_duration_seconds: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            exercises,
            settings,
            total_duration_seconds,
            created_at: Utc::now(),
        }
    }

    /// Check the plan can drive a timer session.
    pub fn validate(&self) -> Result<()> {
        if self.exercises.is_empty() {
            return Err(Error::InvalidPlan("plan has no exercises".into()));
        }
        if self.settings.rounds == 0 {
            return Err(Error::InvalidPlan("rounds must be at least 1".into()));
        }
        if self.settings.exercise_time_seconds == 0 {
            return Err(Error::InvalidPlan(
                "exercise time must be greater than zero".into(),
            ));
        }
        if self.settings.round_rest_time_seconds != 0 {
            return Err(Error::InvalidPlan(format!(
                "round rest must be 0, got {}",
                self.settings.round_rest_time_seconds
            )));
        }
        Ok(())
    }

    /// Wall-clock length of all scheduled phases, get-ready cues included.
    pub fn scheduled_seconds(&self, get_ready_seconds: u32) -> u64 {
        let slots = u64::from(self.settings.rounds) * self.exercises.len() as u64;
        let rests = slots.saturating_sub(1);
        slots * (u64::from(get_ready_seconds) + u64::from(self.settings.exercise_time_seconds))
            + rests * u64::from(self.settings.rest_time_seconds)
    }
}

// ============================================================================
// Completion and Stats Types
// ============================================================================

/// One completed workout as stored in the workout log
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub duration_minutes: u32,
    pub workout_type: String,
    pub completed_at: DateTime<Utc>,
}

impl WorkoutLog {
    pub fn new(user_id: Uuid, duration_minutes: u32, completed_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            duration_minutes,
            workout_type: WORKOUT_TYPE_HIIT.to_string(),
            completed_at,
        }
    }
}

/// Aggregated training stats for one user
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct UserStats {
    pub total_workouts: u32,
    pub total_minutes: i64,
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
    pub last_workout_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(exercises: usize, rounds: u32, work: u32, rest: u32) -> WorkoutPlan {
        let exercises = (0..exercises)
            .map(|i| {
                Exercise::new(
                    &format!("Move {}", i),
                    Equipment::None,
                    ExerciseCategory::FullBody,
                    "videos/move.mp4",
                )
            })
            .collect();
        WorkoutPlan::new(
            exercises,
            WorkoutSettings {
                rounds,
                exercise_time_seconds: work,
                rest_time_seconds: rest,
                round_rest_time_seconds: 0,
            },
            600,
        )
    }

    #[test]
    fn test_valid_plan() {
        assert!(plan(3, 2, 30, 15).validate().is_ok());
        assert!(plan(1, 1, 1, 0).validate().is_ok());
    }

    #[test]
    fn test_empty_plan_rejected() {
        let err = plan(0, 2, 30, 15).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidPlan(_)));
    }

    #[test]
    fn test_zero_durations_rejected() {
        assert!(matches!(
            plan(2, 0, 30, 15).validate(),
            Err(Error::InvalidPlan(_))
        ));
        assert!(matches!(
            plan(2, 1, 0, 15).validate(),
            Err(Error::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_round_rest_must_be_zero() {
        let mut p = plan(2, 2, 30, 15);
        p.settings.round_rest_time_seconds = 60;
        assert!(matches!(p.validate(), Err(Error::InvalidPlan(_))));
    }

    #[test]
    fn test_scheduled_seconds() {
        // 1 round, 2 exercises: 3+30, 15, 3+30
        assert_eq!(plan(2, 1, 30, 15).scheduled_seconds(3), 81);
    }

    #[test]
    fn test_scheduled_seconds_past_u32() {
        let long = plan(5, u32::MAX, 40, 20);
        let slots = u64::from(u32::MAX) * 5;
        assert_eq!(long.scheduled_seconds(3), slots * 43 + (slots - 1) * 20);
    }

    #[test]
    fn test_equipment_parsing() {
        assert_eq!("Dumbbells".parse::<Equipment>().unwrap(), Equipment::Dumbbell);
        assert_eq!("bodyweight".parse::<Equipment>().unwrap(), Equipment::None);
        assert_eq!("jump-rope".parse::<Equipment>().unwrap(), Equipment::JumpRope);
        assert!("treadmill".parse::<Equipment>().is_err());
    }

    #[test]
    fn test_workout_log_serializes_contract_fields() {
        let log = WorkoutLog::new(Uuid::new_v4(), 20, Utc::now());
        let json = serde_json::to_value(&log).unwrap();
        assert!(json.get("user_id").is_some());
        assert_eq!(json["duration_minutes"], 20);
        assert_eq!(json["workout_type"], "hiit");
        assert!(json["completed_at"].as_str().unwrap().contains('T'));
    }
}
