#![forbid(unsafe_code)]

//! Core domain model and business logic for the hiit workout timer.
//!
//! This crate provides:
//! - Domain types (exercises, plans, workout records, stats)
//! - Exercise catalog and randomized plan generation
//! - Interval timer state machine and session driver
//! - Level/badge progression
//! - Persistence (workout log, CSV archive, profile)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod store;
pub mod csv_rollup;
pub mod profile;
pub mod stats;
pub mod progression;
pub mod plan;
pub mod timer;
pub mod session;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog, Catalog};
pub use config::Config;
pub use store::{commit_completion, CommitOutcome, JsonlStore, StatsStore};
pub use profile::UserProfile;
pub use stats::{compute_stats, load_workout_logs};
pub use progression::{calculate_level, calculate_next_level_progress, ProgressionSnapshot};
pub use plan::{generate_plan, PlanRequest};
pub use timer::{format_time, Phase, TimerEngine, TimerEvent, TimerState};
pub use session::{CommitStatus, Control, SessionOutcome, WorkoutSession};
