//! Workout plan generator.
//!
//! Turns "N minutes with this equipment" into a concrete plan:
//! - Filter the catalog by equipment (bodyweight always allowed) and category
//! - Shuffle and take a round's worth of exercises
//! - Fit as many rounds as the requested time allows (at least one)

use crate::config::WorkoutConfig;
use crate::{Catalog, Equipment, Error, ExerciseCategory, Result, WorkoutPlan, WorkoutSettings};
use rand::seq::SliceRandom;
use rand::Rng;

/// What the user asked for
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanRequest {
    pub minutes: u32,
    pub equipment: Vec<Equipment>,
    /// Empty means any category
    pub categories: Vec<ExerciseCategory>,
}

/// Generate a randomized plan from the catalog
pub fn generate_plan<R: Rng + ?Sized>(
    catalog: &Catalog,
    request: &PlanRequest,
    workout: &WorkoutConfig,
    rng: &mut R,
) -> Result<WorkoutPlan> {
    if request.minutes == 0 {
        return Err(Error::Plan("workout length must be at least 1 minute".into()));
    }
    if workout.exercise_time_seconds == 0 || workout.exercises_per_round == 0 {
        return Err(Error::Plan(
            "exercise time and exercises per round must be non-zero".into(),
        ));
    }

    let mut candidates: Vec<_> = catalog
        .with_equipment(&request.equipment)
        .filter(|e| request.categories.is_empty() || request.categories.contains(&e.category))
        .cloned()
        .collect();

    if candidates.is_empty() {
        return Err(Error::Plan(format!(
            "No exercises match equipment {:?} and categories {:?}",
            request.equipment, request.categories
        )));
    }

    candidates.shuffle(rng);
    candidates.truncate(workout.exercises_per_round);

    let too_long =
        || Error::Plan(format!("workout length of {} minutes is too long", request.minutes));
    let total_seconds = request.minutes.checked_mul(60).ok_or_else(too_long)?;
    let per_round = workout
        .exercise_time_seconds
        .checked_add(workout.rest_time_seconds)
        .and_then(|slot| slot.checked_mul(candidates.len() as u32))
        .ok_or_else(too_long)?;
    let rounds = (total_seconds / per_round).max(1);

    tracing::info!(
        "Generated {}-minute plan: {} exercises x {} rounds ({}s work / {}s rest)",
        request.minutes,
        candidates.len(),
        rounds,
        workout.exercise_time_seconds,
        workout.rest_time_seconds
    );

    Ok(WorkoutPlan::new(
        candidates,
        WorkoutSettings {
            rounds,
            exercise_time_seconds: workout.exercise_time_seconds,
            rest_time_seconds: workout.rest_time_seconds,
            round_rest_time_seconds: 0,
        },
        total_seconds,
    ))
}
