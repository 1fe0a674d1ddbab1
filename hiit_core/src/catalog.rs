//! Default exercise library.
//!
//! Each entry points at a demonstration video in the media store.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// The library of exercises the plan generator draws from
#[derive(Clone, Debug)]
pub struct Catalog {
    pub exercises: Vec<Exercise>,
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference. This function is retained for testing and custom catalog creation.
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

fn build_default_catalog_internal() -> Catalog {
    use Equipment as E;
    use ExerciseCategory as C;

    let entries: &[(&str, Equipment, ExerciseCategory)] = &[
        // Bodyweight
        ("Jumping Jacks", E::None, C::Cardio),
        ("High Knees", E::None, C::Cardio),
        ("Burpees", E::None, C::FullBody),
        ("Mountain Climbers", E::None, C::Core),
        ("Plank Jacks", E::None, C::Core),
        ("Bicycle Crunches", E::None, C::Core),
        ("Push-ups", E::None, C::UpperBody),
        ("Tricep Dips", E::None, C::UpperBody),
        ("Air Squats", E::None, C::LowerBody),
        ("Jump Squats", E::None, C::LowerBody),
        ("Alternating Lunges", E::None, C::LowerBody),
        ("Skater Hops", E::None, C::Cardio),
        // Dumbbell
        ("Dumbbell Thrusters", E::Dumbbell, C::FullBody),
        ("Renegade Rows", E::Dumbbell, C::UpperBody),
        ("Goblet Squats", E::Dumbbell, C::LowerBody),
        ("Dumbbell Snatch", E::Dumbbell, C::FullBody),
        // Kettlebell
        ("Kettlebell Swings", E::Kettlebell, C::FullBody),
        ("Kettlebell Halos", E::Kettlebell, C::UpperBody),
        ("Kettlebell Deadlifts", E::Kettlebell, C::LowerBody),
        // Bands, rope, bar
        ("Band Pull-aparts", E::ResistanceBand, C::UpperBody),
        ("Banded Lateral Walks", E::ResistanceBand, C::LowerBody),
        ("Double Unders", E::JumpRope, C::Cardio),
        ("Jump Rope Sprints", E::JumpRope, C::Cardio),
        ("Hanging Knee Raises", E::PullupBar, C::Core),
        ("Pull-ups", E::PullupBar, C::UpperBody),
    ];

    let exercises = entries
        .iter()
        .map(|(name, equipment, category)| {
            let media_ref = format!("{}/{}.mp4", equipment.as_str(), slug(name));
            Exercise::new(name, *equipment, *category, &media_ref)
        })
        .collect();

    Catalog { exercises }
}

fn slug(name: &str) -> String {
    name.chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() => Some(c.to_ascii_lowercase()),
            ' ' | '-' => Some('_'),
            _ => None,
        })
        .collect()
}

impl Catalog {
    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        if self.exercises.is_empty() {
            errors.push("Catalog has no exercises".to_string());
        }

        for exercise in &self.exercises {
            if exercise.name.trim().is_empty() {
                errors.push("Exercise has empty name".to_string());
                continue;
            }
            if !seen.insert(exercise.name.to_lowercase()) {
                errors.push(format!("Duplicate exercise '{}'", exercise.name));
            }
            if exercise.media_ref.is_empty() {
                errors.push(format!("Exercise '{}' has no media reference", exercise.name));
            }
        }

        // The generator always allows bodyweight moves, so they must exist
        if !self.exercises.iter().any(|e| e.equipment == Equipment::None) {
            errors.push("Catalog has no bodyweight exercises".to_string());
        }

        errors
    }

    /// Exercises usable with the given equipment (bodyweight always included)
    pub fn with_equipment<'a>(
        &'a self,
        equipment: &'a [Equipment],
    ) -> impl Iterator<Item = &'a Exercise> + 'a {
        self.exercises
            .iter()
            .filter(move |e| e.equipment == Equipment::None || equipment.contains(&e.equipment))
    }
}
