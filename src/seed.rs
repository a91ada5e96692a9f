use crate::db::{
    Database, Exercise, NewExercise, NewWorkout, PairingFields, RecordCounts, name_key,
};
use crate::error::{StoreError, StoreResult};
use chrono::{Duration, Utc};
use tracing::info;

const SAMPLE_EXERCISES: [(&str, &str, bool); 5] = [
    ("Push-ups", "strength", false),
    ("Running", "cardio", false),
    ("Plank", "core", false),
    ("Yoga Flow", "flexibility", true),
    ("Single-leg Stand", "balance", false),
];

/// (days ago, minutes, notes, pairings as (exercise index, reps, sets, duration_seconds))
type SampleWorkout = (
    i64,
    i64,
    Option<&'static str>,
    &'static [(usize, Option<i64>, Option<i64>, Option<i64>)],
);

const SAMPLE_WORKOUTS: [SampleWorkout; 3] = [
    (
        2,
        45,
        Some("Upper body and core"),
        &[(0, Some(15), Some(3), None), (2, None, None, Some(120))],
    ),
    (1, 30, None, &[(1, None, None, Some(1800))]),
    (
        0,
        60,
        Some("Mobility day"),
        &[(3, None, None, Some(1200)), (4, Some(10), Some(2), None)],
    ),
];

#[derive(Debug, Clone, Copy)]
pub struct SeedSummary {
    pub exercises_created: usize,
    pub exercises_reused: usize,
    pub counts: RecordCounts,
}

/// Fills the database with sample data through the validated store operations.
pub fn seed_database(database: &mut Database, reset: bool) -> StoreResult<SeedSummary> {
    if reset {
        database.clear_all()?;
    }

    let mut exercises_created = 0;
    let mut exercises_reused = 0;
    let mut exercises = Vec::with_capacity(SAMPLE_EXERCISES.len());

    for (name, category, equipment_needed) in SAMPLE_EXERCISES {
        let input = NewExercise {
            name: name.to_string(),
            category: category.to_string(),
            equipment_needed,
        };

        let exercise = match database.create_exercise(&input) {
            Ok(exercise) => {
                exercises_created += 1;
                exercise
            }
            Err(StoreError::Conflict(_)) => {
                exercises_reused += 1;
                find_by_name(database, name)?
            }
            Err(error) => return Err(error),
        };
        exercises.push(exercise);
    }

    let today = Utc::now().date_naive();
    for (days_ago, duration_minutes, notes, pairings) in SAMPLE_WORKOUTS {
        let workout = database.create_workout(&NewWorkout {
            date: (today - Duration::days(days_ago))
                .format("%Y-%m-%d")
                .to_string(),
            duration_minutes,
            notes: notes.map(str::to_string),
        })?;

        for &(index, reps, sets, duration_seconds) in pairings {
            database.attach_exercise(
                workout.meta.id,
                exercises[index].meta.id,
                &PairingFields {
                    reps,
                    sets,
                    duration_seconds,
                },
            )?;
        }
    }

    let counts = database.counts()?;
    info!(
        exercises_created,
        exercises_reused,
        workouts = counts.workouts,
        pairings = counts.workout_exercises,
        "database seeded"
    );

    Ok(SeedSummary {
        exercises_created,
        exercises_reused,
        counts,
    })
}

fn find_by_name(database: &Database, name: &str) -> StoreResult<Exercise> {
    database
        .list_exercises()?
        .into_iter()
        .find(|exercise| name_key(&exercise.name) == name_key(name))
        .ok_or_else(|| StoreError::not_found(format!("Exercise '{name}' not found")))
}
