use super::{Database, RecordMeta, fetch_exercise, fetch_workout, nullable, queries};
use crate::error::{StoreError, StoreResult};
use crate::validation::{
    MAX_DURATION_SECONDS, MAX_REPS, MAX_SETS, validate_count, validate_pairing_shape,
};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One exercise performed within one workout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutExercise {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub workout_id: i64,
    pub exercise_id: i64,
    pub reps: Option<i64>,
    pub sets: Option<i64>,
    pub duration_seconds: Option<i64>,
}

/// A pairing joined with the name of its exercise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutExerciseDetail {
    #[serde(flatten)]
    pub pairing: WorkoutExercise,
    pub exercise_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairingFields {
    pub reps: Option<i64>,
    pub sets: Option<i64>,
    pub duration_seconds: Option<i64>,
}

/// Partial pairing update. Outer `None` keeps the stored value, `Some(None)` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairingPatch {
    #[serde(default, deserialize_with = "nullable")]
    pub reps: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub sets: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub duration_seconds: Option<Option<i64>>,
}

impl Database {
    pub fn attach_exercise(
        &mut self,
        workout_id: i64,
        exercise_id: i64,
        fields: &PairingFields,
    ) -> StoreResult<WorkoutExercise> {
        let transaction = self.write_transaction()?;
        fetch_workout(&transaction, workout_id)?;
        fetch_exercise(&transaction, exercise_id)?;

        if find_pairing(&transaction, workout_id, exercise_id)?.is_some() {
            return Err(StoreError::conflict(format!(
                "Exercise {exercise_id} is already part of workout {workout_id}"
            )));
        }

        let (reps, sets, duration_seconds) =
            validate_pairing(fields.reps, fields.sets, fields.duration_seconds)?;

        let now = Utc::now();
        transaction.execute(
            "INSERT INTO workout_exercises
               (workout_id, exercise_id, reps, sets, duration_seconds, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![workout_id, exercise_id, reps, sets, duration_seconds, now],
        )?;
        let pairing = fetch_pairing(&transaction, workout_id, exercise_id)?;
        transaction.commit()?;

        info!(
            pairing_id = pairing.meta.id,
            workout_id, exercise_id, "exercise attached to workout"
        );
        Ok(pairing)
    }

    /// Merges `patch` onto the stored pairing; the merged row must still have exactly one shape.
    pub fn update_pairing(
        &mut self,
        workout_id: i64,
        exercise_id: i64,
        patch: &PairingPatch,
    ) -> StoreResult<WorkoutExercise> {
        let transaction = self.write_transaction()?;
        let current = fetch_pairing(&transaction, workout_id, exercise_id)?;

        let (reps, sets, duration_seconds) = validate_pairing(
            patch.reps.unwrap_or(current.reps),
            patch.sets.unwrap_or(current.sets),
            patch.duration_seconds.unwrap_or(current.duration_seconds),
        )?;

        transaction.execute(
            "UPDATE workout_exercises
             SET reps = ?1, sets = ?2, duration_seconds = ?3, updated_at = ?4
             WHERE id = ?5",
            params![reps, sets, duration_seconds, Utc::now(), current.meta.id],
        )?;
        let pairing = fetch_pairing(&transaction, workout_id, exercise_id)?;
        transaction.commit()?;

        info!(pairing_id = pairing.meta.id, workout_id, exercise_id, "pairing updated");
        Ok(pairing)
    }

    pub fn detach_exercise(&mut self, workout_id: i64, exercise_id: i64) -> StoreResult<()> {
        let transaction = self.write_transaction()?;
        let removed = transaction.execute(
            "DELETE FROM workout_exercises WHERE workout_id = ?1 AND exercise_id = ?2",
            params![workout_id, exercise_id],
        )?;

        if removed == 0 {
            return Err(pairing_not_found(workout_id, exercise_id));
        }
        transaction.commit()?;

        info!(workout_id, exercise_id, "exercise detached from workout");
        Ok(())
    }

    pub fn pairing(&self, workout_id: i64, exercise_id: i64) -> StoreResult<WorkoutExercise> {
        fetch_pairing(&self.conn, workout_id, exercise_id)
    }

    pub fn list_pairings_by_workout(&self, workout_id: i64) -> StoreResult<Vec<WorkoutExercise>> {
        self.list_pairings_where("workout_id", workout_id)
    }

    pub fn list_pairings_by_exercise(&self, exercise_id: i64) -> StoreResult<Vec<WorkoutExercise>> {
        self.list_pairings_where("exercise_id", exercise_id)
    }

    pub fn workout_exercise_details(&self, workout_id: i64) -> StoreResult<Vec<WorkoutExerciseDetail>> {
        let mut statement = self.conn.prepare(
            "SELECT we.id, we.workout_id, we.exercise_id, we.reps, we.sets, we.duration_seconds,
                    we.created_at, we.updated_at, e.name
             FROM workout_exercises we
             JOIN exercises e ON e.id = we.exercise_id
             WHERE we.workout_id = ?1
             ORDER BY we.id ASC",
        )?;

        let rows = statement
            .query_map(params![workout_id], |row| {
                Ok(WorkoutExerciseDetail {
                    pairing: pairing_from_row(row)?,
                    exercise_name: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn list_pairings_where(&self, column: &str, id: i64) -> StoreResult<Vec<WorkoutExercise>> {
        let mut statement = self.conn.prepare(&format!(
            "SELECT {} FROM workout_exercises WHERE {column} = ?1 ORDER BY id ASC",
            queries::WORKOUT_EXERCISE_COLUMNS
        ))?;

        let rows = statement
            .query_map(params![id], pairing_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

type PairingValues = (Option<i64>, Option<i64>, Option<i64>);

fn validate_pairing(
    reps: Option<i64>,
    sets: Option<i64>,
    duration_seconds: Option<i64>,
) -> StoreResult<PairingValues> {
    let reps = validate_count("reps", reps, MAX_REPS)?;
    let sets = validate_count("sets", sets, MAX_SETS)?;
    let duration_seconds = validate_count("duration_seconds", duration_seconds, MAX_DURATION_SECONDS)?;
    validate_pairing_shape(reps, sets, duration_seconds)?;

    Ok((reps, sets, duration_seconds))
}

fn find_pairing(
    conn: &Connection,
    workout_id: i64,
    exercise_id: i64,
) -> StoreResult<Option<WorkoutExercise>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {} FROM workout_exercises WHERE workout_id = ?1 AND exercise_id = ?2",
                queries::WORKOUT_EXERCISE_COLUMNS
            ),
            params![workout_id, exercise_id],
            pairing_from_row,
        )
        .optional()?)
}

fn fetch_pairing(conn: &Connection, workout_id: i64, exercise_id: i64) -> StoreResult<WorkoutExercise> {
    find_pairing(conn, workout_id, exercise_id)?
        .ok_or_else(|| pairing_not_found(workout_id, exercise_id))
}

fn pairing_not_found(workout_id: i64, exercise_id: i64) -> StoreError {
    StoreError::not_found(format!(
        "Exercise {exercise_id} is not part of workout {workout_id}"
    ))
}

fn pairing_from_row(row: &Row<'_>) -> rusqlite::Result<WorkoutExercise> {
    Ok(WorkoutExercise {
        meta: RecordMeta {
            id: row.get(0)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        },
        workout_id: row.get(1)?,
        exercise_id: row.get(2)?,
        reps: row.get(3)?,
        sets: row.get(4)?,
        duration_seconds: row.get(5)?,
    })
}
