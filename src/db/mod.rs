pub mod association;
pub mod queries;

use crate::error::{StoreError, StoreResult};
use crate::validation::{
    validate_category, validate_duration, validate_exercise_name, validate_notes,
    validate_workout_date,
};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub use association::{PairingFields, PairingPatch, WorkoutExercise, WorkoutExerciseDetail};

/// Fields shared by every stored row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordMeta {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exercise {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub category: String,
    pub equipment_needed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workout {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub date: NaiveDate,
    pub duration_minutes: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExercise {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub equipment_needed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExercisePatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub equipment_needed: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewWorkout {
    pub date: String,
    pub duration_minutes: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkoutPatch {
    pub date: Option<String>,
    pub duration_minutes: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub exercises: i64,
    pub workouts: i64,
    pub workout_exercises: i64,
}

/// Absent keeps the field (`None`), `null` clears it (`Some(None)`).
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite DB: {}", path.display()))?;

        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite DB")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .context("Failed to enable foreign keys")?;
        conn.busy_timeout(Duration::from_secs(5))
            .context("Failed to set busy timeout")?;

        let database = Self { conn };
        database.init_schema()?;

        Ok(database)
    }

    pub fn init_schema(&self) -> Result<()> {
        queries::schema_statements()
            .iter()
            .try_for_each(|statement| {
                self.conn
                    .execute(statement, [])
                    .context("Failed to initialize schema")
                    .map(|_| ())
            })
    }

    /// IMMEDIATE takes the write lock up front so the uniqueness pre-checks
    /// and the write that follows cannot interleave with another writer.
    fn write_transaction(&mut self) -> StoreResult<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }

    pub fn create_exercise(&mut self, input: &NewExercise) -> StoreResult<Exercise> {
        let name = validate_exercise_name(&input.name)?;
        let category = validate_category(&input.category)?;

        let transaction = self.write_transaction()?;
        ensure_unique_name(&transaction, &name, None)?;

        let now = Utc::now();
        transaction.execute(
            "INSERT INTO exercises (name, name_key, category, equipment_needed, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![name, name_key(&name), category, input.equipment_needed, now],
        )?;
        let exercise = fetch_exercise(&transaction, transaction.last_insert_rowid())?;
        transaction.commit()?;

        info!(exercise_id = exercise.meta.id, name = %exercise.name, "exercise created");
        Ok(exercise)
    }

    pub fn update_exercise(&mut self, id: i64, patch: &ExercisePatch) -> StoreResult<Exercise> {
        let name = patch
            .name
            .as_deref()
            .map(validate_exercise_name)
            .transpose()?;
        let category = patch
            .category
            .as_deref()
            .map(validate_category)
            .transpose()?;

        let transaction = self.write_transaction()?;
        let current = fetch_exercise(&transaction, id)?;

        if let Some(name) = name.as_deref() {
            ensure_unique_name(&transaction, name, Some(id))?;
        }

        let name = name.unwrap_or(current.name);
        transaction.execute(
            "UPDATE exercises
             SET name = ?1, name_key = ?2, category = ?3, equipment_needed = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                name,
                name_key(&name),
                category.unwrap_or(current.category),
                patch.equipment_needed.unwrap_or(current.equipment_needed),
                Utc::now(),
                id
            ],
        )?;
        let exercise = fetch_exercise(&transaction, id)?;
        transaction.commit()?;

        info!(exercise_id = id, "exercise updated");
        Ok(exercise)
    }

    pub fn delete_exercise(&mut self, id: i64) -> StoreResult<()> {
        let transaction = self.write_transaction()?;
        fetch_exercise(&transaction, id)?;

        let removed_pairings = transaction.execute(
            "DELETE FROM workout_exercises WHERE exercise_id = ?1",
            params![id],
        )?;
        transaction.execute("DELETE FROM exercises WHERE id = ?1", params![id])?;
        transaction.commit()?;

        info!(exercise_id = id, removed_pairings, "exercise deleted");
        Ok(())
    }

    pub fn exercise(&self, id: i64) -> StoreResult<Exercise> {
        fetch_exercise(&self.conn, id)
    }

    pub fn list_exercises(&self) -> StoreResult<Vec<Exercise>> {
        let mut statement = self.conn.prepare(&format!(
            "SELECT {} FROM exercises ORDER BY id ASC",
            queries::EXERCISE_COLUMNS
        ))?;

        let rows = statement
            .query_map([], exercise_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    pub fn create_workout(&mut self, input: &NewWorkout) -> StoreResult<Workout> {
        let date = validate_workout_date(&input.date)?;
        let duration_minutes = validate_duration(input.duration_minutes)?;
        let notes = validate_notes(input.notes.as_deref())?;

        let transaction = self.write_transaction()?;
        let now = Utc::now();
        transaction.execute(
            "INSERT INTO workouts (date, duration_minutes, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![date, duration_minutes, notes, now],
        )?;
        let workout = fetch_workout(&transaction, transaction.last_insert_rowid())?;
        transaction.commit()?;

        info!(workout_id = workout.meta.id, date = %workout.date, "workout created");
        Ok(workout)
    }

    pub fn update_workout(&mut self, id: i64, patch: &WorkoutPatch) -> StoreResult<Workout> {
        let date = patch
            .date
            .as_deref()
            .map(validate_workout_date)
            .transpose()?;
        let duration_minutes = patch.duration_minutes.map(validate_duration).transpose()?;
        let notes = patch
            .notes
            .as_ref()
            .map(|notes| validate_notes(notes.as_deref()))
            .transpose()?;

        let transaction = self.write_transaction()?;
        let current = fetch_workout(&transaction, id)?;

        transaction.execute(
            "UPDATE workouts SET date = ?1, duration_minutes = ?2, notes = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                date.unwrap_or(current.date),
                duration_minutes.unwrap_or(current.duration_minutes),
                notes.unwrap_or(current.notes),
                Utc::now(),
                id
            ],
        )?;
        let workout = fetch_workout(&transaction, id)?;
        transaction.commit()?;

        info!(workout_id = id, "workout updated");
        Ok(workout)
    }

    pub fn delete_workout(&mut self, id: i64) -> StoreResult<()> {
        let transaction = self.write_transaction()?;
        fetch_workout(&transaction, id)?;

        let removed_pairings = transaction.execute(
            "DELETE FROM workout_exercises WHERE workout_id = ?1",
            params![id],
        )?;
        transaction.execute("DELETE FROM workouts WHERE id = ?1", params![id])?;
        transaction.commit()?;

        info!(workout_id = id, removed_pairings, "workout deleted");
        Ok(())
    }

    pub fn workout(&self, id: i64) -> StoreResult<Workout> {
        fetch_workout(&self.conn, id)
    }

    pub fn list_workouts(&self) -> StoreResult<Vec<Workout>> {
        let mut statement = self.conn.prepare(&format!(
            "SELECT {} FROM workouts ORDER BY id ASC",
            queries::WORKOUT_COLUMNS
        ))?;

        let rows = statement
            .query_map([], workout_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    pub fn counts(&self) -> StoreResult<RecordCounts> {
        let count = |table: &str| -> StoreResult<i64> {
            Ok(self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })?)
        };

        Ok(RecordCounts {
            exercises: count("exercises")?,
            workouts: count("workouts")?,
            workout_exercises: count("workout_exercises")?,
        })
    }

    /// Removes every row and restarts id sequences at 1.
    pub fn clear_all(&mut self) -> StoreResult<()> {
        let transaction = self.write_transaction()?;
        transaction.execute("DELETE FROM workout_exercises", [])?;
        transaction.execute("DELETE FROM workouts", [])?;
        transaction.execute("DELETE FROM exercises", [])?;
        transaction.execute(
            "DELETE FROM sqlite_sequence WHERE name IN ('workout_exercises', 'workouts', 'exercises')",
            [],
        )?;
        transaction.commit()?;

        info!("all records cleared");
        Ok(())
    }
}

/// Case-folded exercise name backing the unique index.
pub(crate) fn name_key(name: &str) -> String {
    name.to_lowercase()
}

fn ensure_unique_name(conn: &Connection, name: &str, exclude_id: Option<i64>) -> StoreResult<()> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM exercises WHERE name_key = ?1 AND (?2 IS NULL OR id != ?2)",
            params![name_key(name), exclude_id],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(_) => Err(StoreError::conflict(format!(
            "Exercise with name '{name}' already exists"
        ))),
        None => Ok(()),
    }
}

fn fetch_exercise(conn: &Connection, id: i64) -> StoreResult<Exercise> {
    conn.query_row(
        &format!(
            "SELECT {} FROM exercises WHERE id = ?1",
            queries::EXERCISE_COLUMNS
        ),
        params![id],
        exercise_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found(format!("Exercise {id} not found")))
}

fn fetch_workout(conn: &Connection, id: i64) -> StoreResult<Workout> {
    conn.query_row(
        &format!(
            "SELECT {} FROM workouts WHERE id = ?1",
            queries::WORKOUT_COLUMNS
        ),
        params![id],
        workout_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found(format!("Workout {id} not found")))
}

fn exercise_from_row(row: &Row<'_>) -> rusqlite::Result<Exercise> {
    Ok(Exercise {
        meta: RecordMeta {
            id: row.get(0)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        },
        name: row.get(1)?,
        category: row.get(2)?,
        equipment_needed: row.get(3)?,
    })
}

fn workout_from_row(row: &Row<'_>) -> rusqlite::Result<Workout> {
    Ok(Workout {
        meta: RecordMeta {
            id: row.get(0)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        },
        date: row.get(1)?,
        duration_minutes: row.get(2)?,
        notes: row.get(3)?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    pub(crate) fn today() -> String {
        Utc::now().date_naive().format("%Y-%m-%d").to_string()
    }

    pub(crate) fn new_exercise(name: &str, category: &str) -> NewExercise {
        NewExercise {
            name: name.to_string(),
            category: category.to_string(),
            equipment_needed: false,
        }
    }

    pub(crate) fn new_workout(date: &str, duration_minutes: i64) -> NewWorkout {
        NewWorkout {
            date: date.to_string(),
            duration_minutes,
            notes: None,
        }
    }

    #[test]
    fn exercise_ids_start_at_one_and_category_is_normalized() {
        let mut database = Database::open_in_memory().expect("db");

        let exercise = database
            .create_exercise(&new_exercise("Plank", "CORE"))
            .expect("exercise created");

        assert_eq!(exercise.meta.id, 1);
        assert_eq!(exercise.category, "core");
        assert!(!exercise.equipment_needed);
    }

    #[test]
    fn blank_exercise_name_leaves_no_row() {
        let mut database = Database::open_in_memory().expect("db");

        let result = database.create_exercise(&new_exercise("  ", "core"));

        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert!(database.list_exercises().expect("list").is_empty());
    }

    #[test]
    fn exercise_names_are_unique_ignoring_case() {
        let mut database = Database::open_in_memory().expect("db");
        database
            .create_exercise(&new_exercise("Push-ups", "strength"))
            .expect("first");

        let duplicate = database.create_exercise(&new_exercise("PUSH-UPS", "strength"));
        let padded = database.create_exercise(&new_exercise("  push-ups ", "cardio"));

        assert!(matches!(duplicate, Err(StoreError::Conflict(_))));
        assert!(matches!(padded, Err(StoreError::Conflict(_))));
        assert_eq!(database.list_exercises().expect("list").len(), 1);
    }

    #[test]
    fn unique_index_rejects_duplicates_that_skip_the_pre_check() {
        let database = Database::open_in_memory().expect("db");
        let insert = "INSERT INTO exercises (name, name_key, category, created_at, updated_at)
                      VALUES (?1, ?2, 'core', ?3, ?3)";
        database
            .conn
            .execute(insert, params!["Plank", name_key("Plank"), Utc::now()])
            .expect("first insert");

        let error = database
            .conn
            .execute(insert, params!["PLANK", name_key("PLANK"), Utc::now()])
            .map_err(StoreError::from)
            .expect_err("duplicate rejected");

        assert!(matches!(error, StoreError::Conflict(_)));
    }

    #[test]
    fn non_ascii_names_differing_only_by_case_conflict() {
        let mut database = Database::open_in_memory().expect("db");
        database
            .create_exercise(&new_exercise("Élan Squat", "strength"))
            .expect("first");

        let lower = database.create_exercise(&new_exercise("élan squat", "strength"));
        let upper = database.create_exercise(&new_exercise("ÉLAN SQUAT", "strength"));

        assert!(matches!(lower, Err(StoreError::Conflict(_))));
        assert!(matches!(upper, Err(StoreError::Conflict(_))));
        assert_eq!(database.list_exercises().expect("list").len(), 1);
    }

    #[test]
    fn renaming_into_non_ascii_case_variant_conflicts() {
        let mut database = Database::open_in_memory().expect("db");
        database
            .create_exercise(&new_exercise("Straße Sprint", "cardio"))
            .expect("first");
        let other = database
            .create_exercise(&new_exercise("Row", "cardio"))
            .expect("second");

        let result = database.update_exercise(
            other.meta.id,
            &ExercisePatch {
                name: Some("STRASSE SPRINT".to_string()),
                ..ExercisePatch::default()
            },
        );
        let renamed = database.update_exercise(
            other.meta.id,
            &ExercisePatch {
                name: Some("straße sprint".to_string()),
                ..ExercisePatch::default()
            },
        );

        assert!(result.is_ok());
        assert!(matches!(renamed, Err(StoreError::Conflict(_))));
    }

    #[test]
    fn update_exercise_is_partial_and_excludes_itself_from_uniqueness() {
        let mut database = Database::open_in_memory().expect("db");
        let squat = database
            .create_exercise(&new_exercise("Squat", "strength"))
            .expect("squat");
        database
            .create_exercise(&new_exercise("Lunge", "strength"))
            .expect("lunge");

        let renamed = database
            .update_exercise(
                squat.meta.id,
                &ExercisePatch {
                    name: Some("SQUAT".to_string()),
                    ..ExercisePatch::default()
                },
            )
            .expect("same row may change case");
        assert_eq!(renamed.name, "SQUAT");
        assert_eq!(renamed.category, "strength");
        assert!(renamed.meta.updated_at >= squat.meta.updated_at);

        let clash = database.update_exercise(
            squat.meta.id,
            &ExercisePatch {
                name: Some("lunge".to_string()),
                equipment_needed: Some(true),
                ..ExercisePatch::default()
            },
        );
        assert!(matches!(clash, Err(StoreError::Conflict(_))));

        let unchanged = database.exercise(squat.meta.id).expect("squat");
        assert_eq!(unchanged.name, "SQUAT");
        assert!(!unchanged.equipment_needed);
    }

    #[test]
    fn update_missing_exercise_is_not_found() {
        let mut database = Database::open_in_memory().expect("db");
        let result = database.update_exercise(42, &ExercisePatch::default());
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn workout_dates_up_to_today_are_accepted() {
        let mut database = Database::open_in_memory().expect("db");
        let tomorrow = (Utc::now().date_naive() + ChronoDuration::days(1))
            .format("%Y-%m-%d")
            .to_string();

        assert!(database.create_workout(&new_workout(&today(), 30)).is_ok());
        assert!(matches!(
            database.create_workout(&new_workout(&tomorrow, 30)),
            Err(StoreError::Validation(_))
        ));
        assert_eq!(database.list_workouts().expect("list").len(), 1);
    }

    #[test]
    fn update_workout_can_clear_notes() {
        let mut database = Database::open_in_memory().expect("db");
        let workout = database
            .create_workout(&NewWorkout {
                date: "2024-01-15".to_string(),
                duration_minutes: 45,
                notes: Some("leg day".to_string()),
            })
            .expect("workout");

        let updated = database
            .update_workout(
                workout.meta.id,
                &WorkoutPatch {
                    duration_minutes: Some(50),
                    notes: Some(None),
                    ..WorkoutPatch::default()
                },
            )
            .expect("updated");

        assert_eq!(updated.duration_minutes, 50);
        assert_eq!(updated.notes, None);
        assert_eq!(updated.date.to_string(), "2024-01-15");
    }

    #[test]
    fn invalid_workout_update_leaves_row_untouched() {
        let mut database = Database::open_in_memory().expect("db");
        let workout = database
            .create_workout(&new_workout("2024-01-15", 45))
            .expect("workout");

        let result = database.update_workout(
            workout.meta.id,
            &WorkoutPatch {
                duration_minutes: Some(400),
                notes: Some(Some("too long".to_string())),
                ..WorkoutPatch::default()
            },
        );

        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert_eq!(database.workout(workout.meta.id).expect("workout"), workout);
    }

    #[test]
    fn workout_patch_distinguishes_absent_and_null_notes() {
        let absent: WorkoutPatch = serde_json::from_str("{}").expect("absent");
        let null: WorkoutPatch = serde_json::from_str(r#"{"notes": null}"#).expect("null");

        assert_eq!(absent.notes, None);
        assert_eq!(null.notes, Some(None));
    }

    #[test]
    fn deleting_missing_rows_is_not_found() {
        let mut database = Database::open_in_memory().expect("db");
        assert!(matches!(
            database.delete_exercise(7),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            database.delete_workout(7),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn lists_are_in_insertion_order() {
        let mut database = Database::open_in_memory().expect("db");
        ["Row", "Bike", "Curl"].iter().for_each(|name| {
            database
                .create_exercise(&new_exercise(name, "cardio"))
                .expect("exercise");
        });

        let names = database
            .list_exercises()
            .expect("list")
            .into_iter()
            .map(|exercise| exercise.name)
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["Row", "Bike", "Curl"]);
    }

    #[test]
    fn clear_all_restarts_ids() {
        let mut database = Database::open_in_memory().expect("db");
        database
            .create_exercise(&new_exercise("Row", "cardio"))
            .expect("exercise");
        database
            .create_workout(&new_workout("2024-01-15", 20))
            .expect("workout");

        database.clear_all().expect("cleared");
        assert_eq!(
            database.counts().expect("counts"),
            RecordCounts {
                exercises: 0,
                workouts: 0,
                workout_exercises: 0
            }
        );

        let exercise = database
            .create_exercise(&new_exercise("Row", "cardio"))
            .expect("exercise");
        assert_eq!(exercise.meta.id, 1);
    }
}
