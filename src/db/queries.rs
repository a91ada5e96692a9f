pub const CREATE_EXERCISES: &str = r#"
CREATE TABLE IF NOT EXISTS exercises (
  id               INTEGER PRIMARY KEY AUTOINCREMENT,
  name             TEXT NOT NULL,
  name_key         TEXT NOT NULL,
  category         TEXT NOT NULL,
  equipment_needed INTEGER NOT NULL DEFAULT 0,
  created_at       TEXT NOT NULL,
  updated_at       TEXT NOT NULL
);
"#;

pub const CREATE_WORKOUTS: &str = r#"
CREATE TABLE IF NOT EXISTS workouts (
  id               INTEGER PRIMARY KEY AUTOINCREMENT,
  date             TEXT NOT NULL,
  duration_minutes INTEGER NOT NULL,
  notes            TEXT,
  created_at       TEXT NOT NULL,
  updated_at       TEXT NOT NULL
);
"#;

pub const CREATE_WORKOUT_EXERCISES: &str = r#"
CREATE TABLE IF NOT EXISTS workout_exercises (
  id               INTEGER PRIMARY KEY AUTOINCREMENT,
  workout_id       INTEGER NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
  exercise_id      INTEGER NOT NULL REFERENCES exercises(id) ON DELETE CASCADE,
  reps             INTEGER,
  sets             INTEGER,
  duration_seconds INTEGER,
  created_at       TEXT NOT NULL,
  updated_at       TEXT NOT NULL
);
"#;

pub const INDEX_EXERCISES_NAME: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_exercises_name_key ON exercises(name_key);";

pub const INDEX_WORKOUT_EXERCISES_PAIR: &str = "CREATE UNIQUE INDEX IF NOT EXISTS idx_workout_exercises_pair ON workout_exercises(workout_id, exercise_id);";

pub const INDEX_WORKOUT_EXERCISES_EXERCISE: &str = "CREATE INDEX IF NOT EXISTS idx_workout_exercises_exercise ON workout_exercises(exercise_id);";

pub const EXERCISE_COLUMNS: &str = "id, name, category, equipment_needed, created_at, updated_at";

pub const WORKOUT_COLUMNS: &str = "id, date, duration_minutes, notes, created_at, updated_at";

pub const WORKOUT_EXERCISE_COLUMNS: &str =
    "id, workout_id, exercise_id, reps, sets, duration_seconds, created_at, updated_at";

pub fn schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_EXERCISES,
        CREATE_WORKOUTS,
        CREATE_WORKOUT_EXERCISES,
        INDEX_EXERCISES_NAME,
        INDEX_WORKOUT_EXERCISES_PAIR,
        INDEX_WORKOUT_EXERCISES_EXERCISE,
    ]
}
