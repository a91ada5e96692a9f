use crate::config::Config;
use crate::db::{
    Database, Exercise, ExercisePatch, NewExercise, NewWorkout, PairingFields, PairingPatch,
    RecordCounts, Workout, WorkoutExercise, WorkoutExerciseDetail, WorkoutPatch,
};
use crate::error::StoreError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
}

impl ApiState {
    fn database(&self) -> ApiResult<Database> {
        Ok(Database::open(&self.config.db_path)?)
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/stats", get(stats))
        .route("/exercises", get(exercise_list).post(exercise_create))
        .route(
            "/exercises/:id",
            get(exercise_show)
                .patch(exercise_update)
                .delete(exercise_delete),
        )
        .route("/workouts", get(workout_list).post(workout_create))
        .route(
            "/workouts/:id",
            get(workout_show)
                .patch(workout_update)
                .delete(workout_delete),
        )
        .route("/workouts/:id/workout_exercises", get(workout_pairings))
        .route(
            "/workouts/:id/exercises/:exercise_id/workout_exercises",
            get(pairing_show)
                .post(pairing_attach)
                .patch(pairing_update)
                .delete(pairing_detach),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ExerciseDetailPayload {
    #[serde(flatten)]
    exercise: Exercise,
    workout_exercises: Vec<WorkoutExercise>,
}

#[derive(Debug, Serialize)]
struct WorkoutDetailPayload {
    #[serde(flatten)]
    workout: Workout,
    workout_exercises: Vec<WorkoutExerciseDetail>,
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn stats(State(state): State<ApiState>) -> ApiResult<Json<RecordCounts>> {
    Ok(Json(state.database()?.counts()?))
}

async fn exercise_list(State(state): State<ApiState>) -> ApiResult<Json<Vec<Exercise>>> {
    Ok(Json(state.database()?.list_exercises()?))
}

async fn exercise_show(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ExerciseDetailPayload>> {
    let database = state.database()?;
    let exercise = database.exercise(id)?;
    let workout_exercises = database.list_pairings_by_exercise(id)?;

    Ok(Json(ExerciseDetailPayload {
        exercise,
        workout_exercises,
    }))
}

async fn exercise_create(
    State(state): State<ApiState>,
    payload: Result<Json<NewExercise>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Exercise>)> {
    let input = json_body(payload)?;
    let exercise = state.database()?.create_exercise(&input)?;

    Ok((StatusCode::CREATED, Json(exercise)))
}

async fn exercise_update(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    payload: Result<Json<ExercisePatch>, JsonRejection>,
) -> ApiResult<Json<Exercise>> {
    let patch = json_body(payload)?;
    Ok(Json(state.database()?.update_exercise(id, &patch)?))
}

async fn exercise_delete(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    state.database()?.delete_exercise(id)?;
    Ok(Json(json!({ "message": "Exercise deleted" })))
}

async fn workout_list(State(state): State<ApiState>) -> ApiResult<Json<Vec<Workout>>> {
    Ok(Json(state.database()?.list_workouts()?))
}

async fn workout_show(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<WorkoutDetailPayload>> {
    let database = state.database()?;
    let workout = database.workout(id)?;
    let workout_exercises = database.workout_exercise_details(id)?;

    Ok(Json(WorkoutDetailPayload {
        workout,
        workout_exercises,
    }))
}

async fn workout_create(
    State(state): State<ApiState>,
    payload: Result<Json<NewWorkout>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Workout>)> {
    let input = json_body(payload)?;
    let workout = state.database()?.create_workout(&input)?;

    Ok((StatusCode::CREATED, Json(workout)))
}

async fn workout_update(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    payload: Result<Json<WorkoutPatch>, JsonRejection>,
) -> ApiResult<Json<Workout>> {
    let patch = json_body(payload)?;
    Ok(Json(state.database()?.update_workout(id, &patch)?))
}

async fn workout_delete(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    state.database()?.delete_workout(id)?;
    Ok(Json(json!({ "message": "Workout deleted" })))
}

async fn workout_pairings(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<WorkoutExercise>>> {
    let database = state.database()?;
    database.workout(id)?;

    Ok(Json(database.list_pairings_by_workout(id)?))
}

async fn pairing_show(
    State(state): State<ApiState>,
    Path((workout_id, exercise_id)): Path<(i64, i64)>,
) -> ApiResult<Json<WorkoutExercise>> {
    Ok(Json(state.database()?.pairing(workout_id, exercise_id)?))
}

async fn pairing_attach(
    State(state): State<ApiState>,
    Path((workout_id, exercise_id)): Path<(i64, i64)>,
    payload: Result<Json<PairingFields>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<WorkoutExercise>)> {
    let fields = json_body(payload)?;
    let pairing = state
        .database()?
        .attach_exercise(workout_id, exercise_id, &fields)?;

    Ok((StatusCode::CREATED, Json(pairing)))
}

async fn pairing_update(
    State(state): State<ApiState>,
    Path((workout_id, exercise_id)): Path<(i64, i64)>,
    payload: Result<Json<PairingPatch>, JsonRejection>,
) -> ApiResult<Json<WorkoutExercise>> {
    let patch = json_body(payload)?;
    let pairing = state
        .database()?
        .update_pairing(workout_id, exercise_id, &patch)?;

    Ok(Json(pairing))
}

async fn pairing_detach(
    State(state): State<ApiState>,
    Path((workout_id, exercise_id)): Path<(i64, i64)>,
) -> ApiResult<Json<Value>> {
    state
        .database()?
        .detach_exercise(workout_id, exercise_id)?;
    Ok(Json(json!({ "message": "Exercise removed from workout" })))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::Validation(rejection.body_text()))
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
enum ApiError {
    Validation(String),
    NotFound(String),
    Conflict(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value)
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(message) => Self::Validation(message),
            StoreError::NotFound(message) => Self::NotFound(message),
            StoreError::Conflict(message) => Self::Conflict(message),
            StoreError::Database(error) => Self::Internal(error.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
            ApiError::Internal(error) => {
                warn!(error = %error, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
            }
        };

        if status.is_client_error() {
            debug!(status = status.as_u16(), error = %message, "request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
