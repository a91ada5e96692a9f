use crate::error::{StoreError, StoreResult};
use chrono::{NaiveDate, Utc};

pub const EXERCISE_CATEGORIES: [&str; 5] = ["cardio", "strength", "flexibility", "balance", "core"];

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_NOTES_CHARS: usize = 1000;
pub const MAX_WORKOUT_MINUTES: i64 = 360;
pub const MAX_REPS: i64 = 1000;
pub const MAX_SETS: i64 = 100;
pub const MAX_DURATION_SECONDS: i64 = 36000;

pub fn validate_exercise_name(name: &str) -> StoreResult<String> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(StoreError::validation("Exercise name cannot be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(StoreError::validation(format!(
            "Exercise name cannot exceed {MAX_NAME_CHARS} characters"
        )));
    }

    Ok(trimmed.to_string())
}

pub fn validate_category(category: &str) -> StoreResult<String> {
    let normalized = category.trim().to_lowercase();

    if EXERCISE_CATEGORIES.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(StoreError::validation(format!(
            "Category must be one of: {}",
            EXERCISE_CATEGORIES.join(", ")
        )))
    }
}

/// Parses `YYYY-MM-DD` and rejects dates after today in UTC.
pub fn validate_workout_date(raw: &str) -> StoreResult<NaiveDate> {
    validate_workout_date_on(raw, Utc::now().date_naive())
}

pub fn validate_workout_date_on(raw: &str, today: NaiveDate) -> StoreResult<NaiveDate> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| StoreError::validation("Date must be in YYYY-MM-DD format"))?;

    if date > today {
        return Err(StoreError::validation(
            "Workout date cannot be in the future",
        ));
    }

    Ok(date)
}

pub fn validate_duration(minutes: i64) -> StoreResult<i64> {
    if minutes <= 0 {
        return Err(StoreError::validation("Duration must be a positive integer"));
    }
    if minutes > MAX_WORKOUT_MINUTES {
        return Err(StoreError::validation(format!(
            "Duration cannot exceed {MAX_WORKOUT_MINUTES} minutes (6 hours)"
        )));
    }

    Ok(minutes)
}

pub fn validate_notes(notes: Option<&str>) -> StoreResult<Option<String>> {
    match notes {
        Some(text) if text.chars().count() > MAX_NOTES_CHARS => Err(StoreError::validation(
            format!("Notes cannot exceed {MAX_NOTES_CHARS} characters"),
        )),
        Some(text) => Ok(Some(text.to_string())),
        None => Ok(None),
    }
}

/// Bounds check for optional pairing counters (reps, sets, duration_seconds).
pub fn validate_count(field: &str, value: Option<i64>, max: i64) -> StoreResult<Option<i64>> {
    match value {
        Some(count) if count <= 0 => Err(StoreError::validation(format!(
            "{field} must be positive if provided"
        ))),
        Some(count) if count > max => Err(StoreError::validation(format!(
            "{field} cannot exceed {max}"
        ))),
        other => Ok(other),
    }
}

/// A pairing records either reps and sets, or a duration. Never both, never neither.
pub fn validate_pairing_shape(
    reps: Option<i64>,
    sets: Option<i64>,
    duration_seconds: Option<i64>,
) -> StoreResult<()> {
    let counted = reps.is_some() && sets.is_some() && duration_seconds.is_none();
    let timed = duration_seconds.is_some() && reps.is_none() && sets.is_none();

    if counted || timed {
        return Ok(());
    }

    if duration_seconds.is_some() {
        Err(StoreError::validation(
            "Cannot provide both reps/sets and duration_seconds",
        ))
    } else {
        Err(StoreError::validation(
            "Must provide either reps and sets, or duration_seconds",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
    }

    #[test]
    fn exercise_name_is_trimmed() {
        let name = validate_exercise_name("  Push-ups  ").expect("valid name");
        assert_eq!(name, "Push-ups");
    }

    #[test]
    fn blank_exercise_name_is_rejected() {
        assert!(matches!(
            validate_exercise_name("  "),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn exercise_name_length_is_measured_after_trim() {
        let padded = format!("  {}  ", "a".repeat(100));
        assert!(validate_exercise_name(&padded).is_ok());
        assert!(validate_exercise_name(&"a".repeat(101)).is_err());
    }

    #[test]
    fn category_is_lowercased() {
        assert_eq!(validate_category("CORE").expect("valid category"), "core");
        assert_eq!(validate_category("Strength").expect("valid category"), "strength");
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(matches!(
            validate_category("yoga"),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn workout_date_today_is_accepted_and_tomorrow_rejected() {
        let today = date("2024-01-15");
        assert_eq!(
            validate_workout_date_on("2024-01-15", today).expect("today accepted"),
            today
        );
        assert!(validate_workout_date_on("2024-01-16", today).is_err());
    }

    #[test]
    fn workout_date_must_parse() {
        let today = date("2024-01-15");
        assert!(validate_workout_date_on("15/01/2024", today).is_err());
        assert!(validate_workout_date_on("", today).is_err());
    }

    #[test]
    fn duration_bounds() {
        assert!(validate_duration(0).is_err());
        assert!(validate_duration(-5).is_err());
        assert_eq!(validate_duration(1).expect("min"), 1);
        assert_eq!(validate_duration(360).expect("max"), 360);
        assert!(validate_duration(361).is_err());
    }

    #[test]
    fn notes_limit() {
        assert_eq!(validate_notes(None).expect("none"), None);
        assert!(validate_notes(Some(&"n".repeat(1000))).is_ok());
        assert!(validate_notes(Some(&"n".repeat(1001))).is_err());
    }

    #[test]
    fn count_rejects_non_positive_and_over_max() {
        assert_eq!(validate_count("reps", None, MAX_REPS).expect("absent"), None);
        assert_eq!(validate_count("reps", Some(15), MAX_REPS).expect("ok"), Some(15));
        assert!(validate_count("reps", Some(0), MAX_REPS).is_err());
        assert!(validate_count("sets", Some(101), MAX_SETS).is_err());
        assert!(validate_count("duration_seconds", Some(36001), MAX_DURATION_SECONDS).is_err());
    }

    #[test]
    fn pairing_shape_accepts_exactly_one_form() {
        assert!(validate_pairing_shape(Some(15), Some(3), None).is_ok());
        assert!(validate_pairing_shape(None, None, Some(1800)).is_ok());
    }

    #[test]
    fn pairing_shape_rejects_mixed_and_partial_forms() {
        assert!(validate_pairing_shape(Some(5), None, Some(100)).is_err());
        assert!(validate_pairing_shape(Some(5), Some(3), Some(100)).is_err());
        assert!(validate_pairing_shape(Some(5), None, None).is_err());
        assert!(validate_pairing_shape(None, Some(3), None).is_err());
        assert!(validate_pairing_shape(None, None, None).is_err());
    }
}
