use rusqlite::ErrorCode;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Error kinds produced by validation, the entity store and the pairing service.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Malformed or out-of-range field value.
    #[error("{0}")]
    Validation(String),

    /// Referenced row does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate exercise name or duplicate pairing.
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[source] rusqlite::Error),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        match &error {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == ErrorCode::ConstraintViolation
                    && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Self::Conflict(format!("unique constraint violated: {error}"))
            }
            _ => Self::Database(error),
        }
    }
}
