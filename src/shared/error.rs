use thiserror::Error;

/// Crate-wide error taxonomy.
///
/// A sync conflict is deliberately not represented here: divergence is a
/// first-class push outcome, not an error (see `PushOutcome::Diverged`).
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Retryable failure reaching the remote authority. Drives scheduler
    /// backoff and is never surfaced to the user directly.
    #[error("Transient network failure: {0}")]
    Network(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Serialization failure: {0}")]
    Serialization(String),

    #[error("Validation failure: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => SyncError::NotFound("row not found".to_string()),
            other => SyncError::Persistence(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for SyncError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        SyncError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

impl From<String> for SyncError {
    fn from(err: String) -> Self {
        SyncError::Internal(err)
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
