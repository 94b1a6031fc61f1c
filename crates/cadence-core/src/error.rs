use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Ambiguous ID: {0:?}")]
    AmbiguousId(Vec<(String, String)>),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Query lists {given} ids but the store accepts at most {limit}")]
    BatchTooLarge { given: usize, limit: usize },

    #[error("Store error: {message}")]
    Store { message: String, retryable: bool },

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Operation cancelled")]
    Cancelled,
}

impl CoreError {
    /// Whether repeating the same call could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Timeout(_) | CoreError::Io(_) => true,
            CoreError::Store { retryable, .. } => *retryable,
            CoreError::Database(e) => matches!(e, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)),
            _ => false,
        }
    }

    /// Validation failures are fatal to the call and never partial.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidInput(_) | CoreError::InvalidRule(_) | CoreError::BatchTooLarge { .. }
        )
    }
}
