use thiserror::Error;

/// Errors from versioned store persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(String),

    #[error("store document at {path} is corrupt: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("lock acquisition failed")]
    LockError,
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

/// Convenience type alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;
