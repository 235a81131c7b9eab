use bulwark_types::StoreError;
use thiserror::Error;

/// Risk engine errors.
#[derive(Debug, Error)]
pub enum RiskError {
    /// A protected-path glob failed to compile.
    #[error("invalid protected-path glob '{glob}': {reason}")]
    Glob { glob: String, reason: String },

    #[error("risk ledger store error: {0}")]
    Store(#[from] StoreError),

    /// The ledger kept changing underneath every commit attempt.
    #[error("risk ledger commit gave up after {0} conflicting attempts")]
    Contention(usize),
}

pub type RiskResult<T> = Result<T, RiskError>;
