use bulwark_policy::PolicyError;
use bulwark_risk::RiskError;
use bulwark_suspend::SuspendError;
use bulwark_whitelist::WhitelistError;
use thiserror::Error;

/// Gate pipeline errors.
///
/// Blocking outcomes are not errors; they come back as a
/// [`GateDecision`](crate::GateDecision) with a [`BlockReason`](crate::BlockReason).
#[derive(Debug, Error)]
pub enum GateError {
    #[error("baseline '{0}' not found")]
    BaselineNotFound(String),

    #[error("invalid baseline name '{0}'")]
    InvalidBaselineName(String),

    #[error("baseline '{name}' could not be read: {reason}")]
    Snapshot { name: String, reason: String },

    #[error("actor '{actor}' is not permitted to {action}")]
    NotAuthorized { actor: String, action: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("baseline registry lock poisoned")]
    LockPoisoned,

    #[error("evaluation task failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Risk(#[from] RiskError),

    #[error(transparent)]
    Suspend(#[from] SuspendError),

    #[error(transparent)]
    Whitelist(#[from] WhitelistError),
}

impl From<std::io::Error> for GateError {
    fn from(e: std::io::Error) -> Self {
        GateError::Io(e.to_string())
    }
}

pub type GateResult<T> = Result<T, GateError>;
