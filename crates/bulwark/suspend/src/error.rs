use bulwark_types::StoreError;
use thiserror::Error;

use crate::state::SuspendSeverity;

/// Suspend manager errors.
#[derive(Debug, Error)]
pub enum SuspendError {
    /// The actor lacks the action outright.
    #[error("actor '{actor}' is not permitted to {action}")]
    NotAuthorized { actor: String, action: String },

    /// The signers do not jointly satisfy the unlock requirement.
    #[error("signers do not satisfy the {severity} unlock requirement")]
    InsufficientUnlockAuthority { severity: SuspendSeverity },

    #[error("co-signer must differ from the unlocking actor")]
    DuplicateSigner,

    #[error("system is not suspended")]
    NotSuspended,

    #[error("suspend store error: {0}")]
    Store(#[from] StoreError),

    #[error("suspend record kept changing; gave up after {0} attempts")]
    Contention(usize),
}

pub type SuspendResult<T> = Result<T, SuspendError>;
