use bulwark_types::StoreError;
use thiserror::Error;

/// Whitelist manager errors.
#[derive(Debug, Error)]
pub enum WhitelistError {
    #[error("actor '{actor}' is not permitted to {action}")]
    NotAuthorized { actor: String, action: String },

    #[error("error class '{0}' is not listed at any gate tier")]
    UnknownClass(String),

    #[error("error class '{0}' does not require approval")]
    ApprovalNotRequired(String),

    #[error("actor '{actor}' already approved '{class}'")]
    DuplicateApprover { class: String, actor: String },

    #[error("approval store error: {0}")]
    Store(#[from] StoreError),

    #[error("approval for '{0}' kept conflicting with concurrent writers")]
    Contention(String),
}

pub type WhitelistResult<T> = Result<T, WhitelistError>;
