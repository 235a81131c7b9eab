//! CLI error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Policy(#[from] bulwark_policy::PolicyError),

    #[error(transparent)]
    Store(#[from] bulwark_types::StoreError),

    #[error(transparent)]
    Risk(#[from] bulwark_risk::RiskError),

    #[error(transparent)]
    Suspend(#[from] bulwark_suspend::SuspendError),

    #[error(transparent)]
    Whitelist(#[from] bulwark_whitelist::WhitelistError),

    #[error(transparent)]
    Gate(#[from] bulwark_gate::GateError),
}

pub type CliResult<T> = Result<T, CliError>;
