//! Error types for the policy store.

use serde::Serialize;
use thiserror::Error;

/// One problem found while validating a policy document.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum SchemaError {
    /// A required top-level section is absent.
    #[error("missing required section '{section}'")]
    MissingSection { section: String },

    /// A protected-path glob does not compile.
    #[error("protectedPaths.{index}: malformed glob '{glob}': {reason}")]
    MalformedGlob {
        index: usize,
        glob: String,
        reason: String,
    },

    /// A role referenced somewhere is not declared under `roles`.
    #[error("{location}: unknown role '{role}'")]
    UnknownRole { location: String, role: String },

    /// An actor is granted an action the engine does not know.
    #[error("actorPermissions.{actor}: unknown action '{action}'")]
    UnknownAction { actor: String, action: String },

    /// Budget cap or window is zero or negative.
    #[error("{field} must be positive, found {value}")]
    NonPositiveBudget { field: String, value: f64 },

    /// A numeric threshold falls outside its allowed range.
    #[error("{field} = {value} is outside [{min}, {max}]")]
    ThresholdOutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// An unlock requirement names no roles at all.
    #[error("suspend.unlockRequires.{severity} names no roles")]
    EmptyUnlockRequirement { severity: String },
}

/// Policy store errors.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The policy file could not be read.
    #[error("policy I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file extension maps to no supported format.
    #[error("unsupported policy format '{0}' (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),

    /// The text is not a well-formed document of the expected shape.
    #[error("policy parse error ({format}): {reason}")]
    Parse { format: String, reason: String },

    /// The document parsed but failed validation; it was not activated.
    #[error("policy failed validation with {} error(s)", .0.len())]
    ValidationFailed(Vec<SchemaError>),

    /// Dotted-path lookup found nothing.
    #[error("policy value not found: {0}")]
    NotFound(String),

    /// The store has no source path to reload from.
    #[error("policy store has no source file to reload")]
    NoSource,
}

/// Result type for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;
