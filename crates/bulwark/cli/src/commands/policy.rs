//! Policy commands

use bulwark_policy::{load_path, validate, PolicyError, SchemaError};
use serde::Serialize;
use tracing::info;

use crate::context::Context;
use crate::error::CliResult;
use crate::output::{emit, Outcome, Refusal};

#[derive(Debug, Serialize)]
struct ValidationReport<'a> {
    valid: bool,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    errors: &'a [SchemaError],
}

/// `validate-policy`: parse and validate without activating anything.
pub fn validate_policy(ctx: &Context) -> CliResult<Outcome> {
    let path = &ctx.settings.policy;
    let (error, errors) = match load_path(path) {
        Ok(loaded) => (None, validate(&loaded)),
        Err(e @ (PolicyError::Parse { .. } | PolicyError::UnsupportedFormat(_) | PolicyError::Io(_))) => {
            (Some(e.to_string()), Vec::new())
        }
        Err(e) => return Err(e.into()),
    };
    let valid = error.is_none() && errors.is_empty();
    info!(path = %path.display(), valid, errors = errors.len(), "policy validated");
    emit(
        &ValidationReport {
            valid,
            path: path.display().to_string(),
            error,
            errors: &errors,
        },
        !valid,
    )
}

#[derive(Debug, Serialize)]
struct PolicyValue<'a> {
    path: &'a str,
    value: &'a serde_json::Value,
}

/// `get-policy-value <path>`: dotted lookup into the active policy.
pub fn get_policy_value(ctx: &Context, path: &str) -> CliResult<Outcome> {
    let policy = ctx.policy()?;
    match policy.get(path) {
        Ok(value) => emit(&PolicyValue { path, value }, false),
        Err(PolicyError::NotFound(p)) => emit(&Refusal::new("not_found", p), true),
        Err(e) => Err(e.into()),
    }
}
