//! Output helpers. Everything goes to stdout as JSON; logs go to stderr.

use std::process::ExitCode;

use serde::Serialize;

use crate::error::CliResult;

/// How a command ended, for the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    /// The result blocks (denied, suspended, invalid, violations).
    Blocked,
}

impl Outcome {
    pub fn blocked_if(blocked: bool) -> Self {
        if blocked {
            Outcome::Blocked
        } else {
            Outcome::Passed
        }
    }

    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Passed => ExitCode::SUCCESS,
            Outcome::Blocked => ExitCode::from(1),
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print `value` and derive the outcome in one step.
pub fn emit<T: Serialize + ?Sized>(value: &T, blocked: bool) -> CliResult<Outcome> {
    print_json(value)?;
    Ok(Outcome::blocked_if(blocked))
}

/// Structured refusal for errors that are an expected answer (an unlock
/// that lacks authority) rather than a failure to run.
#[derive(Debug, Serialize)]
pub struct Refusal<'a> {
    pub ok: bool,
    pub error: &'a str,
    pub message: String,
}

impl<'a> Refusal<'a> {
    pub fn new(error: &'a str, message: impl ToString) -> Self {
        Self {
            ok: false,
            error,
            message: message.to_string(),
        }
    }
}
