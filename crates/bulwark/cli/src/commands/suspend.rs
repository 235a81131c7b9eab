//! Suspend commands

use bulwark_suspend::{SuspendError, UnlockRequest};
use bulwark_types::Actor;
use clap::Subcommand;

use crate::context::Context;
use crate::error::CliResult;
use crate::output::{emit, Outcome, Refusal};

#[derive(Subcommand)]
pub enum SuspendCommands {
    /// Show the suspend state and full history (exit 1 when suspended)
    Status,

    /// Suspend autonomous changes
    Trigger {
        /// Why the system is being suspended
        #[arg(short, long)]
        reason: String,

        /// Acting identity (needs `trigger_suspend`)
        #[arg(short, long, env = "BULWARK_ACTOR")]
        actor: String,
    },

    /// Lift the suspension
    Unlock {
        /// Acting identity (needs `unlock`)
        #[arg(short, long, env = "BULWARK_ACTOR")]
        actor: String,

        /// Second signer, for critical suspensions
        #[arg(long)]
        co_signer: Option<String>,

        /// Free-form note recorded in the history
        #[arg(short, long)]
        note: Option<String>,
    },
}

pub fn execute(command: SuspendCommands, ctx: &Context) -> CliResult<Outcome> {
    let suspend = ctx.suspend();
    match command {
        SuspendCommands::Status => {
            let view = suspend.status();
            let blocked = view.is_suspended();
            emit(&view, blocked)
        }
        SuspendCommands::Trigger { reason, actor } => {
            let policy = ctx.policy()?;
            match suspend.manual_suspend(reason, &Actor::new(actor), &policy) {
                Ok(state) => emit(&state, false),
                Err(e @ SuspendError::NotAuthorized { .. }) => {
                    emit(&Refusal::new("not_authorized", e), true)
                }
                Err(e) => Err(e.into()),
            }
        }
        SuspendCommands::Unlock {
            actor,
            co_signer,
            note,
        } => {
            let policy = ctx.policy()?;
            let mut request = UnlockRequest::new(actor);
            if let Some(co_signer) = co_signer {
                request = request.with_co_signer(co_signer);
            }
            if let Some(note) = note {
                request = request.with_note(note);
            }
            match suspend.unlock(&request, &policy, &policy) {
                Ok(state) => emit(&state, false),
                Err(e) => match refusal_code(&e) {
                    Some(code) => emit(&Refusal::new(code, e), true),
                    None => Err(e.into()),
                },
            }
        }
    }
}

fn refusal_code(e: &SuspendError) -> Option<&'static str> {
    match e {
        SuspendError::NotAuthorized { .. } => Some("not_authorized"),
        SuspendError::InsufficientUnlockAuthority { .. } => Some("insufficient_unlock_authority"),
        SuspendError::DuplicateSigner => Some("duplicate_signer"),
        SuspendError::NotSuspended => Some("not_suspended"),
        SuspendError::Store(_) | SuspendError::Contention(_) => None,
    }
}
