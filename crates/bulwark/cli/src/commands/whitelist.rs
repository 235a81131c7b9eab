//! Whitelist commands

use bulwark_types::{Actor, GateTier};
use bulwark_whitelist::{WhitelistEntry, WhitelistError};
use clap::Subcommand;
use serde::Serialize;

use crate::context::Context;
use crate::error::CliResult;
use crate::output::{emit, Outcome, Refusal};

#[derive(Subcommand)]
pub enum WhitelistCommands {
    /// May `error_class` be auto-remediated at `tier`? (exit 1 when not)
    Check {
        error_class: String,

        /// Gate tier (A, B or C)
        #[arg(short, long, default_value = "A")]
        tier: GateTier,
    },

    /// List effective entries at or below a tier, plus pending approvals
    List {
        #[arg(short, long, default_value = "C")]
        tier: GateTier,
    },

    /// Approve an error class that requires human sign-off
    Approve {
        error_class: String,

        /// Acting identity (needs `approve_whitelist`)
        #[arg(short, long, env = "BULWARK_ACTOR")]
        actor: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Listing {
    tier: GateTier,
    entries: Vec<WhitelistEntry>,
    pending: Vec<WhitelistEntry>,
}

pub fn execute(command: WhitelistCommands, ctx: &Context) -> CliResult<Outcome> {
    match command {
        WhitelistCommands::Check { error_class, tier } => {
            let decision = ctx.gate()?.propose_remediation(&error_class, tier);
            let blocked = !decision.allowed;
            emit(&decision, blocked)
        }
        WhitelistCommands::List { tier } => {
            let policy = ctx.policy()?;
            let whitelist = ctx.whitelist(&policy);
            let listing = Listing {
                tier,
                entries: whitelist.list(tier)?,
                pending: whitelist.pending_approvals()?,
            };
            emit(&listing, false)
        }
        WhitelistCommands::Approve { error_class, actor } => {
            let policy = ctx.policy()?;
            let whitelist = ctx.whitelist(&policy);
            match whitelist.record_approval(&error_class, &Actor::new(actor), &policy) {
                Ok(entry) => emit(&entry, false),
                Err(e @ WhitelistError::NotAuthorized { .. }) => {
                    emit(&Refusal::new("not_authorized", e), true)
                }
                Err(e @ WhitelistError::DuplicateApprover { .. }) => {
                    emit(&Refusal::new("duplicate_approver", e), true)
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}
