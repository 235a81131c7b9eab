//! Bulwark CLI - governance checks for CI and orchestration
//!
//! Every command prints one JSON document on stdout and exits:
//!
//! - `0` when the result passes,
//! - `1` when the result blocks (denied, suspended, invalid, violations),
//! - `2` when the command itself failed.
//!
//! Logs go to stderr, filtered by `RUST_LOG` (or `--verbose`).

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod context;
mod error;
mod output;

use commands::{gate, invariants, policy, risk, signals, suspend, whitelist};
pub use config::{CliConfig, Settings};
pub use context::Context;
pub use error::{CliError, CliResult};
pub use output::Outcome;

/// Bulwark CLI application
#[derive(Parser)]
#[command(name = "bulwark")]
#[command(about = "Bulwark - constitutional governance and risk gating", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, env = "BULWARK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Policy document (YAML or JSON)
    #[arg(short, long, env = "BULWARK_POLICY", global = true)]
    policy: Option<PathBuf>,

    /// State directory (suspend state, risk ledger, approvals)
    #[arg(long, env = "BULWARK_STATE_DIR", global = true)]
    state_dir: Option<PathBuf>,

    /// Baselines directory
    #[arg(long, env = "BULWARK_BASELINES", global = true)]
    baselines: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Parse and validate the policy document
    ValidatePolicy,

    /// Look up a dotted path in the policy (e.g. `risk.budget.max`)
    GetPolicyValue { path: String },

    /// Classify and score a set of changed files
    CheckRisk {
        #[arg(required = true)]
        files: Vec<String>,

        /// Lines added
        #[arg(long, default_value_t = 0)]
        insertions: u32,

        /// Lines removed
        #[arg(long, default_value_t = 0)]
        deletions: u32,
    },

    /// Diff a current snapshot against a named baseline
    RunInvariantCheck {
        #[arg(short, long)]
        baseline: String,

        /// Current snapshot document (JSON)
        #[arg(long)]
        current: PathBuf,

        /// Do not report constitutional violations to the suspend manager
        #[arg(long)]
        dry_run: bool,
    },

    /// Run a patch through the whole gate
    Evaluate {
        #[arg(short, long)]
        baseline: String,

        /// Patch document (JSON)
        #[arg(long)]
        patch: PathBuf,

        /// Evaluation deadline in milliseconds
        #[arg(long, env = "BULWARK_DEADLINE_MS")]
        deadline_ms: Option<u64>,
    },

    /// Suspend state management
    Suspend {
        #[command(subcommand)]
        command: suspend::SuspendCommands,
    },

    /// Remediation whitelist
    Whitelist {
        #[command(subcommand)]
        command: whitelist::WhitelistCommands,
    },

    /// Baseline management
    Baseline {
        #[command(subcommand)]
        command: BaselineCommands,
    },

    /// Record a dry-run result
    Simulate {
        #[arg(long, conflicts_with = "failed", required_unless_present = "failed")]
        passed: bool,

        #[arg(long)]
        failed: bool,
    },

    /// Report an external health score (0-100)
    Health { score: f64 },

    /// Show effective settings
    Config,
}

#[derive(Subcommand)]
enum BaselineCommands {
    /// Replace a named baseline with a snapshot document
    Promote {
        name: String,

        #[arg(long)]
        snapshot: PathBuf,

        /// Acting identity (needs `update_baseline`)
        #[arg(short, long, env = "BULWARK_ACTOR")]
        actor: String,
    },
}

/// Run using the current process arguments.
pub async fn run() -> CliResult<Outcome> {
    run_with_args(std::env::args_os()).await
}

/// Run using the provided argument iterator.
pub async fn run_with_args<I, T>(args: I) -> CliResult<Outcome>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    // Initialize tracing on stderr; stdout is reserved for JSON.
    let filter = if cli.verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();

    let config = CliConfig::load(cli.config.as_deref())?;
    let settings = Settings::resolve(config, cli.policy, cli.state_dir, cli.baselines);
    let ctx = Context::new(settings);

    execute(cli.command, &ctx).await
}

async fn execute(command: Commands, ctx: &Context) -> CliResult<Outcome> {
    match command {
        Commands::ValidatePolicy => policy::validate_policy(ctx),
        Commands::GetPolicyValue { path } => policy::get_policy_value(ctx, &path),
        Commands::CheckRisk {
            files,
            insertions,
            deletions,
        } => risk::check_risk(ctx, &files, insertions, deletions),
        Commands::RunInvariantCheck {
            baseline,
            current,
            dry_run,
        } => invariants::run_invariant_check(ctx, &baseline, &current, dry_run),
        Commands::Evaluate {
            baseline,
            patch,
            deadline_ms,
        } => gate::evaluate(ctx, &baseline, &patch, deadline_ms).await,
        Commands::Suspend { command } => suspend::execute(command, ctx),
        Commands::Whitelist { command } => whitelist::execute(command, ctx),
        Commands::Baseline {
            command:
                BaselineCommands::Promote {
                    name,
                    snapshot,
                    actor,
                },
        } => gate::promote(ctx, &name, &snapshot, &actor),
        Commands::Simulate { passed, .. } => signals::simulate(ctx, passed),
        Commands::Health { score } => signals::health(ctx, score),
        Commands::Config => output::emit(&ctx.settings, false),
    }
}
