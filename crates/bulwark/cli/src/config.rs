//! CLI configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

pub const DEFAULT_CONFIG_FILE: &str = "bulwark.toml";
pub const DEFAULT_POLICY: &str = "policies/default-policy.yaml";
pub const DEFAULT_STATE_DIR: &str = ".bulwark";
pub const DEFAULT_BASELINES_DIR: &str = "baselines";
pub const DEFAULT_DEADLINE_MS: u64 = 5_000;

/// Contents of `bulwark.toml`. Every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Policy document (YAML or JSON)
    pub policy: Option<PathBuf>,

    /// Directory holding suspend state, risk ledger and approvals
    pub state_dir: Option<PathBuf>,

    /// Directory of `<name>.json` baselines
    pub baselines_dir: Option<PathBuf>,

    /// Evaluation deadline for `evaluate`
    pub deadline_ms: Option<u64>,
}

impl CliConfig {
    /// Load configuration from `path`, or `./bulwark.toml` when not given.
    ///
    /// A missing default file is an empty config; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !config_path.exists() {
            if explicit {
                return Err(CliError::Config(format!(
                    "config file {} not found",
                    config_path.display()
                )));
            }
            return Ok(CliConfig::default());
        }
        let contents = std::fs::read_to_string(&config_path)?;
        toml::from_str(&contents).map_err(|e| CliError::Config(e.to_string()))
    }
}

/// Effective settings: flags and `BULWARK_*` variables over the config file
/// over built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub policy: PathBuf,
    pub state_dir: PathBuf,
    pub baselines_dir: PathBuf,
    pub deadline_ms: u64,
}

impl Settings {
    pub fn resolve(
        config: CliConfig,
        policy: Option<PathBuf>,
        state_dir: Option<PathBuf>,
        baselines_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            policy: policy
                .or(config.policy)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_POLICY)),
            state_dir: state_dir
                .or(config.state_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR)),
            baselines_dir: baselines_dir
                .or(config.baselines_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BASELINES_DIR)),
            deadline_ms: config.deadline_ms.unwrap_or(DEFAULT_DEADLINE_MS),
        }
    }

    pub fn suspend_path(&self) -> PathBuf {
        self.state_dir.join("suspend.json")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.state_dir.join("risk-ledger.json")
    }

    pub fn approvals_path(&self) -> PathBuf {
        self.state_dir.join("whitelist-approvals.json")
    }
}
