//! Component wiring for one CLI invocation.
//!
//! Shared records live as JSON files under the state directory, so
//! consecutive invocations (and concurrent ones on one host) see the same
//! suspend state, budget ledger and approvals.

use std::sync::Arc;

use bulwark_gate::{BaselineRegistry, PatchGate};
use bulwark_policy::{Policy, PolicyStore};
use bulwark_risk::{BudgetLedger, RiskEngine};
use bulwark_suspend::{SuspendManager, SuspendState};
use bulwark_types::{Clock, JsonFileStore, SystemClock};
use bulwark_whitelist::{ApprovalLedger, WhitelistManager};

use crate::config::Settings;
use crate::error::CliResult;

pub struct Context {
    pub settings: Settings,
    clock: Arc<dyn Clock>,
}

impl Context {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// The policy, validated. An invalid document is an error.
    pub fn policy(&self) -> CliResult<Policy> {
        Ok(Policy::from_path(&self.settings.policy)?)
    }

    pub fn ledger_store(&self) -> JsonFileStore<BudgetLedger> {
        JsonFileStore::new(self.settings.ledger_path())
    }

    pub fn suspend(&self) -> SuspendManager {
        SuspendManager::new(
            Arc::new(JsonFileStore::<SuspendState>::new(self.settings.suspend_path())),
            Arc::clone(&self.clock),
        )
    }

    pub fn risk(&self) -> RiskEngine {
        RiskEngine::new(Arc::new(self.ledger_store()), Arc::clone(&self.clock))
    }

    pub fn whitelist(&self, policy: &Policy) -> WhitelistManager {
        WhitelistManager::new(
            policy,
            Arc::new(JsonFileStore::<ApprovalLedger>::new(
                self.settings.approvals_path(),
            )),
            Arc::clone(&self.clock),
        )
    }

    pub fn baselines(&self) -> CliResult<BaselineRegistry> {
        Ok(BaselineRegistry::open(&self.settings.baselines_dir)?)
    }

    pub fn gate(&self) -> CliResult<PatchGate> {
        let policy = self.policy()?;
        let whitelist = self.whitelist(&policy);
        Ok(PatchGate::new(
            Arc::new(PolicyStore::new(policy)),
            Arc::new(self.baselines()?),
            self.risk(),
            self.suspend(),
            whitelist,
        ))
    }
}
