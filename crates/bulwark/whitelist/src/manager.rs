//! Whitelist manager.
//!
//! Answers "may tier T auto-remediate error class E?" from the policy's
//! tier table plus recorded human approvals. Approvals live in a
//! [`VersionedStore`] and are appended with compare-and-swap. The tier
//! table follows the active policy through [`WhitelistManager::sync_policy`].

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use bulwark_policy::{GateTiers, Policy};
use bulwark_types::{
    actions, Actor, CasOutcome, Clock, GateTier, InMemoryStore, SystemClock, VersionedStore,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{WhitelistError, WhitelistResult};
use crate::table::{builtin_tiers, resolve, TableRow};

const MAX_CAS_ATTEMPTS: usize = 16;

/// A recorded human approval.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub by: Actor,
    pub at: DateTime<Utc>,
}

/// Approvals per error class.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalLedger {
    #[serde(default)]
    pub approvals: BTreeMap<String, Vec<ApprovalRecord>>,
}

/// Approval status of a whitelist entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Approval {
    NotRequired,
    Pending {
        required: u32,
        approvers: Vec<ApprovalRecord>,
    },
    Approved {
        approvers: Vec<ApprovalRecord>,
    },
}

impl Approval {
    /// Whether the entry is in effect.
    pub fn is_effective(&self) -> bool {
        !matches!(self, Self::Pending { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistEntry {
    pub error_class: String,
    pub min_gate_tier: GateTier,
    pub approval: Approval,
}

/// The resolved table and the tiers it was resolved from.
struct Table {
    tiers: GateTiers,
    rows: BTreeMap<String, TableRow>,
}

impl Table {
    fn resolve(tiers: GateTiers) -> Self {
        Self {
            rows: resolve(&tiers),
            tiers,
        }
    }
}

/// Tier-gated whitelist with approval tracking.
pub struct WhitelistManager {
    table: RwLock<Table>,
    approvals: Arc<dyn VersionedStore<ApprovalLedger>>,
    clock: Arc<dyn Clock>,
}

impl WhitelistManager {
    /// Build from the policy's tier table, or the built-in table when the
    /// policy has none.
    pub fn new(
        policy: &Policy,
        approvals: Arc<dyn VersionedStore<ApprovalLedger>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::from_tiers(&tiers_of(policy), approvals, clock)
    }

    pub fn from_tiers(
        tiers: &GateTiers,
        approvals: Arc<dyn VersionedStore<ApprovalLedger>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            table: RwLock::new(Table::resolve(tiers.clone())),
            approvals,
            clock,
        }
    }

    /// In-memory approvals and the system clock.
    pub fn in_memory(policy: &Policy) -> Self {
        Self::new(
            policy,
            Arc::new(InMemoryStore::<ApprovalLedger>::default()),
            Arc::new(SystemClock),
        )
    }

    /// Re-resolve the tier table when `policy` carries different tiers.
    /// Recorded approvals are kept.
    pub fn sync_policy(&self, policy: &Policy) {
        let tiers = tiers_of(policy);
        if self.table().tiers == tiers {
            return;
        }
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        if table.tiers != tiers {
            *table = Table::resolve(tiers);
            info!(classes = table.rows.len(), "whitelist table re-resolved from active policy");
        }
    }

    /// Whether `error_class` may be auto-remediated at `tier`.
    ///
    /// Fails closed: an unreadable approval store means not whitelisted.
    pub fn is_whitelisted(&self, error_class: &str, tier: GateTier) -> bool {
        let Some(row) = self.row(error_class) else {
            return false;
        };
        if row.min_gate_tier > tier {
            return false;
        }
        if row.required_approvals == 0 {
            return true;
        }
        match self.approvals.read() {
            Ok(ledger) => approvals_for(&ledger.value, error_class).len() as u32 >= row.required_approvals,
            Err(e) => {
                warn!(error = %e, error_class, "approval store unreadable; treating class as not whitelisted");
                false
            }
        }
    }

    /// Minimum tier at which `error_class` is listed.
    pub fn min_tier(&self, error_class: &str) -> Option<GateTier> {
        self.row(error_class).map(|r| r.min_gate_tier)
    }

    /// Effective entries at or below `tier`, ordered by `(minGateTier, errorClass)`.
    pub fn list(&self, tier: GateTier) -> WhitelistResult<Vec<WhitelistEntry>> {
        let mut entries: Vec<_> = self
            .entries()?
            .into_iter()
            .filter(|e| e.min_gate_tier <= tier && e.approval.is_effective())
            .collect();
        entries.sort_by(|a, b| {
            (a.min_gate_tier, &a.error_class).cmp(&(b.min_gate_tier, &b.error_class))
        });
        Ok(entries)
    }

    /// Entries that still wait for human approval.
    pub fn pending_approvals(&self) -> WhitelistResult<Vec<WhitelistEntry>> {
        let mut entries: Vec<_> = self
            .entries()?
            .into_iter()
            .filter(|e| !e.approval.is_effective())
            .collect();
        entries.sort_by(|a, b| {
            (a.min_gate_tier, &a.error_class).cmp(&(b.min_gate_tier, &b.error_class))
        });
        Ok(entries)
    }

    /// Record `actor`'s approval of `error_class` under `policy`'s tiers.
    pub fn record_approval(
        &self,
        error_class: &str,
        actor: &Actor,
        policy: &Policy,
    ) -> WhitelistResult<WhitelistEntry> {
        if !policy.actor_can(actor, actions::APPROVE_WHITELIST) {
            warn!(%actor, error_class, "whitelist approval denied");
            return Err(WhitelistError::NotAuthorized {
                actor: actor.to_string(),
                action: actions::APPROVE_WHITELIST.to_string(),
            });
        }
        self.sync_policy(policy);
        let row = self
            .row(error_class)
            .ok_or_else(|| WhitelistError::UnknownClass(error_class.to_string()))?;
        if row.required_approvals == 0 {
            return Err(WhitelistError::ApprovalNotRequired(error_class.to_string()));
        }

        for _ in 0..MAX_CAS_ATTEMPTS {
            let current = self.approvals.read()?;
            let mut ledger = current.value;
            let records = ledger.approvals.entry(error_class.to_string()).or_default();
            if records.iter().any(|r| &r.by == actor) {
                return Err(WhitelistError::DuplicateApprover {
                    class: error_class.to_string(),
                    actor: actor.to_string(),
                });
            }
            records.push(ApprovalRecord {
                by: actor.clone(),
                at: self.clock.now(),
            });
            let entry = build_entry(error_class, &row, records);

            match self.approvals.compare_and_swap(current.version, ledger)? {
                CasOutcome::Committed { version } => {
                    info!(%actor, error_class, version, "whitelist approval recorded");
                    return Ok(entry);
                }
                CasOutcome::Conflict { current } => {
                    debug!(error_class, current, "approval write conflicted; retrying");
                }
            }
        }
        Err(WhitelistError::Contention(error_class.to_string()))
    }

    fn table(&self) -> RwLockReadGuard<'_, Table> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn row(&self, error_class: &str) -> Option<TableRow> {
        self.table().rows.get(error_class).cloned()
    }

    fn entries(&self) -> WhitelistResult<Vec<WhitelistEntry>> {
        let ledger = self.approvals.read()?.value;
        Ok(self
            .table()
            .rows
            .iter()
            .map(|(class, row)| build_entry(class, row, approvals_for(&ledger, class)))
            .collect())
    }
}

fn tiers_of(policy: &Policy) -> GateTiers {
    match &policy.document().gate_tiers {
        Some(tiers) => tiers.clone(),
        None => {
            debug!("policy has no gateTiers; using built-in whitelist table");
            builtin_tiers()
        }
    }
}

fn approvals_for<'a>(ledger: &'a ApprovalLedger, class: &str) -> &'a [ApprovalRecord] {
    ledger
        .approvals
        .get(class)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn build_entry(class: &str, row: &TableRow, approvers: &[ApprovalRecord]) -> WhitelistEntry {
    let approval = if row.required_approvals == 0 {
        Approval::NotRequired
    } else if approvers.len() as u32 >= row.required_approvals {
        Approval::Approved {
            approvers: approvers.to_vec(),
        }
    } else {
        Approval::Pending {
            required: row.required_approvals,
            approvers: approvers.to_vec(),
        }
    };
    WhitelistEntry {
        error_class: class.to_string(),
        min_gate_tier: row.min_gate_tier,
        approval,
    }
}
