//! Whitelist table: error class → lowest tier that lists it.

use std::collections::BTreeMap;

use bulwark_policy::{Escalation, GateTiers, TierPolicy};
use bulwark_types::GateTier;

/// Table used when the policy omits `gateTiers`.
///
/// A fixes mechanical noise, B adds narrowly-scoped operational repairs, C
/// adds changes with wider blast radius, each of which needs a recorded
/// human approval before it takes effect.
pub fn builtin_tiers() -> GateTiers {
    fn tier(classes: &[&str], escalation: Escalation) -> TierPolicy {
        TierPolicy {
            whitelist: classes.iter().map(|c| c.to_string()).collect(),
            escalation,
        }
    }

    GateTiers {
        a: tier(
            &["lint_failure", "formatting_drift", "flaky_test_retry"],
            Escalation::default(),
        ),
        b: tier(
            &["dependency_patch_bump", "config_typo", "cache_invalidation"],
            Escalation::default(),
        ),
        c: tier(
            &["schema_additive_change", "feature_flag_rollback"],
            Escalation {
                requires_human_approval: true,
                min_approvers: 1,
            },
        ),
    }
}

/// One row of the resolved table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRow {
    pub min_gate_tier: GateTier,
    /// Approvals needed before the class is effective; 0 = none.
    pub required_approvals: u32,
}

/// Resolve tier whitelists into a class → row map.
///
/// The lowest tier listing a class defines its minimum tier; listing it
/// again at a higher tier changes nothing.
pub fn resolve(tiers: &GateTiers) -> BTreeMap<String, TableRow> {
    let mut rows = BTreeMap::new();
    for gate_tier in GateTier::ALL {
        let policy = tiers.tier(gate_tier);
        let required_approvals = if policy.escalation.requires_human_approval {
            policy.escalation.min_approvers.max(1)
        } else {
            0
        };
        for class in &policy.whitelist {
            rows.entry(class.clone()).or_insert(TableRow {
                min_gate_tier: gate_tier,
                required_approvals,
            });
        }
    }
    rows
}
