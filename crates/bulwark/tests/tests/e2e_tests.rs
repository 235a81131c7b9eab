#[path = "e2e/photo_schema.rs"]
mod photo_schema;

#[path = "e2e/review_workflow.rs"]
mod review_workflow;

#[path = "e2e/suspend_lifecycle.rs"]
mod suspend_lifecycle;

#[path = "e2e/policy_reload.rs"]
mod policy_reload;

#[path = "e2e/remediation_tiers.rs"]
mod remediation_tiers;

#[path = "e2e/deadlines.rs"]
mod deadlines;

#[path = "e2e/cli_commands.rs"]
mod cli_commands;

#[path = "property/schema_superset.rs"]
mod schema_superset;

#[path = "property/risk_scoring.rs"]
mod risk_scoring;

#[path = "property/whitelist_monotonic.rs"]
mod whitelist_monotonic;

#[path = "adversarial/corrupt_suspend_store.rs"]
mod corrupt_suspend_store;

#[path = "adversarial/concurrent_ledger.rs"]
mod concurrent_ledger;

#[path = "adversarial/unlock_privilege.rs"]
mod unlock_privilege;
