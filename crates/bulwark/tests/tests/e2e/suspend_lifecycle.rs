//! End-to-end test: suspend triggers, unlock, and the persisted record.

use std::sync::Arc;

use bulwark_invariants::InvariantEngine;
use bulwark_suspend::{
    HistoryEntry, SimulationOutcome, SuspendManager, SuspendSeverity, SuspendState, SuspendStatus,
    Trigger, UnlockRequest,
};
use bulwark_tests::{photo_baseline, photo_id_removed, policy};
use bulwark_types::{Actor, CheckReport, JsonFileStore, ManualClock};
use chrono::{TimeZone, Utc};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn file_manager(path: &std::path::Path, clock: Arc<ManualClock>) -> SuspendManager {
    SuspendManager::new(Arc::new(JsonFileStore::<SuspendState>::new(path)), clock)
}

fn field_removed_report() -> CheckReport {
    InvariantEngine::new().evaluate(&photo_baseline(), &photo_id_removed())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn three_failures_suspend_and_unlock_resets() {
    let policy = policy();
    let thresholds = policy.document().suspend.thresholds;
    let mgr = SuspendManager::in_memory();

    for _ in 0..3 {
        mgr.record_simulation(SimulationOutcome::Failed, &thresholds)
            .unwrap();
    }
    let view = mgr.status();
    assert_eq!(view.state.status, SuspendStatus::Suspended);
    assert!(matches!(
        view.state.history.last(),
        Some(HistoryEntry::Trigger {
            trigger: Trigger::SimulateFailures {
                consecutive: 3,
                limit: 2
            },
            ..
        })
    ));

    let state = mgr
        .unlock(&UnlockRequest::new("alice"), &policy, &policy)
        .unwrap();
    assert_eq!(state.status, SuspendStatus::Active);
    assert_eq!(state.consecutive_simulate_failures, 0);
}

#[test]
fn persisted_record_matches_the_documented_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("suspend.json");
    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(t0));
    let mgr = file_manager(&path, Arc::clone(&clock));

    mgr.manual_suspend("deploy freeze", &Actor::new("alice"), &policy())
        .unwrap();

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc["version"], 1);
    let value = &doc["value"];
    assert_eq!(value["status"], "Suspended");
    assert_eq!(value["reason"], "deploy freeze");
    assert_eq!(value["triggeredBy"], "alice");
    assert_eq!(value["severity"], "standard");
    assert_eq!(value["consecutiveSimulateFailures"], 0);
    assert_eq!(value["history"][0]["event"], "trigger");
    assert_eq!(value["history"][0]["trigger"]["type"], "manual");
    assert!(value["triggeredAt"].as_str().unwrap().starts_with("2026-03-01T12:00:00"));
}

#[test]
fn state_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("suspend.json");
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let policy = policy();

    file_manager(&path, Arc::clone(&clock))
        .report_health(42.0, &policy.document().suspend.thresholds)
        .unwrap();

    let restarted = file_manager(&path, clock);
    assert!(restarted.is_suspended());
    restarted
        .unlock(&UnlockRequest::new("bob").with_note("feed recovered"), &policy, &policy)
        .unwrap();
    assert!(!file_manager(&path, Arc::new(ManualClock::new(Utc::now()))).is_suspended());
}

#[test]
fn escalation_while_suspended_raises_unlock_bar() {
    let policy = policy();
    let mgr = SuspendManager::in_memory();
    mgr.manual_suspend("maintenance", &Actor::new("alice"), &policy)
        .unwrap();
    assert_eq!(mgr.status().state.severity, Some(SuspendSeverity::Standard));

    mgr.report_violations(
        &field_removed_report().violations,
        Some(&Actor::new("healer-bot")),
    )
    .unwrap();
    let state = mgr.status().state;
    assert_eq!(state.severity, Some(SuspendSeverity::Critical));
    assert_eq!(state.reason.as_deref(), Some("maintenance"));

    assert!(mgr
        .unlock(&UnlockRequest::new("alice"), &policy, &policy)
        .is_err());
    mgr.unlock(
        &UnlockRequest::new("bob").with_co_signer("alice"),
        &policy,
        &policy,
    )
    .unwrap();
    let history = mgr.status().state.history;
    assert_eq!(history.len(), 3);
    assert!(matches!(
        history.last(),
        Some(HistoryEntry::Unlock {
            severity: SuspendSeverity::Critical,
            ..
        })
    ));
}
