//! Adversarial test: nobody lifts a suspension without the authority for it.

use bulwark_policy::Policy;
use bulwark_suspend::{SuspendError, SuspendManager, SuspendSeverity, Trigger, UnlockRequest};
use bulwark_tests::policy;
use bulwark_types::{Actor, FindingKind, Subject};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn suspended(policy: &Policy, severity: SuspendSeverity) -> SuspendManager {
    let mgr = SuspendManager::in_memory();
    match severity {
        SuspendSeverity::Standard => {
            mgr.manual_suspend("freeze", &Actor::new("alice"), policy)
                .unwrap();
        }
        SuspendSeverity::Critical => {
            mgr.trigger(
                Trigger::ConstitutionalViolation {
                    rule: "event_schema".into(),
                    kind: FindingKind::FieldRemoved,
                    subject: Subject::Field {
                        event: "photo.uploaded".into(),
                        field: "photoId".into(),
                    },
                },
                "field 'photo.uploaded.photoId' was removed",
                Some(&Actor::new("alice")),
            )
            .unwrap();
        }
    }
    mgr
}

/// Attempt `request` and check the record did not move.
fn refused(mgr: &SuspendManager, policy: &Policy, request: UnlockRequest) -> SuspendError {
    let before = mgr.status();
    let err = mgr.unlock(&request, policy, policy).unwrap_err();
    let after = mgr.status();
    assert!(after.is_suspended());
    assert_eq!(after.version, before.version);
    assert_eq!(after.state.history, before.state.history);
    err
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn permission_without_role_is_not_enough() {
    let policy = policy();
    let mgr = suspended(&policy, SuspendSeverity::Standard);
    let err = refused(&mgr, &policy, UnlockRequest::new("dave"));
    assert!(matches!(
        err,
        SuspendError::InsufficientUnlockAuthority {
            severity: SuspendSeverity::Standard
        }
    ));
}

#[test]
fn actor_without_the_action_is_refused() {
    let policy = policy();
    let mgr = suspended(&policy, SuspendSeverity::Standard);
    for actor in ["healer-bot", "carol", "mallory"] {
        let err = refused(&mgr, &policy, UnlockRequest::new(actor));
        assert!(matches!(err, SuspendError::NotAuthorized { .. }), "{actor}");
    }
}

#[test]
fn co_signer_without_the_action_is_refused() {
    let policy = policy();
    let mgr = suspended(&policy, SuspendSeverity::Critical);
    let err = refused(
        &mgr,
        &policy,
        UnlockRequest::new("alice").with_co_signer("healer-bot"),
    );
    assert!(matches!(err, SuspendError::NotAuthorized { .. }));
}

#[test]
fn signing_twice_is_refused() {
    let policy = policy();
    let mgr = suspended(&policy, SuspendSeverity::Critical);
    let err = refused(
        &mgr,
        &policy,
        UnlockRequest::new("alice").with_co_signer("alice"),
    );
    assert!(matches!(err, SuspendError::DuplicateSigner));
}

#[test]
fn critical_needs_both_roles() {
    let policy = policy();
    let mgr = suspended(&policy, SuspendSeverity::Critical);
    for request in [
        UnlockRequest::new("alice"),
        UnlockRequest::new("bob"),
        UnlockRequest::new("alice").with_co_signer("dave"),
    ] {
        let err = refused(&mgr, &policy, request);
        assert!(matches!(
            err,
            SuspendError::InsufficientUnlockAuthority {
                severity: SuspendSeverity::Critical
            }
        ));
    }
    mgr.unlock(
        &UnlockRequest::new("alice").with_co_signer("bob"),
        &policy,
        &policy,
    )
    .unwrap();
    assert!(!mgr.is_suspended());
}

#[test]
fn triggering_actor_gets_no_implicit_right() {
    let policy = policy();
    let mgr = SuspendManager::in_memory();
    mgr.trigger(
        Trigger::SimulateFailures {
            consecutive: 3,
            limit: 2,
        },
        "dry runs failing",
        Some(&Actor::new("dave")),
    )
    .unwrap();
    let err = refused(&mgr, &policy, UnlockRequest::new("dave"));
    assert!(matches!(err, SuspendError::InsufficientUnlockAuthority { .. }));
}

#[test]
fn unlocking_an_active_system_is_refused() {
    let policy = policy();
    let mgr = SuspendManager::in_memory();
    let err = mgr
        .unlock(&UnlockRequest::new("alice"), &policy, &policy)
        .unwrap_err();
    assert!(matches!(err, SuspendError::NotSuspended));
    assert!(mgr.status().state.history.is_empty());
}
