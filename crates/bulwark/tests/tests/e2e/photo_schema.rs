//! End-to-end test: a patch that drops `photo.uploaded.photoId`.
//!
//! The removal is constitutional: the gate blocks, the suspend manager flips
//! to Suspended with critical severity, and later patches short-circuit.

use bulwark_gate::{BaselineRegistry, BlockReason, PatchGate};
use bulwark_invariants::InvariantEngine;
use bulwark_suspend::{SuspendSeverity, SuspendStatus};
use bulwark_tests::{photo_baseline, photo_id_removed, policy};
use bulwark_types::{FindingKind, Patch, Severity, Subject};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn gate() -> PatchGate {
    PatchGate::in_memory(
        policy(),
        BaselineRegistry::new().with_baseline("photos", photo_baseline()),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn engine_reports_exactly_one_field_removed() {
    let report = InvariantEngine::new().evaluate(&photo_baseline(), &photo_id_removed());

    assert_eq!(report.violations.len(), 1);
    let v = &report.violations[0];
    assert_eq!(v.kind, FindingKind::FieldRemoved);
    assert_eq!(v.severity, Severity::Constitutional);
    assert_eq!(
        v.subject,
        Subject::Field {
            event: "photo.uploaded".into(),
            field: "photoId".into(),
        }
    );
}

#[test]
fn type_tag_order_is_not_a_change() {
    let mut current = photo_baseline();
    current
        .events
        .get_mut("photo.uploaded")
        .unwrap()
        .insert("takenAt".into(), vec!["null".into(), "timestamp".into()]);
    let report = InvariantEngine::new().evaluate(&photo_baseline(), &current);
    assert!(report.violations.is_empty(), "{report:?}");
}

#[test]
fn widened_type_is_constitutional() {
    let current = photo_baseline().with_field("photo.uploaded", "userId", &["string", "int"]);
    let report = InvariantEngine::new().evaluate(&photo_baseline(), &current);
    assert_eq!(report.violation_count(FindingKind::FieldTypeChanged), 1);
    assert!(report.has_constitutional());
}

#[test]
fn gate_blocks_and_suspends_on_removal() {
    let gate = gate();
    let patch = Patch::new(["src/photos/upload.rs"])
        .with_lines(12, 30)
        .with_projected(photo_id_removed());

    let decision = gate.evaluate("photos", &patch).unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.block, Some(BlockReason::ConstitutionalViolation));
    assert_eq!(decision.report.violation_count(FindingKind::FieldRemoved), 1);
    assert!(decision.message.contains("photoId"));

    let view = gate.suspend().status();
    assert_eq!(view.state.status, SuspendStatus::Suspended);
    assert_eq!(view.state.severity, Some(SuspendSeverity::Critical));
    assert_eq!(view.state.history.len(), 1);
}

#[test]
fn suspended_gate_short_circuits_everything() {
    let gate = gate();
    let bad = Patch::new(["src/photos/upload.rs"]).with_projected(photo_id_removed());
    gate.evaluate("photos", &bad).unwrap();

    let harmless = Patch::new(["README.md"]).with_projected(photo_baseline());
    let decision = gate.evaluate("photos", &harmless).unwrap();
    assert_eq!(decision.block, Some(BlockReason::Suspended));
    assert!(decision.risk.is_none());
    assert!(decision.report.is_clean());

    // Short-circuits are not triggers.
    assert_eq!(gate.suspend().status().state.history.len(), 1);
}
