//! End-to-end test: state-machine monotonicity on the review workflow.

use bulwark_invariants::InvariantEngine;
use bulwark_tests::photo_baseline;
use bulwark_types::{FindingKind, Snapshot, Subject};

fn workflow() -> Snapshot {
    Snapshot::new()
        .with_states(&["draft", "reviewed", "approved"])
        .with_transition("draft", "reviewed")
        .with_transition("reviewed", "approved")
}

#[test]
fn approved_to_draft_is_one_backward_transition() {
    let current = workflow().with_transition("approved", "draft");
    let report = InvariantEngine::new().evaluate(&workflow(), &current);

    let backward: Vec<_> = report
        .violations
        .iter()
        .filter(|v| v.kind == FindingKind::BackwardTransition)
        .collect();
    assert_eq!(backward.len(), 1);
    assert_eq!(
        backward[0].subject,
        Subject::Transition {
            from: "approved".into(),
            to: "draft".into(),
        }
    );
    assert!(backward[0].is_constitutional());
}

#[test]
fn forward_skip_is_allowed() {
    let current = workflow().with_transition("draft", "approved");
    let report = InvariantEngine::new().evaluate(&workflow(), &current);
    assert_eq!(report.violation_count(FindingKind::BackwardTransition), 0);
}

#[test]
fn removed_state_is_flagged() {
    let current = Snapshot::new()
        .with_states(&["draft", "approved"])
        .with_transition("draft", "approved");
    let report = InvariantEngine::new().evaluate(&workflow(), &current);
    assert_eq!(report.violation_count(FindingKind::StateRemoved), 1);
}

#[test]
fn isolated_new_state_is_flagged() {
    let current = workflow().with_states(&["draft", "reviewed", "approved", "archived"]);
    let report = InvariantEngine::new().evaluate(&workflow(), &current);
    assert_eq!(report.violation_count(FindingKind::StateUnmapped), 1);
}

#[test]
fn integrated_new_state_is_only_a_warning() {
    let current = workflow()
        .with_states(&["draft", "reviewed", "approved", "archived"])
        .with_order(&["draft", "reviewed", "approved", "archived"])
        .with_transition("approved", "archived");
    let report = InvariantEngine::new().evaluate(&workflow(), &current);
    assert!(report.violations.is_empty(), "{report:?}");
    assert_eq!(report.warning_count(FindingKind::StateAdded), 1);
}

#[test]
fn full_baseline_against_itself_is_clean() {
    let report = InvariantEngine::new().evaluate(&photo_baseline(), &photo_baseline());
    assert!(report.violations.is_empty(), "{report:?}");
}
