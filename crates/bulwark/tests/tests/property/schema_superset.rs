//! Property tests: additive schema changes never violate, removals always do.

use std::collections::BTreeMap;

use bulwark_invariants::InvariantEngine;
use bulwark_types::{FindingKind, Snapshot, Subject};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

type Events = BTreeMap<String, BTreeMap<String, Vec<String>>>;

fn arb_tags() -> impl Strategy<Value = Vec<String>> {
    prop::sample::subsequence(vec!["string", "int", "null", "timestamp", "bool"], 1..3)
        .prop_map(|tags| tags.into_iter().map(String::from).collect())
}

fn arb_fields() -> impl Strategy<Value = BTreeMap<String, Vec<String>>> {
    prop::collection::btree_map("[a-z][a-zA-Z]{0,9}", arb_tags(), 1..6)
}

fn arb_events() -> impl Strategy<Value = Events> {
    prop::collection::btree_map("[a-z]{1,8}\\.[a-z]{1,8}", arb_fields(), 1..5)
}

fn snapshot(events: Events) -> Snapshot {
    Snapshot {
        events,
        ..Snapshot::new()
    }
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// A current schema that only adds fields and events is clean.
    #[test]
    fn superset_has_no_violations(
        base in arb_events(),
        extra_fields in arb_fields(),
        extra_events in arb_events(),
    ) {
        let mut current = base.clone();
        for fields in current.values_mut() {
            for (name, tags) in &extra_fields {
                fields.entry(format!("x_{name}")).or_insert_with(|| tags.clone());
            }
        }
        for (event, fields) in extra_events {
            current.entry(format!("new_{event}")).or_insert(fields);
        }

        let report = InvariantEngine::new().evaluate(&snapshot(base), &snapshot(current));
        prop_assert!(report.violations.is_empty(), "{:?}", report.violations);
        prop_assert!(!report.has_constitutional());
    }

    /// Dropping one recorded field yields exactly one `field_removed`.
    #[test]
    fn single_removal_is_one_violation(base in arb_events(), pick in any::<prop::sample::Index>()) {
        let pairs: Vec<(String, String)> = base
            .iter()
            .flat_map(|(e, fields)| fields.keys().map(move |f| (e.clone(), f.clone())))
            .collect();
        let (event, field) = pick.get(&pairs).clone();

        let mut current = base.clone();
        if let Some(fields) = current.get_mut(&event) {
            fields.remove(&field);
        }

        let report = InvariantEngine::new().evaluate(&snapshot(base), &snapshot(current));
        prop_assert_eq!(report.violations.len(), 1);
        let v = &report.violations[0];
        prop_assert_eq!(v.kind, FindingKind::FieldRemoved);
        prop_assert_eq!(&v.subject, &Subject::Field { event, field });
        prop_assert!(v.is_constitutional());
    }

    /// Evaluation is a pure function of its inputs.
    #[test]
    fn evaluation_is_deterministic(base in arb_events(), current in arb_events()) {
        let engine = InvariantEngine::new();
        let (base, current) = (snapshot(base), snapshot(current));
        prop_assert_eq!(engine.evaluate(&base, &current), engine.evaluate(&base, &current));
    }
}
