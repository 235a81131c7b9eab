//! Property tests: risk scoring is deterministic, bounded, and never admits a
//! constitutional path.

use bulwark_risk::{assess, BudgetLedger};
use bulwark_tests::policy;
use bulwark_types::Patch;
use chrono::Utc;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

fn arb_path() -> impl Strategy<Value = String> {
    prop_oneof![
        "src/[a-z]{1,8}/[a-z]{1,8}\\.rs",
        "src/auth/[a-z]{1,8}\\.rs",
        "config/[a-z]{1,8}\\.toml",
        "docs/[a-z]{1,8}\\.md",
    ]
}

fn arb_patch() -> impl Strategy<Value = Patch> {
    (
        prop::collection::vec(arb_path(), 1..30),
        0u32..5_000,
        0u32..5_000,
    )
        .prop_map(|(files, ins, del)| Patch::new(files).with_lines(ins, del))
}

fn ledger(consumed: f64) -> BudgetLedger {
    BudgetLedger {
        consumed,
        ..BudgetLedger::starting_at(Utc::now())
    }
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn scoring_is_deterministic_and_bounded(patch in arb_patch(), consumed in 0.0f64..2.0) {
        let policy = policy();
        let a = assess(&patch, &policy, &ledger(consumed)).unwrap();
        let b = assess(&patch, &policy, &ledger(consumed)).unwrap();
        prop_assert_eq!(a.score, b.score);
        prop_assert_eq!(a.allowed, b.allowed);
        prop_assert!((0.0..=1.0).contains(&a.score));
        prop_assert_eq!(a.allowed, a.score < a.threshold);
    }

    /// However small the diff, a migration file blocks.
    #[test]
    fn constitutional_path_is_never_allowed(
        patch in arb_patch(),
        name in "[0-9]{4}_[a-z]{1,10}\\.sql",
        consumed in 0.0f64..2.0,
    ) {
        let mut patch = patch;
        patch.files.push(format!("db/migrations/{name}"));
        let result = assess(&patch, &policy(), &ledger(consumed)).unwrap();
        prop_assert!(!result.allowed);
        prop_assert!(result.report.has_constitutional());
    }

    /// Spending budget only ever tightens the threshold.
    #[test]
    fn threshold_shrinks_with_consumption(patch in arb_patch(), lo in 0.0f64..1.0, delta in 0.0f64..1.0) {
        let policy = policy();
        let before = assess(&patch, &policy, &ledger(lo)).unwrap();
        let after = assess(&patch, &policy, &ledger(lo + delta)).unwrap();
        prop_assert!(after.threshold <= before.threshold);
        prop_assert!(!after.allowed || before.allowed);
    }
}
