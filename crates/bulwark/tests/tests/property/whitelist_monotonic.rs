//! Property tests: a higher gate tier never whitelists less than a lower one.

use std::sync::Arc;

use bulwark_policy::{Escalation, GateTiers, TierPolicy};
use bulwark_types::{GateTier, InMemoryStore, SystemClock};
use bulwark_whitelist::{ApprovalLedger, WhitelistManager};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

const CLASSES: &[&str] = &[
    "lint_failure",
    "formatting_drift",
    "config_typo",
    "cache_invalidation",
    "schema_additive_change",
    "feature_flag_rollback",
];

fn arb_tier_policy() -> impl Strategy<Value = TierPolicy> {
    (
        prop::sample::subsequence(CLASSES.to_vec(), 0..CLASSES.len()),
        any::<bool>(),
        1u32..3,
    )
        .prop_map(|(classes, approval, min_approvers)| TierPolicy {
            whitelist: classes.into_iter().map(String::from).collect(),
            escalation: Escalation {
                requires_human_approval: approval,
                min_approvers,
            },
        })
}

fn arb_tiers() -> impl Strategy<Value = GateTiers> {
    (arb_tier_policy(), arb_tier_policy(), arb_tier_policy()).prop_map(|(a, b, c)| GateTiers {
        a,
        b,
        c,
    })
}

fn manager(tiers: &GateTiers) -> WhitelistManager {
    WhitelistManager::from_tiers(
        tiers,
        Arc::new(InMemoryStore::<ApprovalLedger>::default()),
        Arc::new(SystemClock),
    )
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn whitelisting_widens_with_tier(tiers in arb_tiers(), class in prop::sample::select(CLASSES.to_vec())) {
        let wl = manager(&tiers);
        if wl.is_whitelisted(class, GateTier::A) {
            prop_assert!(wl.is_whitelisted(class, GateTier::B));
        }
        if wl.is_whitelisted(class, GateTier::B) {
            prop_assert!(wl.is_whitelisted(class, GateTier::C));
        }
    }

    #[test]
    fn listing_grows_with_tier(tiers in arb_tiers()) {
        let wl = manager(&tiers);
        let sizes: Vec<usize> = GateTier::ALL
            .iter()
            .map(|t| wl.list(*t).unwrap().len())
            .collect();
        prop_assert!(sizes.windows(2).all(|w| w[0] <= w[1]), "{:?}", sizes);
    }

    /// A class is whitelisted below its minimum tier at no point.
    #[test]
    fn nothing_below_min_tier(tiers in arb_tiers(), class in prop::sample::select(CLASSES.to_vec())) {
        let wl = manager(&tiers);
        match wl.min_tier(class) {
            None => {
                for tier in GateTier::ALL {
                    prop_assert!(!wl.is_whitelisted(class, tier));
                }
            }
            Some(min) => {
                for tier in GateTier::ALL.into_iter().filter(|t| *t < min) {
                    prop_assert!(!wl.is_whitelisted(class, tier));
                }
            }
        }
    }
}
