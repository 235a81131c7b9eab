//! Adversarial test: concurrent acceptances never lose a budget charge.

use std::sync::{Arc, Mutex};
use std::thread;

use bulwark_risk::{BudgetLedger, RiskEngine, RiskError};
use bulwark_tests::policy;
use bulwark_types::{InMemoryStore, JsonFileStore, Patch, SystemClock, VersionedStore};

const THREADS: usize = 8;
const PATCHES_PER_THREAD: usize = 12;

/// Run the storm against `engine` and return the accepted scores.
fn storm(engine: Arc<RiskEngine>) -> Vec<f64> {
    let accepted = Arc::new(Mutex::new(Vec::new()));
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let engine = Arc::clone(&engine);
            let accepted = Arc::clone(&accepted);
            thread::spawn(move || {
                let policy = policy();
                for i in 0..PATCHES_PER_THREAD {
                    // config/** is a warning rule; 100+ lines adds a size score.
                    let patch = Patch::new([format!("config/t{t}-{i}.toml")])
                        .with_lines(60 + (i as u32) * 10, 0);
                    match engine.assess(&patch, &policy) {
                        Ok(a) if a.allowed => accepted.lock().unwrap().push(a.score),
                        Ok(_) | Err(RiskError::Contention(_)) => {}
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    Arc::try_unwrap(accepted).unwrap().into_inner().unwrap()
}

fn assert_no_lost_updates(consumed: f64, accepted: &[f64]) {
    let expected: f64 = accepted.iter().sum();
    assert!(
        (consumed - expected).abs() < 1e-9,
        "ledger {consumed} != sum of accepted {expected} over {} patches",
        accepted.len()
    );
}

#[test]
fn in_memory_ledger_matches_accepted_scores() {
    let store = Arc::new(InMemoryStore::<BudgetLedger>::default());
    let engine = Arc::new(RiskEngine::new(store.clone(), Arc::new(SystemClock)));

    let accepted = storm(engine);
    assert!(!accepted.is_empty());
    assert_no_lost_updates(store.read().unwrap().value.consumed, &accepted);
}

#[test]
fn file_ledger_matches_accepted_scores() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::<BudgetLedger>::new(dir.path().join("ledger.json")));
    let engine = Arc::new(RiskEngine::new(store.clone(), Arc::new(SystemClock)));

    let accepted = storm(engine);
    assert_no_lost_updates(store.read().unwrap().value.consumed, &accepted);
}

#[test]
fn budget_never_overshoots_its_cap() {
    let policy = policy();
    let engine = RiskEngine::in_memory();
    let mut rejected = 0;
    for i in 0..200 {
        let patch = Patch::new([format!("src/auth/m{i}.rs")]).with_lines(150, 0);
        if !engine.assess(&patch, &policy).unwrap().allowed {
            rejected += 1;
        }
    }
    let status = engine.status(&policy).unwrap();
    assert!(status.consumed <= status.max);
    assert!(rejected > 0);
}
