//! End-to-end test: policy load, validation and rejected reloads.

use bulwark_gate::{BaselineRegistry, PatchGate};
use bulwark_policy::{GateTiers, Policy, PolicyError, PolicyFormat, PolicyStore, SchemaError};
use bulwark_tests::{photo_baseline, policy_document, POLICY_YAML};
use bulwark_types::{Actor, GateTier};

#[test]
fn yaml_fixture_loads_and_answers_queries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.yaml");
    std::fs::write(&path, POLICY_YAML).unwrap();

    let store = PolicyStore::open(&path).unwrap();
    let policy = store.current();
    assert_eq!(policy.get("risk.budget.max").unwrap(), &serde_json::json!(2.0));
    assert_eq!(
        policy.get("protectedPaths.0.glob").unwrap(),
        &serde_json::json!("db/migrations/**")
    );
    assert!(matches!(
        policy.get("risk.budget.nope"),
        Err(PolicyError::NotFound(_))
    ));
    assert!(policy.actor_can(&Actor::new("alice"), "unlock"));
    assert!(!policy.actor_can(&Actor::new("mallory"), "unlock"));
}

#[test]
fn rejected_reload_keeps_previous_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.yaml");
    std::fs::write(&path, POLICY_YAML).unwrap();
    let store = PolicyStore::open(&path).unwrap();
    let before = store.current();

    // Unknown role and a negative budget.
    let broken = POLICY_YAML
        .replace("alice: [sre]", "alice: [root]")
        .replace("max: 2.0", "max: -1.0");
    std::fs::write(&path, broken).unwrap();

    match store.reload() {
        Err(PolicyError::ValidationFailed(errors)) => {
            assert!(errors
                .iter()
                .any(|e| matches!(e, SchemaError::UnknownRole { role, .. } if role == "root")));
            assert!(errors
                .iter()
                .any(|e| matches!(e, SchemaError::NonPositiveBudget { .. })));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert_eq!(store.current().document(), before.document());
}

#[test]
fn unparseable_replacement_keeps_previous_policy() {
    let store = PolicyStore::new(bulwark_tests::policy());
    let before = store.current();
    assert!(store
        .replace_from_str("{ not json", PolicyFormat::Json)
        .is_err());
    assert_eq!(store.current().document(), before.document());
}

#[test]
fn missing_sections_are_all_reported() {
    let result = PolicyStore::new(bulwark_tests::policy())
        .replace_from_str("roles: [sre]\n", PolicyFormat::Yaml);
    let Err(PolicyError::ValidationFailed(errors)) = result else {
        panic!("expected validation failure");
    };
    let missing: Vec<_> = errors
        .iter()
        .filter_map(|e| match e {
            SchemaError::MissingSection { section } => Some(section.as_str()),
            _ => None,
        })
        .collect();
    for section in ["actorRoles", "actorPermissions", "protectedPaths", "risk", "suspend"] {
        assert!(missing.contains(&section), "{section} not reported");
    }
}

#[test]
fn shipped_default_policy_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../../policies/default-policy.yaml");
    let store = PolicyStore::open(path).unwrap();
    assert!(store.current().document().gate_tiers.is_some());
}

#[test]
fn replaced_policy_tiers_drive_remediation() {
    let mut tiers = GateTiers::default();
    tiers.a.whitelist = vec!["lint_failure".into()];
    tiers.b.whitelist = vec!["config_typo".into()];
    let policy = Policy::from_document(policy_document().with_gate_tiers(tiers.clone())).unwrap();
    let gate = PatchGate::in_memory(
        policy,
        BaselineRegistry::new().with_baseline("photos", photo_baseline()),
    );
    assert!(gate.propose_remediation("lint_failure", GateTier::A).allowed);

    // Revoke lint_failure entirely and move config_typo down to A.
    tiers.a.whitelist = vec!["config_typo".into()];
    tiers.b.whitelist.clear();
    gate.policy()
        .replace(policy_document().with_gate_tiers(tiers))
        .unwrap();

    let revoked = gate.propose_remediation("lint_failure", GateTier::A);
    assert!(!revoked.allowed);
    assert_eq!(revoked.min_gate_tier, None);
    assert!(!gate.propose_remediation("lint_failure", GateTier::C).allowed);
    assert!(gate.propose_remediation("config_typo", GateTier::A).allowed);

    let listed: Vec<_> = gate
        .whitelist()
        .list(GateTier::C)
        .unwrap()
        .into_iter()
        .map(|e| e.error_class)
        .collect();
    assert_eq!(listed, vec!["config_typo".to_string()]);
}

#[test]
fn rejected_policy_leaves_remediation_unchanged() {
    let gate = PatchGate::in_memory(
        bulwark_tests::policy(),
        BaselineRegistry::new().with_baseline("photos", photo_baseline()),
    );
    let mut tiers = GateTiers::default();
    tiers.c.whitelist = vec!["lint_failure".into()];
    tiers.c.escalation.requires_human_approval = true;
    // minApprovers 0 with approval required does not validate.
    assert!(gate
        .policy()
        .replace(policy_document().with_gate_tiers(tiers))
        .is_err());
    assert!(gate.propose_remediation("lint_failure", GateTier::A).allowed);
}
