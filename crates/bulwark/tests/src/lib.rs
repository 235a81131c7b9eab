//! Shared fixtures for the Bulwark integration suite.

use bulwark_policy::{Policy, PolicyDocument, UnlockRequirement};
use bulwark_types::{actions, Severity, Snapshot};

/// Policy used across the scenarios.
///
/// - `alice` (sre) and `bob` (security) can suspend and unlock.
/// - `carol` (release-manager) can promote baselines and approve.
/// - `dave` (developer) holds `unlock` but no role that satisfies an unlock.
/// - `healer-bot` may only propose patches and report signals.
pub fn policy_document() -> PolicyDocument {
    PolicyDocument::default()
        .with_role("sre")
        .with_role("security")
        .with_role("release-manager")
        .with_role("developer")
        .with_actor(
            "alice",
            &["sre"],
            &[actions::TRIGGER_SUSPEND, actions::UNLOCK, actions::UPDATE_BASELINE],
        )
        .with_actor("bob", &["security"], &[actions::TRIGGER_SUSPEND, actions::UNLOCK])
        .with_actor(
            "carol",
            &["release-manager"],
            &[actions::UPDATE_BASELINE, actions::APPROVE_WHITELIST],
        )
        .with_actor("dave", &["developer"], &[actions::UNLOCK, actions::PROPOSE_PATCH])
        .with_actor("healer-bot", &[], &[actions::PROPOSE_PATCH, actions::REPORT_SIGNALS])
        .with_protected_path("db/migrations/**", Severity::Constitutional, "migrations")
        .with_protected_path("src/auth/**", Severity::Major, "auth")
        .with_protected_path("config/**", Severity::Warning, "config")
        .with_unlock_requirements(
            UnlockRequirement::any_of(&["sre", "security"]),
            UnlockRequirement::all_of(&["sre", "security"], 2),
        )
}

pub fn policy() -> Policy {
    match Policy::from_document(policy_document()) {
        Ok(policy) => policy,
        Err(e) => panic!("fixture policy must validate: {e}"),
    }
}

/// The same policy as YAML text, for load / reload paths.
pub const POLICY_YAML: &str = r#"
roles: [sre, security, release-manager, developer]
actorRoles:
  alice: [sre]
  bob: [security]
  carol: [release-manager]
  dave: [developer]
actorPermissions:
  alice: [trigger_suspend, unlock, update_baseline]
  bob: [trigger_suspend, unlock]
  carol: [update_baseline, approve_whitelist]
  dave: [unlock, propose_patch]
protectedPaths:
  - { glob: "db/migrations/**", severity: constitutional, rule: migrations }
  - { glob: "src/auth/**", severity: major, rule: auth }
  - { glob: "config/**", severity: warning, rule: config }
risk:
  budget: { max: 2.0, windowSeconds: 86400 }
  baseThreshold: 0.7
suspend:
  unlockRequires:
    standard: { anyRole: [sre, security] }
    critical: { allRoles: [sre, security], minSigners: 2 }
  thresholds:
    budgetTripFraction: 0.8
    maxConsecutiveSimulateFailures: 2
    healthFloor: 60
"#;

/// Photo-sharing baseline: two events and a three-state review workflow.
pub fn photo_baseline() -> Snapshot {
    Snapshot::new()
        .with_field("photo.uploaded", "photoId", &["string"])
        .with_field("photo.uploaded", "userId", &["string"])
        .with_field("photo.uploaded", "takenAt", &["timestamp", "null"])
        .with_field("photo.deleted", "photoId", &["string"])
        .with_states(&["draft", "reviewed", "approved"])
        .with_order(&["draft", "reviewed", "approved"])
        .with_transition("draft", "reviewed")
        .with_transition("reviewed", "approved")
        .with_migrations(&["0001_create_photos", "0002_add_taken_at"])
}

/// `photo_baseline` with `photo.uploaded.photoId` dropped.
pub fn photo_id_removed() -> Snapshot {
    let mut snapshot = photo_baseline();
    if let Some(fields) = snapshot.events.get_mut("photo.uploaded") {
        fields.remove("photoId");
    }
    snapshot
}
