//! Policy validation.
//!
//! Validation never stops at the first problem: every issue is collected so
//! an operator can fix the document in one pass.

use globset::GlobBuilder;

use crate::document::{PolicyDocument, UnlockRequirement};
use crate::error::SchemaError;
use crate::loader::LoadedPolicy;

/// Top-level sections a complete document must carry.
pub const REQUIRED_SECTIONS: &[&str] = &[
    "roles",
    "actorRoles",
    "actorPermissions",
    "protectedPaths",
    "risk",
    "suspend",
];

/// Maximum signers an unlock can involve (actor + one co-signer).
pub const MAX_UNLOCK_SIGNERS: u32 = 2;

/// Validate a loaded policy, returning every problem found.
pub fn validate(policy: &LoadedPolicy) -> Vec<SchemaError> {
    let mut errors = Vec::new();

    if let Some(obj) = policy.raw.as_object() {
        for section in REQUIRED_SECTIONS {
            if !obj.contains_key(*section) {
                errors.push(SchemaError::MissingSection {
                    section: section.to_string(),
                });
            }
        }
    }

    validate_document(&policy.document, &mut errors);
    errors
}

fn validate_document(doc: &PolicyDocument, errors: &mut Vec<SchemaError>) {
    // Protected path globs.
    for (index, rule) in doc.protected_paths.iter().enumerate() {
        if let Err(e) = GlobBuilder::new(&rule.glob).literal_separator(true).build() {
            errors.push(SchemaError::MalformedGlob {
                index,
                glob: rule.glob.clone(),
                reason: e.kind().to_string(),
            });
        }
    }

    // Roles.
    for (actor, roles) in &doc.actor_roles {
        for role in roles {
            if !doc.roles.contains(role) {
                errors.push(SchemaError::UnknownRole {
                    location: format!("actorRoles.{actor}"),
                    role: role.to_string(),
                });
            }
        }
    }

    // Actions.
    for (actor, actions) in &doc.actor_permissions {
        for action in actions {
            if !action.is_known() {
                errors.push(SchemaError::UnknownAction {
                    actor: actor.to_string(),
                    action: action.to_string(),
                });
            }
        }
    }

    // Risk.
    let risk = &doc.risk;
    if risk.budget.max.is_nan() || risk.budget.max <= 0.0 {
        errors.push(SchemaError::NonPositiveBudget {
            field: "risk.budget.max".into(),
            value: risk.budget.max,
        });
    }
    if risk.budget.window_seconds == 0 {
        errors.push(SchemaError::NonPositiveBudget {
            field: "risk.budget.windowSeconds".into(),
            value: 0.0,
        });
    }
    check_range(errors, "risk.baseThreshold", risk.base_threshold, 0.0, 1.0);
    if risk.base_threshold == 0.0 {
        // A zero threshold rejects every patch.
        errors.push(SchemaError::ThresholdOutOfRange {
            field: "risk.baseThreshold".into(),
            value: 0.0,
            min: f64::EPSILON,
            max: 1.0,
        });
    }
    check_range(errors, "risk.weights.warning", risk.weights.warning, 0.0, 1.0);
    check_range(errors, "risk.weights.major", risk.weights.major, 0.0, 1.0);
    check_range(
        errors,
        "risk.weights.constitutional",
        risk.weights.constitutional,
        0.0,
        1.0,
    );
    for (i, t) in risk.size_thresholds.iter().enumerate() {
        check_range(
            errors,
            &format!("risk.sizeThresholds.{i}.score"),
            t.score,
            0.0,
            1.0,
        );
    }
    check_range(
        errors,
        "risk.manyFilesPenalty",
        risk.many_files_penalty,
        0.0,
        1.0,
    );

    // Gate tiers.
    if let Some(tiers) = &doc.gate_tiers {
        for tier in bulwark_types::GateTier::ALL {
            let escalation = tiers.tier(tier).escalation;
            if escalation.requires_human_approval && escalation.min_approvers == 0 {
                errors.push(SchemaError::ThresholdOutOfRange {
                    field: format!("gateTiers.{tier}.escalation.minApprovers"),
                    value: 0.0,
                    min: 1.0,
                    max: f64::from(u32::MAX),
                });
            }
        }
    }

    // Suspend.
    let unlock = &doc.suspend.unlock_requires;
    validate_unlock(doc, "standard", &unlock.standard, errors);
    validate_unlock(doc, "critical", &unlock.critical, errors);

    let thresholds = &doc.suspend.thresholds;
    check_range(
        errors,
        "suspend.thresholds.budgetTripFraction",
        thresholds.budget_trip_fraction,
        0.0,
        1.0,
    );
    check_range(
        errors,
        "suspend.thresholds.healthFloor",
        thresholds.health_floor,
        0.0,
        100.0,
    );
}

fn validate_unlock(
    doc: &PolicyDocument,
    severity: &str,
    req: &UnlockRequirement,
    errors: &mut Vec<SchemaError>,
) {
    if req.is_empty() {
        errors.push(SchemaError::EmptyUnlockRequirement {
            severity: severity.to_string(),
        });
    }
    for role in req.referenced_roles() {
        if !doc.roles.contains(role) {
            errors.push(SchemaError::UnknownRole {
                location: format!("suspend.unlockRequires.{severity}"),
                role: role.to_string(),
            });
        }
    }
    if req.min_signers == 0 || req.min_signers > MAX_UNLOCK_SIGNERS {
        errors.push(SchemaError::ThresholdOutOfRange {
            field: format!("suspend.unlockRequires.{severity}.minSigners"),
            value: f64::from(req.min_signers),
            min: 1.0,
            max: f64::from(MAX_UNLOCK_SIGNERS),
        });
    }
}

fn check_range(errors: &mut Vec<SchemaError>, field: &str, value: f64, min: f64, max: f64) {
    // NaN fails the containment test too.
    if !(min..=max).contains(&value) {
        errors.push(SchemaError::ThresholdOutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
}
