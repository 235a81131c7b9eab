//! Migration reversibility.
//!
//! Recorded migrations may never vanish. This is a presence check only: it
//! does not prove a rollback path exists for new migrations, which is what
//! [`crate::replay`] verification is for.

use std::collections::BTreeSet;

use bulwark_types::{
    CheckContext, CheckReport, FindingKind, GateCheck, Subject, Violation, Warning,
};

use crate::state_machine::dedup;

pub const RULE: &str = "migration_reversibility";

pub struct MigrationReversibility;

impl GateCheck for MigrationReversibility {
    fn name(&self) -> &str {
        RULE
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckReport {
        let (baseline, current) = (ctx.baseline, ctx.current);

        if !baseline.migrations_enabled || !current.migrations_enabled {
            let side = if !baseline.migrations_enabled {
                "baseline"
            } else {
                "current snapshot"
            };
            return CheckReport::skipped(Warning::new(
                RULE,
                FindingKind::MigrationTrackingDisabled,
                Subject::Check {
                    check: RULE.to_string(),
                },
                format!("migration tracking disabled in {side}; check skipped"),
            ));
        }

        let base: BTreeSet<&str> = baseline.migrations.iter().map(String::as_str).collect();
        let cur: BTreeSet<&str> = current.migrations.iter().map(String::as_str).collect();
        let mut report = CheckReport::new();

        let removed = dedup(
            baseline
                .migrations
                .iter()
                .filter(|m| !cur.contains(m.as_str())),
        );
        for migration in removed {
            report.push_violation(Violation::constitutional(
                RULE,
                FindingKind::MigrationRemoved,
                Subject::Migration {
                    migration: migration.clone(),
                },
                format!("migration '{migration}' was removed"),
            ));
        }

        let added = dedup(
            current
                .migrations
                .iter()
                .filter(|m| !base.contains(m.as_str())),
        );
        for migration in added {
            report.push_warning(Warning::new(
                RULE,
                FindingKind::NewMigrationDetected,
                Subject::Migration {
                    migration: migration.clone(),
                },
                format!("new migration '{migration}'; rollback path not verified"),
            ));
        }

        report
    }
}
