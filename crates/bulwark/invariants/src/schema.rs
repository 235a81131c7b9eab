//! Event schema immutability.
//!
//! Once an event type or field is recorded in a baseline it may never
//! disappear, and its type tags may never change. Additions are fine.

use bulwark_types::{
    CheckContext, CheckReport, FindingKind, GateCheck, Subject, Violation, Warning,
};

pub const RULE: &str = "event_schema_immutability";

pub struct EventSchemaImmutability;

impl GateCheck for EventSchemaImmutability {
    fn name(&self) -> &str {
        RULE
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckReport {
        let (baseline, current) = (ctx.baseline, ctx.current);

        if baseline.events.is_empty() {
            return CheckReport::skipped(Warning::new(
                RULE,
                FindingKind::NoBaseline,
                Subject::Check {
                    check: RULE.to_string(),
                },
                "baseline records no events; schema check skipped",
            ));
        }

        let mut report = CheckReport::new();

        for (event, base_fields) in &baseline.events {
            let Some(cur_fields) = current.events.get(event) else {
                report.push_violation(Violation::constitutional(
                    RULE,
                    FindingKind::EventRemoved,
                    Subject::Event {
                        event: event.clone(),
                    },
                    format!("event type '{event}' was removed"),
                ));
                continue;
            };

            for field in base_fields.keys() {
                let subject = Subject::Field {
                    event: event.clone(),
                    field: field.clone(),
                };
                if !cur_fields.contains_key(field) {
                    report.push_violation(Violation::constitutional(
                        RULE,
                        FindingKind::FieldRemoved,
                        subject,
                        format!("field '{event}.{field}' was removed"),
                    ));
                    continue;
                }
                let before = baseline.sorted_type_tags(event, field).unwrap_or_default();
                let after = current.sorted_type_tags(event, field).unwrap_or_default();
                if before != after {
                    report.push_violation(Violation::constitutional(
                        RULE,
                        FindingKind::FieldTypeChanged,
                        subject,
                        format!(
                            "field '{event}.{field}' changed type from [{}] to [{}]",
                            before.join(", "),
                            after.join(", ")
                        ),
                    ));
                }
            }

            for field in cur_fields.keys().filter(|f| !base_fields.contains_key(*f)) {
                report.push_warning(Warning::new(
                    RULE,
                    FindingKind::FieldAdded,
                    Subject::Field {
                        event: event.clone(),
                        field: field.clone(),
                    },
                    format!("field '{event}.{field}' added"),
                ));
            }
        }

        for event in current.events.keys().filter(|e| !baseline.events.contains_key(*e)) {
            report.push_warning(Warning::new(
                RULE,
                FindingKind::EventAdded,
                Subject::Event {
                    event: event.clone(),
                },
                format!("event type '{event}' added"),
            ));
        }

        report
    }
}
