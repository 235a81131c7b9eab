//! State machine monotonicity.
//!
//! States never disappear, new states must be wired into the transition
//! graph, and no transition may move backwards in the lifecycle order.

use std::collections::{BTreeSet, HashMap};

use bulwark_types::{
    CheckContext, CheckReport, FindingKind, GateCheck, Snapshot, Subject, Violation, Warning,
};

pub const RULE: &str = "state_machine_monotonicity";

pub struct StateMachineMonotonicity;

impl GateCheck for StateMachineMonotonicity {
    fn name(&self) -> &str {
        RULE
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckReport {
        let (baseline, current) = (ctx.baseline, ctx.current);

        if baseline.states.is_empty() {
            return CheckReport::skipped(Warning::new(
                RULE,
                FindingKind::NoBaseline,
                Subject::Check {
                    check: RULE.to_string(),
                },
                "baseline records no states; state machine check skipped",
            ));
        }

        let mut report = CheckReport::new();
        let base_states = baseline.state_set();
        let cur_states = current.state_set();

        let removed = dedup(
            baseline
                .states
                .iter()
                .filter(|s| !cur_states.contains(s.as_str())),
        );
        for state in removed {
            report.push_violation(Violation::constitutional(
                RULE,
                FindingKind::StateRemoved,
                Subject::State {
                    state: state.clone(),
                },
                format!("state '{state}' was removed"),
            ));
        }

        let new_states: Vec<&String> = dedup(
            current
                .states
                .iter()
                .filter(|s| !base_states.contains(s.as_str())),
        );
        for state in &new_states {
            let subject = Subject::State {
                state: (*state).clone(),
            };
            if current.is_integrated(state) {
                report.push_warning(Warning::new(
                    RULE,
                    FindingKind::StateAdded,
                    subject,
                    format!("state '{state}' added"),
                ));
            } else {
                report.push_violation(Violation::constitutional(
                    RULE,
                    FindingKind::StateUnmapped,
                    subject,
                    format!("new state '{state}' has no transitions in or out"),
                ));
            }
        }

        let order = lifecycle_order(baseline, current, &new_states);
        let index: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .rev()
            .map(|(i, s)| (s.as_str(), i))
            .collect();

        let pairs: BTreeSet<(String, String)> = baseline
            .transition_pairs()
            .into_iter()
            .chain(current.transition_pairs())
            .collect();

        for (from, to) in pairs {
            match (index.get(from.as_str()), index.get(to.as_str())) {
                (Some(&f), Some(&t)) => {
                    if t < f {
                        let message =
                            format!("transition '{from}' -> '{to}' moves backwards in the lifecycle");
                        report.push_violation(Violation::constitutional(
                            RULE,
                            FindingKind::BackwardTransition,
                            Subject::Transition { from, to },
                            message,
                        ));
                    }
                }
                (f, t) => {
                    let unordered: Vec<&str> = [(f, from.as_str()), (t, to.as_str())]
                        .into_iter()
                        .filter(|(idx, _)| idx.is_none())
                        .map(|(_, name)| name)
                        .collect();
                    let message = format!(
                        "transition '{from}' -> '{to}' names unordered state(s): {}",
                        unordered.join(", ")
                    );
                    report.push_warning(Warning::new(
                        RULE,
                        FindingKind::UnorderedTransition,
                        Subject::Transition { from, to },
                        message,
                    ));
                }
            }
        }

        report
    }
}

/// The total order used for monotonicity: the current snapshot's order,
/// else the baseline's, else the baseline state list followed by new states.
fn lifecycle_order<'a>(
    baseline: &'a Snapshot,
    current: &'a Snapshot,
    new_states: &[&'a String],
) -> Vec<&'a String> {
    if !current.order.is_empty() {
        current.order.iter().collect()
    } else if !baseline.order.is_empty() {
        baseline.order.iter().collect()
    } else {
        baseline
            .states
            .iter()
            .chain(new_states.iter().copied())
            .collect()
    }
}

/// First occurrence of each item, in input order.
pub(crate) fn dedup<'a>(items: impl Iterator<Item = &'a String>) -> Vec<&'a String> {
    let mut seen = BTreeSet::new();
    items.filter(|s| seen.insert(s.as_str())).collect()
}
