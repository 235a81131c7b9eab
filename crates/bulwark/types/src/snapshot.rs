//! Schema / state-machine / migration snapshots.
//!
//! A [`Snapshot`] is the fact sheet a baseline records and a patch projects.
//! Parsing is lenient: [`Snapshot::from_value`] drops any section it cannot
//! read and reports a `malformed_snapshot` warning for it, so a partial
//! extractor output never crashes an evaluation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::finding::{FindingKind, Subject, Warning};

const PARSE_RULE: &str = "snapshot_parse";

// ── Snapshot ────────────────────────────────────────────────────────────

/// Recorded schema, state-machine and migration facts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Event type → field name → type tags.
    #[serde(default)]
    pub events: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub states: Vec<String>,
    /// Canonical lifecycle order.
    #[serde(default)]
    pub order: Vec<String>,
    #[serde(default)]
    pub transitions: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub migrations: Vec<String>,
    #[serde(default = "default_migrations_enabled")]
    pub migrations_enabled: bool,
}

fn default_migrations_enabled() -> bool {
    true
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            events: BTreeMap::new(),
            states: Vec::new(),
            order: Vec::new(),
            transitions: BTreeMap::new(),
            migrations: Vec::new(),
            migrations_enabled: true,
        }
    }
}

/// Hard failure reading a snapshot document.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("snapshot document must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// A snapshot plus the warnings produced while reading it.
#[derive(Clone, Debug, Default)]
pub struct ParsedSnapshot {
    pub snapshot: Snapshot,
    pub warnings: Vec<Warning>,
}

impl Snapshot {
    /// An empty snapshot with migration tracking enabled.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Builders ────────────────────────────────────────────────────

    /// Add (or replace) a field's type tags on an event.
    pub fn with_field(mut self, event: &str, field: &str, tags: &[&str]) -> Self {
        self.events
            .entry(event.to_string())
            .or_default()
            .insert(field.to_string(), tags.iter().map(|t| t.to_string()).collect());
        self
    }

    /// Add an event type with no fields.
    pub fn with_event(mut self, event: &str) -> Self {
        self.events.entry(event.to_string()).or_default();
        self
    }

    pub fn with_states(mut self, states: &[&str]) -> Self {
        self.states = states.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_order(mut self, order: &[&str]) -> Self {
        self.order = order.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_transition(mut self, from: &str, to: &str) -> Self {
        self.transitions
            .entry(from.to_string())
            .or_default()
            .push(to.to_string());
        self
    }

    pub fn with_migrations(mut self, migrations: &[&str]) -> Self {
        self.migrations = migrations.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn with_migrations_enabled(mut self, enabled: bool) -> Self {
        self.migrations_enabled = enabled;
        self
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Type tags for `event.field`, sorted. Duplicates are kept so that
    /// cardinality changes remain visible.
    pub fn sorted_type_tags(&self, event: &str, field: &str) -> Option<Vec<String>> {
        self.events.get(event).and_then(|fields| fields.get(field)).map(|tags| {
            let mut tags = tags.clone();
            tags.sort();
            tags
        })
    }

    pub fn state_set(&self) -> BTreeSet<&str> {
        self.states.iter().map(String::as_str).collect()
    }

    /// Every `(from, to)` pair in the transition graph, deduplicated.
    pub fn transition_pairs(&self) -> BTreeSet<(String, String)> {
        self.transitions
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |to| (from.clone(), to.clone())))
            .collect()
    }

    /// Whether `state` is a transition target or owns outgoing transitions.
    pub fn is_integrated(&self, state: &str) -> bool {
        let has_outgoing = self
            .transitions
            .get(state)
            .map(|targets| !targets.is_empty())
            .unwrap_or(false);
        has_outgoing
            || self
                .transitions
                .values()
                .any(|targets| targets.iter().any(|t| t == state))
    }

    // ── Parsing ─────────────────────────────────────────────────────

    /// Parse a snapshot document from JSON text.
    ///
    /// Fails only when the text is not a JSON object; malformed sections
    /// are dropped with a warning.
    pub fn from_json_str(text: &str) -> Result<ParsedSnapshot, SnapshotError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| SnapshotError::InvalidJson(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Parse a snapshot from an already-decoded JSON value.
    pub fn from_value(value: &Value) -> Result<ParsedSnapshot, SnapshotError> {
        let obj = value
            .as_object()
            .ok_or_else(|| SnapshotError::NotAnObject(json_type_name(value)))?;

        let mut parsed = ParsedSnapshot::default();
        let warnings = &mut parsed.warnings;
        let snapshot = &mut parsed.snapshot;

        if let Some(events) = obj.get("events") {
            snapshot.events = parse_events(events, warnings);
        }
        if let Some(states) = obj.get("states") {
            snapshot.states = parse_string_list("states", states, warnings);
        }
        if let Some(order) = obj.get("order") {
            snapshot.order = parse_string_list("order", order, warnings);
        }
        if let Some(transitions) = obj.get("transitions") {
            snapshot.transitions = parse_transitions(transitions, warnings);
        }
        if let Some(migrations) = obj.get("migrations") {
            snapshot.migrations = parse_string_list("migrations", migrations, warnings);
        }
        match obj.get("migrationsEnabled") {
            None => {}
            Some(Value::Bool(enabled)) => snapshot.migrations_enabled = *enabled,
            Some(other) => {
                // Unknown tracking state: treat as disabled so the check skips.
                snapshot.migrations_enabled = false;
                warnings.push(malformed(
                    "migrationsEnabled",
                    format!("expected boolean, found {}", json_type_name(other)),
                ));
            }
        }

        Ok(parsed)
    }
}

fn malformed(section: &str, message: impl Into<String>) -> Warning {
    Warning::new(
        PARSE_RULE,
        FindingKind::MalformedSnapshot,
        Subject::Section {
            section: section.to_string(),
        },
        message,
    )
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_string_list(section: &str, value: &Value, warnings: &mut Vec<Warning>) -> Vec<String> {
    let Some(items) = value.as_array() else {
        warnings.push(malformed(
            section,
            format!("expected array, found {}", json_type_name(value)),
        ));
        return Vec::new();
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item.as_str() {
            Some(s) => out.push(s.to_string()),
            None => warnings.push(malformed(
                section,
                format!("ignored non-string entry ({})", json_type_name(item)),
            )),
        }
    }
    out
}

fn parse_events(
    value: &Value,
    warnings: &mut Vec<Warning>,
) -> BTreeMap<String, BTreeMap<String, Vec<String>>> {
    let mut events = BTreeMap::new();
    let Some(obj) = value.as_object() else {
        warnings.push(malformed(
            "events",
            format!("expected object, found {}", json_type_name(value)),
        ));
        return events;
    };
    for (event, fields) in obj {
        let Some(fields) = fields.as_object() else {
            warnings.push(malformed(
                &format!("events.{event}"),
                format!("expected object of fields, found {}", json_type_name(fields)),
            ));
            continue;
        };
        let mut parsed_fields = BTreeMap::new();
        for (field, tags) in fields {
            let section = format!("events.{event}.{field}");
            let Some(items) = tags.as_array() else {
                warnings.push(malformed(
                    &section,
                    format!("expected array of type tags, found {}", json_type_name(tags)),
                ));
                continue;
            };
            // A field with unreadable tags is dropped whole; keeping a partial
            // tag set would report a type change that never happened.
            let tags: Option<Vec<String>> =
                items.iter().map(|t| t.as_str().map(str::to_string)).collect();
            match tags {
                Some(tags) => {
                    parsed_fields.insert(field.clone(), tags);
                }
                None => warnings.push(malformed(&section, "type tags must be strings")),
            }
        }
        events.insert(event.clone(), parsed_fields);
    }
    events
}

fn parse_transitions(value: &Value, warnings: &mut Vec<Warning>) -> BTreeMap<String, Vec<String>> {
    let mut transitions = BTreeMap::new();
    let Some(obj) = value.as_object() else {
        warnings.push(malformed(
            "transitions",
            format!("expected object, found {}", json_type_name(value)),
        ));
        return transitions;
    };
    for (from, targets) in obj {
        let targets = parse_string_list(&format!("transitions.{from}"), targets, warnings);
        transitions.insert(from.clone(), targets);
    }
    transitions
}
