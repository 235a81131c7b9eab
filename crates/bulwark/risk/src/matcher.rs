//! Protected-path classification.
//!
//! Globs follow shell semantics with `literal_separator` on: `*` stays
//! within one path segment, `**` crosses segments. When several rules match
//! a file the most severe wins; equal severities go to the rule listed
//! first.

use bulwark_policy::{Policy, ProtectedPathRule};
use bulwark_types::Severity;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{RiskError, RiskResult};

/// The winning protected-path rule for one file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMatch {
    pub path: String,
    pub rule: String,
    pub glob: String,
    pub severity: Severity,
}

/// A file and the rule it matched, if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathClassification {
    pub path: String,
    #[serde(rename = "match")]
    pub matched: Option<PathMatch>,
}

/// Compiled protected-path rules.
#[derive(Debug, Clone)]
pub struct ProtectedPathMatcher {
    rules: Vec<ProtectedPathRule>,
    set: GlobSet,
}

impl ProtectedPathMatcher {
    pub fn new(rules: &[ProtectedPathRule]) -> RiskResult<Self> {
        let mut builder = GlobSetBuilder::new();
        for rule in rules {
            let glob = GlobBuilder::new(&rule.glob)
                .literal_separator(true)
                .build()
                .map_err(|e| RiskError::Glob {
                    glob: rule.glob.clone(),
                    reason: e.kind().to_string(),
                })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|e| RiskError::Glob {
            glob: "<set>".into(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            rules: rules.to_vec(),
            set,
        })
    }

    pub fn from_policy(policy: &Policy) -> RiskResult<Self> {
        Self::new(&policy.document().protected_paths)
    }

    /// The winning rule for `path`.
    pub fn classify(&self, path: &str) -> Option<PathMatch> {
        let path = path.trim_start_matches("./");
        // Indices come back ascending, i.e. in document order.
        let mut best: Option<&ProtectedPathRule> = None;
        for idx in self.set.matches(path) {
            let rule = &self.rules[idx];
            if best.map_or(true, |b| rule.severity > b.severity) {
                best = Some(rule);
            }
        }
        best.map(|rule| PathMatch {
            path: path.to_string(),
            rule: rule.rule.clone(),
            glob: rule.glob.clone(),
            severity: rule.severity,
        })
    }

    pub fn classify_all<S: AsRef<str>>(&self, paths: &[S]) -> Vec<PathClassification> {
        paths
            .iter()
            .map(|p| PathClassification {
                path: p.as_ref().to_string(),
                matched: self.classify(p.as_ref()),
            })
            .collect()
    }
}

/// Classify `paths` against the policy's protected paths without scoring.
pub fn check_files<S: AsRef<str>>(
    paths: &[S],
    policy: &Policy,
) -> RiskResult<Vec<PathClassification>> {
    Ok(ProtectedPathMatcher::from_policy(policy)?.classify_all(paths))
}
