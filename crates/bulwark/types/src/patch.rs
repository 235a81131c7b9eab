//! Patch proposals.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::snapshot::Snapshot;

/// Unique identifier for a proposed patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchId(pub Uuid);

impl PatchId {
    /// Generate a new random patch ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PatchId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for PatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "patch:{}", self.0)
    }
}

/// Size of a diff.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffStats {
    pub files_changed: u32,
    pub insertions: u32,
    pub deletions: u32,
}

impl DiffStats {
    pub fn new(files_changed: u32, insertions: u32, deletions: u32) -> Self {
        Self {
            files_changed,
            insertions,
            deletions,
        }
    }

    /// Total lines touched.
    pub fn lines_changed(&self) -> u64 {
        u64::from(self.insertions) + u64::from(self.deletions)
    }
}

/// A proposed change set. Consumed once by the gate, never persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch {
    #[serde(default)]
    pub id: PatchId,
    /// Repository-relative paths touched by the patch.
    pub files: Vec<String>,
    #[serde(default)]
    pub diff_stats: DiffStats,
    /// The snapshot the tree would have after applying the patch.
    #[serde(default)]
    pub projected: Option<Snapshot>,
}

impl Patch {
    /// A patch touching `files`, with `files_changed` pre-filled.
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let files: Vec<String> = files.into_iter().map(Into::into).collect();
        let diff_stats = DiffStats {
            files_changed: files.len() as u32,
            ..DiffStats::default()
        };
        Self {
            id: PatchId::generate(),
            files,
            diff_stats,
            projected: None,
        }
    }

    pub fn with_lines(mut self, insertions: u32, deletions: u32) -> Self {
        self.diff_stats.insertions = insertions;
        self.diff_stats.deletions = deletions;
        self
    }

    pub fn with_projected(mut self, snapshot: Snapshot) -> Self {
        self.projected = Some(snapshot);
        self
    }
}
