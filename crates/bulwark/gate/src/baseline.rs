//! Named baselines.
//!
//! Each baseline is an immutable `Arc<Snapshot>`. Promotion swaps the `Arc`
//! under a write lock; readers holding the old one keep a consistent view.
//! When the registry is backed by a directory, each baseline lives in
//! `<dir>/<name>.json` and is written atomically before the swap.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use bulwark_policy::Policy;
use bulwark_types::{actions, Actor, Snapshot};
use tracing::{debug, info, warn};

use crate::error::{GateError, GateResult};

const EXTENSION: &str = "json";

#[derive(Debug, Default)]
pub struct BaselineRegistry {
    baselines: RwLock<BTreeMap<String, Arc<Snapshot>>>,
    dir: Option<PathBuf>,
}

impl BaselineRegistry {
    /// Empty, memory-only registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a baseline at construction time.
    pub fn with_baseline(mut self, name: &str, snapshot: Snapshot) -> Self {
        if let Ok(map) = self.baselines.get_mut() {
            map.insert(name.to_string(), Arc::new(snapshot));
        }
        self
    }

    /// Load every `<name>.json` in `dir`. A missing directory is empty.
    pub fn open(dir: impl Into<PathBuf>) -> GateResult<Self> {
        let dir = dir.into();
        let mut map = BTreeMap::new();
        if dir.exists() {
            for entry in std::fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                    continue;
                }
                let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let snapshot = read_baseline(name, &path)?;
                map.insert(name.to_string(), Arc::new(snapshot));
            }
        }
        info!(dir = %dir.display(), count = map.len(), "baselines loaded");
        Ok(Self {
            baselines: RwLock::new(map),
            dir: Some(dir),
        })
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn get(&self, name: &str) -> GateResult<Arc<Snapshot>> {
        let map = self.baselines.read().map_err(|_| GateError::LockPoisoned)?;
        map.get(name)
            .cloned()
            .ok_or_else(|| GateError::BaselineNotFound(name.to_string()))
    }

    pub fn names(&self) -> GateResult<Vec<String>> {
        let map = self.baselines.read().map_err(|_| GateError::LockPoisoned)?;
        Ok(map.keys().cloned().collect())
    }

    /// Replace (or create) `name` with `snapshot`. Requires `update_baseline`.
    pub fn promote(
        &self,
        name: &str,
        snapshot: Snapshot,
        actor: &Actor,
        policy: &Policy,
    ) -> GateResult<Arc<Snapshot>> {
        if !policy.actor_can(actor, actions::UPDATE_BASELINE) {
            warn!(%actor, baseline = name, "baseline promotion denied");
            return Err(GateError::NotAuthorized {
                actor: actor.to_string(),
                action: actions::UPDATE_BASELINE.to_string(),
            });
        }
        validate_name(name)?;

        let mut map = self.baselines.write().map_err(|_| GateError::LockPoisoned)?;
        if let Some(dir) = &self.dir {
            write_baseline(dir, name, &snapshot)?;
        }
        let snapshot = Arc::new(snapshot);
        let previous = map.insert(name.to_string(), Arc::clone(&snapshot));
        info!(
            %actor,
            baseline = name,
            replaced = previous.is_some(),
            events = snapshot.events.len(),
            states = snapshot.states.len(),
            migrations = snapshot.migrations.len(),
            "baseline promoted"
        );
        Ok(snapshot)
    }
}

fn validate_name(name: &str) -> GateResult<()> {
    let ok = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.starts_with('.');
    if ok {
        Ok(())
    } else {
        Err(GateError::InvalidBaselineName(name.to_string()))
    }
}

fn read_baseline(name: &str, path: &Path) -> GateResult<Snapshot> {
    let text = std::fs::read_to_string(path)?;
    let parsed = Snapshot::from_json_str(&text).map_err(|e| GateError::Snapshot {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    for w in &parsed.warnings {
        warn!(baseline = name, kind = %w.kind, message = %w.message, "baseline section ignored");
    }
    debug!(baseline = name, path = %path.display(), "baseline read");
    Ok(parsed.snapshot)
}

fn write_baseline(dir: &Path, name: &str, snapshot: &Snapshot) -> GateResult<()> {
    std::fs::create_dir_all(dir)?;
    let json = serde_json::to_string_pretty(snapshot).map_err(|e| GateError::Snapshot {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    let path = dir.join(format!("{name}.{EXTENSION}"));
    let tmp = dir.join(format!(".{name}.{EXTENSION}.tmp"));
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, &path)?;
    Ok(())
}
