//! The active policy and the store that swaps it.
//!
//! ```text
//!   load / reload ──▶ parse ──▶ validate ──┬─ ok ──▶ swap Arc<Policy>
//!                                          └─ err ─▶ keep previous
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use bulwark_types::{Action, Actor, Role};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::document::PolicyDocument;
use crate::error::{PolicyError, PolicyResult};
use crate::loader::{load_path, parse_str, LoadedPolicy, PolicyFormat};
use crate::lookup::get_path;
use crate::resolver::RoleResolver;
use crate::validate::validate;

/// A policy document that passed validation.
#[derive(Clone, Debug)]
pub struct Policy {
    document: PolicyDocument,
    raw: Value,
}

impl Policy {
    /// Validate a loaded document, refusing it on any schema error.
    pub fn try_from_loaded(loaded: LoadedPolicy) -> PolicyResult<Self> {
        let errors = validate(&loaded);
        if !errors.is_empty() {
            return Err(PolicyError::ValidationFailed(errors));
        }
        Ok(Self {
            document: loaded.document,
            raw: loaded.raw,
        })
    }

    /// Validate an in-memory document.
    pub fn from_document(document: PolicyDocument) -> PolicyResult<Self> {
        Self::try_from_loaded(LoadedPolicy::from_document(document)?)
    }

    pub fn from_str_as(text: &str, format: PolicyFormat) -> PolicyResult<Self> {
        Self::try_from_loaded(parse_str(text, format)?)
    }

    pub fn from_path(path: &Path) -> PolicyResult<Self> {
        Self::try_from_loaded(load_path(path)?)
    }

    pub fn document(&self) -> &PolicyDocument {
        &self.document
    }

    /// Dotted-path lookup over the document as written.
    pub fn get(&self, path: &str) -> PolicyResult<&Value> {
        get_path(&self.raw, path).ok_or_else(|| PolicyError::NotFound(path.to_string()))
    }

    /// Whether `actor` is granted `action`. Unknown actors get nothing.
    pub fn actor_can(&self, actor: &Actor, action: &str) -> bool {
        let allowed = self
            .document
            .actor_permissions
            .get(actor)
            .map(|granted| granted.contains(&Action::new(action)))
            .unwrap_or(false);
        if !allowed {
            debug!(%actor, action, "action not granted");
        }
        allowed
    }
}

impl RoleResolver for Policy {
    fn roles_of(&self, actor: &Actor) -> BTreeSet<Role> {
        self.document
            .actor_roles
            .get(actor)
            .cloned()
            .unwrap_or_default()
    }
}

// ── Store ───────────────────────────────────────────────────────────────

/// Holds the active policy. Readers get an `Arc` snapshot; activation swaps
/// it atomically and only for documents that validate.
#[derive(Debug)]
pub struct PolicyStore {
    source: Option<PathBuf>,
    active: RwLock<Arc<Policy>>,
}

impl PolicyStore {
    /// A store seeded with an already-validated policy.
    pub fn new(policy: Policy) -> Self {
        Self {
            source: None,
            active: RwLock::new(Arc::new(policy)),
        }
    }

    /// Load, validate and activate the policy file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> PolicyResult<Self> {
        let path = path.into();
        let policy = Policy::from_path(&path)?;
        info!(path = %path.display(), "policy activated");
        Ok(Self {
            source: Some(path),
            active: RwLock::new(Arc::new(policy)),
        })
    }

    /// The active policy.
    pub fn current(&self) -> Arc<Policy> {
        match self.active.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Re-read the source file. On any failure the previous policy stays.
    pub fn reload(&self) -> PolicyResult<Arc<Policy>> {
        let path = self.source.as_ref().ok_or(PolicyError::NoSource)?;
        self.activate_with(|| Policy::from_path(path))
    }

    /// Activate a policy given as text. On any failure the previous
    /// policy stays.
    pub fn replace_from_str(&self, text: &str, format: PolicyFormat) -> PolicyResult<Arc<Policy>> {
        self.activate_with(|| Policy::from_str_as(text, format))
    }

    /// Activate an in-memory document. On any failure the previous policy
    /// stays.
    pub fn replace(&self, document: PolicyDocument) -> PolicyResult<Arc<Policy>> {
        self.activate_with(|| Policy::from_document(document))
    }

    fn activate_with(
        &self,
        build: impl FnOnce() -> PolicyResult<Policy>,
    ) -> PolicyResult<Arc<Policy>> {
        match build() {
            Ok(policy) => {
                let policy = Arc::new(policy);
                let mut guard = match self.active.write() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                *guard = Arc::clone(&policy);
                info!("policy activated");
                Ok(policy)
            }
            Err(e) => {
                warn!(error = %e, "policy rejected; previous policy remains active");
                Err(e)
            }
        }
    }
}
