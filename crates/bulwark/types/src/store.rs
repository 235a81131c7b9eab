//! Versioned records with compare-and-swap writes.
//!
//! Shared mutable records (suspend state, risk ledger) are read with their
//! version and written back only if nobody else committed in between. A
//! caller that loses the race gets [`CasOutcome::Conflict`], re-reads and
//! retries.
//!
//! Two backends are provided:
//! - [`InMemoryStore`] for tests and embedded use.
//! - [`JsonFileStore`], a single JSON document written atomically
//!   (`.tmp` then rename). A missing file reads as version 0 with the
//!   default value.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// A value together with the version it was read at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

impl<T> Versioned<T> {
    pub fn new(version: u64, value: T) -> Self {
        Self { version, value }
    }
}

/// Result of a compare-and-swap attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CasOutcome {
    /// The write landed; the record is now at `version`.
    Committed { version: u64 },
    /// Someone else committed first; the record is at `current`.
    Conflict { current: u64 },
}

impl CasOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// Read + compare-and-swap persistence for a single record.
pub trait VersionedStore<T>: Send + Sync {
    /// Read the current value and its version.
    fn read(&self) -> StoreResult<Versioned<T>>;

    /// Write `value` only if the record is still at `expected_version`.
    fn compare_and_swap(&self, expected_version: u64, value: T) -> StoreResult<CasOutcome>;
}

// ── In-memory ───────────────────────────────────────────────────────────

/// Mutex-guarded in-process store.
#[derive(Debug)]
pub struct InMemoryStore<T> {
    data: Mutex<Versioned<T>>,
}

impl<T> InMemoryStore<T> {
    /// A store holding `initial` at version 0.
    pub fn new(initial: T) -> Self {
        Self {
            data: Mutex::new(Versioned::new(0, initial)),
        }
    }
}

impl<T: Default> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send> VersionedStore<T> for InMemoryStore<T> {
    fn read(&self) -> StoreResult<Versioned<T>> {
        let data = self.data.lock().map_err(|_| StoreError::LockError)?;
        Ok(data.clone())
    }

    fn compare_and_swap(&self, expected_version: u64, value: T) -> StoreResult<CasOutcome> {
        let mut data = self.data.lock().map_err(|_| StoreError::LockError)?;
        if data.version != expected_version {
            return Ok(CasOutcome::Conflict {
                current: data.version,
            });
        }
        data.version += 1;
        data.value = value;
        Ok(CasOutcome::Committed {
            version: data.version,
        })
    }
}

// ── JSON file ───────────────────────────────────────────────────────────

/// Single-document JSON store.
///
/// The version check and the write happen under one in-process lock, so
/// concurrent writers sharing a `JsonFileStore` are serialized. Separate
/// processes writing the same path are not coordinated.
pub struct JsonFileStore<T> {
    path: PathBuf,
    guard: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    fn load(&self) -> StoreResult<Versioned<T>> {
        if !self.path.exists() {
            return Ok(Versioned::new(0, T::default()));
        }
        let contents = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn write(&self, record: &Versioned<T>) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl<T> VersionedStore<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Default + Send,
{
    fn read(&self) -> StoreResult<Versioned<T>> {
        let _guard = self.guard.lock().map_err(|_| StoreError::LockError)?;
        self.load()
    }

    fn compare_and_swap(&self, expected_version: u64, value: T) -> StoreResult<CasOutcome> {
        let _guard = self.guard.lock().map_err(|_| StoreError::LockError)?;
        let current = self.load()?;
        if current.version != expected_version {
            return Ok(CasOutcome::Conflict {
                current: current.version,
            });
        }
        let next = Versioned::new(current.version + 1, value);
        self.write(&next)?;
        Ok(CasOutcome::Committed {
            version: next.version,
        })
    }
}

impl<T> std::fmt::Debug for JsonFileStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("path", &self.path)
            .finish()
    }
}
