//! Reading policy documents from YAML or JSON.

use std::fmt;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::document::PolicyDocument;
use crate::error::{PolicyError, PolicyResult};

/// Source format of a policy document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyFormat {
    Yaml,
    Json,
}

impl PolicyFormat {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> PolicyResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(PolicyError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for PolicyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yaml => write!(f, "yaml"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// A parsed but not yet validated policy.
///
/// The raw tree is kept next to the typed document: validation needs it to
/// detect absent sections and dotted-path lookups read from it.
#[derive(Clone, Debug)]
pub struct LoadedPolicy {
    pub document: PolicyDocument,
    pub raw: Value,
}

impl LoadedPolicy {
    /// Wrap an in-memory document; the raw tree is its serialization.
    pub fn from_document(document: PolicyDocument) -> PolicyResult<Self> {
        let raw = serde_json::to_value(&document).map_err(|e| PolicyError::Parse {
            format: "document".into(),
            reason: e.to_string(),
        })?;
        Ok(Self { document, raw })
    }
}

/// Parse policy text in the given format.
pub fn parse_str(text: &str, format: PolicyFormat) -> PolicyResult<LoadedPolicy> {
    let parse_err = |reason: String| PolicyError::Parse {
        format: format.to_string(),
        reason,
    };

    let raw: Value = match format {
        PolicyFormat::Yaml => serde_yaml::from_str(text).map_err(|e| parse_err(e.to_string()))?,
        PolicyFormat::Json => serde_json::from_str(text).map_err(|e| parse_err(e.to_string()))?,
    };
    if !raw.is_object() {
        return Err(parse_err("top level must be a mapping".into()));
    }
    let document: PolicyDocument =
        serde_json::from_value(raw.clone()).map_err(|e| parse_err(e.to_string()))?;

    Ok(LoadedPolicy { document, raw })
}

/// Read and parse a policy file, choosing the format by extension.
pub fn load_path(path: &Path) -> PolicyResult<LoadedPolicy> {
    let format = PolicyFormat::from_path(path)?;
    let text = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), %format, "loading policy document");
    parse_str(&text, format)
}
