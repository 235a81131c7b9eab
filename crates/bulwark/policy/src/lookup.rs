//! Dotted-path lookup over the raw policy tree.
//!
//! `risk.budget.max` walks object keys; a numeric segment indexes into an
//! array (`protectedPaths.0.glob`).

use serde_json::Value;

/// Resolve `path` against `root`. An empty path returns the root.
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.trim();
    if path.is_empty() {
        return Some(root);
    }
    path.split('.').try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}
