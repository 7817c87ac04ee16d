use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Context a query was issued in.
///
/// Only `default_os` and `current_dir` influence which commands the model
/// generates, so only those two take part in the fingerprint. Recent commands
/// are carried for the model's benefit and would otherwise fragment the cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
    pub default_os: Option<String>,
    pub current_dir: Option<String>,
    #[serde(default)]
    pub recent_commands: Vec<String>,
}

impl QueryContext {
    pub fn os(&self) -> Option<&str> {
        self.default_os.as_deref().filter(|os| !os.is_empty())
    }
}

/// Trim, collapse whitespace runs and lower-case a query.
pub fn normalize(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn relevant_subset(context: Option<&QueryContext>) -> BTreeMap<&'static str, &str> {
    let mut subset = BTreeMap::new();
    if let Some(context) = context {
        if let Some(os) = context.default_os.as_deref() {
            subset.insert("default_os", os);
        }
        if let Some(dir) = context.current_dir.as_deref() {
            subset.insert("current_dir", dir);
        }
    }
    subset
}

/// Hex SHA-256 of the normalized query and the relevant context subset.
pub fn fingerprint(query: &str, context: Option<&QueryContext>) -> String {
    // BTreeMap serializes with sorted keys, which keeps the JSON canonical.
    let canonical = serde_json::to_string(&relevant_subset(context)).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(normalize(query).as_bytes());
    hasher.update(b"|");
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}
