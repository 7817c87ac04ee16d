use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One cached query and the commands generated for it.
///
/// Field names on disk follow the storage format: the fingerprint is stored
/// as `query_hash` and the OS tag as `os_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<C> {
    #[serde(rename = "query_hash")]
    pub fingerprint: String,
    pub query: String,
    pub commands: Vec<C>,
    #[serde(rename = "os_type", default)]
    pub os_tag: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub access_count: u64,
}

impl<C> CacheEntry<C> {
    pub fn new(
        fingerprint: String,
        query: &str,
        commands: Vec<C>,
        os_tag: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        CacheEntry {
            fingerprint,
            query: query.to_string(),
            commands,
            os_tag,
            created_at: now,
            last_accessed: now,
            access_count: 1,
        }
    }

    /// Record a cache hit.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        // Wall clocks can step backwards; never record an access before creation.
        self.last_accessed = now.max(self.created_at);
        self.access_count = self.access_count.saturating_add(1);
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// The OS tag, treating the legacy `"unknown"` marker as unset.
    pub fn os_tag(&self) -> Option<&str> {
        self.os_tag
            .as_deref()
            .filter(|tag| !tag.is_empty() && *tag != "unknown")
    }

    pub(crate) fn validate(&self, key: &str) -> Result<(), String> {
        if self.fingerprint != key {
            return Err(format!("stored under {} but hashed as {}", key, self.fingerprint));
        }
        if self.access_count == 0 {
            return Err("access_count is zero".to_string());
        }
        if self.last_accessed < self.created_at {
            return Err("last_accessed precedes created_at".to_string());
        }
        Ok(())
    }
}
