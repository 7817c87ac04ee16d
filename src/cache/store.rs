use crate::cache::entry::CacheEntry;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

pub type Entries<C> = HashMap<String, CacheEntry<C>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cache storage is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("cache entry {key} is invalid: {reason}")]
    Invalid { key: String, reason: String },
}

/// The JSON document backing a command cache.
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CacheStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn ensure_parent(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        Ok(())
    }

    /// Read every entry. A missing file is created as `{}` and yields an
    /// empty map; any invalid entry rejects the whole document.
    pub fn load<C: DeserializeOwned>(&self) -> Result<Entries<C>, StoreError> {
        if !self.path.exists() {
            debug!("Creating empty cache file at {}", self.path.display());
            self.ensure_parent()?;
            fs::write(&self.path, "{}").map_err(|e| self.io_error(e))?;
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let entries: Entries<C> = serde_json::from_str(&content)?;

        for (key, entry) in &entries {
            entry.validate(key).map_err(|reason| StoreError::Invalid {
                key: key.clone(),
                reason,
            })?;
        }

        Ok(entries)
    }

    /// Write every entry, replacing the file atomically.
    pub fn save<C: Serialize>(&self, entries: &Entries<C>) -> Result<(), StoreError> {
        self.ensure_parent()?;
        let json = serde_json::to_string_pretty(entries)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut file = NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        file.write_all(json.as_bytes())
            .map_err(|e| self.io_error(e))?;
        file.persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;

        Ok(())
    }

    pub fn size_bytes(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_created_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("commands.json");
        let store = CacheStore::new(&path);

        let entries: Entries<String> = store.load().unwrap();
        assert!(entries.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("commands.json"));

        let mut entries = HashMap::new();
        let entry = CacheEntry::new(
            "key".to_string(),
            "list files",
            vec!["ls".to_string()],
            None,
            Utc::now(),
        );
        entries.insert("key".to_string(), entry.clone());
        store.save(&entries).unwrap();

        let loaded: Entries<String> = store.load().unwrap();
        assert_eq!(loaded.get("key"), Some(&entry));
        assert!(store.size_bytes() > 2);
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("commands.json");
        fs::write(&path, "{ not json").unwrap();

        let result: Result<Entries<String>, _> = CacheStore::new(&path).load();
        assert!(matches!(result, Err(StoreError::Malformed(_))));
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("commands.json");
        fs::write(&path, r#"{"abc": {"query": "list files"}}"#).unwrap();

        let result: Result<Entries<String>, _> = CacheStore::new(&path).load();
        assert!(matches!(result, Err(StoreError::Malformed(_))));
    }

    #[test]
    fn test_zero_access_count_is_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("commands.json");
        let now = Utc::now().to_rfc3339();
        let doc = format!(
            r#"{{"abc": {{"query_hash": "abc", "query": "ls", "commands": ["ls"],
                "os_type": null, "created_at": "{now}", "last_accessed": "{now}",
                "access_count": 0}}}}"#
        );
        fs::write(&path, doc).unwrap();

        let result: Result<Entries<String>, _> = CacheStore::new(&path).load();
        assert!(matches!(result, Err(StoreError::Invalid { .. })));
    }

    #[test]
    fn test_timestamps_without_offset_are_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("commands.json");
        let doc = r#"{"abc": {"query_hash": "abc", "query": "ls", "commands": ["ls"],
            "os_type": "macos", "created_at": "2024-05-01T12:00:00.123456",
            "last_accessed": "2024-05-01T12:00:00.123456", "access_count": 1}}"#;
        fs::write(&path, doc).unwrap();

        let result: Result<Entries<String>, _> = CacheStore::new(&path).load();
        assert!(matches!(result, Err(StoreError::Malformed(_))));
    }

    #[test]
    fn test_size_of_missing_file_is_zero() {
        let dir = tempdir().unwrap();
        assert_eq!(CacheStore::new(dir.path().join("absent.json")).size_bytes(), 0);
    }
}
