//! Persistent cache of generated commands.
//!
//! Sits in front of the model: queries are looked up by fingerprint first,
//! then by similarity against stored queries. Entries expire after
//! `max_age`, and when the store outgrows `max_entries` the least used,
//! least recently used entries go first.
//!
//! Durability: the store is written on every `flush_interval`-th insertion,
//! on `clear`, on `flush` and when the cache is dropped. A crash can lose at
//! most `flush_interval - 1` insertions plus unflushed access metadata.

mod entry;
mod fingerprint;
mod similarity;
mod store;

pub use self::entry::CacheEntry;
pub use self::fingerprint::{fingerprint, QueryContext};
pub use self::similarity::similarity;
pub use self::store::CacheStore;

use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Anything the generator hands the cache. The cache only stores and clones it.
pub trait CommandRecord: Serialize + DeserializeOwned + Clone {}

impl<T: Serialize + DeserializeOwned + Clone> CommandRecord for T {}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
    pub max_age: Duration,
    pub min_similarity: f64,
    pub fuzzy_matching: bool,
    /// Persist (and clean up) after this many insertions. Zero disables the
    /// periodic write; the store is then only written on flush, clear and drop.
    pub flush_interval: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            enabled: true,
            max_entries: 1000,
            max_age: Duration::days(30),
            min_similarity: 0.85,
            fuzzy_matching: true,
            flush_interval: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub expired: usize,
    pub evicted: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatistics {
    pub enabled: bool,
    pub entry_count: usize,
    pub max_entries: usize,
    pub max_age_days: i64,
    pub size_bytes: u64,
    /// Fraction of stored entries that were hit at least once. Structural,
    /// not a per-request hit ratio.
    pub hit_rate: f64,
}

pub struct CommandCache<C: CommandRecord> {
    config: CacheConfig,
    store: CacheStore,
    entries: HashMap<String, CacheEntry<C>>,
    insertions: u64,
    dirty: bool,
}

impl<C: CommandRecord> CommandCache<C> {
    /// Open the cache backed by `path`. Storage problems are logged and
    /// leave the cache empty but usable.
    pub fn open(config: CacheConfig, path: impl Into<PathBuf>) -> Self {
        Self::load(config, path.into(), true)
    }

    /// Open the cache for inspection only. Expired and surplus entries are
    /// kept and nothing is written back.
    pub fn inspect(config: CacheConfig, path: impl Into<PathBuf>) -> Self {
        Self::load(config, path.into(), false)
    }

    fn load(config: CacheConfig, path: PathBuf, tidy: bool) -> Self {
        let mut cache = CommandCache {
            config,
            store: CacheStore::new(path),
            entries: HashMap::new(),
            insertions: 0,
            dirty: false,
        };

        if !cache.config.enabled {
            return cache;
        }

        match cache.store.load() {
            Ok(entries) => {
                cache.entries = entries;
                debug!("Loaded {} entries from cache", cache.entries.len());
                if tidy && !cache.entries.is_empty() {
                    cache.cleanup();
                }
            }
            Err(e) => {
                error!("Error loading cache: {}", e);
                cache.entries.clear();
            }
        }

        cache
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store generated commands for a query. Empty results are never cached.
    pub fn put(&mut self, query: &str, commands: &[C], context: Option<&QueryContext>) {
        if !self.config.enabled || commands.is_empty() {
            return;
        }

        let key = fingerprint(query, context);
        let os_tag = context.and_then(QueryContext::os).map(str::to_string);
        let entry = CacheEntry::new(key.clone(), query, commands.to_vec(), os_tag, Utc::now());

        self.entries.insert(key.clone(), entry);
        self.dirty = true;
        self.insertions += 1;
        debug!("Added entry to cache with hash {}", key);

        if self.config.flush_interval > 0 && self.insertions % self.config.flush_interval == 0 {
            self.cleanup();
        }
    }

    /// Look up commands for a query, exactly first and then by similarity.
    pub fn get(&mut self, query: &str, context: Option<&QueryContext>) -> Option<Vec<C>> {
        if !self.config.enabled || self.entries.is_empty() {
            return None;
        }

        let now = Utc::now();
        let key = fingerprint(query, context);

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.touch(now);
            self.dirty = true;
            debug!("Cache hit for hash {}", key);
            return Some(entry.commands.clone());
        }

        if !self.config.fuzzy_matching {
            debug!("Cache miss");
            return None;
        }

        match self.best_fuzzy_match(query, context) {
            Some((key, score)) => {
                let entry = self.entries.get_mut(&key)?;
                entry.touch(now);
                self.dirty = true;
                debug!("Fuzzy cache hit with score {:.3} for hash {}", score, key);
                Some(entry.commands.clone())
            }
            None => {
                debug!("Cache miss");
                None
            }
        }
    }

    fn best_fuzzy_match(&self, query: &str, context: Option<&QueryContext>) -> Option<(String, f64)> {
        let probe_os = context.and_then(QueryContext::os);

        let mut candidates: Vec<&CacheEntry<C>> = self.entries.values().collect();
        candidates.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.fingerprint.cmp(&b.fingerprint))
        });

        let mut best: Option<(&str, f64)> = None;
        for entry in candidates {
            if let (Some(tag), Some(os)) = (entry.os_tag(), probe_os) {
                if tag != os {
                    continue;
                }
            }

            let score = similarity(query, &entry.query);
            if score < self.config.min_similarity {
                continue;
            }
            // Strictly greater: on equal scores the older entry stays.
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((entry.fingerprint.as_str(), score));
            }
        }

        best.map(|(key, score)| (key.to_string(), score))
    }

    /// Drop expired entries, then trim to `max_entries`, then persist.
    pub fn cleanup(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();
        if !self.config.enabled {
            return report;
        }

        let now = Utc::now();
        let max_age = self.config.max_age;
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.age(now) <= max_age);
        report.expired = before - self.entries.len();
        if report.expired > 0 {
            debug!("Removed {} old entries from cache", report.expired);
        }

        if self.entries.len() > self.config.max_entries {
            let surplus = self.entries.len() - self.config.max_entries;

            let mut ranked: Vec<(u64, DateTime<Utc>, String)> = self
                .entries
                .values()
                .map(|e| (e.access_count, e.last_accessed, e.fingerprint.clone()))
                .collect();
            ranked.sort();

            for (_, _, key) in ranked.into_iter().take(surplus) {
                self.entries.remove(&key);
            }
            report.evicted = surplus;
            debug!("Removed {} least used entries from cache", surplus);
        }

        self.persist();
        report
    }

    /// Remove every entry and persist the empty store.
    pub fn clear(&mut self) -> bool {
        self.entries.clear();
        if !self.config.enabled {
            return true;
        }

        self.dirty = true;
        let saved = self.persist();
        if saved {
            info!("Cache cleared");
        }
        saved
    }

    /// Write pending changes to storage.
    pub fn flush(&mut self) -> bool {
        if !self.config.enabled || !self.dirty {
            return true;
        }
        self.persist()
    }

    fn persist(&mut self) -> bool {
        match self.store.save(&self.entries) {
            Ok(()) => {
                self.dirty = false;
                debug!("Saved {} entries to cache", self.entries.len());
                true
            }
            Err(e) => {
                error!("Error saving cache: {}", e);
                false
            }
        }
    }

    pub fn statistics(&self) -> CacheStatistics {
        let hits = self.entries.values().filter(|e| e.access_count > 1).count();
        let hit_rate = if self.entries.is_empty() {
            0.0
        } else {
            hits as f64 / self.entries.len() as f64
        };

        CacheStatistics {
            enabled: self.config.enabled,
            entry_count: self.entries.len(),
            max_entries: self.config.max_entries,
            max_age_days: self.config.max_age.num_days(),
            size_bytes: self.store.size_bytes(),
            hit_rate,
        }
    }
}

impl<C: CommandRecord> Drop for CommandCache<C> {
    fn drop(&mut self) {
        // Save pending entries and access counts when the cache goes away
        self.flush();
    }
}
