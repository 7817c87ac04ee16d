use crate::cache::CacheConfig;
use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const SUPPORTED_OS: [&str; 3] = ["macos", "linux", "windows"];

/// Where smart-terminal keeps its files, by default under `~/.smartterminal`.
#[derive(Debug, Clone)]
pub struct Paths {
    pub config_dir: PathBuf,
}

impl Paths {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Paths {
            config_dir: config_dir.into(),
        }
    }

    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(Paths::new(home.join(".smartterminal")))
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    pub fn history_file(&self) -> PathBuf {
        self.config_dir.join("history.json")
    }

    pub fn cache_file(&self) -> PathBuf {
        self.config_dir.join("cache").join("commands.json")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub model_name: String,
    pub default_os: String,
    pub history_limit: usize,
    pub log_level: String,
    pub cache_enabled: bool,
    pub cache_max_entries: usize,
    pub cache_max_age_days: i64,
    pub cache_min_similarity: f64,
    pub cache_fuzzy_matching: bool,
    pub cache_flush_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        let cache = CacheConfig::default();
        Config {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model_name: DEFAULT_MODEL.to_string(),
            default_os: "macos".to_string(),
            history_limit: 20,
            log_level: "WARNING".to_string(),
            cache_enabled: cache.enabled,
            cache_max_entries: cache.max_entries,
            cache_max_age_days: cache.max_age.num_days(),
            cache_min_similarity: cache.min_similarity,
            cache_fuzzy_matching: cache.fuzzy_matching,
            cache_flush_interval: cache.flush_interval,
        }
    }
}

impl Config {
    /// Read the config file. A missing or unreadable file falls back to the
    /// defaults; environment variables override whatever was read.
    pub fn load(path: &Path) -> Config {
        let mut config = match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Error loading config, using defaults: {}", e);
                Config::default()
            }),
            Err(e) => {
                if path.exists() {
                    warn!("Error reading config {}, using defaults: {}", path.display(), e);
                }
                Config::default()
            }
        };
        config.apply_env_overrides();
        config
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to save configuration to {}", path.display()))?;
        Ok(())
    }

    /// Create `path` with the default configuration if it does not exist.
    /// Environment overrides are never written to disk.
    pub fn init_file(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        Config::default().save(path)?;
        Ok(true)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = env::var("ST_API_KEY") {
            self.api_key = key;
        }
        if let Ok(url) = env::var("ST_BASE_URL") {
            self.base_url = url;
        }
        if let Ok(model) = env::var("ST_MODEL") {
            self.model_name = model;
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            enabled: self.cache_enabled,
            max_entries: self.cache_max_entries,
            max_age: chrono::Duration::days(self.cache_max_age_days),
            min_similarity: self.cache_min_similarity,
            fuzzy_matching: self.cache_fuzzy_matching,
            flush_interval: self.cache_flush_interval,
        }
    }

    /// `log` level filter matching `log_level`. Unknown names give info.
    pub fn log_filter(&self) -> log::LevelFilter {
        match self.log_level.to_ascii_uppercase().as_str() {
            "DEBUG" => log::LevelFilter::Debug,
            "WARNING" | "WARN" => log::LevelFilter::Warn,
            "ERROR" | "CRITICAL" => log::LevelFilter::Error,
            "TRACE" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        }
    }
}
