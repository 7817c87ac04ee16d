// src/shell/cache_info.rs
use crate::cache::{CacheStatistics, CommandCache};
use crate::config::{Config, Paths};
use crate::llm::GeneratedCommand;
use anyhow::Result;
use colored::*;
use std::path::Path;

/// Print cache statistics, as JSON when `json` is set.
pub fn show(config: &Config, paths: &Paths, json: bool) -> Result<()> {
    let cache: CommandCache<GeneratedCommand> =
        CommandCache::inspect(config.cache_config(), paths.cache_file());
    let stats = cache.statistics();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    print!("{}", render(&stats, cache.path()));
    Ok(())
}

/// Clear the cache; returns whether the empty store was written.
pub fn clear(config: &Config, paths: &Paths) -> bool {
    let mut cache: CommandCache<GeneratedCommand> =
        CommandCache::open(config.cache_config(), paths.cache_file());
    let cleared = cache.clear();
    if cleared {
        println!("{}", "Command cache cleared.".green());
    } else {
        eprintln!("{}", "Failed to clear the command cache.".red());
    }
    cleared
}

fn render(stats: &CacheStatistics, location: &Path) -> String {
    let status = if stats.enabled {
        "enabled".green()
    } else {
        "disabled".yellow()
    };

    let mut out = String::new();
    out.push_str(&format!("{}\n", "Command Cache".bright_cyan().bold()));
    out.push_str(&format!("{}\n", "=============".bright_cyan().bold()));
    out.push_str(&format!("Status:      {}\n", status));
    out.push_str(&format!("Entries:     {} / {}\n", stats.entry_count, stats.max_entries));
    out.push_str(&format!("Max age:     {} days\n", stats.max_age_days));
    out.push_str(&format!("Size:        {}\n", human_size(stats.size_bytes)));
    out.push_str(&format!("Hit rate:    {:.1}%\n", stats.hit_rate * 100.0));
    out.push_str(&format!("Location:    {}\n", location.display()));
    out.push('\n');
    out.push_str("Clear with `st --clear-cache`, bypass with `st --no-cache <request>`.\n");
    out
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
