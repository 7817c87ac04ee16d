// src/shell/setup.rs
use crate::config::{Config, Paths, SUPPORTED_OS};
use crate::terminal::Terminal;
use anyhow::Result;
use colored::*;
use log::info;

const LOG_LEVELS: [&str; 5] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

/// Interactive configuration. Each prompt shows the current value and an
/// empty answer keeps it.
pub fn setup(config: &mut Config, paths: &Paths) -> Result<()> {
    println!("{}", "SmartTerminal Setup".bright_cyan().bold());
    println!("{}", "===================".bright_cyan().bold());

    let mut terminal = Terminal::new()?;

    let masked = mask_key(&config.api_key);
    let api_key = terminal.prompt_with_default("API Key", &masked)?;
    if api_key != masked {
        config.api_key = api_key;
    }

    config.base_url = terminal.prompt_with_default("Base URL", &config.base_url)?;
    config.model_name = terminal.prompt_with_default("Model name", &config.model_name)?;

    let os = terminal
        .prompt_with_default("Default OS (macos, linux, windows)", &config.default_os)?
        .to_lowercase();
    match validate_os(&os) {
        Some(os) => config.default_os = os,
        None => println!(
            "{}",
            format!("Invalid OS '{}'. Keeping {}.", os, config.default_os).yellow()
        ),
    }

    let limit = terminal.prompt_with_default("History limit", &config.history_limit.to_string())?;
    match limit.parse::<usize>() {
        Ok(limit) => config.history_limit = limit,
        Err(_) => println!(
            "{}",
            format!("Invalid number '{}'. Keeping {}.", limit, config.history_limit).yellow()
        ),
    }

    let level = terminal
        .prompt_with_default("Log level (DEBUG, INFO, WARNING, ERROR, CRITICAL)", &config.log_level)?
        .to_uppercase();
    if LOG_LEVELS.contains(&level.as_str()) {
        config.log_level = level;
    } else {
        println!(
            "{}",
            format!("Invalid log level '{}'. Keeping {}.", level, config.log_level).yellow()
        );
    }

    let cache = if config.cache_enabled { "y" } else { "n" };
    let cache = terminal.prompt_with_default("Enable command cache (y/n)", cache)?;
    config.cache_enabled = matches!(cache.trim().to_lowercase().as_str(), "y" | "yes");

    config.save(&paths.config_file())?;
    info!("Configuration saved to {}", paths.config_file().display());
    println!("{}", "Configuration saved.".green());
    Ok(())
}

fn validate_os(os: &str) -> Option<String> {
    let os = os.trim().to_lowercase();
    if SUPPORTED_OS.contains(&os.as_str()) {
        Some(os)
    } else {
        None
    }
}

fn mask_key(key: &str) -> String {
    if key.is_empty() {
        String::new()
    } else if key.chars().count() <= 8 {
        "*".repeat(key.chars().count())
    } else {
        let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
        format!("****{}", tail)
    }
}
