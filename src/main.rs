mod cache;
mod config;
mod llm;
mod shell;
mod terminal;

use crate::config::{Config, Paths};
use crate::shell::{cache_info, SmartTerminal};
use crate::terminal::History;
use anyhow::Result;
use clap::Parser;
use colored::*;
use log::{debug, info};

/// SmartTerminal: turn natural language into terminal commands.
#[derive(Parser, Debug)]
#[command(name = "st", version, about)]
struct Args {
    /// Natural language request to turn into commands
    command: Vec<String>,

    /// Configure API key, model and defaults
    #[arg(long)]
    setup: bool,

    /// Clear the conversation history
    #[arg(long)]
    clear_history: bool,

    /// Start interactive mode
    #[arg(short, long)]
    interactive: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Show command cache statistics
    #[arg(long)]
    cache_info: bool,

    /// Print --cache-info output as JSON
    #[arg(long)]
    json: bool,

    /// Remove all cached commands
    #[arg(long)]
    clear_cache: bool,

    /// Ask the model even if a cached answer exists
    #[arg(long)]
    no_cache: bool,
}

fn init_logging(args: &Args, config: &Config) {
    let level = if args.debug {
        log::LevelFilter::Debug
    } else {
        config.log_filter()
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_env(env_logger::Env::default())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let paths = Paths::default_location()?;
    let mut config = Config::load(&paths.config_file());
    init_logging(&args, &config);
    debug!("Arguments: {:?}", args);

    if Config::init_file(&paths.config_file())? {
        info!("Created default configuration at {}", paths.config_file().display());
    }

    if args.cache_info {
        return cache_info::show(&config, &paths, args.json);
    }

    if args.setup {
        return shell::setup(&mut config, &paths);
    }

    if args.clear_history {
        History::new(paths.history_file(), config.history_limit).clear()?;
        println!("{}", "History cleared.".green());
        return Ok(());
    }

    if args.clear_cache {
        cache_info::clear(&config, &paths);
        if args.command.is_empty() && !args.interactive {
            return Ok(());
        }
    }

    if !config.has_api_key() {
        println!(
            "{}",
            "API key not set. Please run 'st --setup' to configure.".yellow()
        );
        return Ok(());
    }

    let mut terminal = SmartTerminal::new(&config, &paths)?;

    if args.interactive {
        terminal.run_interactive(args.no_cache).await?;
    } else if !args.command.is_empty() {
        terminal.run_command(&args.command.join(" "), args.no_cache).await?;
    } else {
        use clap::CommandFactory;
        Args::command().print_help()?;
        println!();
    }

    Ok(())
}
