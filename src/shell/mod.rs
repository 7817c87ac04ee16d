pub mod cache_info;
mod executor;
mod placeholders;
mod setup;

pub use self::setup::setup;

use crate::cache::CommandCache;
use crate::config::{Config, Paths};
use crate::llm::context_manager::ContextManager;
use crate::llm::{APIClient, ChatMessage, CommandGenerator, GeneratedCommand};
use crate::terminal::{History, Terminal};
use anyhow::Result;
use colored::*;
use log::{debug, error};

use self::executor::CommandExecutor;
use self::placeholders::fill_placeholders;

pub struct SmartTerminal {
    terminal: Terminal,
    generator: CommandGenerator<APIClient>,
    context_manager: ContextManager,
    history: History,
}

impl SmartTerminal {
    pub fn new(config: &Config, paths: &Paths) -> Result<Self> {
        debug!("Initializing SmartTerminal");
        let cache = CommandCache::open(config.cache_config(), paths.cache_file());

        Ok(SmartTerminal {
            terminal: Terminal::new()?,
            generator: CommandGenerator::new(APIClient::new(config), cache),
            context_manager: ContextManager::new(&config.default_os),
            history: History::new(paths.history_file(), config.history_limit),
        })
    }

    /// Generate commands for one request, then confirm, fill in and run each.
    pub async fn process_input(&mut self, query: &str, bypass_cache: bool) -> Result<()> {
        println!("{}", format!("Processing: {}", query).bright_blue());

        if let Ok(dir) = std::env::current_dir() {
            self.context_manager.update_directory(&dir.to_string_lossy());
        }
        let context = self.context_manager.get_context();

        let generation = match self
            .generator
            .generate(query, &context, self.history.get_entries(), bypass_cache)
            .await
        {
            Ok(generation) => generation,
            Err(e) => {
                error!("AI error during command processing: {:#}", e);
                eprintln!("{} {:#}", "Error:".red().bold(), e);
                return Ok(());
            }
        };

        if generation.commands.is_empty() {
            println!("{}", "Sorry, I couldn't determine the commands needed.".yellow());
            return Ok(());
        }
        if generation.from_cache {
            println!("{}", "Using cached commands.".bright_blue());
        }

        for (i, command) in generation.commands.iter().enumerate() {
            self.run_generated(i + 1, command)?;
        }

        self.record_history(query, &generation.commands);
        Ok(())
    }

    fn run_generated(&mut self, number: usize, command: &GeneratedCommand) -> Result<()> {
        println!(
            "\n{} {}",
            format!("Command {}:", number).bright_cyan().bold(),
            command.command.bright_green()
        );
        if !command.description.is_empty() {
            println!("{} {}", "Description:".bright_cyan().bold(), command.description);
        }

        if !self.terminal.confirm("Execute this command? (y/n):")? {
            println!("{}", "Command skipped.".bright_blue());
            return Ok(());
        }

        let terminal = &mut self.terminal;
        let final_command = fill_placeholders(&command.command, &command.user_inputs, |name| {
            terminal.prompt_value(name)
        })?;
        println!("{} {}", "Executing:".bright_blue(), final_command.bright_green());

        match CommandExecutor::execute(&final_command, command.needs_admin()) {
            Ok(outcome) if outcome.success => {
                println!("{}", "Command executed successfully:".green());
                print!("{}", outcome.output);
            }
            Ok(outcome) => {
                println!("{}", "Command failed:".red());
                print!("{}", outcome.output);
            }
            Err(e) => eprintln!("{} {:#}", "Error:".red().bold(), e),
        }

        self.context_manager.add_command(&final_command);
        Ok(())
    }

    fn record_history(&mut self, query: &str, commands: &[GeneratedCommand]) {
        let mut summary = String::from("I executed the following commands:\n");
        for command in commands {
            summary.push_str(&format!("- {}\n", command.command));
        }

        self.history.add(ChatMessage::user(query));
        self.history.add(ChatMessage::assistant(&summary));
        if let Err(e) = self.history.save() {
            error!("Failed to save history: {:#}", e);
        }
    }

    pub async fn run_command(&mut self, command: &str, bypass_cache: bool) -> Result<()> {
        self.process_input(command, bypass_cache).await
    }

    pub async fn run_interactive(&mut self, bypass_cache: bool) -> Result<()> {
        println!("{}", "SmartTerminal Interactive Mode".bright_cyan().bold());
        println!("{}", "Type 'exit' or 'quit' to exit".bright_blue());
        println!("{}", "==============================".bright_cyan().bold());

        loop {
            let prompt = format!("\n{} ", "st>".bright_green());
            let input = match self.terminal.read_line(&prompt)? {
                Some(input) => input,
                None => break,
            };

            if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
                break;
            }
            if input.is_empty() {
                continue;
            }

            if let Err(e) = self.process_input(&input, bypass_cache).await {
                error!("Error in interactive mode: {:#}", e);
                eprintln!("{} {:#}", "An error occurred:".red(), e);
            }
        }

        self.generator.cache_mut().flush();
        Ok(())
    }
}
