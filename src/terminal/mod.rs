mod history;

pub use self::history::History;

use anyhow::Result;
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor, EditMode};

pub struct Terminal {
    editor: DefaultEditor,
}

impl Terminal {
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .edit_mode(EditMode::Emacs)
            .auto_add_history(false)
            .build();

        let editor = DefaultEditor::with_config(config)?;
        Ok(Terminal { editor })
    }

    /// Read one line. Ctrl-C yields an empty line, Ctrl-D yields `None`.
    pub fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                let line = line.trim().to_string();
                if !line.is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(anyhow::anyhow!("Error reading input: {}", err)),
        }
    }

    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self
            .read_line(&format!("{} ", question.yellow()))?
            .unwrap_or_default();
        Ok(is_yes(&answer))
    }

    pub fn prompt_value(&mut self, name: &str) -> Result<String> {
        let value = self
            .read_line(&format!("Enter value for {}: ", name.bright_cyan().bold()))?
            .unwrap_or_default();
        Ok(value)
    }

    /// Prompt showing the current value; an empty answer keeps it.
    pub fn prompt_with_default(&mut self, label: &str, current: &str) -> Result<String> {
        let value = self
            .read_line(&format!("{} [{}]: ", label, current))?
            .unwrap_or_default();
        if value.is_empty() {
            Ok(current.to_string())
        } else {
            Ok(value)
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
