use crate::llm::ChatMessage;
use anyhow::{Context, Result};
use log::warn;
use std::fs;
use std::path::PathBuf;

/// Conversation history sent along with each request, kept in a JSON file.
pub struct History {
    history_file: PathBuf,
    max_history_size: usize,
    entries: Vec<ChatMessage>,
}

impl History {
    pub fn new(history_file: PathBuf, max_history_size: usize) -> Self {
        let mut history = History {
            history_file,
            max_history_size,
            entries: Vec::new(),
        };
        history.load();
        history
    }

    /// Read the file; anything unreadable leaves the history empty.
    pub fn load(&mut self) {
        self.entries.clear();
        if !self.history_file.exists() {
            return;
        }

        match self.read_entries() {
            Ok(entries) => {
                self.entries = entries;
                self.trim();
            }
            Err(e) => warn!("Error loading history from {}: {}", self.history_file.display(), e),
        }
    }

    fn read_entries(&self) -> Result<Vec<ChatMessage>> {
        let content = fs::read_to_string(&self.history_file)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.history_file.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.history_file, json)
            .with_context(|| format!("Failed to save history to {}", self.history_file.display()))?;
        Ok(())
    }

    pub fn add(&mut self, message: ChatMessage) {
        self.entries.push(message);
        self.trim();
    }

    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.save()
    }

    fn trim(&mut self) {
        if self.entries.len() > self.max_history_size {
            let excess = self.entries.len() - self.max_history_size;
            self.entries.drain(..excess);
        }
    }

    pub fn get_entries(&self) -> &[ChatMessage] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_history_is_trimmed_to_limit() {
        let dir = tempdir().unwrap();
        let mut history = History::new(dir.path().join("history.json"), 3);
        for i in 0..5 {
            history.add(ChatMessage::user(&format!("request {}", i)));
        }

        let entries = history.get_entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].content.as_deref(), Some("request 2"));
    }

    #[test]
    fn test_history_round_trips_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        let mut history = History::new(path.clone(), 20);
        history.add(ChatMessage::user("list all files"));
        history.add(ChatMessage::assistant("I executed the following commands:\n- ls -la\n"));
        history.save().unwrap();

        let reloaded = History::new(path, 20);
        assert_eq!(reloaded.get_entries(), history.get_entries());
    }

    #[test]
    fn test_corrupt_history_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "[{broken").unwrap();

        assert!(History::new(path, 20).get_entries().is_empty());
    }

    #[test]
    fn test_clear_writes_empty_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        let mut history = History::new(path.clone(), 20);
        history.add(ChatMessage::user("list all files"));
        history.clear().unwrap();

        assert_eq!(fs::read_to_string(path).unwrap().trim(), "[]");
    }
}
