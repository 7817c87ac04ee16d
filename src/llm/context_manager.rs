use crate::cache::QueryContext;

const MAX_RECENT_COMMANDS: usize = 5;

#[derive(Clone)]
pub struct ContextManager {
    default_os: String,
    current_dir: String,
    last_commands: Vec<String>,
}

impl ContextManager {
    pub fn new(default_os: &str) -> Self {
        ContextManager {
            default_os: default_os.to_string(),
            current_dir: std::env::current_dir()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            last_commands: Vec::new(),
        }
    }

    pub fn get_context(&self) -> QueryContext {
        QueryContext {
            default_os: Some(self.default_os.clone()).filter(|os| !os.is_empty()),
            current_dir: Some(self.current_dir.clone()).filter(|dir| !dir.is_empty()),
            recent_commands: self.last_commands.clone(),
        }
    }

    pub fn update_directory(&mut self, new_dir: &str) {
        self.current_dir = new_dir.to_string();
    }

    pub fn add_command(&mut self, command: &str) {
        self.last_commands.push(command.to_string());
        if self.last_commands.len() > MAX_RECENT_COMMANDS {
            self.last_commands.remove(0);
        }
    }
}
