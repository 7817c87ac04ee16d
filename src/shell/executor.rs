// src/shell/executor.rs
use anyhow::{Context, Result};
use log::{debug, error};
use std::process::{Command, Stdio};

#[derive(Debug)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub output: String,
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// The command line that will actually run, with `sudo` added for admin
    /// commands outside Windows.
    pub fn prepare(command: &str, requires_admin: bool) -> String {
        let command = command.trim();
        if requires_admin && !cfg!(windows) && !command.starts_with("sudo ") {
            format!("sudo {}", command)
        } else {
            command.to_string()
        }
    }

    pub fn execute(command: &str, requires_admin: bool) -> Result<ExecutionOutcome> {
        let command_line = Self::prepare(command, requires_admin);
        debug!("Executing command: {}, requires_admin={}", command_line, requires_admin);

        let output = Self::shell_command(&command_line)
            .stdin(Stdio::inherit())
            .output()
            .with_context(|| format!("Command execution failed: {}", command_line))?;

        let success = output.status.success();
        let text = if success {
            String::from_utf8_lossy(&output.stdout).to_string()
        } else {
            error!(
                "Command failed with return code {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            String::from_utf8_lossy(&output.stderr).to_string()
        };

        Ok(ExecutionOutcome {
            success,
            exit_code: output.status.code(),
            output: text,
        })
    }

    #[cfg(not(windows))]
    fn shell_command(command_line: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(command_line);
        command
    }

    #[cfg(windows)]
    fn shell_command(command_line: &str) -> Command {
        let mut command = Command::new("cmd");
        command.arg("/C").arg(command_line);
        command
    }
}
