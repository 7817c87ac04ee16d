mod api_client;
pub mod context_manager;
mod generator;

pub use self::api_client::APIClient;
pub use self::generator::CommandGenerator;

use crate::cache::QueryContext;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One command produced by the model's `get_command` tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCommand {
    pub command: String,
    #[serde(default)]
    pub user_inputs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default)]
    pub requires_admin: bool,
    #[serde(default)]
    pub description: String,
}

impl GeneratedCommand {
    pub fn new(command: &str) -> Self {
        GeneratedCommand {
            command: command.to_string(),
            user_inputs: Vec::new(),
            os: None,
            requires_admin: false,
            description: String::new(),
        }
    }

    /// Admin rights are requested either explicitly or by listing `sudo`
    /// among the inputs.
    pub fn needs_admin(&self) -> bool {
        self.requires_admin
            || self
                .user_inputs
                .iter()
                .any(|input| input.eq_ignore_ascii_case("sudo"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn with_content(role: &str, content: &str) -> Self {
        ChatMessage {
            role: role.to_string(),
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn system(content: &str) -> Self {
        Self::with_content("system", content)
    }

    pub fn user(content: &str) -> Self {
        Self::with_content("user", content)
    }

    pub fn assistant(content: &str) -> Self {
        Self::with_content("assistant", content)
    }

    pub fn tool_result(tool_call_id: &str, content: &str) -> Self {
        ChatMessage {
            tool_call_id: Some(tool_call_id.to_string()),
            ..Self::with_content("tool", content)
        }
    }

    pub fn assistant_tool_calls(calls: Vec<ToolCall>) -> Self {
        ChatMessage {
            role: "assistant".to_string(),
            content: None,
            tool_calls: Some(calls),
            tool_call_id: None,
        }
    }
}

/// Something that turns a request into commands, normally the model.
#[async_trait]
pub trait CommandSource: Send + Sync {
    async fn generate(
        &self,
        query: &str,
        context: &QueryContext,
        history: &[ChatMessage],
    ) -> Result<Vec<GeneratedCommand>>;
}
