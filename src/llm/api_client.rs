use super::{ChatMessage, CommandSource, GeneratedCommand, ToolCall};
use crate::cache::QueryContext;
use crate::config::Config;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{debug, error};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const TOOL_NAME: &str = "get_command";
const MAX_FOLLOW_UPS: usize = 5;
const FIRST_FOLLOW_UP: &str = "What other commands are needed to complete this task? If no more commands are needed, please respond with 'No more commands needed.'";
const NEXT_FOLLOW_UP: &str = "Are there any more commands needed? If not, please respond with 'No more commands needed.'";

#[derive(Clone)]
pub struct APIClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    tools: &'a [Value],
    tool_choice: &'a str,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

lazy_static! {
    static ref CODE_BLOCK_RE: Regex = Regex::new(r"```(?:shell|bash|sh|zsh)?\s*([^`]+)```").unwrap();
}

impl APIClient {
    pub fn new(config: &Config) -> Self {
        APIClient {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model_name.clone(),
        }
    }

    fn command_tool() -> Value {
        json!({
            "type": "function",
            "function": {
                "name": TOOL_NAME,
                "description": "Get a single terminal command to execute. For tasks requiring multiple commands, this tool should be called multiple times in sequence.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "command": {
                            "type": "string",
                            "description": "A single terminal command with placeholders for user inputs enclosed in angle brackets (e.g., 'mkdir <folder_name>')"
                        },
                        "user_inputs": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "List of input values that the user needs to provide to execute the command. These correspond to the placeholders in the command string."
                        },
                        "os": {
                            "type": "string",
                            "enum": ["macos", "linux", "windows"],
                            "description": "The operating system for which this command is intended"
                        },
                        "requires_admin": {
                            "type": "boolean",
                            "description": "Whether this command requires administrator or root privileges"
                        },
                        "description": {
                            "type": "string",
                            "description": "A brief description of what this command does"
                        }
                    },
                    "required": ["command", "user_inputs"],
                    "additionalProperties": false
                },
                "strict": true
            }
        })
    }

    fn system_prompt(context: &QueryContext) -> String {
        let default_os = context.os().unwrap_or("macos");
        let mut prompt = format!(
            "You are an expert terminal command assistant.

When users request tasks:
1. Break complex tasks into individual terminal commands
2. For each command, specify:
   - The exact command with placeholders (like <folder_name>) for user inputs
   - List all required user inputs that correspond to placeholders
   - Specify the OS (default: {os})
   - Indicate if admin/root privileges are needed
   - Include a brief description of what this command does

Important rules:
- Generate ONE command per tool call
- If a task requires multiple commands, make multiple separate tool calls in sequence
- Use placeholders with angle brackets for any user input values
- Make sure the user_inputs field contains strings matching EXACTLY to the placeholders in the command (without the < >)
- Include \"sudo\" in user_inputs list if the command requires admin privileges
- Make commands as specific and accurate as possible
- Default to {os} commands unless specified otherwise
",
            os = default_os
        );

        if let Some(dir) = context.current_dir.as_deref() {
            prompt.push_str(&format!("\nCurrent directory: {}", dir));
        }
        if !context.recent_commands.is_empty() {
            prompt.push_str(&format!("\nLast commands: {}", context.recent_commands.join(", ")));
        }
        prompt
    }

    async fn invoke_tools(&self, messages: &[ChatMessage]) -> Result<ChatMessage> {
        debug!("Invoking model with {} messages", messages.len());
        let tools = [Self::command_tool()];
        let request = ChatRequest {
            model: &self.model,
            messages,
            tools: &tools,
            tool_choice: "auto",
            temperature: 0.0,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Error communicating with AI service")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("AI service returned {}: {}", status, body.trim());
        }

        let response = response
            .json::<ChatResponse>()
            .await
            .context("Unexpected response from AI service")?;

        match response.choices.into_iter().next() {
            Some(choice) => Ok(choice.message),
            None => bail!("AI service returned no choices"),
        }
    }

    fn parse_tool_calls(calls: &[ToolCall]) -> Vec<GeneratedCommand> {
        calls
            .iter()
            .filter(|call| call.function.name == TOOL_NAME)
            .filter_map(|call| {
                match serde_json::from_str::<GeneratedCommand>(&call.function.arguments) {
                    Ok(command) if !command.command.trim().is_empty() => Some(command),
                    Ok(_) => None,
                    Err(e) => {
                        error!("Error parsing command {}: {}", call.function.arguments, e);
                        None
                    }
                }
            })
            .collect()
    }

    /// Some models answer in prose with a code block instead of calling the tool.
    fn clean_command_output(output: &str) -> Option<String> {
        let captures = CODE_BLOCK_RE.captures(output)?;
        let command = captures.get(1)?.as_str().trim();
        if command.is_empty() {
            None
        } else {
            Some(command.to_string())
        }
    }

    fn record_tool_round(messages: &mut Vec<ChatMessage>, calls: Vec<ToolCall>, follow_up: &str) {
        let ids: Vec<String> = calls.iter().map(|call| call.id.clone()).collect();
        messages.push(ChatMessage::assistant_tool_calls(calls));
        for id in ids {
            messages.push(ChatMessage::tool_result(&id, "Command recorded."));
        }
        messages.push(ChatMessage::user(follow_up));
    }
}

#[async_trait]
impl CommandSource for APIClient {
    async fn generate(
        &self,
        query: &str,
        context: &QueryContext,
        history: &[ChatMessage],
    ) -> Result<Vec<GeneratedCommand>> {
        debug!("Generating commands for query: {}", query);

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(&Self::system_prompt(context)));
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::user(query));

        let reply = self.invoke_tools(&messages).await?;
        let calls = match reply.tool_calls {
            Some(calls) if !calls.is_empty() => calls,
            _ => {
                debug!("No tool calls in reply");
                let fallback = reply
                    .content
                    .as_deref()
                    .and_then(Self::clean_command_output)
                    .map(|command| vec![GeneratedCommand::new(&command)]);
                return Ok(fallback.unwrap_or_default());
            }
        };

        let mut commands = Self::parse_tool_calls(&calls);
        Self::record_tool_round(&mut messages, calls, FIRST_FOLLOW_UP);

        for iteration in 1..=MAX_FOLLOW_UPS {
            debug!("Getting additional commands (iteration {})", iteration);
            let reply = self.invoke_tools(&messages).await?;
            let calls = match reply.tool_calls {
                Some(calls) if !calls.is_empty() => calls,
                _ => {
                    debug!("No more commands needed");
                    break;
                }
            };
            commands.extend(Self::parse_tool_calls(&calls));
            Self::record_tool_round(&mut messages, calls, NEXT_FOLLOW_UP);
        }

        debug!("Generated {} commands", commands.len());
        Ok(commands)
    }
}
