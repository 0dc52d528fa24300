// Memgate - Agent Driver
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Drives one user query against the Messages API:
// send -> collect text -> run memory tool_use blocks -> send results back,
// until the model stops asking for tools. All file access goes through
// MemoryTool::execute. Nothing bypasses the mounts.

use crate::config::ApiConfig;
use crate::memory::{MemoryCommand, MemoryTool};
use crate::prompt::SYSTEM_PROMPT;
use anyhow::{bail, Context};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const API_VERSION: &str = "2023-06-01";
const MEMORY_TOOL_TYPE: &str = "memory_20250818";
const MEMORY_TOOL_NAME: &str = "memory";

// ============================================================================
// TRANSPORT
// ============================================================================

/// One request/response exchange with the model endpoint
pub trait Transport {
    fn send(&self, request: &Value) -> anyhow::Result<Value>;
}

/// Blocking HTTPS transport for `{base_url}/v1/messages`
pub struct HttpTransport {
    client: Client,
    url: String,
    api_key: String,
    betas: String,
}

impl HttpTransport {
    pub fn new(api: &ApiConfig, api_key: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("memgate/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            url: format!("{}/v1/messages", api.base_url.trim_end_matches('/')),
            api_key,
            betas: api.betas.join(","),
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Value) -> anyhow::Result<Value> {
        let mut builder = self.client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(request);
        if !self.betas.is_empty() {
            builder = builder.header("anthropic-beta", &self.betas);
        }

        let resp = builder.send().context("Messages API request failed")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            bail!("Messages API error: HTTP {}: {}", status.as_u16(), body);
        }
        resp.json::<Value>().context("Messages API returned invalid JSON")
    }
}

// ============================================================================
// RESPONSE SHAPES
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    ToolUse { id: String, name: String, input: Value },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Usage,
}

/// Token usage, summed across round-trips
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl Usage {
    fn add(&mut self, other: Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// One memory tool invocation made during a query
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallRecord {
    pub command: String,
    pub path: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub text: String,
    pub usage: Usage,
    pub turns: u32,
    pub tool_calls: usize,
    pub calls: Vec<ToolCallRecord>,
}

// ============================================================================
// DRIVER
// ============================================================================

#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub model: String,
    pub max_tokens: u32,
    pub max_turns: u32,
}

impl From<&ApiConfig> for AgentSettings {
    fn from(api: &ApiConfig) -> Self {
        Self { model: api.model.clone(), max_tokens: api.max_tokens, max_turns: api.max_turns }
    }
}

pub struct AgentDriver<'a, T: Transport> {
    transport: T,
    tool: &'a MemoryTool,
    settings: AgentSettings,
}

impl<'a, T: Transport> AgentDriver<'a, T> {
    pub fn new(transport: T, tool: &'a MemoryTool, settings: AgentSettings) -> Self {
        Self { transport, tool, settings }
    }

    /// Run one query to completion
    pub fn run(&self, query: &str) -> anyhow::Result<QueryOutcome> {
        let mut messages = vec![json!({"role": "user", "content": query})];
        let mut text = String::new();
        let mut usage = Usage::default();
        let mut calls = Vec::new();

        for turn in 1..=self.settings.max_turns {
            let request = json!({
                "model": self.settings.model,
                "max_tokens": self.settings.max_tokens,
                "system": SYSTEM_PROMPT,
                "tools": [{"type": MEMORY_TOOL_TYPE, "name": MEMORY_TOOL_NAME}],
                "messages": messages,
            });

            let raw = self.transport.send(&request)?;
            let assistant_content = raw.get("content").cloned().unwrap_or_else(|| json!([]));
            let response: MessageResponse = serde_json::from_value(raw)
                .context("Unexpected Messages API response shape")?;
            usage.add(response.usage);
            log::debug!("turn {} stop_reason={:?}", turn, response.stop_reason);

            let mut results = Vec::new();
            for block in response.content {
                match block {
                    ContentBlock::Text { text: t } => text.push_str(&t),
                    ContentBlock::ToolUse { id, name, input } => {
                        let (content, record) = self.run_tool(&name, input);
                        let is_error = record.error.is_some();
                        calls.push(record);
                        results.push(json!({
                            "type": "tool_result",
                            "tool_use_id": id,
                            "content": content,
                            "is_error": is_error,
                        }));
                    }
                    ContentBlock::Other => {}
                }
            }

            messages.push(json!({"role": "assistant", "content": assistant_content}));
            if results.is_empty() {
                log::info!(
                    "Query finished: {} turns, {} tool calls, {} in / {} out tokens",
                    turn, calls.len(), usage.input_tokens, usage.output_tokens
                );
                return Ok(QueryOutcome { text, usage, turns: turn, tool_calls: calls.len(), calls });
            }
            messages.push(json!({"role": "user", "content": results}));
        }

        bail!("Agent did not finish within {} turns", self.settings.max_turns)
    }

    fn run_tool(&self, name: &str, input: Value) -> (String, ToolCallRecord) {
        if name != MEMORY_TOOL_NAME {
            let msg = format!("Unknown tool: {}", name);
            log::warn!("{}", msg);
            return (msg.clone(), ToolCallRecord { command: name.to_string(), path: String::new(), error: Some(msg) });
        }

        let command: MemoryCommand = match serde_json::from_value(input) {
            Ok(c) => c,
            Err(e) => {
                let msg = format!("Invalid memory command: {}", e);
                log::warn!("{}", msg);
                return (msg.clone(), ToolCallRecord { command: "invalid".to_string(), path: String::new(), error: Some(msg) });
            }
        };

        let op = command.operation().name().to_string();
        let path = command.target().to_string();
        match self.tool.execute(&command) {
            Ok(output) => (output, ToolCallRecord { command: op, path, error: None }),
            Err(e) => {
                let msg = e.to_string();
                log::warn!("memory {} {} failed: {}", op, path, msg);
                (msg.clone(), ToolCallRecord { command: op, path, error: Some(msg) })
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
