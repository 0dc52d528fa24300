// Memgate - MCP Server (JSON-RPC 2.0 over stdio)
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Exposes the memory tool to any MCP client.
// Tools: memory, list_user_files, list_responses, session_status
// stdout carries JSON-RPC only. Logging goes to stderr.

use crate::context::AppContext;
use crate::memory::MemoryCommand;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "memgate";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Summarize tool params for logging (truncate large values)
fn param_summary(name: &str, args: &Value) -> String {
    match name {
        "memory" => {
            let command = args.get("command").and_then(|v| v.as_str()).unwrap_or("?");
            let path = args.get("path")
                .or_else(|| args.get("old_path"))
                .and_then(|v| v.as_str())
                .unwrap_or("?");
            format!("{} {}", command, path)
        }
        _ => {
            let s = args.to_string();
            if s.len() > 300 { format!("{}…", s.chars().take(300).collect::<String>()) } else { s }
        }
    }
}

/// Write one JSON-RPC message as a single line
fn send_message(out: &mut impl Write, message: &Value) {
    let _ = writeln!(out, "{}", message);
    let _ = out.flush();
}

fn response(id: &Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

fn error_response(id: &Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}

/// MCP tool definition helper
fn tool_def(name: &str, description: &str, properties: Value, required: Vec<&str>) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": {
            "type": "object",
            "properties": properties,
            "required": required,
        }
    })
}

/// Return all tool definitions
fn tool_definitions() -> Vec<Value> {
    vec![
        tool_def(
            "memory",
            "Sandboxed file commands. /user_files is read-only (view only), /responses is read-write. \
             Commands: view, create, delete, insert, rename, str_replace.",
            json!({
                "command": {
                    "type": "string",
                    "enum": ["view", "create", "delete", "insert", "rename", "str_replace"]
                },
                "path": {"type": "string", "description": "Virtual path under /user_files or /responses"},
                "view_range": {
                    "type": "array", "items": {"type": "integer"}, "minItems": 2, "maxItems": 2,
                    "description": "[start, end] 1-based inclusive, end -1 for last line"
                },
                "file_text": {"type": "string"},
                "insert_line": {"type": "integer", "description": "0 inserts before the first line"},
                "insert_text": {"type": "string"},
                "old_path": {"type": "string"},
                "new_path": {"type": "string"},
                "old_str": {"type": "string", "description": "Must occur exactly once"},
                "new_str": {"type": "string"}
            }),
            vec!["command"],
        ),
        tool_def(
            "list_user_files",
            "List uploaded documents in /user_files (name, path, size, extension).",
            json!({}),
            vec![],
        ),
        tool_def(
            "list_responses",
            "List generated answers in /responses, newest first.",
            json!({}),
            vec![],
        ),
        tool_def(
            "session_status",
            "Show the session ledger: command counts, failures, token usage.",
            json!({}),
            vec![],
        ),
    ]
}

/// Run one tool. Returns (text, is_error).
fn handle_tool_call(name: &str, args: &Value, ctx: &mut AppContext) -> (String, bool) {
    match name {
        "memory" => {
            let (text, is_error) = match serde_json::from_value::<MemoryCommand>(args.clone()) {
                Ok(command) => {
                    let op = command.operation().name();
                    let path = command.target().to_string();
                    match ctx.tool.execute(&command) {
                        Ok(output) => {
                            ctx.session.record_command(op, &path, None);
                            (output, false)
                        }
                        Err(e) => {
                            let msg = e.to_string();
                            log::warn!("memory {} {} failed: {}", op, path, msg);
                            ctx.session.record_command(op, &path, Some(&msg));
                            (msg, true)
                        }
                    }
                }
                Err(e) => {
                    let msg = format!("Invalid memory command: {}", e);
                    ctx.session.record_command("invalid", "", Some(&msg));
                    (msg, true)
                }
            };
            if let Err(e) = ctx.persist() {
                log::warn!("Session persist failed: {}", e);
            }
            (text, is_error)
        }

        "list_user_files" => match ctx.library.list_user_files() {
            Ok(files) => (serde_json::to_string_pretty(&files).unwrap_or_default(), false),
            Err(e) => (e.to_string(), true),
        },

        "list_responses" => match ctx.library.list_responses() {
            Ok(files) => (serde_json::to_string_pretty(&files).unwrap_or_default(), false),
            Err(e) => (e.to_string(), true),
        },

        "session_status" => {
            let mut text = ctx.session.status_summary();
            for failure in ctx.session.failures.iter().rev().take(5) {
                text.push_str(&format!(
                    "\n  FAILED {} {}: {}",
                    failure.timestamp.format("%H:%M:%S"), failure.command, failure.error
                ));
            }
            (text, false)
        }

        _ => (format!("Unknown tool: {}", name), true),
    }
}

/// Handle one decoded JSON-RPC message. None for notifications.
pub fn handle_message(msg: &Value, ctx: &mut AppContext) -> Option<Value> {
    let method = msg["method"].as_str().unwrap_or("");
    let id = &msg["id"];
    let params = &msg["params"];

    log::debug!("Received: {}", method);

    match method {
        "initialize" => Some(response(id, json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION,
            }
        }))),

        "notifications/initialized" => None,

        "tools/list" => Some(response(id, json!({ "tools": tool_definitions() }))),

        "tools/call" => {
            let name = params["name"].as_str().unwrap_or("");
            let args = params.get("arguments").cloned().unwrap_or(json!({}));

            log::info!("CALL {} | {}", name, param_summary(name, &args));
            let (text, is_error) = handle_tool_call(name, &args, ctx);
            if is_error {
                let snippet: String = text.chars().take(200).collect();
                log::warn!("FAIL {} | {}", name, snippet);
            }

            Some(response(id, json!({
                "content": [{"type": "text", "text": text}],
                "isError": is_error,
            })))
        }

        "ping" => Some(response(id, json!({}))),

        _ => {
            if id.is_null() {
                None
            } else {
                Some(error_response(id, -32601, &format!("Unknown method: {}", method)))
            }
        }
    }
}

/// Serve JSON-RPC on stdin/stdout until EOF
pub fn run(mut ctx: AppContext) {
    log::info!("Starting {} v{}", SERVER_NAME, SERVER_VERSION);

    let stdin = io::stdin();
    let stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::error!("stdin read error: {}", e);
                continue;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let msg: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("JSON parse error: {}", e);
                continue;
            }
        };

        if let Some(reply) = handle_message(&msg, &mut ctx) {
            send_message(&mut stdout.lock(), &reply);
        }
    }

    log::info!("stdin closed, shutting down");
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::temp_context;

    fn call(ctx: &mut AppContext, name: &str, args: Value) -> Value {
        let msg = json!({
            "jsonrpc": "2.0", "id": 7, "method": "tools/call",
            "params": {"name": name, "arguments": args}
        });
        handle_message(&msg, ctx).unwrap()["result"].clone()
    }

    #[test]
    fn initialize_and_list() {
        let (_dir, mut ctx) = temp_context();
        let init = handle_message(&json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}), &mut ctx).unwrap();
        assert_eq!(init["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(init["id"], 1);

        let list = handle_message(&json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}), &mut ctx).unwrap();
        let names: Vec<&str> = list["result"]["tools"].as_array().unwrap()
            .iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["memory", "list_user_files", "list_responses", "session_status"]);
    }

    #[test]
    fn notifications_and_unknown_methods() {
        let (_dir, mut ctx) = temp_context();
        assert!(handle_message(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}), &mut ctx).is_none());
        assert!(handle_message(&json!({"jsonrpc": "2.0", "method": "bogus"}), &mut ctx).is_none());
        let err = handle_message(&json!({"jsonrpc": "2.0", "id": 3, "method": "bogus"}), &mut ctx).unwrap();
        assert_eq!(err["error"]["code"], -32601);
        let pong = handle_message(&json!({"jsonrpc": "2.0", "id": 4, "method": "ping"}), &mut ctx).unwrap();
        assert_eq!(pong["result"], json!({}));
    }

    #[test]
    fn memory_calls_are_recorded_and_persisted() {
        let (_dir, mut ctx) = temp_context();
        let ok = call(&mut ctx, "memory", json!({
            "command": "create", "path": "/responses/a.txt", "file_text": "x"
        }));
        assert_eq!(ok["isError"], false);

        let denied = call(&mut ctx, "memory", json!({
            "command": "delete", "path": "/user_files/a.txt"
        }));
        assert_eq!(denied["isError"], true);

        let stored = ctx.storage.load_session().unwrap().unwrap();
        assert_eq!(stored.command_count, 2);
        assert_eq!(stored.failures.len(), 1);
        assert_eq!(stored.manifest[0].command, "create");
    }

    #[test]
    fn malformed_memory_input_is_an_error_result() {
        let (_dir, mut ctx) = temp_context();
        let result = call(&mut ctx, "memory", json!({"command": "view"}));
        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"].as_str().unwrap().starts_with("Invalid memory command"));
    }

    #[test]
    fn listings_and_status() {
        let (dir, mut ctx) = temp_context();
        std::fs::write(dir.path().join("user_files/doc.txt"), "hi").unwrap();
        call(&mut ctx, "memory", json!({"command": "create", "path": "/responses/r.txt", "file_text": "y"}));

        let files = call(&mut ctx, "list_user_files", json!({}));
        assert!(files["content"][0]["text"].as_str().unwrap().contains("doc.txt"));
        let responses = call(&mut ctx, "list_responses", json!({}));
        assert!(responses["content"][0]["text"].as_str().unwrap().contains("r.txt"));
        let status = call(&mut ctx, "session_status", json!({}));
        assert!(status["content"][0]["text"].as_str().unwrap().starts_with("Commands: 1"));
        let unknown = call(&mut ctx, "shell", json!({}));
        assert_eq!(unknown["isError"], true);
    }
}
