// Memgate - Main Entry Point
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// CLI and MCP stdio server. Every file command routes through the mounts.
// Usage:
//   memgate serve                                # Run MCP server (stdio)
//   memgate query "<question>"                   # One agent query against the Messages API
//   memgate exec '<json>'                        # Run one memory command
//   memgate files | responses                    # JSON listings
//   memgate show-response <rel> | delete-response <rel>
//   memgate upload <file> [--dir <subdir>]       # Import a document into /user_files
//   memgate delete-file <rel> | clear-files
//   memgate session | reset | status

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use memgate::{
    agent::{AgentDriver, AgentSettings, HttpTransport},
    config::MemgateConfig,
    context::AppContext,
    mcp,
    memory::MemoryCommand,
    paths,
    session::Session,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "memgate")]
#[command(author = "Joseph Stone")]
#[command(version)]
#[command(about = "Memgate - sandboxed memory tool backend for document question answering")]
struct Cli {
    /// Config file (JSON). Missing file means defaults.
    #[arg(short, long, default_value_os_t = paths::default_config_file(paths::memgate_root()))]
    config: PathBuf,

    /// Session ledger directory, overrides the config value
    #[arg(short, long)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run MCP server (stdio JSON-RPC)
    Serve,

    /// Answer one question; the agent writes its answer under /responses
    Query {
        /// Question text
        text: String,

        /// Response token limit per round-trip
        #[arg(long)]
        max_tokens: Option<u32>,
    },

    /// Execute one memory command given as JSON
    Exec {
        /// e.g. {"command":"view","path":"/responses"}
        json: String,
    },

    /// List uploaded documents
    Files,

    /// List generated answers, newest first
    Responses,

    /// Print one generated answer
    ShowResponse {
        /// Path relative to /responses
        path: String,
    },

    /// Delete one generated answer
    DeleteResponse {
        /// Path relative to /responses
        path: String,
    },

    /// Import a local document into /user_files
    Upload {
        /// Local file to import
        file: PathBuf,

        /// Subdirectory under /user_files
        #[arg(long)]
        dir: Option<String>,
    },

    /// Delete an uploaded document or directory
    DeleteFile {
        /// Path relative to /user_files
        path: String,
    },

    /// Remove every uploaded document
    ClearFiles,

    /// Show full session state
    Session,

    /// Reset session (fresh start)
    Reset,

    /// Show mounts, model and session summary
    Status,
}

fn main() -> Result<()> {
    // Initialize logging (safe if already init)
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();

    let cli = Cli::parse();

    let mut config = MemgateConfig::load(&cli.config)?;
    config.apply_env();
    if let Some(state) = &cli.state {
        config.state_dir = state.clone();
    }

    let mut ctx = AppContext::open(config)?;

    match cli.command {
        Commands::Serve => {
            // Blocks until stdin closes
            mcp::run(ctx);
        }

        Commands::Query { text, max_tokens } => {
            let api_key = ctx.config.api_key()?;
            let transport = HttpTransport::new(&ctx.config.api, api_key)?;
            let mut settings = AgentSettings::from(&ctx.config.api);
            if let Some(max_tokens) = max_tokens {
                settings.max_tokens = max_tokens;
            }

            let outcome = AgentDriver::new(transport, &ctx.tool, settings).run(&text);

            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(e) => {
                    ctx.session.record_failure("query", &e.to_string());
                    ctx.persist()?;
                    return Err(e);
                }
            };
            for call in &outcome.calls {
                ctx.session.record_command(&call.command, &call.path, call.error.as_deref());
            }
            ctx.session.record_query(outcome.usage.input_tokens, outcome.usage.output_tokens);
            ctx.persist()?;

            println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                "success": true,
                "text": outcome.text,
                "usage": outcome.usage,
                "turns": outcome.turns,
                "tool_calls": outcome.tool_calls,
            }))?);
        }

        Commands::Exec { json } => {
            let command: MemoryCommand = serde_json::from_str(&json)
                .with_context(|| format!("Invalid memory command JSON: {}", json))?;
            let op = command.operation().name();
            let path = command.target().to_string();

            match ctx.tool.execute(&command) {
                Ok(output) => {
                    ctx.session.record_command(op, &path, None);
                    ctx.persist()?;
                    println!("{}", output);
                }
                Err(e) => {
                    ctx.session.record_command(op, &path, Some(&e.to_string()));
                    ctx.persist()?;
                    println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                        "error": e.to_string(),
                        "kind": e.kind(),
                    }))?);
                    std::process::exit(1);
                }
            }
        }

        Commands::Files => {
            let files = ctx.library.list_user_files()?;
            println!("{}", serde_json::to_string_pretty(&files)?);
        }

        Commands::Responses => {
            let files = ctx.library.list_responses()?;
            println!("{}", serde_json::to_string_pretty(&files)?);
        }

        Commands::ShowResponse { path } => {
            let response = ctx.library.read_response(&path)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::DeleteResponse { path } => {
            ctx.library.delete_response(&path)?;
            println!("Response deleted: {}", path);
        }

        Commands::Upload { file, dir } => {
            let receipt = ctx.library.import_upload(&file, dir.as_deref())
                .with_context(|| format!("Upload failed: {:?}", file))?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }

        Commands::DeleteFile { path } => {
            ctx.library.delete_user_file(&path)?;
            println!("File deleted: {}", path);
        }

        Commands::ClearFiles => {
            let removed = ctx.library.clear_user_files()?;
            println!("Cleared {} entries from /user_files", removed);
        }

        Commands::Session => {
            println!("{}", serde_json::to_string_pretty(&ctx.session)?);
        }

        Commands::Reset => {
            ctx.session = Session::new();
            ctx.persist()?;
            println!("Session reset.");
        }

        Commands::Status => {
            println!("Memgate v{}", env!("CARGO_PKG_VERSION"));
            println!("Config: {:?}", cli.config);
            println!("State:  {:?}", ctx.config.state_dir);
            println!();
            println!("Mounts:");
            println!("  /user_files  (read-only)   -> {:?}", ctx.config.user_files_dir);
            println!("  /responses   (read-write)  -> {:?}", ctx.config.responses_dir);
            println!();
            println!("Model: {} | max_tokens {} | max_turns {}",
                ctx.config.api.model, ctx.config.api.max_tokens, ctx.config.api.max_turns);
            println!("API key env: {} ({})", ctx.config.api.key_env,
                if ctx.config.api_key().is_ok() { "set" } else { "not set" });
            println!();
            println!("Session: {}", ctx.session.status_summary());
        }
    }

    Ok(())
}
