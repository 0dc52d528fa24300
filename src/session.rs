// Memgate - Session Ledger
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// In-memory session state. Persisted to LMDB after each tool call.
// Tracks: command count, outcome manifest, failures, token usage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MAX_MANIFEST: usize = 200;
const MAX_FAILURES: usize = 50;

/// Active session state. Lives in RAM, flushed to LMDB after every call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub command_count: u64,
    pub last_command: Option<String>,
    pub last_path: Option<String>,
    pub started: DateTime<Utc>,
    pub last_action: Option<DateTime<Utc>>,
    pub manifest: Vec<ManifestEntry>,
    pub failures: Vec<FailureEntry>,
    #[serde(default)]
    pub query_count: u64,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub timestamp: DateTime<Utc>,
    pub command: String,
    pub path: String,
    pub outcome: String, // "OK" or "FAILED"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureEntry {
    pub timestamp: DateTime<Utc>,
    pub command: String,
    pub error: String,
}

impl Session {
    pub fn new() -> Self {
        Self {
            command_count: 0,
            last_command: None,
            last_path: None,
            started: Utc::now(),
            last_action: None,
            manifest: Vec::new(),
            failures: Vec::new(),
            query_count: 0,
            input_tokens: 0,
            output_tokens: 0,
        }
    }

    /// Record a memory command outcome (called after every execution)
    pub fn record_command(&mut self, command: &str, path: &str, error: Option<&str>) {
        self.command_count += 1;
        self.last_command = Some(command.to_string());
        self.last_path = Some(path.to_string());
        let now = Utc::now();
        self.last_action = Some(now);

        self.manifest.push(ManifestEntry {
            timestamp: now,
            command: command.to_string(),
            path: path.to_string(),
            outcome: if error.is_some() { "FAILED" } else { "OK" }.to_string(),
        });
        if self.manifest.len() > MAX_MANIFEST {
            self.manifest.remove(0);
        }

        if let Some(error) = error {
            self.record_failure(command, error);
        }
    }

    /// Record failure
    pub fn record_failure(&mut self, command: &str, error: &str) {
        self.failures.push(FailureEntry {
            timestamp: Utc::now(),
            command: command.to_string(),
            error: error.to_string(),
        });
        if self.failures.len() > MAX_FAILURES {
            self.failures.remove(0);
        }
    }

    /// Add token usage of one completed query
    pub fn record_query(&mut self, input_tokens: u64, output_tokens: u64) {
        self.query_count += 1;
        self.input_tokens += input_tokens;
        self.output_tokens += output_tokens;
        self.last_action = Some(Utc::now());
    }

    /// Status summary string
    pub fn status_summary(&self) -> String {
        format!(
            "Commands: {} | Failures: {} | Queries: {} | Tokens: {} in / {} out | Last: {}",
            self.command_count,
            self.failures.len(),
            self.query_count,
            self.input_tokens,
            self.output_tokens,
            self.last_command.as_deref().unwrap_or("none"),
        )
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
