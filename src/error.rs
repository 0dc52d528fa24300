// Memgate - Error Taxonomy
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Typed failures for the memory tool. Every variant carries the offending
// virtual path so the agent can correct its next command.

use crate::extract::ExtractError;
use serde::Serialize;
use thiserror::Error;

/// Coarse failure category reported to callers and the session ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PathEscape,
    UnrecognizedMount,
    Permission,
    NotFound,
    AlreadyExists,
    Validation,
    Extraction,
    Io,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("path must start with /user_files or /responses, got: {path}")]
    UnrecognizedMount { path: String },

    #[error("path {path} resolves outside of its mount root")]
    PathEscape { path: String },

    #[error("cannot {operation} in read-only mount: {path}")]
    PermissionDenied { operation: &'static str, path: String },

    #[error("path not found: {path}")]
    NotFound { path: String },

    #[error("file already exists: {path}")]
    AlreadyExists { path: String },

    #[error("not a file: {path}")]
    NotAFile { path: String },

    #[error("cannot {operation} the mount root: {path}")]
    MountRoot { operation: &'static str, path: String },

    #[error("cannot move {old_path} into itself: {new_path}")]
    MoveIntoSelf { old_path: String, new_path: String },

    #[error("invalid insert line {line} for {path}: must be between 0 and {line_count}")]
    LineOutOfRange { path: String, line: i64, line_count: usize },

    #[error("old_str must not be empty in {path}; use insert to add text")]
    EmptyOldStr { path: String },

    #[error("old_str must occur exactly once in {path}, found {count} occurrences")]
    MatchCount { path: String, count: usize },

    #[error("failed to read {path}: {source}")]
    Extraction {
        path: String,
        #[source]
        source: ExtractError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::UnrecognizedMount { .. } => ErrorKind::UnrecognizedMount,
            ToolError::PathEscape { .. } => ErrorKind::PathEscape,
            ToolError::PermissionDenied { .. } => ErrorKind::Permission,
            ToolError::NotFound { .. } => ErrorKind::NotFound,
            ToolError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            ToolError::NotAFile { .. }
            | ToolError::MountRoot { .. }
            | ToolError::MoveIntoSelf { .. }
            | ToolError::LineOutOfRange { .. }
            | ToolError::EmptyOldStr { .. }
            | ToolError::MatchCount { .. } => ErrorKind::Validation,
            ToolError::Extraction { .. } => ErrorKind::Extraction,
            ToolError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Wrap an I/O failure, mapping the common kinds onto the taxonomy
    pub(crate) fn io(path: &str, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => ToolError::NotFound { path: path.to_string() },
            std::io::ErrorKind::AlreadyExists => ToolError::AlreadyExists { path: path.to_string() },
            _ => ToolError::Io { path: path.to_string(), source },
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
