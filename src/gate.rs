// Memgate - Gate (Permission Enforcement Point)
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Every memory command passes through here after path resolution and before
// touching the filesystem. One rule: mutations never reach a read-only mount.

use crate::error::ToolError;
use crate::mount::Resolved;
use serde::{Deserialize, Serialize};

/// The six memory tool operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    View,
    Create,
    Delete,
    Insert,
    Rename,
    StrReplace,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::View => "view",
            Operation::Create => "create",
            Operation::Delete => "delete",
            Operation::Insert => "insert",
            Operation::Rename => "rename",
            Operation::StrReplace => "str_replace",
        }
    }

    pub fn is_mutating(self) -> bool {
        !matches!(self, Operation::View)
    }
}

/// Allow or refuse an operation on a resolved target
pub fn authorize(operation: Operation, target: &Resolved) -> Result<(), ToolError> {
    if operation.is_mutating() && target.read_only {
        log::warn!("BLOCKED | {} | read-only mount | {}", operation.name(), target.virtual_path);
        return Err(ToolError::PermissionDenied {
            operation: operation.name(),
            path: target.virtual_path.clone(),
        });
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
