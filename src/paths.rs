// Memgate - Path Resolution
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Single source of truth for the install root and the default storage layout.
// Cached via OnceLock for zero-overhead repeated access.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static MEMGATE_ROOT_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Find the memgate install root.
///
/// Resolution order:
///   1. MEMGATE_ROOT environment variable
///   2. Walk up from binary location looking for Cargo.toml
///   3. Current working directory
pub fn memgate_root() -> &'static Path {
    MEMGATE_ROOT_CACHE.get_or_init(|| {
        if let Ok(root) = std::env::var("MEMGATE_ROOT") {
            let p = PathBuf::from(&root);
            if p.exists() {
                return p;
            }
        }

        if let Ok(exe) = std::env::current_exe() {
            if let Ok(canonical) = exe.canonicalize() {
                let mut dir = canonical.parent();
                while let Some(d) = dir {
                    if d.join("Cargo.toml").exists() {
                        return d.to_path_buf();
                    }
                    dir = d.parent();
                }
            }
        }

        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    })
}

/// storage/: parent of both mounts
pub fn storage_dir(root: &Path) -> PathBuf {
    root.join("storage")
}

/// storage/user_files: uploaded documents (read-only mount)
pub fn default_user_files_dir(root: &Path) -> PathBuf {
    storage_dir(root).join("user_files")
}

/// storage/responses: generated answers (read-write mount)
pub fn default_responses_dir(root: &Path) -> PathBuf {
    storage_dir(root).join("responses")
}

/// LIVE/SESSION/SESSION.DB: LMDB session ledger
pub fn default_state_dir(root: &Path) -> PathBuf {
    root.join("LIVE/SESSION/SESSION.DB")
}

/// memgate.json: optional config file
pub fn default_config_file(root: &Path) -> PathBuf {
    root.join("memgate.json")
}
