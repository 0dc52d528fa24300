// Memgate - Mount Table and Path Resolution
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Maps virtual paths (/user_files/..., /responses/...) onto the two mount
// roots. Containment is checked on the canonical path, after symlinks and
// `..` are resolved, never on the raw string.

use crate::error::ToolError;
use serde::Serialize;
use std::io;
use std::path::{Component, Path, PathBuf};

pub const USER_FILES_PREFIX: &str = "/user_files";
pub const RESPONSES_PREFIX: &str = "/responses";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MountKind {
    /// Uploaded documents, read-only to the agent
    UserFiles,
    /// Agent-generated answers, read-write
    Responses,
}

impl MountKind {
    pub fn prefix(self) -> &'static str {
        match self {
            MountKind::UserFiles => USER_FILES_PREFIX,
            MountKind::Responses => RESPONSES_PREFIX,
        }
    }

    pub fn read_only(self) -> bool {
        matches!(self, MountKind::UserFiles)
    }
}

/// A root directory plus its capability flag
#[derive(Debug, Clone)]
pub struct Mount {
    pub kind: MountKind,
    pub root: PathBuf,
    canonical_root: PathBuf,
}

impl Mount {
    fn open(kind: MountKind, root: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(root)?;
        let canonical_root = root.canonicalize()?;
        Ok(Self { kind, root: root.to_path_buf(), canonical_root })
    }

    pub fn read_only(&self) -> bool {
        self.kind.read_only()
    }

    pub fn canonical_root(&self) -> &Path {
        &self.canonical_root
    }
}

/// Outcome of resolving a virtual path
#[derive(Debug, Clone)]
pub struct Resolved {
    pub virtual_path: String,
    pub path: PathBuf,
    pub mount: MountKind,
    pub read_only: bool,
}

impl Resolved {
    /// True when the path is the mount root itself
    pub fn is_root(&self, mounts: &MountTable) -> bool {
        self.path == mounts.mount(self.mount).canonical_root
    }
}

/// The two fixed mounts. Built once, never changed afterwards.
#[derive(Debug, Clone)]
pub struct MountTable {
    user_files: Mount,
    responses: Mount,
}

impl MountTable {
    /// Open both mounts, creating their roots if needed
    pub fn new(user_files_dir: &Path, responses_dir: &Path) -> io::Result<Self> {
        let user_files = Mount::open(MountKind::UserFiles, user_files_dir)?;
        let responses = Mount::open(MountKind::Responses, responses_dir)?;
        log::info!("Mounts: {} -> {:?}, {} -> {:?}",
            USER_FILES_PREFIX, user_files.canonical_root,
            RESPONSES_PREFIX, responses.canonical_root);
        Ok(Self { user_files, responses })
    }

    pub fn mount(&self, kind: MountKind) -> &Mount {
        match kind {
            MountKind::UserFiles => &self.user_files,
            MountKind::Responses => &self.responses,
        }
    }

    /// Resolve a virtual path to a confined concrete path.
    ///
    /// Steps:
    /// 1. Pick the mount by prefix (prefix must end the string or be followed by `/`)
    /// 2. Strip the prefix and one leading separator
    /// 3. Join onto the canonical mount root
    /// 4. Canonicalize and require the result to stay under the root
    pub fn resolve(&self, virtual_path: &str) -> Result<Resolved, ToolError> {
        let (mount, remainder) = self.split_mount(virtual_path)?;

        let candidate = if remainder.is_empty() {
            mount.canonical_root.clone()
        } else {
            mount.canonical_root.join(remainder)
        };

        let canonical = canonicalize_lenient(&candidate)
            .map_err(|e| match e {
                LenientError::DanglingLink => ToolError::PathEscape { path: virtual_path.to_string() },
                LenientError::Io(source) => ToolError::io(virtual_path, source),
            })?;

        if !canonical.starts_with(&mount.canonical_root) {
            log::warn!("Path escape rejected: {} -> {:?}", virtual_path, canonical);
            return Err(ToolError::PathEscape { path: virtual_path.to_string() });
        }

        Ok(Resolved {
            virtual_path: virtual_path.to_string(),
            path: canonical,
            mount: mount.kind,
            read_only: mount.read_only(),
        })
    }

    /// Resolve a path naming a directory entry that will be removed or moved.
    ///
    /// Like `resolve`, but the final component is kept as written instead of
    /// being followed, so a symlink resolves to the link itself. The parent
    /// must stay inside the root. A link whose target exists must point inside
    /// the root as well; a dangling link is accepted so it can be cleaned up.
    pub fn resolve_entry(&self, virtual_path: &str) -> Result<Resolved, ToolError> {
        let (mount, remainder) = self.split_mount(virtual_path)?;
        if remainder.is_empty() {
            return self.resolve(virtual_path);
        }

        let candidate = mount.canonical_root.join(remainder);
        let (parent, name) = match (candidate.parent(), candidate.file_name()) {
            (Some(parent), Some(name)) => (parent, name),
            _ => return self.resolve(virtual_path),
        };

        let canonical_parent = canonicalize_lenient(parent)
            .map_err(|e| match e {
                LenientError::DanglingLink => ToolError::PathEscape { path: virtual_path.to_string() },
                LenientError::Io(source) => ToolError::io(virtual_path, source),
            })?;
        if !canonical_parent.starts_with(&mount.canonical_root) {
            log::warn!("Path escape rejected: {} -> {:?}", virtual_path, canonical_parent);
            return Err(ToolError::PathEscape { path: virtual_path.to_string() });
        }

        let path = canonical_parent.join(name);
        let is_link = std::fs::symlink_metadata(&path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);
        if is_link {
            if let Ok(target) = path.canonicalize() {
                if !target.starts_with(&mount.canonical_root) {
                    log::warn!("Symlink escape rejected: {} -> {:?}", virtual_path, target);
                    return Err(ToolError::PathEscape { path: virtual_path.to_string() });
                }
            }
        }

        Ok(Resolved {
            virtual_path: virtual_path.to_string(),
            path,
            mount: mount.kind,
            read_only: mount.read_only(),
        })
    }

    fn split_mount<'a>(&self, virtual_path: &'a str) -> Result<(&Mount, &'a str), ToolError> {
        for mount in [&self.user_files, &self.responses] {
            if let Some(rest) = virtual_path.strip_prefix(mount.kind.prefix()) {
                if rest.is_empty() {
                    return Ok((mount, rest));
                }
                if let Some(rest) = rest.strip_prefix('/') {
                    return Ok((mount, rest));
                }
            }
        }
        Err(ToolError::UnrecognizedMount { path: virtual_path.to_string() })
    }
}

enum LenientError {
    DanglingLink,
    Io(io::Error),
}

/// Canonicalize a path whose tail may not exist yet.
///
/// Each existing prefix is resolved through the filesystem; components past
/// the deepest existing ancestor are applied lexically. Since the prefix is
/// already canonical, a lexical `..` is exact. A symlink whose target does not
/// exist cannot be resolved and is rejected.
fn canonicalize_lenient(path: &Path) -> Result<PathBuf, LenientError> {
    let mut resolved = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                resolved.push(name);
                match resolved.canonicalize() {
                    Ok(p) => resolved = p,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        if std::fs::symlink_metadata(&resolved).is_ok() {
                            return Err(LenientError::DanglingLink);
                        }
                    }
                    Err(e) => return Err(LenientError::Io(e)),
                }
            }
        }
    }

    Ok(resolved)
}

// ============================================================================
// TESTS
// ============================================================================
