// Memgate - Document Library
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Operator-side view of both mounts: upload import, listings, delete, clear.
// Every relative path goes through the mount resolver first.

use crate::error::ToolError;
use crate::mount::{MountKind, MountTable, RESPONSES_PREFIX, USER_FILES_PREFIX};
use crate::validate::{self, extension_of};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error(transparent)]
    Path(#[from] ToolError),

    #[error("no usable filename in {0:?}")]
    EmptyFilename(String),

    #[error("upload rejected: {0}")]
    Rejected(String),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A file under one of the mounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    /// Path relative to the mount root
    pub path: String,
    pub size: u64,
    pub extension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

/// Content of a generated answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseContent {
    pub filename: String,
    pub content: String,
}

/// Result of importing one upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub entry: FileEntry,
    /// SHA256 of the stored bytes, hex
    pub checksum: String,
}

pub struct Library {
    mounts: MountTable,
    max_upload_size: u64,
    allowed_extensions: Vec<String>,
}

impl Library {
    pub fn new(mounts: MountTable, max_upload_size: u64, allowed_extensions: Vec<String>) -> Self {
        Self { mounts, max_upload_size, allowed_extensions }
    }

    fn resolve(&self, kind: MountKind, relative: &str) -> Result<PathBuf, ToolError> {
        let prefix = kind.prefix();
        let virtual_path = if relative.is_empty() {
            prefix.to_string()
        } else {
            format!("{}/{}", prefix, relative)
        };
        let resolved = self.mounts.resolve(&virtual_path)?;
        if resolved.is_root(&self.mounts) {
            return Err(ToolError::MountRoot { operation: "modify", path: virtual_path });
        }
        Ok(resolved.path)
    }

    // ========================================================================
    // LISTINGS
    // ========================================================================

    /// All visible uploaded documents, sorted by relative path
    pub fn list_user_files(&self) -> Result<Vec<FileEntry>, LibraryError> {
        let mut files = self.walk(MountKind::UserFiles, false)?;
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// All visible generated answers, newest first
    pub fn list_responses(&self) -> Result<Vec<FileEntry>, LibraryError> {
        let mut files = self.walk(MountKind::Responses, true)?;
        files.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(files)
    }

    fn walk(&self, kind: MountKind, with_modified: bool) -> Result<Vec<FileEntry>, LibraryError> {
        let root = self.mounts.mount(kind).canonical_root();
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let metadata = entry.metadata()?;
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let name = entry.file_name().to_string_lossy().into_owned();

            files.push(FileEntry {
                extension: extension_of(&name),
                name,
                path: relative.to_string_lossy().into_owned(),
                size: metadata.len(),
                modified: if with_modified {
                    metadata.modified().ok().map(DateTime::<Utc>::from)
                } else {
                    None
                },
            });
        }

        Ok(files)
    }

    // ========================================================================
    // RESPONSES
    // ========================================================================

    pub fn read_response(&self, relative: &str) -> Result<ResponseContent, LibraryError> {
        let path = self.resolve(MountKind::Responses, relative)?;
        if !path.is_file() {
            return Err(ToolError::NotFound { path: format!("{}/{}", RESPONSES_PREFIX, relative) }.into());
        }
        let content = fs::read_to_string(&path)
            .map_err(|source| LibraryError::Io { path: path.clone(), source })?;
        let filename = path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(ResponseContent { filename, content })
    }

    pub fn delete_response(&self, relative: &str) -> Result<(), LibraryError> {
        let path = self.resolve(MountKind::Responses, relative)?;
        let virtual_path = format!("{}/{}", RESPONSES_PREFIX, relative);
        if path.is_dir() {
            return Err(ToolError::NotAFile { path: virtual_path }.into());
        }
        if !path.exists() {
            return Err(ToolError::NotFound { path: virtual_path }.into());
        }
        fs::remove_file(&path).map_err(|source| LibraryError::Io { path, source })?;
        log::info!("response deleted: {}", virtual_path);
        Ok(())
    }

    // ========================================================================
    // USER FILES
    // ========================================================================

    /// Remove an uploaded file or directory tree
    pub fn delete_user_file(&self, relative: &str) -> Result<(), LibraryError> {
        let path = self.resolve(MountKind::UserFiles, relative)?;
        if !path.exists() {
            return Err(ToolError::NotFound { path: format!("{}/{}", USER_FILES_PREFIX, relative) }.into());
        }
        let removed = if path.is_dir() { fs::remove_dir_all(&path) } else { fs::remove_file(&path) };
        removed.map_err(|source| LibraryError::Io { path, source })?;
        log::info!("user file deleted: {}", relative);
        Ok(())
    }

    /// Remove everything under the uploads root. Returns the number of top-level entries removed.
    pub fn clear_user_files(&self) -> Result<usize, LibraryError> {
        let root = self.mounts.mount(MountKind::UserFiles).canonical_root().to_path_buf();
        let entries = fs::read_dir(&root)
            .map_err(|source| LibraryError::Io { path: root.clone(), source })?;

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|source| LibraryError::Io { path: root.clone(), source })?;
            let path = entry.path();
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            let result = if is_dir { fs::remove_dir_all(&path) } else { fs::remove_file(&path) };
            result.map_err(|source| LibraryError::Io { path, source })?;
            removed += 1;
        }

        log::info!("user files cleared: {} entries", removed);
        Ok(removed)
    }

    /// Copy a local document into the uploads mount.
    ///
    /// Order: sanitize name -> confine destination -> extension -> size.
    /// An upload with the same name replaces the previous one.
    pub fn import_upload(&self, source: &Path, subdir: Option<&str>) -> Result<UploadReceipt, LibraryError> {
        let original = source.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let filename = validate::sanitize_filename(&original)
            .ok_or_else(|| LibraryError::EmptyFilename(original.clone()))?;

        let relative = match subdir.map(|d| d.trim_matches('/')).filter(|d| !d.is_empty()) {
            Some(dir) => format!("{}/{}", dir, filename),
            None => filename.clone(),
        };
        let destination = self.resolve(MountKind::UserFiles, &relative)?;

        let size = fs::metadata(source)
            .map_err(|e| LibraryError::Io { path: source.to_path_buf(), source: e })?
            .len();
        let check = validate::validate_upload(&filename, size, &self.allowed_extensions, self.max_upload_size);
        if !check.valid {
            return Err(LibraryError::Rejected(check.errors.join("; ")));
        }

        let data = fs::read(source)
            .map_err(|e| LibraryError::Io { path: source.to_path_buf(), source: e })?;
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| LibraryError::Io { path: parent.to_path_buf(), source: e })?;
        }
        fs::write(&destination, &data)
            .map_err(|e| LibraryError::Io { path: destination.clone(), source: e })?;

        let checksum = sha256_hex(&data);
        log::info!("upload stored: {} ({} bytes, {})", relative, data.len(), &checksum[..16]);

        Ok(UploadReceipt {
            entry: FileEntry {
                extension: extension_of(&filename),
                name: filename,
                path: relative,
                size: data.len() as u64,
                modified: None,
            },
            checksum,
        })
    }
}

/// SHA256 hash as hex string
fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================
