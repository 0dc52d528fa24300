// Memgate - Memory Tool
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// The six-command file protocol driven by the agent:
//   view, create, delete, insert, rename, str_replace
// Pipeline per command: resolve -> gate -> read/write.
// No locking. insert and str_replace are read-modify-write.

use crate::error::ToolError;
use crate::extract::{FormatExtractor, TextExtractor};
use crate::gate::{self, Operation};
use crate::mount::{MountTable, Resolved};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;

/// One command as sent by the agent in a `memory` tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum MemoryCommand {
    View {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        view_range: Option<[i64; 2]>,
    },
    Create {
        path: String,
        #[serde(default)]
        file_text: Option<String>,
    },
    Delete {
        path: String,
    },
    Insert {
        path: String,
        insert_line: i64,
        #[serde(default)]
        insert_text: Option<String>,
    },
    Rename {
        old_path: String,
        new_path: String,
    },
    StrReplace {
        path: String,
        old_str: String,
        new_str: String,
    },
}

impl MemoryCommand {
    pub fn operation(&self) -> Operation {
        match self {
            MemoryCommand::View { .. } => Operation::View,
            MemoryCommand::Create { .. } => Operation::Create,
            MemoryCommand::Delete { .. } => Operation::Delete,
            MemoryCommand::Insert { .. } => Operation::Insert,
            MemoryCommand::Rename { .. } => Operation::Rename,
            MemoryCommand::StrReplace { .. } => Operation::StrReplace,
        }
    }

    /// Primary virtual path the command targets
    pub fn target(&self) -> &str {
        match self {
            MemoryCommand::View { path, .. }
            | MemoryCommand::Create { path, .. }
            | MemoryCommand::Delete { path }
            | MemoryCommand::Insert { path, .. }
            | MemoryCommand::StrReplace { path, .. } => path,
            MemoryCommand::Rename { old_path, .. } => old_path,
        }
    }
}

/// Sandboxed two-mount filesystem tool
pub struct MemoryTool {
    mounts: MountTable,
    extractor: Box<dyn TextExtractor>,
}

impl MemoryTool {
    pub fn new(mounts: MountTable) -> Self {
        Self::with_extractor(mounts, Box::new(FormatExtractor::default()))
    }

    pub fn with_extractor(mounts: MountTable, extractor: Box<dyn TextExtractor>) -> Self {
        Self { mounts, extractor }
    }

    pub fn mounts(&self) -> &MountTable {
        &self.mounts
    }

    /// Dispatch a command to its handler
    pub fn execute(&self, command: &MemoryCommand) -> Result<String, ToolError> {
        log::debug!("memory {} {}", command.operation().name(), command.target());
        match command {
            MemoryCommand::View { path, view_range } => self.view(path, *view_range),
            MemoryCommand::Create { path, file_text } => {
                self.create(path, file_text.as_deref().unwrap_or(""))
            }
            MemoryCommand::Delete { path } => self.delete(path),
            MemoryCommand::Insert { path, insert_line, insert_text } => {
                self.insert(path, *insert_line, insert_text.as_deref().unwrap_or(""))
            }
            MemoryCommand::Rename { old_path, new_path } => self.rename(old_path, new_path),
            MemoryCommand::StrReplace { path, old_str, new_str } => {
                self.str_replace(path, old_str, new_str)
            }
        }
    }

    fn resolve_for(&self, operation: Operation, path: &str) -> Result<Resolved, ToolError> {
        let target = self.mounts.resolve(path)?;
        gate::authorize(operation, &target)?;
        Ok(target)
    }

    fn resolve_entry_for(&self, operation: Operation, path: &str) -> Result<Resolved, ToolError> {
        let target = self.mounts.resolve_entry(path)?;
        gate::authorize(operation, &target)?;
        Ok(target)
    }

    // ========================================================================
    // VIEW
    // ========================================================================

    /// List a directory or show a file with 1-based line numbers.
    /// `view_range` is `[start, end]`, inclusive; `end == -1` reads to the last line.
    pub fn view(&self, path: &str, view_range: Option<[i64; 2]>) -> Result<String, ToolError> {
        let target = self.resolve_for(Operation::View, path)?;

        if target.path.is_dir() {
            return list_directory(&target);
        }
        if !target.path.is_file() {
            return Err(ToolError::NotFound { path: path.to_string() });
        }

        let content = self.extractor.extract(&target.path)
            .map_err(|source| ToolError::Extraction { path: path.to_string(), source })?;
        let lines: Vec<&str> = content.lines().collect();

        let (start, end) = match view_range {
            Some([start, end]) => {
                let start = (start.max(1) - 1) as usize;
                let end = if end == -1 { lines.len() } else { end.max(0) as usize };
                (start.min(lines.len()), end.min(lines.len()))
            }
            None => (0, lines.len()),
        };
        let slice = if start < end { &lines[start..end] } else { &[][..] };

        let numbered: Vec<String> = slice.iter()
            .enumerate()
            .map(|(i, line)| format!("{:>4}: {}", start + i + 1, line))
            .collect();
        Ok(numbered.join("\n"))
    }

    // ========================================================================
    // CREATE
    // ========================================================================

    /// Create a new file. Never overwrites.
    pub fn create(&self, path: &str, file_text: &str) -> Result<String, ToolError> {
        let target = self.resolve_for(Operation::Create, path)?;

        if target.path.exists() {
            return Err(ToolError::AlreadyExists { path: path.to_string() });
        }
        if let Some(parent) = target.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ToolError::io(path, e))?;
        }

        // create_new refuses a file that appeared after the check
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target.path)
            .map_err(|e| ToolError::io(path, e))?;
        file.write_all(file_text.as_bytes()).map_err(|e| ToolError::io(path, e))?;

        log::info!("created {} ({} bytes)", path, file_text.len());
        Ok(format!("File created successfully at: {}", path))
    }

    // ========================================================================
    // DELETE
    // ========================================================================

    /// Remove a file, a directory tree, or a symlink (never its target)
    pub fn delete(&self, path: &str) -> Result<String, ToolError> {
        let target = self.resolve_entry_for(Operation::Delete, path)?;

        if target.is_root(&self.mounts) {
            return Err(ToolError::MountRoot { operation: "delete", path: path.to_string() });
        }
        let meta = fs::symlink_metadata(&target.path)
            .map_err(|_| ToolError::NotFound { path: path.to_string() })?;

        let removed = if meta.is_dir() {
            fs::remove_dir_all(&target.path)
        } else {
            fs::remove_file(&target.path)
        };
        removed.map_err(|e| ToolError::io(path, e))?;

        log::info!("deleted {}", path);
        Ok(format!("File deleted: {}", path))
    }

    // ========================================================================
    // INSERT
    // ========================================================================

    /// Insert `text` as a new line before 0-based line `insert_line`.
    /// `insert_line == line_count` appends.
    pub fn insert(&self, path: &str, insert_line: i64, text: &str) -> Result<String, ToolError> {
        let target = self.resolve_for(Operation::Insert, path)?;
        let content = read_existing_file(&target)?;

        let mut lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();
        let line_count = lines.len();

        if insert_line < 0 || insert_line as usize > line_count {
            return Err(ToolError::LineOutOfRange {
                path: path.to_string(),
                line: insert_line,
                line_count,
            });
        }
        let index = insert_line as usize;

        if index == line_count {
            if let Some(last) = lines.last_mut() {
                if !last.ends_with('\n') {
                    last.push('\n');
                }
            }
        }
        lines.insert(index, format!("{}\n", text));

        fs::write(&target.path, lines.concat()).map_err(|e| ToolError::io(path, e))?;
        Ok(format!("Text inserted at line {} in {}", insert_line, path))
    }

    // ========================================================================
    // RENAME
    // ========================================================================

    pub fn rename(&self, old_path: &str, new_path: &str) -> Result<String, ToolError> {
        let source = self.mounts.resolve_entry(old_path)?;
        let destination = self.mounts.resolve_entry(new_path)?;

        gate::authorize(Operation::Rename, &source)?;
        // Moving into the read-only mount would mutate it
        gate::authorize(Operation::Rename, &destination)?;

        if source.is_root(&self.mounts) {
            return Err(ToolError::MountRoot { operation: "rename", path: old_path.to_string() });
        }
        if fs::symlink_metadata(&source.path).is_err() {
            return Err(ToolError::NotFound { path: old_path.to_string() });
        }
        if fs::symlink_metadata(&destination.path).is_ok() {
            return Err(ToolError::AlreadyExists { path: new_path.to_string() });
        }
        // Checked before any parent directory is created
        if destination.path.starts_with(&source.path) {
            return Err(ToolError::MoveIntoSelf {
                old_path: old_path.to_string(),
                new_path: new_path.to_string(),
            });
        }

        if let Some(parent) = destination.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ToolError::io(new_path, e))?;
        }
        fs::rename(&source.path, &destination.path).map_err(|e| ToolError::io(old_path, e))?;

        log::info!("renamed {} -> {}", old_path, new_path);
        Ok(format!("File renamed: {} -> {}", old_path, new_path))
    }

    // ========================================================================
    // STR_REPLACE
    // ========================================================================

    /// Replace the single occurrence of `old_str`. Zero or several matches are refused.
    pub fn str_replace(&self, path: &str, old_str: &str, new_str: &str) -> Result<String, ToolError> {
        let target = self.resolve_for(Operation::StrReplace, path)?;
        let content = read_existing_file(&target)?;

        if old_str.is_empty() {
            return Err(ToolError::EmptyOldStr { path: path.to_string() });
        }

        let count = content.matches(old_str).count();
        if count != 1 {
            return Err(ToolError::MatchCount { path: path.to_string(), count });
        }

        let updated = content.replacen(old_str, new_str, 1);
        fs::write(&target.path, updated).map_err(|e| ToolError::io(path, e))?;
        Ok(format!("File {} has been edited", path))
    }
}

fn list_directory(target: &Resolved) -> Result<String, ToolError> {
    let path = &target.virtual_path;
    let entries = fs::read_dir(&target.path).map_err(|e| ToolError::io(path, e))?;

    let mut items = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ToolError::io(path, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        items.push(if is_dir { format!("{}/", name) } else { name });
    }
    items.sort();

    if items.is_empty() {
        return Ok(format!("Directory: {}\n(empty)", path));
    }
    let listing: Vec<String> = items.iter().map(|item| format!("- {}", item)).collect();
    Ok(format!("Directory: {}\n{}", path, listing.join("\n")))
}

fn read_existing_file(target: &Resolved) -> Result<String, ToolError> {
    let path = &target.virtual_path;
    // Directories count as missing files
    if !target.path.is_file() {
        return Err(ToolError::NotFound { path: path.clone() });
    }
    fs::read_to_string(&target.path).map_err(|e| ToolError::io(path, e))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::{tempdir, TempDir};

    fn setup() -> (TempDir, MemoryTool) {
        let dir = tempdir().unwrap();
        let mounts = MountTable::new(&dir.path().join("user_files"), &dir.path().join("responses")).unwrap();
        (dir, MemoryTool::new(mounts))
    }

    fn read(dir: &TempDir, rel: &str) -> String {
        std::fs::read_to_string(dir.path().join(rel)).unwrap()
    }

    #[test]
    fn create_then_view_round_trips() {
        let (_dir, tool) = setup();
        tool.create("/responses/answer.txt", "alpha\nbeta\ngamma").unwrap();
        let out = tool.view("/responses/answer.txt", None).unwrap();
        assert_eq!(out, "   1: alpha\n   2: beta\n   3: gamma");
    }

    #[test]
    fn create_makes_parent_directories() {
        let (dir, tool) = setup();
        tool.create("/responses/deep/nested/a.txt", "x").unwrap();
        assert_eq!(read(&dir, "responses/deep/nested/a.txt"), "x");
    }

    #[test]
    fn create_twice_keeps_first_content() {
        let (dir, tool) = setup();
        tool.create("/responses/a.txt", "first").unwrap();
        let err = tool.create("/responses/a.txt", "second").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(read(&dir, "responses/a.txt"), "first");
    }

    #[test]
    fn view_range_slices_with_absolute_numbers() {
        let (_dir, tool) = setup();
        tool.create("/responses/a.txt", "l1\nl2\nl3\nl4\nl5\n").unwrap();
        assert_eq!(tool.view("/responses/a.txt", Some([2, 3])).unwrap(), "   2: l2\n   3: l3");
        assert_eq!(tool.view("/responses/a.txt", Some([4, -1])).unwrap(), "   4: l4\n   5: l5");
        assert_eq!(tool.view("/responses/a.txt", Some([0, 1])).unwrap(), "   1: l1");
        assert_eq!(tool.view("/responses/a.txt", Some([4, 99])).unwrap(), "   4: l4\n   5: l5");
        assert_eq!(tool.view("/responses/a.txt", Some([9, -1])).unwrap(), "");
    }

    #[test]
    fn view_directory_lists_sorted_children() {
        let (dir, tool) = setup();
        tool.create("/responses/b.txt", "").unwrap();
        tool.create("/responses/a.txt", "").unwrap();
        tool.create("/responses/sub/c.txt", "").unwrap();
        std::fs::write(dir.path().join("responses/.hidden"), "h").unwrap();

        let out = tool.view("/responses", None).unwrap();
        assert_eq!(out, "Directory: /responses\n- a.txt\n- b.txt\n- sub/");
    }

    #[test]
    fn view_directory_with_only_hidden_entries_is_empty() {
        let (dir, tool) = setup();
        std::fs::write(dir.path().join("user_files/.DS_Store"), "x").unwrap();
        std::fs::create_dir_all(dir.path().join("user_files/.cache")).unwrap();
        let out = tool.view("/user_files", None).unwrap();
        assert_eq!(out, "Directory: /user_files\n(empty)");
    }

    #[test]
    fn view_reads_uploaded_document() {
        let (dir, tool) = setup();
        std::fs::write(dir.path().join("user_files/data.json"), r#"{"k":1}"#).unwrap();
        let out = tool.view("/user_files/data.json", None).unwrap();
        assert_eq!(out, "   1: {\n   2:   \"k\": 1\n   3: }");
    }

    #[test]
    fn view_missing_and_unsupported() {
        let (dir, tool) = setup();
        let err = tool.view("/responses/missing.txt", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        std::fs::write(dir.path().join("user_files/tool.exe"), "MZ").unwrap();
        let err = tool.view("/user_files/tool.exe", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Extraction);
        assert!(err.to_string().contains(".exe"));
    }

    #[test]
    fn traversal_is_rejected_before_io() {
        let (_dir, tool) = setup();
        let err = tool.view("/user_files/../../etc/passwd", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathEscape);
    }

    #[test]
    fn mutations_on_user_files_are_denied_without_changes() {
        let (dir, tool) = setup();
        std::fs::write(dir.path().join("user_files/doc.txt"), "one\ntwo\n").unwrap();

        let commands = vec![
            MemoryCommand::Create { path: "/user_files/new.txt".into(), file_text: Some("x".into()) },
            MemoryCommand::Delete { path: "/user_files/doc.txt".into() },
            MemoryCommand::Insert { path: "/user_files/doc.txt".into(), insert_line: 0, insert_text: Some("x".into()) },
            MemoryCommand::Rename { old_path: "/user_files/doc.txt".into(), new_path: "/responses/doc.txt".into() },
            MemoryCommand::StrReplace { path: "/user_files/doc.txt".into(), old_str: "one".into(), new_str: "1".into() },
        ];
        for command in &commands {
            let err = tool.execute(command).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Permission, "{:?}", command);
        }

        assert_eq!(read(&dir, "user_files/doc.txt"), "one\ntwo\n");
        assert!(!dir.path().join("user_files/new.txt").exists());
        assert!(!dir.path().join("responses/doc.txt").exists());
    }

    #[test]
    fn rename_into_user_files_is_denied() {
        let (dir, tool) = setup();
        tool.create("/responses/a.txt", "a").unwrap();
        let err = tool.rename("/responses/a.txt", "/user_files/a.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Permission);
        assert_eq!(read(&dir, "responses/a.txt"), "a");
    }

    #[test]
    fn insert_at_bounds() {
        let (dir, tool) = setup();
        tool.create("/responses/a.txt", "one\ntwo\nthree\n").unwrap();

        tool.insert("/responses/a.txt", 0, "zero").unwrap();
        assert_eq!(read(&dir, "responses/a.txt"), "zero\none\ntwo\nthree\n");

        tool.insert("/responses/a.txt", 4, "four").unwrap();
        assert_eq!(read(&dir, "responses/a.txt"), "zero\none\ntwo\nthree\nfour\n");

        let err = tool.insert("/responses/a.txt", 6, "six").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("between 0 and 5"));

        let err = tool.insert("/responses/a.txt", -1, "neg").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn insert_on_three_line_file() {
        let (dir, tool) = setup();
        tool.create("/responses/a.txt", "a\nb\nc\n").unwrap();
        tool.insert("/responses/a.txt", 3, "d").unwrap();
        assert_eq!(read(&dir, "responses/a.txt"), "a\nb\nc\nd\n");

        tool.delete("/responses/a.txt").unwrap();
        tool.create("/responses/a.txt", "a\nb\nc\n").unwrap();
        let err = tool.insert("/responses/a.txt", 4, "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(read(&dir, "responses/a.txt"), "a\nb\nc\n");
    }

    #[test]
    fn insert_appends_after_unterminated_last_line() {
        let (dir, tool) = setup();
        tool.create("/responses/a.txt", "a\nb").unwrap();
        tool.insert("/responses/a.txt", 2, "c").unwrap();
        assert_eq!(read(&dir, "responses/a.txt"), "a\nb\nc\n");
    }

    #[test]
    fn insert_into_empty_file() {
        let (dir, tool) = setup();
        tool.create("/responses/empty.txt", "").unwrap();
        tool.insert("/responses/empty.txt", 0, "first").unwrap();
        assert_eq!(read(&dir, "responses/empty.txt"), "first\n");
    }

    #[test]
    fn insert_missing_file() {
        let (_dir, tool) = setup();
        let err = tool.insert("/responses/none.txt", 0, "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn str_replace_requires_unique_match() {
        let (dir, tool) = setup();
        tool.create("/responses/a.txt", "cat dog cat").unwrap();

        let err = tool.str_replace("/responses/a.txt", "bird", "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("found 0 occurrences"));

        let err = tool.str_replace("/responses/a.txt", "cat", "x").unwrap_err();
        assert!(err.to_string().contains("found 2 occurrences"));

        let err = tool.str_replace("/responses/a.txt", "", "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(read(&dir, "responses/a.txt"), "cat dog cat");

        tool.str_replace("/responses/a.txt", "dog", "wolf").unwrap();
        assert_eq!(read(&dir, "responses/a.txt"), "cat wolf cat");
    }

    #[test]
    fn str_replace_missing_file() {
        let (_dir, tool) = setup();
        let err = tool.str_replace("/responses/none.txt", "a", "b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn rename_onto_existing_leaves_both() {
        let (dir, tool) = setup();
        tool.create("/responses/a.txt", "A").unwrap();
        tool.create("/responses/b.txt", "B").unwrap();
        let err = tool.rename("/responses/a.txt", "/responses/b.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(read(&dir, "responses/a.txt"), "A");
        assert_eq!(read(&dir, "responses/b.txt"), "B");
    }

    #[test]
    fn rename_moves_content() {
        let (_dir, tool) = setup();
        tool.create("/responses/a.txt", "hello").unwrap();
        tool.rename("/responses/a.txt", "/responses/archive/b.txt").unwrap();

        let err = tool.view("/responses/a.txt", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(tool.view("/responses/archive/b.txt", None).unwrap(), "   1: hello");
    }

    #[test]
    fn rename_missing_source_and_escaping_destination() {
        let (_dir, tool) = setup();
        let err = tool.rename("/responses/none.txt", "/responses/b.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        tool.create("/responses/a.txt", "a").unwrap();
        let err = tool.rename("/responses/a.txt", "/responses/../../x.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathEscape);
    }

    #[test]
    fn delete_file_and_refuse_root() {
        let (dir, tool) = setup();
        tool.create("/responses/a.txt", "a").unwrap();
        tool.delete("/responses/a.txt").unwrap();
        assert!(!dir.path().join("responses/a.txt").exists());

        let err = tool.delete("/responses/a.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = tool.delete("/responses").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(dir.path().join("responses").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn delete_symlink_removes_link_not_target() {
        let (dir, tool) = setup();
        tool.create("/responses/real.txt", "keep me").unwrap();
        std::os::unix::fs::symlink(dir.path().join("responses/real.txt"), dir.path().join("responses/link.txt")).unwrap();

        tool.delete("/responses/link.txt").unwrap();
        assert!(std::fs::symlink_metadata(dir.path().join("responses/link.txt")).is_err());
        assert_eq!(read(&dir, "responses/real.txt"), "keep me");
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_can_be_deleted() {
        let (dir, tool) = setup();
        std::os::unix::fs::symlink(dir.path().join("responses/gone.txt"), dir.path().join("responses/stale.txt")).unwrap();
        assert_eq!(tool.view("/responses/stale.txt", None).unwrap_err().kind(), ErrorKind::PathEscape);

        tool.delete("/responses/stale.txt").unwrap();
        assert!(std::fs::symlink_metadata(dir.path().join("responses/stale.txt")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn rename_symlink_moves_link_not_target() {
        let (dir, tool) = setup();
        tool.create("/responses/real.txt", "data").unwrap();
        std::os::unix::fs::symlink(dir.path().join("responses/real.txt"), dir.path().join("responses/link.txt")).unwrap();

        tool.rename("/responses/link.txt", "/responses/moved.txt").unwrap();
        let moved = std::fs::symlink_metadata(dir.path().join("responses/moved.txt")).unwrap();
        assert!(moved.file_type().is_symlink());
        assert_eq!(read(&dir, "responses/real.txt"), "data");
    }

    #[test]
    fn rename_into_own_subtree_leaves_nothing_behind() {
        let (dir, tool) = setup();
        tool.create("/responses/d/a.txt", "a").unwrap();

        let err = tool.rename("/responses/d", "/responses/d/sub/d2").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!dir.path().join("responses/d/sub").exists());
        assert_eq!(read(&dir, "responses/d/a.txt"), "a");

        tool.rename("/responses/d/a.txt", "/responses/d/a.txt.bak").unwrap();
    }

    #[test]
    fn edits_on_a_directory_report_not_found() {
        let (_dir, tool) = setup();
        tool.create("/responses/folder/a.txt", "a").unwrap();

        let err = tool.insert("/responses/folder", 0, "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = tool.str_replace("/responses/folder", "a", "b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn command_deserializes_from_tool_input() {
        let cmd: MemoryCommand = serde_json::from_str(
            r#"{"command":"view","path":"/responses","view_range":[1,-1]}"#).unwrap();
        assert_eq!(cmd, MemoryCommand::View { path: "/responses".into(), view_range: Some([1, -1]) });

        let cmd: MemoryCommand = serde_json::from_str(
            r#"{"command":"str_replace","path":"/responses/a.txt","old_str":"a","new_str":"b"}"#).unwrap();
        assert_eq!(cmd.operation(), Operation::StrReplace);

        let cmd: MemoryCommand = serde_json::from_str(
            r#"{"command":"create","path":"/responses/a.txt"}"#).unwrap();
        assert_eq!(cmd, MemoryCommand::Create { path: "/responses/a.txt".into(), file_text: None });

        assert!(serde_json::from_str::<MemoryCommand>(r#"{"command":"chmod","path":"/x"}"#).is_err());
    }
}
