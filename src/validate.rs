// Memgate - Upload Validator
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Validates documents entering the read-only mount:
// - Filename sanitization (no separators, no leading dots)
// - Extension allowlist
// - File size limit
// Path confinement is checked by the caller BEFORE any of these.

use serde::{Deserialize, Serialize};

/// Default upload size limit: 100 MiB
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;

/// Document types the extraction layer understands
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    ".json", ".txt", ".xml", ".pdf", ".csv", ".xlsx", ".xls",
];

/// Validation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self { valid: true, errors: Vec::new() }
    }

    pub fn error(&mut self, msg: String) {
        self.valid = false;
        self.errors.push(msg);
    }
}

/// Reduce an uploaded filename to a safe flat ASCII name.
///
/// Path separators and whitespace become `_`, anything outside
/// `[A-Za-z0-9._-]` is dropped, leading and trailing `.`/`_` are stripped.
/// Returns None when nothing usable is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let spaced: String = name.chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Lowercase extension with leading dot, or empty string
pub fn extension_of(filename: &str) -> String {
    std::path::Path::new(filename)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Validate an upload's extension and size against the configured limits
pub fn validate_upload(
    filename: &str,
    size: u64,
    allowed_extensions: &[String],
    max_size: u64,
) -> ValidationResult {
    let mut result = ValidationResult::ok();

    let extension = extension_of(filename);
    if !allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&extension)) {
        let shown = if extension.is_empty() { "(none)" } else { extension.as_str() };
        result.error(format!(
            "Unsupported file type: {}. Allowed: {}", shown, allowed_extensions.join(", ")
        ));
    }

    if size > max_size {
        result.error(format!("File too large: {} bytes (max {})", size, max_size));
    }

    result
}

/// Default allowlist as owned strings for config
pub fn default_allowed_extensions() -> Vec<String> {
    DEFAULT_ALLOWED_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// TESTS
// ============================================================================
