// Memgate - Configuration
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Mount roots, model settings, upload limits. Loaded from an optional JSON
// file, defaults rooted at the install root, a few environment overrides.

use crate::extract::DEFAULT_ROW_CAP;
use crate::paths;
use crate::validate::{default_allowed_extensions, DEFAULT_MAX_UPLOAD_SIZE};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Master configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemgateConfig {
    pub version: String,
    /// Root of the read-only /user_files mount
    pub user_files_dir: PathBuf,
    /// Root of the read-write /responses mount
    pub responses_dir: PathBuf,
    /// LMDB session ledger directory
    pub state_dir: PathBuf,
    pub api: ApiConfig,
    pub max_upload_size: u64,
    pub allowed_extensions: Vec<String>,
    pub row_cap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Name of the environment variable holding the API key
    pub key_env: String,
    pub model: String,
    pub betas: Vec<String>,
    pub max_tokens: u32,
    /// Upper bound on model round-trips per query
    pub max_turns: u32,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            key_env: "CLAUDE_API".to_string(),
            model: "claude-sonnet-4-6".to_string(),
            betas: vec![
                "context-1m-2025-08-07".to_string(),
                "context-management-2025-06-27".to_string(),
            ],
            max_tokens: 8000,
            max_turns: 40,
            timeout_secs: 600,
        }
    }
}

impl Default for MemgateConfig {
    fn default() -> Self {
        let root = paths::memgate_root();
        Self {
            version: "1.0.0".to_string(),
            user_files_dir: paths::default_user_files_dir(root),
            responses_dir: paths::default_responses_dir(root),
            state_dir: paths::default_state_dir(root),
            api: ApiConfig::default(),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            allowed_extensions: default_allowed_extensions(),
            row_cap: DEFAULT_ROW_CAP,
        }
    }
}

impl MemgateConfig {
    /// Load config from JSON file, falling back to defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {:?}", path))?;
            let config: Self = serde_json::from_str(&content)
                .with_context(|| format!("Invalid config JSON in {:?}", path))?;
            Ok(config)
        } else {
            log::warn!("Config not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save config to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply MEMGATE_USER_FILES, MEMGATE_RESPONSES and MEMGATE_MODEL overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("MEMGATE_USER_FILES") {
            self.user_files_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("MEMGATE_RESPONSES") {
            self.responses_dir = PathBuf::from(dir);
        }
        if let Some(model) = lookup("MEMGATE_MODEL") {
            self.api.model = model;
        }
    }

    /// API key from the configured environment variable
    pub fn api_key(&self) -> anyhow::Result<String> {
        std::env::var(&self.api.key_env)
            .with_context(|| format!("API key not set: export {}", self.api.key_env))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_service_limits() {
        let config = MemgateConfig::default();
        assert_eq!(config.max_upload_size, 100 * 1024 * 1024);
        assert_eq!(config.row_cap, 1000);
        assert_eq!(config.api.max_tokens, 8000);
        assert_eq!(config.api.key_env, "CLAUDE_API");
        assert!(config.allowed_extensions.contains(&".xlsx".to_string()));
        assert!(config.user_files_dir.ends_with("storage/user_files"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let config = MemgateConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.version, "1.0.0");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("memgate.json");
        std::fs::write(&path, r#"{"row_cap": 50, "api": {"model": "test-model"}}"#).unwrap();
        let config = MemgateConfig::load(&path).unwrap();
        assert_eq!(config.row_cap, 50);
        assert_eq!(config.api.model, "test-model");
        assert_eq!(config.api.max_tokens, 8000);
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("memgate.json");
        let mut config = MemgateConfig::default();
        config.max_upload_size = 42;
        config.save(&path).unwrap();
        assert_eq!(MemgateConfig::load(&path).unwrap().max_upload_size, 42);
    }

    #[test]
    fn overrides_replace_dirs_and_model() {
        let mut config = MemgateConfig::default();
        config.apply_overrides(|key| match key {
            "MEMGATE_RESPONSES" => Some("/data/out".to_string()),
            "MEMGATE_MODEL" => Some("m".to_string()),
            _ => None,
        });
        assert_eq!(config.responses_dir, PathBuf::from("/data/out"));
        assert_eq!(config.api.model, "m");
        assert!(config.user_files_dir.ends_with("storage/user_files"));
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("memgate.json");
        std::fs::write(&path, "{oops").unwrap();
        assert!(MemgateConfig::load(&path).is_err());
    }
}
