// Memgate - Application Context
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Everything a command needs, built once at startup and passed explicitly:
// config, mount table, memory tool, document library, LMDB ledger.

use crate::config::MemgateConfig;
use crate::extract::FormatExtractor;
use crate::library::Library;
use crate::memory::MemoryTool;
use crate::mount::MountTable;
use crate::session::Session;
use crate::storage::MemgateStorage;
use anyhow::Context;

pub struct AppContext {
    pub config: MemgateConfig,
    pub tool: MemoryTool,
    pub library: Library,
    pub storage: MemgateStorage,
    pub session: Session,
}

impl AppContext {
    /// Open mounts and storage, restore the persisted session
    pub fn open(config: MemgateConfig) -> anyhow::Result<Self> {
        let mounts = MountTable::new(&config.user_files_dir, &config.responses_dir)
            .with_context(|| format!(
                "Failed to open mounts {:?} and {:?}", config.user_files_dir, config.responses_dir
            ))?;
        let storage = MemgateStorage::open(&config.state_dir)
            .with_context(|| format!("Failed to open LMDB at {:?}", config.state_dir))?;
        let session = storage.load_session()?.unwrap_or_default();

        let extractor = FormatExtractor::with_row_cap(config.row_cap);
        let tool = MemoryTool::with_extractor(mounts.clone(), Box::new(extractor));
        let library = Library::new(mounts, config.max_upload_size, config.allowed_extensions.clone());

        log::info!(
            "Mounts ready: /user_files -> {:?}, /responses -> {:?}",
            config.user_files_dir, config.responses_dir
        );
        Ok(Self { config, tool, library, storage, session })
    }

    /// Flush the session ledger to LMDB
    pub fn persist(&self) -> anyhow::Result<()> {
        self.storage.save_session(&self.session)
    }
}
