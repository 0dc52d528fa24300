// Memgate - LMDB Storage
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Persists the session ledger to LMDB at the configured state dir.

use crate::session::Session;
use anyhow::Result;
use heed::types::*;
use heed::{Database, Env, EnvOpenOptions};
use std::path::Path;

/// LMDB storage for the session ledger
pub struct MemgateStorage {
    env: Env,
    /// string keys → JSON values
    db: Database<Str, Str>,
}

const SESSION_KEY: &str = "current_session";
const MAX_DB_SIZE: usize = 50 * 1024 * 1024;

impl MemgateStorage {
    /// Open or create LMDB at the given path
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(MAX_DB_SIZE)
                .max_dbs(2)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let db = env.create_database(&mut wtxn, Some("memgate_state"))?;
        wtxn.commit()?;

        log::info!("Memgate LMDB opened at {:?}", path);
        Ok(Self { env, db })
    }

    /// Save session state to LMDB
    pub fn save_session(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session)?;
        let mut wtxn = self.env.write_txn()?;
        self.db.put(&mut wtxn, SESSION_KEY, &json)?;
        wtxn.commit()?;
        Ok(())
    }

    /// Load session state from LMDB
    pub fn load_session(&self) -> Result<Option<Session>> {
        let rtxn = self.env.read_txn()?;
        match self.db.get(&rtxn, SESSION_KEY)? {
            Some(json) => {
                let session: Session = serde_json::from_str(json)?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// Drop the persisted session
    pub fn clear_session(&self) -> Result<bool> {
        let mut wtxn = self.env.write_txn()?;
        let deleted = self.db.delete(&mut wtxn, SESSION_KEY)?;
        wtxn.commit()?;
        Ok(deleted)
    }
}
