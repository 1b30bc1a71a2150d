//! Persistence layer for Chainview
//!
//! The ledger and the accounts are JSON documents maintained by the node that
//! produces blocks. This crate only reads them, loading each one in full for
//! every query.

use crate::account::Accounts;
use crate::block::Ledger;
use crate::config::StoreConfig;
use crate::error::{LedgerError, Result};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Abstraction for ledger backends. Every call returns a fresh snapshot.
pub trait LedgerSource: Send + Sync {
    fn load_ledger(&self) -> Result<Ledger>;
    fn load_accounts(&self) -> Result<Accounts>;
}

/// Ledger and accounts backed by JSON files on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    blocks_path: PathBuf,
    accounts_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(blocks_path: impl Into<PathBuf>, accounts_path: impl Into<PathBuf>) -> Self {
        JsonFileStore {
            blocks_path: blocks_path.into(),
            accounts_path: accounts_path.into(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(&config.blocks_path, &config.accounts_path)
    }

    pub fn blocks_path(&self) -> &Path {
        &self.blocks_path
    }

    pub fn accounts_path(&self) -> &Path {
        &self.accounts_path
    }
}

impl LedgerSource for JsonFileStore {
    fn load_ledger(&self) -> Result<Ledger> {
        read_json(&self.blocks_path)
    }

    fn load_accounts(&self) -> Result<Accounts> {
        read_json(&self.accounts_path)
    }
}

/// Read and parse a whole JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path).map_err(|e| {
        LedgerError::StoreUnavailable(format!("Failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        LedgerError::StoreUnavailable(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// Replace a JSON document atomically: write a sibling temp file, then rename
/// it over the target.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temp = NamedTempFile::new_in(dir).map_err(|e| {
        LedgerError::StoreUnavailable(format!("Failed to create temp file in {}: {}", dir.display(), e))
    })?;

    {
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| {
        LedgerError::StoreUnavailable(format!("Failed to replace {}: {}", path.display(), e))
    })?;
    Ok(())
}

/// Create `path` holding `initial` unless it already exists.
pub fn init_json_file<T: Serialize + ?Sized>(path: &Path, initial: &T) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    write_json_atomic(path, initial)?;
    tracing::info!("Initialized {}", path.display());
    Ok(true)
}

/// Simple in-memory source useful for tests and ephemeral runs.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    pub ledger: Arc<RwLock<Ledger>>,
    pub accounts: Arc<RwLock<Accounts>>,
}

impl InMemoryStore {
    pub fn new(ledger: Ledger, accounts: Accounts) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            accounts: Arc::new(RwLock::new(accounts)),
        }
    }

    pub fn set_ledger(&self, ledger: Ledger) {
        *self.ledger.write() = ledger;
    }

    pub fn set_accounts(&self, accounts: Accounts) {
        *self.accounts.write() = accounts;
    }
}

impl LedgerSource for InMemoryStore {
    fn load_ledger(&self) -> Result<Ledger> {
        Ok(self.ledger.read().clone())
    }

    fn load_accounts(&self) -> Result<Accounts> {
        Ok(self.accounts.read().clone())
    }
}
