//! Pending pool of submitted, not yet included transactions
//!
//! The pool is a JSON array persisted on disk. Entries are appended in arrival
//! order and never rewritten or removed here: existing entries are carried
//! over as raw JSON, whatever shape earlier writers gave them. Submissions
//! carry signature components; raw key material is refused.

use crate::config::StoreConfig;
use crate::error::{LedgerError, Result};
use crate::persistence::{init_json_file, read_json, write_json_atomic};
use crate::transaction::Signature;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Field names that indicate private key material in a submission.
const KEY_MATERIAL_FIELDS: &[&str] = &["pk", "private_key", "privateKey", "secret_key"];

/// An accepted entry in the pending pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub from: String,
    pub to: String,
    pub value: u64,
    #[serde(flatten)]
    pub signature: Signature,
}

/// A submission as received from a caller, before presence checks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitRequest {
    pub from: Option<String>,
    pub to: Option<String>,
    pub value: Option<u64>,
    pub v: Option<String>,
    pub r: Option<String>,
    pub s: Option<String>,
}

impl SubmitRequest {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        value: u64,
        signature: Signature,
    ) -> Self {
        SubmitRequest {
            from: Some(from.into()),
            to: Some(to.into()),
            value: Some(value),
            v: Some(signature.v),
            r: Some(signature.r),
            s: Some(signature.s),
        }
    }

    /// Parse an untyped payload, reporting key material and unknown or
    /// mistyped fields as caller errors.
    pub fn from_value(payload: serde_json::Value) -> Result<Self> {
        if let Some(obj) = payload.as_object() {
            if let Some(field) = KEY_MATERIAL_FIELDS.iter().find(|f| obj.contains_key(**f)) {
                return Err(LedgerError::CallerError(format!(
                    "Field '{}' carries key material and is not accepted; submit the signature components v, r and s instead",
                    field
                )));
            }
        }
        serde_json::from_value(payload)
            .map_err(|e| LedgerError::CallerError(format!("Malformed transaction: {}", e)))
    }

    /// Check that every required field is present and non-empty.
    pub fn validate(self) -> Result<PendingTransaction> {
        let mut missing = Vec::new();
        let mut take = |name: &'static str, field: Option<String>| match field {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                missing.push(name);
                String::new()
            }
        };

        let from = take("from", self.from);
        let to = take("to", self.to);
        let v = take("v", self.v);
        let r = take("r", self.r);
        let s = take("s", self.s);
        if self.value.is_none() {
            missing.push("value");
        }

        if !missing.is_empty() {
            return Err(LedgerError::CallerError(format!(
                "Please provide from, to, value, v, r and s; missing: {}",
                missing.join(", ")
            )));
        }

        Ok(PendingTransaction {
            from,
            to,
            value: self.value.unwrap_or_default(),
            signature: Signature { v, r, s },
        })
    }
}

/// File-backed pending pool. Appends from this process are serialized by a
/// writer lock, and every rewrite replaces the file atomically.
#[derive(Debug)]
pub struct PendingPool {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl PendingPool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PendingPool {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(&config.mempool_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty pool file if none exists. Returns whether it was created.
    pub fn init(&self) -> Result<bool> {
        let _guard = self.write_lock.lock();
        init_json_file(&self.path, &Vec::<Value>::new())
    }

    /// Every entry as stored, in arrival order.
    pub fn records(&self) -> Result<Vec<Value>> {
        read_json(&self.path)
    }

    /// Entries in arrival order, skipping records that do not have the
    /// shape this crate submits.
    pub fn entries(&self) -> Result<Vec<PendingTransaction>> {
        Ok(self
            .records()?
            .into_iter()
            .filter_map(|record| serde_json::from_value(record).ok())
            .collect())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.records()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Validate and append one submission. Nothing is written when the
    /// submission is rejected.
    pub fn submit(&self, request: SubmitRequest) -> Result<()> {
        let entry = serde_json::to_value(request.validate()?)
            .map_err(|e| LedgerError::EncodingFailure(format!("pending transaction: {}", e)))?;

        let _guard = self.write_lock.lock();
        let mut pool = self.records()?;
        pool.push(entry);
        write_json_atomic(&self.path, &pool)?;

        tracing::debug!(pool_size = pool.len(), "pending transaction appended");
        Ok(())
    }
}
