//! Query resolution over the persisted ledger
//!
//! There is no index: every lookup loads a fresh snapshot from the
//! [`LedgerSource`] and scans it in store order, recomputing identity hashes
//! where the lookup is by hash. The first match wins.

use crate::account::{find_account, Account};
use crate::block::{Block, HeaderSchema};
use crate::config::StoreConfig;
use crate::error::{LedgerError, Result};
use crate::persistence::{JsonFileStore, LedgerSource};
use crate::transaction::Transaction;
use std::sync::Arc;
use tracing::{debug, warn};

/// How a single block is addressed. Exactly one of number or hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockSelector {
    Number(u64),
    Hash(String),
}

impl BlockSelector {
    /// Build a selector from optional request parameters. An empty hash
    /// counts as absent; both or neither is a caller error.
    pub fn from_params(number: Option<u64>, hash: Option<String>) -> Result<Self> {
        let hash = hash.filter(|h| !h.trim().is_empty());
        match (number, hash) {
            (Some(number), None) => Ok(BlockSelector::Number(number)),
            (None, Some(hash)) => Ok(BlockSelector::Hash(hash)),
            (Some(_), Some(_)) => Err(LedgerError::CallerError(
                "Please provide only one of number or hash".to_string(),
            )),
            (None, None) => Err(LedgerError::CallerError(
                "Please provide either number or hash".to_string(),
            )),
        }
    }
}

/// Block with the greatest number. Ties keep the earliest block.
pub fn highest_block(blocks: &[Block]) -> Option<&Block> {
    let mut iter = blocks.iter();
    let mut highest = iter.next()?;
    for block in iter {
        if block.header.number > highest.header.number {
            highest = block;
        }
    }
    Some(highest)
}

pub fn find_block_by_number(blocks: &[Block], number: u64) -> Option<&Block> {
    blocks.iter().find(|b| b.header.number == number)
}

/// First block whose recomputed hash equals `hash`. A block that cannot be
/// encoded aborts the scan.
pub fn find_block_by_hash<'a>(
    blocks: &'a [Block],
    hash: &str,
    schema: HeaderSchema,
) -> Result<Option<&'a Block>> {
    for block in blocks {
        if block.hash(schema)? == hash {
            return Ok(Some(block));
        }
    }
    Ok(None)
}

/// First transaction, scanning blocks then their transactions in order, whose
/// recomputed hash equals `hash`.
pub fn find_transaction_by_hash<'a>(
    blocks: &'a [Block],
    hash: &str,
) -> Result<Option<&'a Transaction>> {
    for block in blocks {
        for tx in &block.txs {
            if tx.hash()? == hash {
                return Ok(Some(tx));
            }
        }
    }
    Ok(None)
}

/// Answers ledger and account queries against a [`LedgerSource`].
#[derive(Clone)]
pub struct QueryResolver {
    source: Arc<dyn LedgerSource>,
    schema: HeaderSchema,
}

impl QueryResolver {
    pub fn new(source: Arc<dyn LedgerSource>, schema: HeaderSchema) -> Self {
        QueryResolver { source, schema }
    }

    /// Resolver over the JSON files named in the store configuration.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(
            Arc::new(JsonFileStore::from_config(config)),
            config.header_schema,
        )
    }

    pub fn schema(&self) -> HeaderSchema {
        self.schema
    }

    pub fn highest_block(&self) -> Result<Block> {
        let ledger = self.source.load_ledger()?;
        highest_block(&ledger.blocks)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound("Ledger has no blocks".to_string()))
    }

    /// Number of the highest block.
    pub fn block_number(&self) -> Result<u64> {
        Ok(self.highest_block()?.header.number)
    }

    pub fn block(&self, selector: &BlockSelector) -> Result<Block> {
        match selector {
            BlockSelector::Number(number) => self.block_by_number(*number),
            BlockSelector::Hash(hash) => self.block_by_hash(hash),
        }
    }

    pub fn block_by_number(&self, number: u64) -> Result<Block> {
        let ledger = self.source.load_ledger()?;
        let matches = ledger.blocks.iter().filter(|b| b.header.number == number).count();
        if matches > 1 {
            warn!(number, matches, "duplicate block number, serving the first");
        }
        find_block_by_number(&ledger.blocks, number)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("Block {} not found", number)))
    }

    pub fn block_by_hash(&self, hash: &str) -> Result<Block> {
        let ledger = self.source.load_ledger()?;
        debug!(blocks = ledger.blocks.len(), hash, "scanning blocks by hash");
        find_block_by_hash(&ledger.blocks, hash, self.schema)?
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("Block {} not found", hash)))
    }

    pub fn transaction_by_hash(&self, hash: &str) -> Result<Transaction> {
        if hash.trim().is_empty() {
            return Err(LedgerError::CallerError(
                "Please provide a transaction hash".to_string(),
            ));
        }
        let ledger = self.source.load_ledger()?;
        debug!(blocks = ledger.blocks.len(), hash, "scanning transactions by hash");
        find_transaction_by_hash(&ledger.blocks, hash)?
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("Transaction {} not found", hash)))
    }

    pub fn account(&self, address: &str) -> Result<Account> {
        if address.trim().is_empty() {
            return Err(LedgerError::CallerError(
                "Please provide the address of the account to query".to_string(),
            ));
        }
        let accounts = self.source.load_accounts()?;
        find_account(&accounts, address)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("Account {} not found", address)))
    }

    pub fn account_nonce(&self, address: &str) -> Result<u64> {
        Ok(self.account(address)?.nonce)
    }

    pub fn account_balance(&self, address: &str) -> Result<u64> {
        Ok(self.account(address)?.balance)
    }
}
