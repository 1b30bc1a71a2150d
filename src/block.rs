//! Block structure and header schemas

use crate::transaction::Transactions;
use serde::{Deserialize, Deserializer, Serialize};

pub type Blocks = Vec<Block>;

/// Which header fields make up a block's identity.
///
/// Two header layouts exist for the same ledger. The schema is chosen by
/// configuration, never inferred from whichever fields a record happens to
/// carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderSchema {
    /// parent_hash, miner, state_root, transactions_root, number, timestamp,
    /// extra_data.
    #[default]
    Legacy,
    /// Legacy fields plus difficulty, total_difficulty and nonce.
    Difficulty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_difficulty: Option<u64>,
    pub number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    /// `None` when the key is absent; an explicit JSON `null` is `Some(Value::Null)`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub extra_data: Option<serde_json::Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl BlockHeader {
    /// Header with every legacy identity field set and no difficulty fields.
    pub fn new(
        parent_hash: impl Into<String>,
        miner: impl Into<String>,
        state_root: impl Into<String>,
        transactions_root: impl Into<String>,
        number: u64,
        timestamp: i64,
        extra_data: serde_json::Value,
    ) -> Self {
        BlockHeader {
            parent_hash: Some(parent_hash.into()),
            miner: Some(miner.into()),
            state_root: Some(state_root.into()),
            transactions_root: Some(transactions_root.into()),
            difficulty: None,
            total_difficulty: None,
            number,
            timestamp: Some(timestamp),
            nonce: None,
            extra_data: Some(extra_data),
        }
    }

    pub fn with_difficulty(mut self, difficulty: u64, total_difficulty: u64, nonce: u64) -> Self {
        self.difficulty = Some(difficulty);
        self.total_difficulty = Some(total_difficulty);
        self.nonce = Some(nonce);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub txs: Transactions,
}

impl Block {
    pub fn new(header: BlockHeader, txs: Transactions) -> Self {
        Block { header, txs }
    }

    pub fn number(&self) -> u64 {
        self.header.number
    }
}

/// The persisted ledger document: `{ "blocks": [...] }`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ledger {
    pub blocks: Blocks,
}

impl Ledger {
    pub fn new(blocks: Blocks) -> Self {
        Ledger { blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
