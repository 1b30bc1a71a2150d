//! Keccak-256 identity hashes
//!
//! Block hashes are rendered as `0x`-prefixed lowercase hex, transaction
//! hashes as bare lowercase hex. Both forms are what the ledger's clients
//! already look records up by.

use crate::block::{Block, HeaderSchema};
use crate::encoding::{encode_block, encode_transaction};
use crate::error::Result;
use crate::transaction::Transaction;
use sha3::{Digest, Keccak256};

pub type Keccak256Hash = [u8; 32];

/// Digest a sequence of chunks, fed to the hasher in order.
pub fn keccak256_chunks<I, T>(chunks: I) -> Keccak256Hash
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut hasher = Keccak256::new();
    for chunk in chunks {
        hasher.update(chunk.as_ref());
    }
    hasher.finalize().into()
}

pub fn block_hash(block: &Block, schema: HeaderSchema) -> Result<String> {
    let digest = keccak256_chunks(encode_block(block, schema)?);
    Ok(format!("0x{}", hex::encode(digest)))
}

pub fn transaction_hash(tx: &Transaction) -> Result<String> {
    Ok(hex::encode(keccak256_chunks(encode_transaction(tx)?)))
}

impl Block {
    /// Identity hash under the given header schema.
    pub fn hash(&self, schema: HeaderSchema) -> Result<String> {
        block_hash(self, schema)
    }
}

impl Transaction {
    pub fn hash(&self) -> Result<String> {
        transaction_hash(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockHeader;
    use crate::error::LedgerError;
    use crate::transaction::Signature;
    use serde_json::json;

    fn sample_tx() -> Transaction {
        Transaction::new("A", "B", 10, 1, Signature::new("27", "0xr", "0xs"))
    }

    fn sample_block() -> Block {
        let header = BlockHeader::new("0x00", "0xminer", "0xstate", "0xroot", 1, 1700, json!([]));
        Block::new(header, vec![sample_tx()])
    }

    #[test]
    fn test_keccak_empty_input() {
        let empty: [&[u8]; 0] = [];
        assert_eq!(
            hex::encode(keccak256_chunks(empty)),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_chunking_does_not_change_digest() {
        assert_eq!(
            keccak256_chunks(["AB", "10", "1"]),
            keccak256_chunks(["AB101"])
        );
    }

    #[test]
    fn test_transaction_hash_format() {
        let hash = sample_tx().hash().unwrap();
        assert_eq!(hash.len(), 64);
        assert!(!hash.starts_with("0x"));
        assert!(hash.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_eq!(hash, hex::encode(keccak256_chunks(["AB10127", "0xr0xs"])));
    }

    #[test]
    fn test_block_hash_format() {
        let hash = sample_block().hash(HeaderSchema::Legacy).unwrap();
        assert_eq!(hash.len(), 66);
        assert!(hash.starts_with("0x"));
        assert_eq!(hash, hash.to_lowercase());
    }

    #[test]
    fn test_transaction_hash_is_deterministic() {
        let a = sample_tx();
        let b: Transaction = serde_json::from_str(&serde_json::to_string(&a).unwrap()).unwrap();
        assert_eq!(a.hash().unwrap(), b.hash().unwrap());
    }

    #[test]
    fn test_transaction_hash_is_field_sensitive() {
        let base = sample_tx().hash().unwrap();
        let mutations: [fn(&mut Transaction); 7] = [
            |tx| tx.set_field("sender", "A2"),
            |tx| tx.set_field("receiver", "B2"),
            |tx| tx.set_field("value", 11),
            |tx| tx.set_field("nonce", 2),
            |tx| tx.set_field("v", "28"),
            |tx| tx.set_field("r", "0xr2"),
            |tx| tx.set_field("s", "0xs2"),
        ];
        for mutate in mutations {
            let mut tx = sample_tx();
            mutate(&mut tx);
            assert_ne!(tx.hash().unwrap(), base);
        }
    }

    #[test]
    fn test_block_hash_is_deterministic_across_instances() {
        let a = sample_block();
        let json = serde_json::to_string(&a).unwrap();
        let b: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(
            a.hash(HeaderSchema::Legacy).unwrap(),
            b.hash(HeaderSchema::Legacy).unwrap()
        );
    }

    #[test]
    fn test_block_hash_covers_transactions() {
        let a = sample_block();
        let mut b = sample_block();
        b.txs[0].set_field("value", 11);
        assert_ne!(
            a.hash(HeaderSchema::Legacy).unwrap(),
            b.hash(HeaderSchema::Legacy).unwrap()
        );
    }

    #[test]
    fn test_schemas_produce_different_hashes() {
        let mut block = sample_block();
        block.header = block.header.with_difficulty(1, 1, 0);
        assert_ne!(
            block.hash(HeaderSchema::Legacy).unwrap(),
            block.hash(HeaderSchema::Difficulty).unwrap()
        );
    }

    #[test]
    fn test_incomplete_transaction_is_encoding_failure() {
        let mut tx = sample_tx();
        tx.remove_field("r");
        assert!(matches!(tx.hash(), Err(LedgerError::EncodingFailure(_))));
    }

    // Digests below were produced by hashing the same records with the
    // ledger's existing JavaScript service.
    const STORED_BLOCK: &str = r#"{"header":{"parent_hash":"0xparent","miner":"0xminer","state_root":"0xstate","transactions_root":"0xroot","number":7,"timestamp":1700000000,"extra_data":{"gas":1.0,"big":1e21,"note":"caf\u00e9 \u20ac"}},"txs":[{"sender":"A","receiver":"B","value":10,"v":"27","r":"0xr","s":"0xs","nonce":1,"hash":"abc","memo":null},{"sender":"C","receiver":"D","value":2.0,"nonce":0,"v":"28","r":"0xr2","s":"0xs2"}]}"#;

    #[test]
    fn test_known_block_hashes() {
        assert_eq!(
            sample_block().hash(HeaderSchema::Legacy).unwrap(),
            "0x3a25d40fb11945c572e792b5459e7c260b7a783e18e9d5bc2479b4f50ced1622"
        );

        let stored: Block = serde_json::from_str(STORED_BLOCK).unwrap();
        assert_eq!(
            stored.hash(HeaderSchema::Legacy).unwrap(),
            "0x36d71e795a7e079cbb7fefccdf2e2efd9782c861f93b2b9c820e5b1037eb3907"
        );
    }

    #[test]
    fn test_known_transaction_hashes() {
        assert_eq!(
            sample_tx().hash().unwrap(),
            "2c77816e6e7f259d4a3adaa36777e827ce46917264546f89342bdf9bc72b8188"
        );

        let stored: Block = serde_json::from_str(STORED_BLOCK).unwrap();
        assert_eq!(
            stored.txs[0].hash().unwrap(),
            "2c77816e6e7f259d4a3adaa36777e827ce46917264546f89342bdf9bc72b8188"
        );
        assert_eq!(
            stored.txs[1].hash().unwrap(),
            "145207a0b7e6e20e3c96bba17cd80da0e0d59bb48357e65ccbc3b16243e6f66b"
        );
    }
}
