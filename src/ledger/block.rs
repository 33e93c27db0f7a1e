use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::digest::sha256_hex;
use super::transaction::Transaction;

/// Sentinel previous-hash of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// A sealed batch of transactions in the chain
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Block {
    /// Index of the block in the chain (0 is genesis)
    pub index: u64,

    /// Transactions included in this block, insertion order preserved
    pub transactions: Vec<Transaction>,

    /// Timestamp when the block was created
    #[schema(value_type = String, example = "2023-01-01T12:00:00Z")]
    pub timestamp: DateTime<Utc>,

    /// Hash of the previous block
    pub previous_hash: String,

    /// Proof-of-work search counter
    pub nonce: u64,

    /// Hash of the block contents (excluded from its own input)
    pub hash: String,
}

impl Block {
    /// Creates a new candidate block, timestamped now, with nonce 0.
    pub fn new(index: u64, transactions: Vec<Transaction>, previous_hash: String) -> Self {
        Self::new_at(index, transactions, previous_hash, Utc::now())
    }

    /// Creates a new candidate block with an explicit timestamp.
    pub fn new_at(
        index: u64,
        transactions: Vec<Transaction>,
        previous_hash: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut block = Block {
            index,
            transactions,
            timestamp,
            previous_hash,
            nonce: 0,
            hash: String::new(),
        };

        block.hash = block.compute_hash();
        block
    }

    /// Creates the genesis block: index 0, no transactions, sentinel parent.
    pub fn genesis() -> Self {
        Self::new(0, Vec::new(), GENESIS_PREVIOUS_HASH.to_string())
    }

    /// Recomputes the hash of the block.
    ///
    /// The digest covers the canonical JSON of {index, transactions,
    /// timestamp, previous_hash, nonce}; the stored hash itself is never
    /// part of its own input, so the result is a pure function of the five
    /// fields and can be recomputed identically at any time.
    pub fn compute_hash(&self) -> String {
        // serde_json's default map keeps keys sorted, which makes the
        // serialization canonical.
        let content = serde_json::json!({
            "index": self.index,
            "transactions": self.transactions,
            "timestamp": self.timestamp,
            "previous_hash": self.previous_hash,
            "nonce": self.nonce,
        });

        sha256_hex(&content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transactions() -> Vec<Transaction> {
        vec![
            Transaction::coinbase("miner1", 10.0).unwrap(),
            Transaction::coinbase("miner2", 20.0).unwrap(),
        ]
    }

    #[test]
    fn test_new_block() {
        let block = Block::new(1, sample_transactions(), "previous_hash".to_string());

        assert_eq!(block.index, 1);
        assert_eq!(block.nonce, 0);
        assert_eq!(block.previous_hash, "previous_hash");
        assert!(!block.hash.is_empty());
        assert_eq!(block.hash.len(), 64);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let block = Block::new(1, sample_transactions(), "previous_hash".to_string());

        assert_eq!(block.compute_hash(), block.compute_hash());
        assert_eq!(block.hash, block.compute_hash());
    }

    #[test]
    fn test_hash_excludes_itself() {
        let mut block = Block::new(1, Vec::new(), "previous_hash".to_string());
        let original = block.compute_hash();

        // Overwriting the stored hash must not change the recomputation.
        block.hash = "garbage".to_string();
        assert_eq!(block.compute_hash(), original);
    }

    #[test]
    fn test_nonce_changes_hash() {
        let mut block = Block::new(1, Vec::new(), "previous_hash".to_string());
        let before = block.compute_hash();

        block.nonce += 1;
        assert_ne!(block.compute_hash(), before);
    }

    #[test]
    fn test_genesis_block() {
        let genesis = Block::genesis();

        assert_eq!(genesis.index, 0);
        assert!(genesis.transactions.is_empty());
        assert_eq!(genesis.previous_hash, GENESIS_PREVIOUS_HASH);
    }
}
