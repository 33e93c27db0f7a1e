use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use log::warn;
use sled::{Db, Tree};
use thiserror::Error;

use super::block::Block;
use super::transaction::Transaction;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

/// Persistence collaborator for the ledger engine.
///
/// The engine never touches the storage medium directly; it loads each
/// aggregate once at startup and saves synchronously with every mutation.
/// Empty storage loads as empty collections.
pub trait Storage: Send + Sync {
    /// Loads the full account-id to balance mapping.
    fn load_balances(&self) -> Result<HashMap<String, f64>, StorageError>;

    /// Persists a single account balance.
    fn save_balance(&self, account: &str, amount: f64) -> Result<(), StorageError>;

    /// Loads the chain, ordered by block index.
    fn load_chain(&self) -> Result<Vec<Block>, StorageError>;

    /// Persists a newly appended block.
    fn append_block(&self, block: &Block) -> Result<(), StorageError>;

    /// Loads the pending transaction pool.
    fn load_mempool(&self) -> Result<Vec<Transaction>, StorageError>;

    /// Persists the pending transaction pool in full.
    fn save_mempool(&self, pool: &[Transaction]) -> Result<(), StorageError>;
}

const MEMPOOL_KEY: &str = "pending";

/// Sled-backed storage for node operation
pub struct SledStorage {
    db: Db,
    balances: Tree,
    blocks: Tree,
    mempool: Tree,
}

impl std::fmt::Debug for SledStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStorage").finish()
    }
}

impl SledStorage {
    /// Opens (or creates) the database at the given directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;

        let balances = db.open_tree("balances")?;
        let blocks = db.open_tree("blocks")?;
        let mempool = db.open_tree("mempool")?;

        Ok(Self {
            db,
            balances,
            blocks,
            mempool,
        })
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

impl Storage for SledStorage {
    fn load_balances(&self) -> Result<HashMap<String, f64>, StorageError> {
        let mut balances = HashMap::new();

        for result in self.balances.iter() {
            let (key, value) = result?;
            let account = String::from_utf8_lossy(key.as_ref()).to_string();

            match bincode::deserialize::<f64>(&value) {
                Ok(amount) => {
                    balances.insert(account, amount);
                }
                Err(e) => {
                    warn!("Skipping undecodable balance entry for {}: {}", account, e);
                }
            }
        }

        Ok(balances)
    }

    fn save_balance(&self, account: &str, amount: f64) -> Result<(), StorageError> {
        let value = bincode::serialize(&amount)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        self.balances.insert(account.as_bytes(), value)?;
        self.flush()
    }

    fn load_chain(&self) -> Result<Vec<Block>, StorageError> {
        let mut blocks = Vec::new();

        for result in self.blocks.iter() {
            let (key, value) = result?;
            let block: Block = bincode::deserialize(&value).map_err(|e| {
                let key_str = String::from_utf8_lossy(key.as_ref()).to_string();
                StorageError::DeserializationError(format!(
                    "Failed to deserialize block {}: {}",
                    key_str, e
                ))
            })?;

            blocks.push(block);
        }

        // Keys are big-endian indices, so iteration is already ordered, but
        // sort anyway in case the tree was written by an older layout.
        blocks.sort_by_key(|block| block.index);

        Ok(blocks)
    }

    fn append_block(&self, block: &Block) -> Result<(), StorageError> {
        let value = bincode::serialize(block)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        self.blocks.insert(block.index.to_be_bytes(), value)?;
        self.flush()
    }

    fn load_mempool(&self) -> Result<Vec<Transaction>, StorageError> {
        match self.mempool.get(MEMPOOL_KEY)? {
            Some(value) => bincode::deserialize(&value)
                .map_err(|e| StorageError::DeserializationError(e.to_string())),
            None => Ok(Vec::new()),
        }
    }

    fn save_mempool(&self, pool: &[Transaction]) -> Result<(), StorageError> {
        let value = bincode::serialize(pool)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        self.mempool.insert(MEMPOOL_KEY, value)?;
        self.flush()
    }
}

/// In-memory storage for tests and for running without a data directory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    balances: Mutex<HashMap<String, f64>>,
    chain: Mutex<Vec<Block>>,
    mempool: Mutex<Vec<Transaction>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn load_balances(&self) -> Result<HashMap<String, f64>, StorageError> {
        Ok(self.balances.lock().unwrap().clone())
    }

    fn save_balance(&self, account: &str, amount: f64) -> Result<(), StorageError> {
        self.balances
            .lock()
            .unwrap()
            .insert(account.to_string(), amount);
        Ok(())
    }

    fn load_chain(&self) -> Result<Vec<Block>, StorageError> {
        Ok(self.chain.lock().unwrap().clone())
    }

    fn append_block(&self, block: &Block) -> Result<(), StorageError> {
        self.chain.lock().unwrap().push(block.clone());
        Ok(())
    }

    fn load_mempool(&self) -> Result<Vec<Transaction>, StorageError> {
        Ok(self.mempool.lock().unwrap().clone())
    }

    fn save_mempool(&self, pool: &[Transaction]) -> Result<(), StorageError> {
        *self.mempool.lock().unwrap() = pool.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> Block {
        let tx = Transaction::coinbase("miner", 5.0).unwrap();
        Block::new(1, vec![tx], "previous_hash".to_string())
    }

    #[test]
    fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();

        storage.save_balance("Alice", 1000.0).unwrap();
        storage.save_balance("Alice", 898.0).unwrap();
        storage.save_balance("Bob", 1000.0).unwrap();

        let balances = storage.load_balances().unwrap();
        assert_eq!(balances.get("Alice"), Some(&898.0));
        assert_eq!(balances.get("Bob"), Some(&1000.0));

        let block = sample_block();
        storage.append_block(&block).unwrap();
        assert_eq!(storage.load_chain().unwrap().len(), 1);

        let pool = vec![Transaction::coinbase("miner", 5.0).unwrap()];
        storage.save_mempool(&pool).unwrap();
        assert_eq!(storage.load_mempool().unwrap().len(), 1);
    }

    #[test]
    fn test_sled_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SledStorage::open(dir.path()).unwrap();

        storage.save_balance("Alice", 898.0).unwrap();
        let balances = storage.load_balances().unwrap();
        assert_eq!(balances.get("Alice"), Some(&898.0));

        let genesis = Block::genesis();
        let block = sample_block();
        storage.append_block(&block).unwrap();
        storage.append_block(&genesis).unwrap();

        // Loading returns blocks ordered by index regardless of write order.
        let chain = storage.load_chain().unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].index, 0);
        assert_eq!(chain[1].index, 1);
        assert_eq!(chain[1].hash, block.hash);

        let pool = vec![Transaction::coinbase("miner", 5.0).unwrap()];
        storage.save_mempool(&pool).unwrap();
        let loaded = storage.load_mempool().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].txid, pool[0].txid);
    }

    #[test]
    fn test_empty_storage_loads_empty() {
        let storage = MemoryStorage::new();

        assert!(storage.load_balances().unwrap().is_empty());
        assert!(storage.load_chain().unwrap().is_empty());
        assert!(storage.load_mempool().unwrap().is_empty());
    }
}
