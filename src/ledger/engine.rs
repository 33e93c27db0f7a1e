use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::account::AccountLedger;
use super::block::Block;
use super::mempool::Mempool;
use super::params::Params;
use super::pow::{self, SealOutcome};
use super::secrets::SecretProvider;
use super::storage::{Storage, StorageError};
use super::transaction::{Transaction, TransactionError};

/// Nonce attempts per proof-of-work batch before the search yields.
const SEAL_BATCH: u64 = 10_000;

/// Errors that can occur during engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("No transactions to mine")]
    EmptyMempool,

    #[error("Broken link at block {0}")]
    BrokenLink(u64),

    #[error("Hash mismatch at block {0}")]
    HashMismatch(u64),
}

/// Result of a successful mining run
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlockSummary {
    /// Index of the sealed block
    pub index: u64,

    /// Reward credited to the miner (base reward plus collected fees)
    pub reward: f64,

    /// Difficulty the proof-of-work search had to satisfy
    pub difficulty: u32,

    /// Hash of the sealed block
    pub hash: String,
}

/// The ledger engine: mempool admission, block sealing and chain validation.
///
/// Logically single-writer. The mempool lock is held across the whole
/// admission sequence (pending sum, balance check, debit, insert), which
/// keeps check-then-debit atomic under concurrent HTTP callers.
pub struct Engine {
    /// The chain of sealed blocks, genesis first
    chain: Mutex<Vec<Block>>,

    /// Admitted but unconfirmed transactions
    mempool: Mutex<Mempool>,

    /// Account balances
    ledger: AccountLedger,

    /// Signing secrets for the simulated identities
    secrets: Arc<dyn SecretProvider>,

    /// Reward, fee and difficulty parameters
    params: Params,

    /// Persistence collaborator
    storage: Arc<dyn Storage>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("params", &self.params)
            .finish()
    }
}

impl Engine {
    /// Loads the engine state from storage, creating and persisting the
    /// genesis block when the chain is empty.
    pub fn new(
        params: Params,
        secrets: Arc<dyn SecretProvider>,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, EngineError> {
        let ledger = AccountLedger::load(storage.clone())?;

        let mut chain = storage.load_chain()?;
        if chain.is_empty() {
            let genesis = Block::genesis();
            storage.append_block(&genesis)?;
            chain.push(genesis);
            info!("Created genesis block");
        } else {
            info!("Loaded chain with {} blocks", chain.len());
        }

        let mempool = Mempool::from_entries(storage.load_mempool()?);

        Ok(Engine {
            chain: Mutex::new(chain),
            mempool: Mutex::new(mempool),
            ledger,
            secrets,
            params,
            storage,
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Builds and signs a transaction for a sender whose secret is known.
    pub fn create_and_sign(
        &self,
        sender: &str,
        receiver: &str,
        amount: f64,
        fee: f64,
    ) -> Result<Transaction, EngineError> {
        let mut tx = Transaction::new(sender, receiver, amount, fee)?;
        tx.sign(self.secrets.as_ref())?;
        Ok(tx)
    }

    /// Admits a transaction into the mempool.
    ///
    /// Verifies the signature, checks the sender's confirmed balance net of
    /// already-pending outflows, then debits amount + fee immediately. That
    /// pessimistic reservation is the only double-spend defense: an admitted
    /// transaction can no longer be invalidated by a later one. On any
    /// rejection the engine state is unchanged.
    pub fn admit(&self, tx: Transaction) -> Result<String, EngineError> {
        if !tx.verify(self.secrets.as_ref()) {
            return Err(EngineError::InvalidSignature);
        }

        let mut pool = self.mempool.lock().unwrap();

        let pending_outgoing = pool.pending_outgoing(&tx.sender);
        let available = self.ledger.balance(&tx.sender) - pending_outgoing;
        let required = tx.total_outgoing();

        if available < required {
            return Err(EngineError::InsufficientFunds {
                required,
                available,
            });
        }

        // Cannot fail: required <= available <= confirmed balance, and the
        // pool lock serializes admissions.
        let _debited = self.ledger.debit(&tx.sender, required)?;
        debug_assert!(_debited);

        // Persist the would-be pool before touching the in-memory one. If
        // the write fails the reservation is refunded and the pool stays as
        // it was, on disk and in memory.
        let mut prospective = pool.entries().to_vec();
        prospective.push(tx.clone());

        if let Err(err) = self.storage.save_mempool(&prospective) {
            if let Err(refund_err) = self.ledger.credit(&tx.sender, required) {
                warn!(
                    "Failed to refund reservation of {} for {}: {}",
                    required, tx.sender, refund_err
                );
            }
            return Err(err.into());
        }

        let txid = tx.txid.clone();
        pool.insert(tx);

        info!("Transaction {} added to mempool", txid);
        Ok(txid)
    }

    /// Mines one block: selects the best-paying pending transactions, pays
    /// their receivers, seals the block by proof-of-work, appends it and
    /// credits the miner the base reward plus the collected fees.
    pub fn mine_block(&self, miner: &str) -> Result<BlockSummary, EngineError> {
        let mut pool = self.mempool.lock().unwrap();

        if pool.is_empty() {
            return Err(EngineError::EmptyMempool);
        }

        let selected = pool.select(self.params.max_tx_per_block);
        let total_fees: f64 = selected.iter().map(|tx| tx.fee).sum();
        let reward = self.params.block_reward + total_fees;

        let reward_tx = Transaction::coinbase(miner, reward)?;

        // Receivers are paid out at block construction time. Senders were
        // already debited on admission; fees reach the miner only through
        // the reward transaction.
        for tx in &selected {
            self.ledger.credit(&tx.receiver, tx.amount)?;
        }

        let mut chain = self.chain.lock().unwrap();

        // Difficulty is evaluated on the chain length before the append.
        let difficulty = self.params.difficulty_for(chain.len() as u64);

        let last = chain.last().unwrap();
        let mut transactions = selected.clone();
        transactions.push(reward_tx);

        let mut candidate = Block::new(last.index + 1, transactions, last.hash.clone());

        let sealed = loop {
            match pow::seal(candidate, difficulty, SEAL_BATCH) {
                SealOutcome::Sealed(block) => break block,
                SealOutcome::Searching(block) => candidate = block,
            }
        };

        self.storage.append_block(&sealed)?;
        chain.push(sealed.clone());

        // Persist the purged pool before applying the purge, so the
        // in-memory pool never diverges from the stored one.
        let selected_txids: HashSet<String> =
            selected.iter().map(|tx| tx.txid.clone()).collect();
        let remaining: Vec<Transaction> = pool
            .entries()
            .iter()
            .filter(|tx| !selected_txids.contains(&tx.txid))
            .cloned()
            .collect();
        self.storage.save_mempool(&remaining)?;
        pool.remove(&selected_txids);

        self.ledger.credit(miner, reward)?;

        info!(
            "Block {} mined at difficulty {}, miner reward {} (includes {} in fees)",
            sealed.index, difficulty, reward, total_fees
        );

        Ok(BlockSummary {
            index: sealed.index,
            reward,
            difficulty,
            hash: sealed.hash,
        })
    }

    /// Walks the chain recomputing hashes and checking linkage.
    ///
    /// Read-only; consults neither the mempool nor the balances. Genesis is
    /// implicitly valid by construction.
    pub fn validate(&self) -> Result<(), EngineError> {
        let chain = self.chain.lock().unwrap();

        for i in 1..chain.len() {
            let current = &chain[i];
            let previous = &chain[i - 1];

            if current.previous_hash != previous.hash {
                return Err(EngineError::BrokenLink(i as u64));
            }

            if current.hash != current.compute_hash() {
                return Err(EngineError::HashMismatch(i as u64));
            }
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Gets the balance of an account (0 for unknown accounts).
    pub fn balance(&self, account: &str) -> f64 {
        self.ledger.balance(account)
    }

    /// Snapshot of all account balances.
    pub fn balances(&self) -> HashMap<String, f64> {
        self.ledger.snapshot()
    }

    /// Snapshot of the pending transaction pool.
    pub fn pending(&self) -> Vec<Transaction> {
        self.mempool.lock().unwrap().entries().to_vec()
    }

    /// Snapshot of the full chain.
    pub fn blocks(&self) -> Vec<Block> {
        self.chain.lock().unwrap().clone()
    }

    /// Credits accounts that do not exist yet (demo setup).
    pub fn seed_accounts(&self, accounts: &[&str], amount: f64) -> Result<(), EngineError> {
        self.ledger.seed_missing(accounts, amount)?;
        Ok(())
    }
}
