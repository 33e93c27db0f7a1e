// Ledger engine module
//
// This module contains the core ledger implementation including:
// - Transaction structure and the simulated signature scheme
// - Block structure and hashing
// - Mempool admission and selection
// - Proof of work sealing
// - Account balances
// - Chain validation and persistence

pub mod account;
pub mod block;
pub mod digest;
pub mod engine;
pub mod mempool;
pub mod params;
pub mod pow;
pub mod secrets;
pub mod storage;
pub mod transaction;

// Re-export main components for easier access
pub use block::Block;
pub use engine::{BlockSummary, Engine, EngineError};
pub use params::Params;
pub use secrets::{SecretProvider, StaticSecrets};
pub use transaction::Transaction;
