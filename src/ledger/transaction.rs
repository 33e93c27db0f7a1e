use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::digest::sha256_hex;
use super::secrets::SecretProvider;

/// The distinguished sender identity of reward (coinbase) transactions.
///
/// Only the miner constructs transactions from this sender, so they are
/// exempt from signature verification.
pub const SYSTEM_SENDER: &str = "SYSTEM";

/// Errors that can occur when building or signing a transaction
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Amount must be positive: {0}")]
    InvalidAmount(f64),

    #[error("Fee must not be negative: {0}")]
    InvalidFee(f64),

    #[error("No signing secret available for sender: {0}")]
    MissingSecret(String),
}

/// A signed transfer of value between two accounts
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// Sender's account identifier
    pub sender: String,

    /// Receiver's account identifier
    pub receiver: String,

    /// Amount being transferred
    pub amount: f64,

    /// Transaction fee, claimed by the miner of the confirming block
    pub fee: f64,

    /// Timestamp when the transaction was created (immutable once set)
    #[schema(value_type = String, example = "2023-01-01T12:00:00Z")]
    pub timestamp: DateTime<Utc>,

    /// Deterministic transaction identifier, derived from the other fields
    pub txid: String,

    /// Simulated signature of the transaction
    pub signature: Option<String>,
}

impl Transaction {
    /// Creates a new unsigned transaction, timestamped now.
    ///
    /// Fails when the amount is not positive or the fee is negative; those
    /// invariants are enforced at construction, not at use.
    pub fn new(
        sender: &str,
        receiver: &str,
        amount: f64,
        fee: f64,
    ) -> Result<Self, TransactionError> {
        Self::new_at(sender, receiver, amount, fee, Utc::now())
    }

    /// Creates a new unsigned transaction with an explicit timestamp.
    pub fn new_at(
        sender: &str,
        receiver: &str,
        amount: f64,
        fee: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, TransactionError> {
        if amount.is_nan() || amount <= 0.0 {
            return Err(TransactionError::InvalidAmount(amount));
        }
        if fee.is_nan() || fee < 0.0 {
            return Err(TransactionError::InvalidFee(fee));
        }

        let txid = compute_txid(sender, receiver, amount, fee, &timestamp);

        Ok(Transaction {
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            amount,
            fee,
            timestamp,
            txid,
            signature: None,
        })
    }

    /// Creates a reward transaction from the `SYSTEM` sender to the miner.
    pub fn coinbase(receiver: &str, amount: f64) -> Result<Self, TransactionError> {
        Self::new(SYSTEM_SENDER, receiver, amount, 0.0)
    }

    /// Signs the transaction with the sender's shared secret.
    ///
    /// The signature binds sender, receiver, amount and timestamp. The fee
    /// is deliberately left out to match the original scheme, so a fee can
    /// change post-signing without invalidating the signature.
    pub fn sign(&mut self, secrets: &dyn SecretProvider) -> Result<(), TransactionError> {
        let secret = secrets
            .secret_for(&self.sender)
            .ok_or_else(|| TransactionError::MissingSecret(self.sender.clone()))?;

        self.signature = Some(self.expected_signature(&secret));
        Ok(())
    }

    /// Verifies the transaction's signature against the sender's secret.
    ///
    /// Reward transactions from `SYSTEM` are implicitly trusted. Anything
    /// else needs a present signature and a resolvable secret.
    pub fn verify(&self, secrets: &dyn SecretProvider) -> bool {
        if self.is_coinbase() {
            return true;
        }

        let signature = match &self.signature {
            Some(sig) => sig,
            None => return false,
        };

        match secrets.secret_for(&self.sender) {
            Some(secret) => self.expected_signature(&secret) == *signature,
            None => false,
        }
    }

    fn expected_signature(&self, secret: &str) -> String {
        sha256_hex(&format!(
            "{}|{}|{}|{}|{}",
            self.sender,
            self.receiver,
            self.amount,
            self.timestamp.to_rfc3339(),
            secret
        ))
    }

    /// Checks if the transaction is a reward (coinbase) transaction
    pub fn is_coinbase(&self) -> bool {
        self.sender == SYSTEM_SENDER
    }

    /// Gets the total amount the sender gives up (amount + fee)
    pub fn total_outgoing(&self) -> f64 {
        self.amount + self.fee
    }
}

/// txid is a pure function of the core fields plus the creation timestamp;
/// two transactions with identical values collide by design.
fn compute_txid(
    sender: &str,
    receiver: &str,
    amount: f64,
    fee: f64,
    timestamp: &DateTime<Utc>,
) -> String {
    sha256_hex(&format!(
        "{}|{}|{}|{}|{}",
        sender,
        receiver,
        amount,
        fee,
        timestamp.to_rfc3339()
    ))
}
