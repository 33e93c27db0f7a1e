use std::cmp::Ordering;
use std::collections::HashSet;

use super::transaction::Transaction;

/// Pool of admitted but unconfirmed transactions.
///
/// Entries enter on successful admission (funds already reserved) and leave
/// exactly when they are selected into a successfully sealed block.
#[derive(Debug, Default)]
pub struct Mempool {
    entries: Vec<Transaction>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the pool from persisted entries.
    pub fn from_entries(entries: Vec<Transaction>) -> Self {
        Mempool { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn insert(&mut self, tx: Transaction) {
        self.entries.push(tx);
    }

    pub fn entries(&self) -> &[Transaction] {
        &self.entries
    }

    /// Sum of amount + fee over all pooled transactions of a sender.
    ///
    /// This is the sender's currently reserved outflow, subtracted from the
    /// confirmed balance during admission.
    pub fn pending_outgoing(&self, sender: &str) -> f64 {
        self.entries
            .iter()
            .filter(|tx| tx.sender == sender)
            .map(|tx| tx.total_outgoing())
            .sum()
    }

    /// Selects up to `capacity` transactions for the next block.
    ///
    /// Ordered by fee descending, ties broken by ascending timestamp so
    /// earlier transactions are preferred.
    pub fn select(&self, capacity: usize) -> Vec<Transaction> {
        let mut sorted: Vec<Transaction> = self.entries.clone();
        sorted.sort_by(|a, b| {
            b.fee
                .partial_cmp(&a.fee)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.timestamp.cmp(&b.timestamp))
        });

        sorted.truncate(capacity);
        sorted
    }

    /// Removes every entry whose txid is in the given set.
    pub fn remove(&mut self, txids: &HashSet<String>) {
        self.entries.retain(|tx| !txids.contains(&tx.txid));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn tx_at(sender: &str, fee: f64, second: u32) -> Transaction {
        let timestamp = Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, second).unwrap();
        Transaction::new_at(sender, "receiver", 10.0, fee, timestamp).unwrap()
    }

    #[test]
    fn test_selection_orders_by_fee_then_timestamp() {
        let mut pool = Mempool::new();
        pool.insert(tx_at("a", 1.0, 0));
        pool.insert(tx_at("b", 3.0, 5));
        pool.insert(tx_at("c", 3.0, 2));
        pool.insert(tx_at("d", 2.0, 1));

        let selected = pool.select(10);
        let senders: Vec<&str> = selected.iter().map(|tx| tx.sender.as_str()).collect();

        // Highest fee first; equal fees resolved by earlier timestamp.
        assert_eq!(senders, vec!["c", "b", "d", "a"]);
    }

    #[test]
    fn test_selection_respects_capacity() {
        let mut pool = Mempool::new();
        for second in 0..8 {
            pool.insert(tx_at("a", 1.0, second));
        }

        assert_eq!(pool.select(5).len(), 5);
        assert!(pool.select(0).is_empty());
    }

    #[test]
    fn test_selection_of_empty_pool_is_empty() {
        let pool = Mempool::new();
        assert!(pool.select(5).is_empty());
    }

    #[test]
    fn test_pending_outgoing_sums_amount_plus_fee() {
        let mut pool = Mempool::new();
        pool.insert(tx_at("Alice", 2.0, 0)); // 10 + 2
        pool.insert(tx_at("Alice", 1.0, 1)); // 10 + 1
        pool.insert(tx_at("Bob", 5.0, 2));

        assert_eq!(pool.pending_outgoing("Alice"), 23.0);
        assert_eq!(pool.pending_outgoing("Bob"), 15.0);
        assert_eq!(pool.pending_outgoing("nobody"), 0.0);
    }

    #[test]
    fn test_remove_by_txid() {
        let mut pool = Mempool::new();
        let keep = tx_at("a", 1.0, 0);
        let drop = tx_at("b", 2.0, 1);
        pool.insert(keep.clone());
        pool.insert(drop.clone());

        let mut txids = HashSet::new();
        txids.insert(drop.txid);
        pool.remove(&txids);

        assert_eq!(pool.len(), 1);
        assert_eq!(pool.entries()[0].txid, keep.txid);
    }
}
