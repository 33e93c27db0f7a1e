/// Numeric parameters of the ledger engine.
///
/// Injected at engine construction instead of living as process-wide
/// constants, so tests can substitute cheap values (a difficulty floor of 1
/// keeps the proof-of-work search fast).
#[derive(Debug, Clone)]
pub struct Params {
    /// Base reward credited to the miner per sealed block, before fees.
    pub block_reward: f64,

    /// Fee applied to a transaction when the caller does not supply one.
    pub default_fee: f64,

    /// Maximum number of mempool transactions selected into one block.
    pub max_tx_per_block: usize,

    /// Minimum number of leading zero hex digits a block hash must have.
    pub difficulty_floor: u32,

    /// Every this many blocks on the chain, difficulty increases by one.
    pub difficulty_window: u64,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            block_reward: 5.0,
            default_fee: 2.0,
            max_tx_per_block: 5,
            difficulty_floor: 2,
            difficulty_window: 3,
        }
    }
}

impl Params {
    /// Difficulty for the next block, given the chain length *before* the
    /// block is appended.
    pub fn difficulty_for(&self, chain_len: u64) -> u32 {
        let step = (chain_len / self.difficulty_window) as u32;
        self.difficulty_floor.max(self.difficulty_floor + step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_schedule() {
        let params = Params::default();

        // Genesis only.
        assert_eq!(params.difficulty_for(1), 2);
        assert_eq!(params.difficulty_for(2), 2);
        // One full window adds a zero digit.
        assert_eq!(params.difficulty_for(3), 3);
        assert_eq!(params.difficulty_for(4), 3);
        assert_eq!(params.difficulty_for(6), 4);
    }
}
