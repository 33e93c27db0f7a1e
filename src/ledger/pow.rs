use super::block::Block;

/// Outcome of a bounded proof-of-work search batch.
#[derive(Debug)]
pub enum SealOutcome {
    /// The block's hash meets the target; the block is sealed.
    Sealed(Block),

    /// The attempt budget ran out; the block carries the advanced nonce and
    /// can be handed back in for another batch.
    Searching(Block),
}

/// Checks whether a hash starts with `difficulty` zero hex digits.
pub fn meets_target(hash: &str, difficulty: u32) -> bool {
    let prefix = difficulty as usize;
    hash.len() >= prefix && hash.as_bytes()[..prefix].iter().all(|b| *b == b'0')
}

/// Runs up to `attempts` brute-force nonce increments against the target.
///
/// The search is pure and bounded: it returns control after the batch so a
/// caller can interleave cancellation or scheduling without changing the
/// hashing contract. Expected iterations grow by a factor of 16 per added
/// zero digit.
pub fn seal(mut block: Block, difficulty: u32, attempts: u64) -> SealOutcome {
    for _ in 0..attempts {
        if meets_target(&block.hash, difficulty) {
            return SealOutcome::Sealed(block);
        }

        block.nonce += 1;
        block.hash = block.compute_hash();
    }

    if meets_target(&block.hash, difficulty) {
        SealOutcome::Sealed(block)
    } else {
        SealOutcome::Searching(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meets_target() {
        assert!(meets_target("00abc", 2));
        assert!(meets_target("000abc", 2));
        assert!(!meets_target("0abc", 2));
        assert!(meets_target("anything", 0));
    }

    #[test]
    fn test_seal_finds_qualifying_hash() {
        let block = Block::new(1, Vec::new(), "previous_hash".to_string());

        let mut candidate = block;
        let sealed = loop {
            match seal(candidate, 1, 1000) {
                SealOutcome::Sealed(b) => break b,
                SealOutcome::Searching(b) => candidate = b,
            }
        };

        assert!(sealed.hash.starts_with('0'));
        assert_eq!(sealed.hash, sealed.compute_hash());
    }

    #[test]
    fn test_seal_returns_searching_when_budget_exhausted() {
        let block = Block::new(1, Vec::new(), "previous_hash".to_string());

        // A 64-digit target is unreachable in one attempt.
        match seal(block, 64, 1) {
            SealOutcome::Searching(b) => assert!(b.nonce >= 1),
            SealOutcome::Sealed(_) => panic!("should not seal against a 64-digit target"),
        }
    }
}
