use sha2::{Digest, Sha256};

/// Computes the SHA-256 digest of a string and returns it as lowercase hex.
///
/// Every identifier in the system (txid, signature, block hash) is produced
/// by this one function over a canonical string payload.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_deterministic() {
        let a = sha256_hex("sender|receiver|10|2|2023-01-01T12:00:00Z");
        let b = sha256_hex("sender|receiver|10|2|2023-01-01T12:00:00Z");

        assert_eq!(a, b);
        assert_eq!(a.len(), 64); // SHA-256 hash is 64 characters in hex
    }

    #[test]
    fn test_digest_changes_with_input() {
        assert_ne!(sha256_hex("a"), sha256_hex("b"));
    }
}
