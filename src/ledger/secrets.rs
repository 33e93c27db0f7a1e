use std::collections::HashMap;

/// Resolves the per-account shared secret used by the simulated signature
/// scheme.
///
/// The engine only ever talks to this trait, so the simulation could be
/// swapped for a real signature scheme without touching the mempool or the
/// miner.
pub trait SecretProvider: Send + Sync {
    /// Returns the signing secret for an account, if one is known.
    fn secret_for(&self, account: &str) -> Option<String>;
}

/// A fixed in-memory secret table.
///
/// This is a simulated identity store for the demo; a real system would
/// never hold plain secrets like this.
#[derive(Debug, Clone, Default)]
pub struct StaticSecrets {
    secrets: HashMap<String, String>,
}

impl StaticSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a secret for an account, builder style.
    pub fn with_secret(mut self, account: &str, secret: &str) -> Self {
        self.secrets.insert(account.to_string(), secret.to_string());
        self
    }

    /// The three demo identities the node ships with.
    pub fn demo() -> Self {
        Self::new()
            .with_secret("Alice", "ALICE_PRIVATE_SECRET_9b1")
            .with_secret("Bob", "BOB_PRIVATE_SECRET_3f7")
            .with_secret("Charles", "CHARLES_PRIVATE_SECRET_z4y")
    }
}

impl SecretProvider for StaticSecrets {
    fn secret_for(&self, account: &str) -> Option<String> {
        self.secrets.get(account).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_account_resolves() {
        let secrets = StaticSecrets::new().with_secret("Alice", "s3cret");

        assert_eq!(secrets.secret_for("Alice"), Some("s3cret".to_string()));
    }

    #[test]
    fn test_unknown_account_is_none() {
        let secrets = StaticSecrets::demo();

        assert!(secrets.secret_for("Mallory").is_none());
    }
}
