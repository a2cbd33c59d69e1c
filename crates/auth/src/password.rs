use domain::{FeedxError, PasswordHasher};
use tracing::warn;

use crate::AuthError;

/// bcrypt password hashing.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// `cost` is the bcrypt work factor (4..=31).
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String, FeedxError> {
        bcrypt::hash(password, self.cost)
            .map_err(AuthError::from)
            .map_err(FeedxError::from)
    }

    fn verify(&self, password: &str, password_hash: &str) -> bool {
        match bcrypt::verify(password, password_hash) {
            Ok(matches) => matches,
            Err(e) => {
                warn!(error = %e, "stored password hash is unreadable");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hasher = BcryptHasher::new(4);
        let hash = hasher.hash("admin123").unwrap();
        assert_ne!(hash, "admin123");
        assert!(hasher.verify("admin123", &hash));
        assert!(!hasher.verify("admin124", &hash));
    }

    #[test]
    fn garbage_hashes_never_verify() {
        assert!(!BcryptHasher::new(4).verify("anything", "not-a-bcrypt-hash"));
    }

    #[test]
    fn invalid_cost_is_a_configuration_error() {
        let err = BcryptHasher::new(99).hash("x").unwrap_err();
        assert!(err.is_internal());
    }
}
