use async_trait::async_trait;

use crate::app::ports::HasherPort;
use crate::error::{Result, TaskerError};

/// bcrypt password hashing. Hashing is CPU-bound, so it runs on the blocking pool.
#[derive(Debug, Clone)]
pub struct BcryptHasherAdapter {
    cost: u32,
}

impl BcryptHasherAdapter {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

fn hash_error(message: impl std::fmt::Display) -> TaskerError {
    TaskerError::Hash {
        message: message.to_string(),
    }
}

#[async_trait]
impl HasherPort for BcryptHasherAdapter {
    async fn encrypt(&self, plain: &str) -> Result<String> {
        let plain = plain.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
            .await
            .map_err(hash_error)?
            .map_err(hash_error)
    }

    async fn parse(&self, plain: &str, hash: &str) -> Result<bool> {
        let plain = plain.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash))
            .await
            .map_err(hash_error)?
            .map_err(hash_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hasher = BcryptHasherAdapter::new(bcrypt::DEFAULT_COST.min(4));
        let hash = hasher.encrypt("secret1").await.unwrap();

        assert_ne!(hash, "secret1");
        assert!(hasher.parse("secret1", &hash).await.unwrap());
        assert!(!hasher.parse("secret2", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_is_an_error() {
        let hasher = BcryptHasherAdapter::new(4);
        assert!(hasher.parse("secret1", "not-a-bcrypt-hash").await.is_err());
    }
}
