use async_trait::async_trait;

use crate::authorization::Authorization;
use crate::error::TokenError;

/// Durable keyed storage for [`Authorization`] records.
///
/// The store is the only shared mutable resource in the system and the sole
/// concurrency-safety mechanism: token uniqueness must be enforced at the
/// storage level so that two concurrent issuance calls can never both succeed
/// with the same token. Implementations must be safely usable by many
/// concurrent callers without external locking.
///
/// Backends should index `expiration` for efficient expiry scans, but must
/// not enforce uniqueness on it: distinct tokens may legitimately expire at
/// the same instant.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist a new record.
    ///
    /// Fails with [`TokenError::DuplicateToken`] if a record with the same
    /// token already exists.
    async fn insert(&self, authorization: &Authorization) -> Result<(), TokenError>;

    /// Fetch a record by its token.
    ///
    /// Fails with [`TokenError::InvalidToken`] when no such record exists.
    /// Callers cannot distinguish "never issued" from "expired and purged";
    /// both collapse to the same error.
    async fn find_by_token(&self, token: &str) -> Result<Authorization, TokenError>;

    /// Remove a record. Absence is not an error; delete is idempotent.
    async fn delete(&self, token: &str) -> Result<(), TokenError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Minimal map-backed store for exercising the engine and validator
    //! without pulling in a backend crate.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MapStore {
        records: Mutex<HashMap<String, Authorization>>,
    }

    impl MapStore {
        pub fn contains(&self, token: &str) -> bool {
            self.records.lock().unwrap().contains_key(token)
        }
    }

    #[async_trait]
    impl TokenStore for MapStore {
        async fn insert(&self, authorization: &Authorization) -> Result<(), TokenError> {
            let mut records = self.records.lock().unwrap();
            if records.contains_key(&authorization.token) {
                return Err(TokenError::DuplicateToken(authorization.token.clone()));
            }
            records.insert(authorization.token.clone(), authorization.clone());
            Ok(())
        }

        async fn find_by_token(&self, token: &str) -> Result<Authorization, TokenError> {
            self.records
                .lock()
                .unwrap()
                .get(token)
                .cloned()
                .ok_or(TokenError::InvalidToken)
        }

        async fn delete(&self, token: &str) -> Result<(), TokenError> {
            self.records.lock().unwrap().remove(token);
            Ok(())
        }
    }
}
