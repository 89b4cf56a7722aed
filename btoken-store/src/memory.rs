use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use btoken_core::{Authorization, TokenError, TokenStore};

/// In-memory [`TokenStore`] backend.
///
/// Keeps all records in a process-local map behind a read/write lock. The
/// lock is never held across an await point, so the store is safe for any
/// number of concurrent callers. Nothing survives a restart; use the
/// PostgreSQL backend when durability matters.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    records: RwLock<HashMap<String, Authorization>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Remove every record whose expiration is at or before `cutoff`.
    ///
    /// Lazy expiry already self-cleans any token that gets looked up; this
    /// sweep reclaims the ones that never are. Returns the number of records
    /// removed.
    pub fn purge_expired(&self, cutoff: DateTime<Utc>) -> usize {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = records.len();
        records.retain(|_, authorization| authorization.is_valid_at(cutoff));
        before - records.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Authorization>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn insert(&self, authorization: &Authorization) -> Result<(), TokenError> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if records.contains_key(&authorization.token) {
            return Err(TokenError::DuplicateToken(authorization.token.clone()));
        }
        records.insert(authorization.token.clone(), authorization.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Authorization, TokenError> {
        self.read()
            .get(token)
            .cloned()
            .ok_or(TokenError::InvalidToken)
    }

    async fn delete(&self, token: &str) -> Result<(), TokenError> {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use btoken_core::ScopeSet;

    fn record(token: &str, expiration: DateTime<Utc>) -> Authorization {
        Authorization {
            token: token.into(),
            user: "jtkirk".into(),
            scopes: ScopeSet::new(),
            expiration,
        }
    }

    fn live(token: &str) -> Authorization {
        record(token, Utc::now() + chrono::Duration::hours(1))
    }

    #[tokio::test]
    async fn insert_then_find() {
        let store = MemoryTokenStore::new();
        let authorization = live("tok-1");
        store.insert(&authorization).await.unwrap();

        let found = store.find_by_token("tok-1").await.unwrap();
        assert_eq!(found, authorization);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_token() {
        let store = MemoryTokenStore::new();
        store.insert(&live("tok-1")).await.unwrap();

        let err = store.insert(&live("tok-1")).await.unwrap_err();
        assert!(matches!(err, TokenError::DuplicateToken(t) if t == "tok-1"));
    }

    #[tokio::test]
    async fn find_absent_is_invalid_token() {
        let store = MemoryTokenStore::new();
        let err = store.find_by_token("nope").await.unwrap_err();
        assert!(matches!(err, TokenError::InvalidToken));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryTokenStore::new();
        store.insert(&live("tok-1")).await.unwrap();

        store.delete("tok-1").await.unwrap();
        store.delete("tok-1").await.unwrap();
        store.delete("never-existed").await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn purge_removes_only_expired_records() {
        let store = MemoryTokenStore::new();
        let now = Utc::now();
        store
            .insert(&record("old", now - chrono::Duration::hours(2)))
            .await
            .unwrap();
        store
            .insert(&record("boundary", now))
            .await
            .unwrap();
        store.insert(&live("fresh")).await.unwrap();

        let removed = store.purge_expired(now);
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
        assert!(store.find_by_token("fresh").await.is_ok());
    }

    #[tokio::test]
    async fn same_expiration_instant_is_not_a_conflict() {
        let store = MemoryTokenStore::new();
        let expiration = Utc::now() + chrono::Duration::hours(1);
        store.insert(&record("a", expiration)).await.unwrap();
        store.insert(&record("b", expiration)).await.unwrap();
        assert_eq!(store.len(), 2);
    }
}
