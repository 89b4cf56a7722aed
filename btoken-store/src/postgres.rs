use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use btoken_core::{Authorization, ScopeSet, TokenError, TokenStore};

/// PostgreSQL [`TokenStore`] backend.
///
/// Token uniqueness is enforced by the primary key on `token`, which makes
/// the database the arbiter between concurrent issuance calls. `expiration`
/// carries a plain (non-unique) index: distinct tokens may legitimately
/// expire at the same instant, and the index only exists to keep expiry
/// sweeps cheap.
pub struct PostgresTokenStore {
    pool: PgPool,
}

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS authorizations (
    token      TEXT PRIMARY KEY,
    username   TEXT NOT NULL,
    scopes     JSONB NOT NULL,
    expiration TIMESTAMPTZ NOT NULL
)
"#;

const CREATE_EXPIRATION_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS authorizations_expiration_idx ON authorizations (expiration)";

impl PostgresTokenStore {
    /// Connect to the database at `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, TokenError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(TokenError::storage)?;
        Ok(Self { pool })
    }

    /// Wrap an existing connection pool.
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `authorizations` table and its expiration index if they do
    /// not exist yet.
    pub async fn initialize(&self) -> Result<(), TokenError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(TokenError::storage)?;
        sqlx::query(CREATE_EXPIRATION_INDEX)
            .execute(&self.pool)
            .await
            .map_err(TokenError::storage)?;
        Ok(())
    }

    /// Delete every record whose expiration is at or before `cutoff`.
    /// Returns the number of rows removed.
    pub async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, TokenError> {
        let result = sqlx::query("DELETE FROM authorizations WHERE expiration <= $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(TokenError::storage)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TokenStore for PostgresTokenStore {
    async fn insert(&self, authorization: &Authorization) -> Result<(), TokenError> {
        let scopes = serde_json::to_value(&authorization.scopes).map_err(TokenError::storage)?;
        let result = sqlx::query(
            "INSERT INTO authorizations (token, username, scopes, expiration) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&authorization.token)
        .bind(&authorization.user)
        .bind(scopes)
        .bind(authorization.expiration)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(TokenError::DuplicateToken(authorization.token.clone()))
            }
            Err(err) => Err(TokenError::storage(err)),
        }
    }

    async fn find_by_token(&self, token: &str) -> Result<Authorization, TokenError> {
        let row = sqlx::query(
            "SELECT token, username, scopes, expiration FROM authorizations WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(TokenError::storage)?
        .ok_or(TokenError::InvalidToken)?;

        let scopes: serde_json::Value = row.try_get("scopes").map_err(TokenError::storage)?;
        let scopes: ScopeSet = serde_json::from_value(scopes).map_err(TokenError::storage)?;
        Ok(Authorization {
            token: row.try_get("token").map_err(TokenError::storage)?,
            user: row.try_get("username").map_err(TokenError::storage)?,
            scopes,
            expiration: row.try_get("expiration").map_err(TokenError::storage)?,
        })
    }

    async fn delete(&self, token: &str) -> Result<(), TokenError> {
        sqlx::query("DELETE FROM authorizations WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(TokenError::storage)?;
        Ok(())
    }
}

// These run against a live database; set DATABASE_URL and pass --ignored.
#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> PostgresTokenStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let store = PostgresTokenStore::connect(&url).await.unwrap();
        store.initialize().await.unwrap();
        store
    }

    fn record(token: &str) -> Authorization {
        Authorization {
            token: token.into(),
            user: "jtkirk".into(),
            scopes: ["enterprise"].into_iter().collect(),
            expiration: Utc::now() + chrono::Duration::hours(1),
        }
    }

    #[tokio::test]
    #[ignore]
    async fn insert_find_delete_round_trip() {
        let store = store().await;
        let token = format!("test-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());
        let authorization = Authorization {
            token: token.clone(),
            ..record(&token)
        };
        store.insert(&authorization).await.unwrap();

        let found = store.find_by_token(&token).await.unwrap();
        assert_eq!(found, authorization);

        store.delete(&token).await.unwrap();
        let err = store.find_by_token(&token).await.unwrap_err();
        assert!(matches!(err, TokenError::InvalidToken));

        // Idempotent.
        store.delete(&token).await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn duplicate_insert_is_rejected() {
        let store = store().await;
        let token = format!("dup-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());
        store.insert(&record(&token)).await.unwrap();
        let err = store.insert(&record(&token)).await.unwrap_err();
        assert!(matches!(err, TokenError::DuplicateToken(_)));
        store.delete(&token).await.unwrap();
    }
}
