use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::authorization::{AuthRequest, Authorization};
use crate::error::TokenError;
use crate::identity::Identity;
use crate::store::TokenStore;

/// Issues new authorization records through a [`TokenStore`].
///
/// The engine holds no mutable state: `expire_after` is fixed at
/// construction, and all cross-call coordination is delegated to the store's
/// uniqueness guarantee. One engine may serve any number of concurrent
/// callers.
pub struct AuthorizationEngine {
    store: Arc<dyn TokenStore>,
    expire_after: Duration,
}

impl AuthorizationEngine {
    /// Create an engine over `store` with the given lifetime ceiling.
    pub fn new(store: Arc<dyn TokenStore>, expire_after: Duration) -> Self {
        Self {
            store,
            expire_after,
        }
    }

    /// The configured maximum (and default) token lifetime.
    pub fn expire_after(&self) -> Duration {
        self.expire_after
    }

    /// Issue a new authorization for a verified identity.
    ///
    /// The requested duration is clamped: zero or anything above the ceiling
    /// becomes the ceiling, so the server never issues a token that outlives
    /// its own configuration. The token itself is a fresh UUIDv4; a collision
    /// in that space is rare enough that the resulting uniqueness violation
    /// is propagated to the caller rather than retried.
    ///
    /// # Errors
    ///
    /// Any store-layer error is returned unchanged, including
    /// [`TokenError::DuplicateToken`] on a token collision.
    pub async fn authorize(
        &self,
        identity: &Identity,
        request: AuthRequest,
    ) -> Result<Authorization, TokenError> {
        let lifetime = self.effective_lifetime(request.duration);
        let authorization = Authorization {
            token: Uuid::new_v4().to_string(),
            user: request.user,
            scopes: request.scopes.into_iter().collect(),
            expiration: expiration_from(Utc::now(), lifetime),
        };
        self.store.insert(&authorization).await?;
        debug!(
            issued_by = %identity.username,
            user = %authorization.user,
            expiration = %authorization.expiration,
            "issued authorization token"
        );
        Ok(authorization)
    }

    fn effective_lifetime(&self, requested: Duration) -> Duration {
        if requested.is_zero() || requested > self.expire_after {
            self.expire_after
        } else {
            requested
        }
    }
}

/// Absolute expiration for a record created at `now`, saturating at the far
/// end of the representable range rather than overflowing.
fn expiration_from(now: DateTime<Utc>, lifetime: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(lifetime)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
