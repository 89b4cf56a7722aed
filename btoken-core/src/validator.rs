use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::authorization::Authorization;
use crate::error::TokenError;
use crate::store::TokenStore;

/// Answers whether a token is live, belongs to a user, and carries a scope.
///
/// Expiry is lazy: the first read that observes an expired record deletes it.
/// No background sweep is required for correctness, only for reclaiming the
/// storage of tokens that are never looked up again.
pub struct Validator {
    store: Arc<dyn TokenStore>,
}

impl Validator {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Fetch the live record for a token.
    ///
    /// Expired records are deleted on the way out and reported as
    /// [`TokenError::InvalidToken`], indistinguishable from a token that
    /// never existed. A failure of that delete does not change the outcome.
    pub async fn get_authorization(&self, token: &str) -> Result<Authorization, TokenError> {
        let authorization = self.store.find_by_token(token).await?;
        if !authorization.is_valid_at(Utc::now()) {
            if let Err(err) = self.store.delete(token).await {
                warn!(error = %err, "failed to remove expired authorization");
            }
            return Err(TokenError::InvalidToken);
        }
        Ok(authorization)
    }

    /// Whether the holder of `token` is `user`, authorized for `scope`.
    ///
    /// With `scope` of `None` the identity match alone decides. Identity or
    /// scope mismatch yields `Ok(false)`; every other failure, including an
    /// invalid or expired token, is an error the caller must branch on.
    pub async fn check_auth(
        &self,
        token: &str,
        user: &str,
        scope: Option<&str>,
    ) -> Result<bool, TokenError> {
        let authorization = self.get_authorization(token).await?;
        if authorization.user != user {
            return Ok(false);
        }
        if let Some(scope) = scope {
            if !authorization.scopes.contains(scope) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
