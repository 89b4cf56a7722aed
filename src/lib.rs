//! # btoken
//!
//! Bearer authorization token service for Rust.
//!
//! A client authenticates with a username/password pair and requests a token
//! scoped to one or more permission strings and a maximum validity duration;
//! btoken returns an opaque token that downstream services present to prove
//! identity and authorized scope. Tokens expire lazily: the first read past
//! the expiration deletes the record, with no background sweep required.
//!
//! This crate combines functionality from:
//! - `btoken-core`: the token lifecycle and validation engine
//! - `btoken-store`: storage backends (in-memory, PostgreSQL)
//! - `btoken-config`: configuration management
//!
//! The HTTP front end lives in the separate `btoken-server` crate.
//!
//! ## Feature Flags
//!
//! - `toml`: configuration loading from TOML files (enabled by default)
//! - `postgres`: the PostgreSQL storage backend
//!
//! ## Usage
//!
//! ```no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use btoken::{AuthRequest, Credentials, MemoryTokenStore, StaticAuthorizer, TokenService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), btoken::TokenError> {
//!     let users = HashMap::from([("jtkirk".to_string(), "Beam me up, Scotty!".to_string())]);
//!     let service = TokenService::new(
//!         Arc::new(MemoryTokenStore::new()),
//!         Arc::new(StaticAuthorizer::new(users)),
//!         Duration::from_secs(8 * 3600),
//!     );
//!
//!     let credentials = Credentials::new("jtkirk", "Beam me up, Scotty!");
//!     let request = AuthRequest {
//!         user: "jtkirk".into(),
//!         scopes: vec!["enterprise".into()],
//!         ..Default::default()
//!     };
//!     let authorization = service.authorize(&credentials, request).await?;
//!
//!     assert!(service.check_auth(&authorization.token, "jtkirk", Some("enterprise")).await?);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

// Re-export everything from the component crates
pub use btoken_core::{
    authenticate, duration_str, AuthRequest, Authorization, AuthorizationEngine, Authorizer,
    Credentials, Identity, ScopeSet, StaticAuthorizer, TokenError, TokenStore, Validator,
};

pub use btoken_config::{
    try_load_default_config, BtokenConfig, BtokenConfigBuilder, ConfigError, DEFAULT_EXPIRE_AFTER,
};

pub use btoken_store::MemoryTokenStore;
#[cfg(feature = "postgres")]
pub use btoken_store::PostgresTokenStore;

/// The issuing and validating sides of the token lifecycle over one shared
/// store.
///
/// This is the type most embedders want: construct it once with a store, an
/// authorizer, and the expiry ceiling, then share it across request
/// handlers. All methods take `&self` and may run concurrently.
pub struct TokenService {
    authorizer: Arc<dyn Authorizer>,
    engine: AuthorizationEngine,
    validator: Validator,
}

impl TokenService {
    /// Create a service over `store`, verifying credentials against
    /// `authorizer`, with `expire_after` as the maximum and default token
    /// lifetime.
    pub fn new(
        store: Arc<dyn TokenStore>,
        authorizer: Arc<dyn Authorizer>,
        expire_after: Duration,
    ) -> Self {
        Self {
            authorizer,
            engine: AuthorizationEngine::new(store.clone(), expire_after),
            validator: Validator::new(store),
        }
    }

    /// The configured maximum (and default) token lifetime.
    pub fn expire_after(&self) -> Duration {
        self.engine.expire_after()
    }

    /// Verify credentials and issue a new authorization.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Unauthorized`] when the authorizer rejects the
    /// credentials; store-layer errors are propagated unchanged.
    pub async fn authorize(
        &self,
        credentials: &Credentials,
        request: AuthRequest,
    ) -> Result<Authorization, TokenError> {
        let identity = authenticate(self.authorizer.as_ref(), credentials).await?;
        self.engine.authorize(&identity, request).await
    }

    /// Fetch the live record for a token, purging it if expired.
    pub async fn get_authorization(&self, token: &str) -> Result<Authorization, TokenError> {
        self.validator.get_authorization(token).await
    }

    /// Whether the holder of `token` is `user`, authorized for `scope`.
    ///
    /// See [`Validator::check_auth`] for the exact contract.
    pub async fn check_auth(
        &self,
        token: &str,
        user: &str,
        scope: Option<&str>,
    ) -> Result<bool, TokenError> {
        self.validator.check_auth(token, user, scope).await
    }
}
