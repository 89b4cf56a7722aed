use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;

use crate::error::TokenError;

/// A raw username/password pair as decoded from the transport layer.
///
/// This type belongs to the front end. It never reaches the authorization
/// engine, which accepts only a verified [`Identity`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep secrets out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An identity that has been verified against an [`Authorizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

/// Credential verification collaborator.
///
/// The core does not own a user directory; it only consumes the yes/no
/// decision of whatever directory the embedding system delegates to.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Whether the credentials name a known user with the right password.
    async fn verify(&self, credentials: &Credentials) -> Result<bool, TokenError>;
}

/// Verify credentials and promote them into an [`Identity`].
///
/// Returns [`TokenError::Unauthorized`] when the authorizer says no.
pub async fn authenticate(
    authorizer: &dyn Authorizer,
    credentials: &Credentials,
) -> Result<Identity, TokenError> {
    if authorizer.verify(credentials).await? {
        Ok(Identity {
            username: credentials.username.clone(),
        })
    } else {
        Err(TokenError::Unauthorized)
    }
}

/// An [`Authorizer`] over a fixed username/password table.
///
/// Suitable for tests and small deployments where the user table lives in
/// configuration; anything bigger should implement [`Authorizer`] against a
/// real directory.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorizer {
    users: HashMap<String, String>,
}

impl StaticAuthorizer {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }

    /// Add a user, replacing any existing password.
    pub fn add_user(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.users.insert(username.into(), password.into());
    }
}

#[async_trait]
impl Authorizer for StaticAuthorizer {
    async fn verify(&self, credentials: &Credentials) -> Result<bool, TokenError> {
        Ok(self
            .users
            .get(&credentials.username)
            .is_some_and(|password| *password == credentials.password))
    }
}
