use thiserror::Error;

/// Errors produced by the token lifecycle engine and its storage backends.
#[derive(Error, Debug)]
pub enum TokenError {
    /// The supplied credentials were rejected by the authorizer.
    #[error("credentials were not accepted")]
    Unauthorized,

    /// The token is unknown or has expired. The two cases are deliberately
    /// indistinguishable so callers cannot probe which tokens ever existed.
    #[error("invalid or expired token")]
    InvalidToken,

    /// A record with this token already exists in the store.
    #[error("token already exists: {0}")]
    DuplicateToken(String),

    /// The storage backend failed. Never collapsed into `InvalidToken`.
    #[error("storage error: {0}")]
    Storage(String),
}

impl TokenError {
    /// Wrap a backend failure, preserving its message.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        TokenError::Storage(err.to_string())
    }
}
