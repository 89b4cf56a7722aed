//! # btoken Core
//!
//! Token lifecycle and validation engine for the btoken authorization
//! service.
//!
//! This crate owns the policy with real invariants: how long a token lives,
//! how scopes are recorded and checked, how expired records are purged, and
//! the storage contract a durable backend must satisfy. It has no networking
//! or database dependencies of its own: transports live in `btoken-server`
//! and backends in `btoken-store`.
//!
//! ## Components
//!
//! - [`AuthorizationEngine`]: clamps requested durations to the configured
//!   ceiling, generates unique tokens, and writes [`Authorization`] records
//!   through a [`TokenStore`]
//! - [`Validator`]: answers token/user/scope queries with lazy delete-on-read
//!   expiry
//! - [`TokenStore`]: the contract any durable backend must satisfy
//! - [`Authorizer`]: the credential-verification collaborator the engine
//!   consumes a yes/no decision from

mod authorization;
mod engine;
mod error;
mod identity;
mod scopes;
mod store;
mod validator;

pub use authorization::{duration_str, AuthRequest, Authorization};
pub use engine::AuthorizationEngine;
pub use error::TokenError;
pub use identity::{authenticate, Authorizer, Credentials, Identity, StaticAuthorizer};
pub use scopes::ScopeSet;
pub use store::TokenStore;
pub use validator::Validator;
