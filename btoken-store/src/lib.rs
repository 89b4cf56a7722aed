//! # btoken Store
//!
//! Storage backends for btoken authorization records.
//!
//! The storage contract itself ([`TokenStore`]) lives in `btoken-core`; this
//! crate supplies the concrete backends:
//!
//! - [`MemoryTokenStore`]: process-local map, always available. The default
//!   for tests and single-node deployments that can afford to lose tokens on
//!   restart.
//! - [`PostgresTokenStore`]: durable backend over sqlx, behind the
//!   `postgres` feature flag.
//!
//! Both enforce token uniqueness at the storage level, which is the system's
//! only defense against two concurrent issuance calls colliding.

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use btoken_core::TokenStore;
pub use memory::MemoryTokenStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresTokenStore;
