//! # btoken Server
//!
//! HTTP front end for the btoken authorization service.
//!
//! The front end is a thin collaborator around the core: it decodes Basic
//! auth credentials, decodes the JSON request body, calls the token service,
//! and maps the result or a classified error onto a status code. All token
//! policy lives in `btoken-core`.

pub mod basic_auth;
pub mod handlers;
pub mod state;

pub use handlers::{router, ApiError, VerifyRequest, VerifyResponse};
pub use state::AppState;
