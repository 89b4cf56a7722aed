use std::sync::Arc;

use btoken::TokenService;

/// Shared state handed to every handler.
///
/// Handlers are stateless; everything mutable lives behind the token store
/// inside the service.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TokenService>,
}

impl AppState {
    pub fn new(service: Arc<TokenService>) -> Self {
        Self { service }
    }
}
