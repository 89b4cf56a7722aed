use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use btoken::{
    try_load_default_config, BtokenConfig, MemoryTokenStore, StaticAuthorizer, TokenService,
    TokenStore,
};
use btoken_server::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = try_load_default_config().unwrap_or_default();
    config.validate()?;

    let store = build_store(&config).await?;
    let authorizer = Arc::new(StaticAuthorizer::new(config.users.clone()));
    let service = Arc::new(TokenService::new(
        store,
        authorizer,
        config.expiry_ceiling()?,
    ));

    let app = router(AppState::new(service));
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!("btoken-server listening on {}", config.listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_store(config: &BtokenConfig) -> anyhow::Result<Arc<dyn TokenStore>> {
    #[cfg(feature = "postgres")]
    if let Some(database_url) = &config.database_url {
        let store = btoken::PostgresTokenStore::connect(database_url).await?;
        store.initialize().await?;
        tracing::info!("using the PostgreSQL token store");
        return Ok(Arc::new(store));
    }

    #[cfg(not(feature = "postgres"))]
    if config.database_url.is_some() {
        tracing::warn!(
            "database_url is set but postgres support is not compiled in; using the in-memory store"
        );
    }

    tracing::info!("using the in-memory token store");
    Ok(Arc::new(MemoryTokenStore::new()))
}
