//! Local Business Directory Server
//!
//! Serves directory pages, location landing pages, sitemaps and the business
//! creation flow.

use anyhow::{Context, Result};
use directory_server::config::{BackendKind, Config};
use directory_server::{create_router, AppState, Backend, InMemoryBackend, RedisBackend, User};
use localbiz_common::Catalog;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEV_SESSION_TTL_SECS: u64 = 24 * 60 * 60;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "directory_server=debug,localbiz_common=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Local Business Directory Server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Site base URL: {}", config.site_base_url);
    info!("Backend: {:?}", config.backend);

    // Load the read-only catalog
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("Failed to load catalog from {}", path.display()))?,
        None => Catalog::builtin().context("Failed to load built-in catalog")?,
    };
    info!(
        "Catalog ready: {} businesses, {} locations",
        catalog.len(),
        catalog.locations().count()
    );

    // Initialize backend
    let backend: Arc<dyn Backend> = match config.backend {
        BackendKind::Redis => {
            info!("Redis URL: {}", config.redis_url);
            let redis = RedisBackend::new(&config.redis_url)
                .await
                .context("Failed to initialize Redis backend")?;
            if let Some(token) = &config.dev_session_token {
                info!("Seeding development session");
                let user = User::new("dev@localhost", "Developer");
                redis
                    .put_session(token, &user, DEV_SESSION_TTL_SECS)
                    .await
                    .context("Failed to seed development session")?;
            }
            Arc::new(redis)
        }
        BackendKind::Memory => {
            warn!("Using in-memory backend; created businesses are lost on restart");
            let mut memory = InMemoryBackend::new();
            if let Some(token) = &config.dev_session_token {
                info!("Seeding development session");
                memory = memory.with_session(token.clone(), User::new("dev@localhost", "Developer"));
            }
            Arc::new(memory)
        }
    };

    // Create application state
    let state = AppState::new(catalog, backend, config.site_base_url.clone())
        .with_site_name(config.site_name.clone())
        .with_sign_in_path(config.sign_in_path.clone());

    // Create router
    let app = create_router(state);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(&config.api_address())
        .await
        .with_context(|| format!("Failed to bind to {}", config.api_address()))?;

    info!("Directory server running on http://{}", config.api_address());
    info!("Health check: http://{}/health", config.api_address());

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
