mod routes;
pub mod templates;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use routes::ApiError;

use crate::cache::ProfileCache;
use crate::config::Config;
use crate::resolver::Resolver;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub cache: ProfileCache,
}

impl AppState {
    /// Build the state for `config` with the default method chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolver's HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let resolver = Resolver::new(config).context("Failed to initialize resolver")?;
        Ok(Self::with_resolver(config, resolver))
    }

    /// Build the state around an existing resolver, caching under `config.cache_dir`.
    #[must_use]
    pub fn with_resolver(config: &Config, resolver: Resolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
            cache: ProfileCache::new(config.cache_dir.clone(), config.cache_ttl),
        }
    }
}

/// Start the web server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn serve(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.web_host, config.web_port)
        .parse()
        .context("Invalid web server address")?;

    tokio::fs::create_dir_all(&config.cache_dir)
        .await
        .with_context(|| format!("Failed to create cache directory {}", config.cache_dir.display()))?;

    let state = AppState::new(&config)?;
    info!(
        cache_dir = %state.cache.dir().display(),
        hosting = state.resolver.hosting_enabled(),
        "Profile picture relay ready"
    );

    let app = create_app(state);

    info!(addr = %addr, "Starting HTTP web server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind web server")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Web server error")?;

    Ok(())
}

/// Create the main application router.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
