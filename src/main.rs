//! Sitegate - content site front door
//!
//! Serves a headless CMS site. Every page request first passes the site
//! middleware, which:
//!
//! - Breaks CMS previews out of the editor iframe
//! - Strips the `/en` locale prefix and canonicalizes preview paths
//! - Switches requests into edit/draft mode for the CMS visual editor
//! - Assigns a visitor identifier to every browser
//!
//! Pages and the preview are rendered from the CMS content graph.

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitegate::services::GraphAuth;
use sitegate::{config, metrics, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sitegate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Sitegate v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let app_config = config::AppConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    tracing::info!(
        "Configuration loaded. Server will listen on {}:{} ({:?})",
        app_config.server.host,
        app_config.server.port,
        app_config.site.environment
    );

    match GraphAuth::from_config(&app_config.graph) {
        Ok(GraphAuth::Public { single_key: None }) => {
            tracing::warn!("No content graph key configured; content requests will be rejected");
        }
        Ok(_) => tracing::info!("Content graph at {}", app_config.graph.endpoint),
        Err(e) => return Err(anyhow::anyhow!("Configuration error: {}", e)),
    }

    metrics::register_metrics()?;

    // Initialize application state
    let state = Arc::new(config::AppState::new(app_config.clone())?);

    let app = routes::build_app(state);

    // Start the server
    let addr = SocketAddr::from((
        app_config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .unwrap_or([127, 0, 0, 1].into()),
        app_config.server.port,
    ));

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
