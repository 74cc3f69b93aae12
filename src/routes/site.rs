//! Site Routes
//!
//! Defines the routing structure of the site:
//! - /api/* - Health and metrics endpoints (skipped by the site middleware)
//! - /preview - CMS preview and edit page
//! - everything else - content pages looked up by path

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::AppState;
use crate::handlers::{pages, preview};
use crate::metrics;
use crate::middleware::with_site_middleware;
use crate::routes::health;

/// Create the site router, without the site middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::liveness_check))
        .route("/metrics", get(metrics::metrics_handler));

    Router::new()
        .nest("/api", api_routes)
        .route("/preview", get(preview::preview_page))
        .fallback(get(pages::content_page))
        .with_state(state)
}

/// The complete application: site router behind the site middleware
pub fn build_app(state: Arc<AppState>) -> Router {
    with_site_middleware(state.clone(), create_router(state)).layer(TraceLayer::new_for_http())
}
