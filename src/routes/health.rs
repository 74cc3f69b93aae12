//! Health check routes
//!
//! Provides health and liveness endpoints for the site.

use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::config::{AppState, Environment};
use crate::models::HealthResponse;
use crate::services::GraphAuth;

/// Health check endpoint
///
/// GET /api/health
///
/// Reports the running version and whether the content graph has
/// credentials configured.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let graph_configured = match GraphAuth::from_config(&state.config.graph) {
        Ok(GraphAuth::Public { single_key }) => single_key.is_some(),
        Ok(_) => true,
        Err(_) => false,
    };

    let status = if graph_configured { "healthy" } else { "degraded" };
    let environment = match state.config.site.environment {
        Environment::Development => "development",
        Environment::Production => "production",
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: environment.to_string(),
        graph_configured,
    })
}

/// Liveness check endpoint
///
/// GET /api/live
///
/// Simple liveness probe - returns 200 if the process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (axum::http::StatusCode::OK, "alive")
}
