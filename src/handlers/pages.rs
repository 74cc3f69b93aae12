//! Content page handler
//!
//! Serves every routed path that is not handled elsewhere by looking the
//! path up in the content graph.

use axum::{
    extract::{Request, State},
    http::header,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

use super::render_document;
use crate::components::RenderContext;
use crate::config::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::SiteContextExt;
use crate::services::GraphClient;

/// Render the content published at the request path
///
/// GET /*path
pub async fn content_page(
    State(state): State<Arc<AppState>>,
    req: Request,
) -> AppResult<Response> {
    let path = req.uri().path().to_string();
    let site = req.site_context().cloned();
    let edit_mode = site.as_ref().is_some_and(|ctx| ctx.edit_mode);

    let client = GraphClient::from_config(
        state.http_client.clone(),
        &state.config.graph,
        state.components.fragments(),
    )?;

    let item = client
        .get_content_by_path(&path, None)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No content at {}", path)))?;

    if let Some(ctx) = site {
        tracing::debug!(
            path = %path,
            key = %item.key,
            visitor_id = ?ctx.visitor_id,
            "Rendering content page"
        );
    }

    let body = state.components.render(&item, &RenderContext { edit_mode });
    let title = item.display_name.as_deref().unwrap_or(&item.key);
    let html = render_document(title, item.locale.as_deref(), &body, None);

    let cache_control = if edit_mode { "no-store" } else { "public, max-age=60" };
    Ok(([(header::CACHE_CONTROL, cache_control)], Html(html)).into_response())
}
