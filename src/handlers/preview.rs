//! Preview Handler
//!
//! The CMS opens this page to preview or edit a content item. It always
//! talks to the content graph without caching, using the preview token
//! from the CMS when one is given.

use axum::{
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

use super::render_document;
use crate::components::RenderContext;
use crate::config::AppState;
use crate::error::{AppError, AppResult};
use crate::models::PreviewParams;
use crate::services::GraphClient;

/// Render the preview/edit page
///
/// GET /preview?key=...&ver=...&loc=...&ctx=edit&preview_token=...
pub async fn preview_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PreviewParams>,
) -> AppResult<Response> {
    let key = params
        .key
        .as_deref()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing content key".into()))?;

    let client = GraphClient::for_preview(
        state.http_client.clone(),
        &state.config.graph,
        params.preview_token.as_deref(),
        state.components.fragments(),
    )?;

    tracing::info!(
        key = %key,
        version = ?params.ver,
        locale = ?params.loc,
        ctx = ?params.ctx,
        "Loading preview"
    );

    let item = client
        .get_content_by_id(key, params.ver.as_deref(), params.loc.as_deref())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Content {} not found", key)))?;

    let ctx = RenderContext {
        edit_mode: params.ctx.as_deref() == Some("edit"),
    };
    let body = state.components.render(&item, &ctx);
    let title = item.display_name.as_deref().unwrap_or("Preview");
    let html = render_document(
        title,
        item.locale.as_deref().or(params.loc.as_deref()),
        &body,
        Some(state.config.edit.refresh_timeout_ms),
    );

    Ok(([(header::CACHE_CONTROL, "no-store")], Html(html)).into_response())
}
