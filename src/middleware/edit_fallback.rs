//! Edit Fallback
//!
//! Runs ahead of the site rule chain. A fallback may answer a request on its
//! own; when it does, the rule chain is skipped entirely.

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Redirect, Response},
};
use url::form_urlencoded;

use super::rules::PREVIEW_PATH;

/// Query parameter the legacy CMS edit UI appends to page URLs
pub const LEGACY_EDIT_PARAM: &str = "epieditmode";

/// Hook that may short-circuit a request before the rule chain runs
pub trait EditFallback: Send + Sync {
    fn intercept(&self, req: &Request<Body>) -> Option<Response>;
}

/// Never intercepts
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEditFallback;

impl EditFallback for NoEditFallback {
    fn intercept(&self, _req: &Request<Body>) -> Option<Response> {
        None
    }
}

/// Sends legacy edit-mode URLs (`?epieditmode=true`) to the preview page in
/// edit context
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyEditUrlFallback;

impl LegacyEditUrlFallback {
    /// Preview location for a legacy edit URL query, if it is one
    pub fn preview_location(query: Option<&str>) -> Option<String> {
        let query = query?;
        let is_edit = form_urlencoded::parse(query.as_bytes())
            .any(|(key, value)| key == LEGACY_EDIT_PARAM && value.eq_ignore_ascii_case("true"));
        if !is_edit {
            return None;
        }

        let forwarded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(
                form_urlencoded::parse(query.as_bytes())
                    .filter(|(key, _)| key != LEGACY_EDIT_PARAM && key != "ctx"),
            )
            .append_pair("ctx", "edit")
            .finish();

        Some(format!("{}?{}", PREVIEW_PATH, forwarded))
    }
}

impl EditFallback for LegacyEditUrlFallback {
    fn intercept(&self, req: &Request<Body>) -> Option<Response> {
        let location = Self::preview_location(req.uri().query())?;
        tracing::debug!(
            path = %req.uri().path(),
            location = %location,
            "Redirecting legacy edit URL to preview"
        );
        Some(Redirect::temporary(&location).into_response())
    }
}
