//! Site Middleware
//!
//! Runs before routing for every page request: gives the edit fallback a
//! chance to answer, evaluates the site rule chain, and applies the resulting
//! redirect, rewrite or pass-through. Pass-through responses carry the
//! edit-mode or visitor headers and cookies.

use axum::{
    body::Body,
    extract::State,
    http::{header::HeaderName, HeaderValue, Request, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    Router,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use tower::Layer;

use super::rules::{self, Action, RequestView, DRAFT_MODE_HEADER, EDIT_MODE_HEADER};
use crate::config::AppState;
use crate::models::SiteContext;

pub const VISITOR_ID_HEADER: &str = "x-visitorid";
pub const SEARCH_HEADER: &str = "x-search";

/// Wrap `inner` so the site middleware sees requests before route matching.
///
/// URI rewrites only affect routing when the middleware sits outside the
/// router, so the wrapped router becomes the fallback of an empty one.
pub fn with_site_middleware(state: Arc<AppState>, inner: Router) -> Router {
    let site = middleware::from_fn_with_state(state, site_middleware).layer(inner);
    Router::new().fallback_service(site)
}

/// Site middleware
///
/// This middleware:
/// 1. Skips paths excluded by the path matcher
/// 2. Lets the edit fallback short-circuit the request
/// 3. Evaluates the rule chain and applies exactly one action
pub async fn site_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if !state.matcher.matches(req.uri().path()) {
        return next.run(req).await;
    }

    if let Some(response) = state.edit_fallback.intercept(&req) {
        crate::metrics::record_site_action("edit_fallback", "intercept");
        return response;
    }

    let view = RequestView::from_uri(req.uri());
    let search = view.search();
    let (rule, action) = rules::evaluate(&view, state.config.site.environment);

    tracing::debug!(
        path = %req.uri().path(),
        rule = rule,
        action = action.kind(),
        "Site rule matched"
    );
    crate::metrics::record_site_action(rule, action.kind());

    match action {
        Action::Redirect(location) => Redirect::temporary(&location).into_response(),
        Action::Rewrite(target) => {
            match rewrite_uri(req.uri(), &target) {
                Ok(uri) => *req.uri_mut() = uri,
                Err(e) => {
                    tracing::warn!(target = %target, error = %e, "Skipping unparseable rewrite target");
                }
            }
            next.run(req).await
        }
        Action::EditMode(bypass) => {
            req.extensions_mut().insert(SiteContext {
                visitor_id: None,
                search,
                edit_mode: true,
            });

            let mut response = next.run(req).await;
            set_header(&mut response, EDIT_MODE_HEADER, "true");
            set_header(&mut response, DRAFT_MODE_HEADER, "true");

            let jar = CookieJar::new().add(bypass.to_cookie());
            (jar, response).into_response()
        }
        Action::TrackVisitor => {
            let visitor_id = state.visitor.get_or_create_visitor_id(req.headers());

            // Request headers stay untouched so incoming cookies survive
            req.extensions_mut().insert(SiteContext {
                visitor_id: Some(visitor_id.clone()),
                search: search.clone(),
                edit_mode: false,
            });

            let mut response = next.run(req).await;
            set_header(&mut response, VISITOR_ID_HEADER, &visitor_id);
            set_header(&mut response, SEARCH_HEADER, &search);
            state.visitor.add_visitor_id(response, &visitor_id)
        }
    }
}

/// `uri` with its path and query replaced by `target`
fn rewrite_uri(uri: &Uri, target: &str) -> Result<Uri, axum::http::Error> {
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(target.parse()?);
    Ok(Uri::from_parts(parts)?)
}

fn set_header(response: &mut Response, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            response
                .headers_mut()
                .insert(HeaderName::from_static(name), value);
        }
        Err(e) => {
            tracing::warn!(header = name, error = %e, "Dropping response header with invalid value");
        }
    }
}

/// Extension trait to get the site context from a request
pub trait SiteContextExt {
    fn site_context(&self) -> Option<&SiteContext>;
}

impl<B> SiteContextExt for Request<B> {
    fn site_context(&self) -> Option<&SiteContext> {
        self.extensions().get::<SiteContext>()
    }
}
