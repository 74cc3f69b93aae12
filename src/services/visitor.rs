//! Visitor Session
//!
//! Issues and propagates the visitor identifier cookie.

use axum::{
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::config::{Environment, VisitorConfig};

const MIN_VISITOR_ID_LEN: usize = 8;
const MAX_VISITOR_ID_LEN: usize = 64;

/// Reads, generates and persists visitor identifiers
#[derive(Debug, Clone)]
pub struct VisitorSession {
    cookie_name: String,
    max_age: time::Duration,
    secure: bool,
}

impl VisitorSession {
    pub fn new(config: &VisitorConfig, environment: Environment) -> Self {
        Self {
            cookie_name: config.cookie_name.clone(),
            max_age: time::Duration::days(config.max_age_days),
            secure: environment.is_production(),
        }
    }

    /// Visitor identifier from the request cookie, or a freshly generated one
    pub fn get_or_create_visitor_id(&self, headers: &HeaderMap) -> String {
        let jar = CookieJar::from_headers(headers);
        match jar.get(&self.cookie_name).map(Cookie::value) {
            Some(id) if is_valid_visitor_id(id) => id.to_string(),
            Some(id) => {
                tracing::debug!(len = id.len(), "Discarding malformed visitor id cookie");
                new_visitor_id()
            }
            None => new_visitor_id(),
        }
    }

    /// Cookie carrying `visitor_id`
    pub fn visitor_cookie(&self, visitor_id: &str) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), visitor_id.to_string()))
            .path("/")
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(self.max_age)
            .build()
    }

    /// Attach or refresh the visitor cookie on `response`
    pub fn add_visitor_id(&self, response: Response, visitor_id: &str) -> Response {
        let jar = CookieJar::new().add(self.visitor_cookie(visitor_id));
        (jar, response).into_response()
    }
}

fn new_visitor_id() -> String {
    let id = Uuid::new_v4().to_string();
    crate::metrics::record_visitor_issued();
    tracing::trace!(visitor_id = %id, "Issued new visitor id");
    id
}

/// Visitor ids are short opaque tokens of URL-safe characters
pub fn is_valid_visitor_id(id: &str) -> bool {
    (MIN_VISITOR_ID_LEN..=MAX_VISITOR_ID_LEN).contains(&id.len())
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
