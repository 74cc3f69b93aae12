//! Site Rule Chain
//!
//! The ordered set of redirect/rewrite/edit-mode rules applied to every
//! matched request. Evaluation is pure: it only looks at the request URI and
//! the deployment environment, and the first matching rule wins. Requests
//! matching no rule fall through to visitor tracking.

use axum::http::Uri;
use axum_extra::extract::cookie::{Cookie, SameSite};
use std::borrow::Cow;
use url::form_urlencoded;

use crate::config::Environment;

/// Entry point of the CMS preview page
pub const PREVIEW_PATH: &str = "/preview";

/// The only locale prefix that gets stripped
pub const LOCALE_PREFIX: &str = "/en";

/// Cookie that makes downstream rendering skip prerendered output
pub const PRERENDER_BYPASS_COOKIE: &str = "__prerender_bypass";

pub const EDIT_MODE_HEADER: &str = "x-edit-mode";
pub const DRAFT_MODE_HEADER: &str = "x-draft-mode";

/// Read-only view over the parts of a request the rules inspect
#[derive(Debug, Clone, Copy)]
pub struct RequestView<'a> {
    path: &'a str,
    query: Option<&'a str>,
}

impl<'a> RequestView<'a> {
    pub fn new(path: &'a str, query: Option<&'a str>) -> Self {
        Self { path, query }
    }

    pub fn from_uri(uri: &'a Uri) -> Self {
        Self::new(uri.path(), uri.query())
    }

    pub fn path(&self) -> &'a str {
        self.path
    }

    pub fn query(&self) -> Option<&'a str> {
        self.query
    }

    fn pairs(&self) -> form_urlencoded::Parse<'a> {
        form_urlencoded::parse(self.query.unwrap_or_default().as_bytes())
    }

    /// Whether the query string carries `name`, with or without a value
    pub fn has_param(&self, name: &str) -> bool {
        self.pairs().any(|(key, _)| key == name)
    }

    /// First value of query parameter `name`
    pub fn param(&self, name: &str) -> Option<Cow<'a, str>> {
        self.pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// The raw query string including its leading `?`, or empty when there
    /// is no query (an empty query counts as none)
    pub fn search(&self) -> String {
        match self.query {
            Some(query) if !query.is_empty() => format!("?{}", query),
            _ => String::new(),
        }
    }

    /// `path` joined with this request's query string
    pub fn with_path(&self, path: &str) -> String {
        format!("{}{}", path, self.search())
    }
}

/// Attributes of the prerender bypass cookie set in edit mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BypassCookie {
    pub secure: bool,
    pub same_site: SameSite,
}

impl BypassCookie {
    pub fn for_environment(environment: Environment) -> Self {
        if environment.is_production() {
            Self {
                secure: true,
                same_site: SameSite::None,
            }
        } else {
            Self {
                secure: false,
                same_site: SameSite::Lax,
            }
        }
    }

    pub fn to_cookie(self) -> Cookie<'static> {
        Cookie::build((PRERENDER_BYPASS_COOKIE, "true"))
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .path("/")
            .build()
    }
}

/// Terminal action produced for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send the client to this location (path and query)
    Redirect(String),
    /// Route the request internally to this path and query
    Rewrite(String),
    /// Continue in edit/draft mode
    EditMode(BypassCookie),
    /// Continue, issuing or refreshing the visitor identifier
    TrackVisitor,
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Redirect(_) => "redirect",
            Action::Rewrite(_) => "rewrite",
            Action::EditMode(_) => "edit_mode",
            Action::TrackVisitor => "track_visitor",
        }
    }
}

/// A predicate/action pair in the rule chain
pub struct Rule {
    pub name: &'static str,
    matches: fn(&RequestView<'_>) -> bool,
    action: fn(&RequestView<'_>, Environment) -> Action,
}

/// Name reported when no rule matched
pub const DEFAULT_RULE: &str = "visitor_tracking";

/// The rule chain, in evaluation order
pub static RULES: [Rule; 4] = [
    Rule {
        name: "preview_breakout",
        matches: is_embedded_preview,
        action: break_out_of_preview,
    },
    Rule {
        name: "locale_prefix",
        matches: has_locale_prefix,
        action: strip_locale_prefix,
    },
    Rule {
        name: "preview_path",
        matches: is_nested_preview,
        action: canonical_preview,
    },
    Rule {
        name: "edit_mode",
        matches: is_edit_context,
        action: enter_edit_mode,
    },
];

/// Evaluate the rule chain and return the matching rule's name and action
pub fn evaluate(view: &RequestView<'_>, environment: Environment) -> (&'static str, Action) {
    RULES
        .iter()
        .find(|rule| (rule.matches)(view))
        .map(|rule| (rule.name, (rule.action)(view, environment)))
        .unwrap_or((DEFAULT_RULE, Action::TrackVisitor))
}

fn is_embedded_preview(view: &RequestView<'_>) -> bool {
    view.path() == PREVIEW_PATH && view.has_param("key") && !view.has_param("breakout")
}

fn break_out_of_preview(view: &RequestView<'_>, _: Environment) -> Action {
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(view.pairs())
        .append_pair("breakout", "1")
        .finish();
    Action::Redirect(format!("{}?{}", view.path(), query))
}

fn has_locale_prefix(view: &RequestView<'_>) -> bool {
    view.path().starts_with(LOCALE_PREFIX)
}

fn strip_locale_prefix(view: &RequestView<'_>, _: Environment) -> Action {
    Action::Rewrite(view.with_path(&strip_locale(view.path())))
}

/// Remove the leading locale prefix, normalizing to an absolute path
pub fn strip_locale(path: &str) -> String {
    let rest = path.strip_prefix(LOCALE_PREFIX).unwrap_or(path);
    if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{}", rest)
    }
}

fn is_nested_preview(view: &RequestView<'_>) -> bool {
    view.path().contains(PREVIEW_PATH) && view.path() != PREVIEW_PATH
}

fn canonical_preview(view: &RequestView<'_>, _: Environment) -> Action {
    Action::Rewrite(view.with_path(PREVIEW_PATH))
}

fn is_edit_context(view: &RequestView<'_>) -> bool {
    view.param("ctx").as_deref() == Some("edit")
}

fn enter_edit_mode(_: &RequestView<'_>, environment: Environment) -> Action {
    Action::EditMode(BypassCookie::for_environment(environment))
}
