//! Middleware module for Sitegate
//!
//! Contains the site rule chain, its path matcher, and the edit fallback
//! that runs ahead of it.

mod edit_fallback;
mod matcher;
pub mod rules;
mod site;

pub use edit_fallback::{EditFallback, LegacyEditUrlFallback, NoEditFallback, LEGACY_EDIT_PARAM};
pub use matcher::PathMatcher;
pub use rules::{evaluate, Action, RequestView};
pub use site::{
    site_middleware, with_site_middleware, SiteContextExt, SEARCH_HEADER, VISITOR_ID_HEADER,
};
