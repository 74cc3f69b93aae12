//! Path matcher deciding which requests pass through the site middleware.

/// Skips static files and reserved path prefixes
#[derive(Debug, Clone)]
pub struct PathMatcher {
    excluded_prefixes: Vec<String>,
}

impl PathMatcher {
    pub fn new(excluded_prefixes: Vec<String>) -> Self {
        let excluded_prefixes = excluded_prefixes
            .into_iter()
            .map(|prefix| prefix.trim_start_matches('/').to_string())
            .filter(|prefix| !prefix.is_empty())
            .collect();
        Self { excluded_prefixes }
    }

    /// Whether the middleware should handle a request for `path`.
    ///
    /// Anything with a dot after the leading slash is treated as a static
    /// file. Prefixes match without a segment boundary, so `api` also
    /// excludes `/apis`.
    pub fn matches(&self, path: &str) -> bool {
        let rest = path.strip_prefix('/').unwrap_or(path);
        if rest.contains('.') {
            return false;
        }
        !self
            .excluded_prefixes
            .iter()
            .any(|prefix| rest.starts_with(prefix.as_str()))
    }
}
