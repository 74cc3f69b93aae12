//! Configuration module for Sitegate
//!
//! Handles loading configuration from environment variables and config files.

use serde::Deserialize;
use std::sync::Arc;

use crate::components::ComponentFactory;
use crate::middleware::{EditFallback, LegacyEditUrlFallback, NoEditFallback, PathMatcher};
use crate::services::VisitorSession;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Deployment environment switches
    #[serde(default)]
    pub site: SiteConfig,
    /// Visitor cookie configuration
    #[serde(default)]
    pub visitor: VisitorConfig,
    /// Paths the request middleware skips
    #[serde(default)]
    pub matcher: MatcherConfig,
    /// Content graph connection
    #[serde(default)]
    pub graph: GraphConfig,
    /// CMS edit mode integration
    #[serde(default)]
    pub edit: EditConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Deployment environment. Cookie security attributes depend on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub environment: Environment,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisitorConfig {
    /// Name of the cookie carrying the visitor identifier
    #[serde(default = "default_visitor_cookie")]
    pub cookie_name: String,
    /// Cookie lifetime in days
    #[serde(default = "default_visitor_max_age_days")]
    pub max_age_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatcherConfig {
    /// Path prefixes (without the leading slash) that bypass the middleware
    #[serde(default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    /// GraphQL endpoint of the content graph
    #[serde(default = "default_graph_endpoint")]
    pub endpoint: String,
    /// Public single key for published content
    pub single_key: Option<String>,
    /// Application key for basic authentication
    pub app_key: Option<String>,
    /// Application secret for basic authentication
    pub secret: Option<String>,
    /// Whether the graph may serve cached query results
    #[serde(default = "default_true")]
    pub query_cache: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditConfig {
    /// Redirect legacy `epieditmode` URLs into the preview page
    #[serde(default = "default_true")]
    pub legacy_fallback: bool,
    /// Delay before the edit page reloads after a content change
    #[serde(default = "default_refresh_timeout_ms")]
    pub refresh_timeout_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_visitor_cookie() -> String {
    "visitorId".to_string()
}

fn default_visitor_max_age_days() -> i64 {
    365
}

fn default_excluded_prefixes() -> Vec<String> {
    vec![
        "api".to_string(),
        "assets".to_string(),
        "_static".to_string(),
        "_image".to_string(),
        "_platform".to_string(),
    ]
}

fn default_graph_endpoint() -> String {
    "https://cg.optimizely.com/content/v2".to_string()
}

fn default_true() -> bool {
    true
}

fn default_refresh_timeout_ms() -> u64 {
    500
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for VisitorConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_visitor_cookie(),
            max_age_days: default_visitor_max_age_days(),
        }
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            excluded_prefixes: default_excluded_prefixes(),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            endpoint: default_graph_endpoint(),
            single_key: None,
            app_key: None,
            secret: None,
            query_cache: true,
        }
    }
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            legacy_fallback: true,
            refresh_timeout_ms: default_refresh_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and config files
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            // Set defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("site.environment", "development")?
            .set_default("visitor.cookie_name", default_visitor_cookie())?
            .set_default("visitor.max_age_days", default_visitor_max_age_days())?
            .set_default("matcher.excluded_prefixes", default_excluded_prefixes())?
            .set_default("graph.endpoint", default_graph_endpoint())?
            // Load from config file if exists
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            // Override with environment variables (SITEGATE_ prefix)
            .add_source(
                config::Environment::with_prefix("SITEGATE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("matcher.excluded_prefixes")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub http_client: reqwest::Client,
    pub visitor: VisitorSession,
    pub matcher: PathMatcher,
    pub edit_fallback: Arc<dyn EditFallback>,
    pub components: Arc<ComponentFactory>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, anyhow::Error> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("Sitegate/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let visitor = VisitorSession::new(&config.visitor, config.site.environment);
        let matcher = PathMatcher::new(config.matcher.excluded_prefixes.clone());

        let edit_fallback: Arc<dyn EditFallback> = if config.edit.legacy_fallback {
            Arc::new(LegacyEditUrlFallback)
        } else {
            tracing::info!("Legacy edit URL fallback disabled");
            Arc::new(NoEditFallback)
        };

        Ok(Self {
            config: Arc::new(config),
            http_client,
            visitor,
            matcher,
            edit_fallback,
            components: Arc::new(ComponentFactory::with_defaults()),
        })
    }
}
