//! Data types for Sitegate
//!
//! Defines content graph payloads, request parameters and API responses.

use serde::{Deserialize, Serialize};

/// Per-request context published by the site middleware into request
/// extensions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteContext {
    /// Visitor identifier, when visitor tracking ran for this request
    pub visitor_id: Option<String>,
    /// Raw query string including the leading `?`, or empty
    pub search: String,
    /// Whether the request entered CMS edit mode
    pub edit_mode: bool,
}

/// A content item returned by the content graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Content key
    pub key: String,
    /// Content type names, most specific first
    #[serde(default)]
    pub types: Vec<String>,
    /// Editor-facing display name
    #[serde(default)]
    pub display_name: Option<String>,
    /// Locale of this variation
    #[serde(default)]
    pub locale: Option<String>,
    /// Content type specific properties
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Metadata block attached to every item in the content graph
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    pub key: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

/// Standard GraphQL response envelope
#[derive(Debug, Deserialize)]
pub struct GraphResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphError {
    pub message: String,
}

/// Query parameters of the preview page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviewParams {
    /// Content key to preview
    pub key: Option<String>,
    /// Content version
    pub ver: Option<String>,
    /// Locale
    pub loc: Option<String>,
    /// CMS context (`edit` or `preview`)
    pub ctx: Option<String>,
    /// Preview token issued by the CMS
    pub preview_token: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub graph_configured: bool,
}
