//! Content Graph Client
//!
//! Thin GraphQL client for the headless CMS content graph. Supports the
//! public single key, application key/secret (basic) authentication and CMS
//! preview tokens.

use base64::Engine;
use serde_json::{json, Value};
use std::time::Instant;

use crate::components::DataFragment;
use crate::config::GraphConfig;
use crate::error::{AppError, AppResult};
use crate::models::{ContentItem, GraphMetadata, GraphResponse};

const CONTENT_BY_ID_QUERY: &str = r#"query getContentById($key: String!, $version: String, $locale: [Locales]) {
  content: _Content(
    where: { _metadata: { key: { eq: $key }, version: { eq: $version } } }
    locale: $locale
  ) {
    item {
      __typename
      _metadata { key types displayName locale }
      ...ComponentData
    }
  }
}"#;

const CONTENT_BY_PATH_QUERY: &str = r#"query getContentByPath($path: String!, $locale: [Locales]) {
  content: _Content(
    where: { _metadata: { url: { default: { eq: $path } } } }
    locale: $locale
  ) {
    item {
      __typename
      _metadata { key types displayName locale }
      ...ComponentData
    }
  }
}"#;

/// How requests to the content graph are authenticated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphAuth {
    /// Published content only, keyed by the public single key
    Public { single_key: Option<String> },
    /// Application key and secret, sent as HTTP basic credentials
    Basic { app_key: String, secret: String },
    /// Preview token handed out by the CMS, grants draft access
    PreviewToken(String),
}

impl GraphAuth {
    pub fn from_config(config: &GraphConfig) -> AppResult<Self> {
        match (&config.app_key, &config.secret) {
            (Some(app_key), Some(secret)) => Ok(GraphAuth::Basic {
                app_key: app_key.clone(),
                secret: secret.clone(),
            }),
            (Some(_), None) | (None, Some(_)) => Err(AppError::Config(
                "graph.app_key and graph.secret must be set together".to_string(),
            )),
            (None, None) => Ok(GraphAuth::Public {
                single_key: config.single_key.clone(),
            }),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            GraphAuth::Public { .. } => "public",
            GraphAuth::Basic { .. } => "basic",
            GraphAuth::PreviewToken(_) => "token",
        }
    }
}

/// Client for the content graph
#[derive(Debug, Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    endpoint: String,
    auth: GraphAuth,
    query_cache: bool,
    fragments: Vec<DataFragment>,
}

impl GraphClient {
    /// Client for published content as configured
    pub fn from_config(
        http: reqwest::Client,
        config: &GraphConfig,
        fragments: Vec<DataFragment>,
    ) -> AppResult<Self> {
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            auth: GraphAuth::from_config(config)?,
            query_cache: config.query_cache,
            fragments,
        })
    }

    /// Client for the preview page. Caching is always off; a preview token
    /// switches the client to token authentication.
    pub fn for_preview(
        http: reqwest::Client,
        config: &GraphConfig,
        token: Option<&str>,
        fragments: Vec<DataFragment>,
    ) -> AppResult<Self> {
        let mut client = Self::from_config(http, config, fragments)?;
        client.query_cache = false;
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            client.auth = GraphAuth::PreviewToken(token.to_string());
        }
        Ok(client)
    }

    pub fn auth(&self) -> &GraphAuth {
        &self.auth
    }

    pub fn query_cache(&self) -> bool {
        self.query_cache
    }

    /// Load a content item by key, optionally pinned to a version and locale
    pub async fn get_content_by_id(
        &self,
        key: &str,
        version: Option<&str>,
        locale: Option<&str>,
    ) -> AppResult<Option<ContentItem>> {
        let variables = json!({
            "key": key,
            "version": version,
            "locale": locale.map(|l| vec![l.replace('-', "_")]),
        });
        let data = self
            .execute("getContentById", CONTENT_BY_ID_QUERY, variables)
            .await?;
        content_item(data)
    }

    /// Load the content item published at `path`
    pub async fn get_content_by_path(
        &self,
        path: &str,
        locale: Option<&str>,
    ) -> AppResult<Option<ContentItem>> {
        let variables = json!({
            "path": path,
            "locale": locale.map(|l| vec![l.replace('-', "_")]),
        });
        let data = self
            .execute("getContentByPath", CONTENT_BY_PATH_QUERY, variables)
            .await?;
        content_item(data)
    }

    /// Query text with the registered component fragments spread into it
    fn document(&self, query: &str) -> String {
        let spreads = self
            .fragments
            .iter()
            .map(|fragment| format!("...{}", fragment.name))
            .collect::<Vec<_>>()
            .join("\n      ");
        let mut document = query.replace("...ComponentData", &spreads);
        for fragment in &self.fragments {
            document.push_str("\n\n");
            document.push_str(fragment.definition);
        }
        document
    }

    async fn execute(&self, operation: &str, query: &str, variables: Value) -> AppResult<Value> {
        let mut request = self.http.post(&self.endpoint);

        let mut params: Vec<(&str, &str)> = Vec::new();
        if let GraphAuth::Public {
            single_key: Some(key),
        } = &self.auth
        {
            params.push(("auth", key.as_str()));
        }
        if !self.query_cache {
            params.push(("cache", "false"));
        }
        if !params.is_empty() {
            request = request.query(&params);
        }

        request = match &self.auth {
            GraphAuth::Basic { app_key, secret } => {
                let credentials = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", app_key, secret));
                request.header("Authorization", format!("Basic {}", credentials))
            }
            GraphAuth::PreviewToken(token) => {
                request.header("Authorization", format!("Bearer {}", token))
            }
            GraphAuth::Public { .. } => request,
        };

        let body = json!({
            "operationName": operation,
            "query": self.document(query),
            "variables": variables,
        });

        tracing::debug!(
            operation = %operation,
            auth = %self.auth.label(),
            cache = self.query_cache,
            "Querying content graph"
        );

        let start = Instant::now();
        let response = request.json(&body).send().await?;
        let status = response.status();
        crate::metrics::record_graph_request(
            operation,
            status.as_u16(),
            start.elapsed().as_secs_f64(),
        );

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let payload: GraphResponse<Value> = response.json().await?;
        if !payload.errors.is_empty() {
            let message = payload
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AppError::Graph(message));
        }

        payload
            .data
            .ok_or_else(|| AppError::Graph("response carried no data".to_string()))
    }
}

/// Pull `content.item` out of a query result
fn content_item(data: Value) -> AppResult<Option<ContentItem>> {
    match data.pointer("/content/item") {
        None | Some(Value::Null) => Ok(None),
        Some(item) => parse_item(item.clone()).map(Some),
    }
}

/// Split a graph item into its metadata and its content properties
pub fn parse_item(item: Value) -> AppResult<ContentItem> {
    let Value::Object(mut fields) = item else {
        return Err(AppError::Graph("content item is not an object".to_string()));
    };

    let metadata = fields
        .remove("_metadata")
        .ok_or_else(|| AppError::Graph("content item has no _metadata".to_string()))?;
    let metadata: GraphMetadata = serde_json::from_value(metadata)?;
    let typename = fields.remove("__typename");

    let mut types = metadata.types;
    if types.is_empty() {
        if let Some(Value::String(name)) = typename {
            types.push(name);
        }
    }

    Ok(ContentItem {
        key: metadata.key,
        types,
        display_name: metadata.display_name,
        locale: metadata.locale,
        data: Value::Object(fields),
    })
}
