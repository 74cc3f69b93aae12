//! Integration tests for Sitegate
//!
//! These tests drive the router end to end. The content graph is replaced
//! by a wiremock server.

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode, Uri},
    response::Response,
    routing::get,
    Extension, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header as header_eq, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sitegate::middleware::with_site_middleware;
use sitegate::routes::build_app;
use sitegate::{AppConfig, AppState, Environment, SiteContext};

fn state_with(configure: impl FnOnce(&mut AppConfig)) -> Arc<AppState> {
    let mut config = AppConfig::default();
    config.graph.single_key = Some("public-key".to_string());
    configure(&mut config);
    Arc::new(AppState::new(config).unwrap())
}

/// Site middleware in front of a router that echoes the URI it was routed with
fn echo_app(state: Arc<AppState>) -> Router {
    let inner = Router::new()
        .route(
            "/context",
            get(|Extension(ctx): Extension<SiteContext>| async move {
                format!("{:?}|{}|{}", ctx.visitor_id, ctx.search, ctx.edit_mode)
            }),
        )
        .fallback(|uri: Uri| async move { uri.to_string() });
    with_site_middleware(state, inner)
}

async fn send(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn send_with_cookie(app: Router, uri: &str, cookie: &str) -> Response {
    let req = Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    app.oneshot(req).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(String::from)
        .collect()
}

mod middleware_tests {
    use super::*;

    #[tokio::test]
    async fn test_preview_breakout_redirect() {
        let response = send(echo_app(state_with(|_| {})), "/preview?key=X").await;

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            header_str(response.headers(), "location"),
            Some("/preview?key=X&breakout=1")
        );
        assert!(header_str(response.headers(), "x-visitorid").is_none());
    }

    #[tokio::test]
    async fn test_preview_with_breakout_passes_through() {
        let response = send(echo_app(state_with(|_| {})), "/preview?key=X&breakout=1").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(header_str(response.headers(), "x-visitorid").is_some());
        assert_eq!(body_text(response).await, "/preview?key=X&breakout=1");
    }

    #[tokio::test]
    async fn test_locale_prefix_rewrite() {
        let state = state_with(|_| {});

        let response = send(echo_app(state.clone()), "/en/products").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "/products");

        let response = send(echo_app(state.clone()), "/en").await;
        assert_eq!(body_text(response).await, "/");

        let response = send(echo_app(state.clone()), "/en/search?q=boots").await;
        assert_eq!(body_text(response).await, "/search?q=boots");

        let response = send(echo_app(state), "/en?x=1").await;
        assert_eq!(body_text(response).await, "/?x=1");
    }

    #[tokio::test]
    async fn test_rewrites_do_not_track_visitors() {
        let response = send(echo_app(state_with(|_| {})), "/en/products").await;
        assert!(header_str(response.headers(), "x-visitorid").is_none());
        assert!(set_cookies(response.headers()).is_empty());
    }

    #[tokio::test]
    async fn test_nested_preview_rewrite() {
        let state = state_with(|_| {});

        let response = send(echo_app(state.clone()), "/fr/preview").await;
        assert_eq!(body_text(response).await, "/preview");

        let response = send(echo_app(state), "/preview/extra?key=1").await;
        assert_eq!(body_text(response).await, "/preview?key=1");
    }

    #[tokio::test]
    async fn test_edit_mode_headers_and_cookie() {
        let response = send(echo_app(state_with(|_| {})), "/about?ctx=edit").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_str(response.headers(), "x-edit-mode"), Some("true"));
        assert_eq!(header_str(response.headers(), "x-draft-mode"), Some("true"));
        assert!(header_str(response.headers(), "x-visitorid").is_none());

        let cookies = set_cookies(response.headers());
        assert_eq!(cookies.len(), 1);
        let bypass = &cookies[0];
        assert!(bypass.starts_with("__prerender_bypass=true"));
        assert!(bypass.contains("HttpOnly"));
        assert!(bypass.contains("SameSite=Lax"));
        assert!(bypass.contains("Path=/"));
        assert!(!bypass.contains("Secure"));
    }

    #[tokio::test]
    async fn test_edit_mode_cookie_in_production() {
        let state = state_with(|c| c.site.environment = Environment::Production);
        let response = send(echo_app(state), "/about?ctx=edit").await;

        let cookies = set_cookies(response.headers());
        assert!(cookies[0].contains("Secure"));
        assert!(cookies[0].contains("SameSite=None"));
    }

    #[tokio::test]
    async fn test_visitor_tracking_headers() {
        let response = send(echo_app(state_with(|_| {})), "/products?color=red&size=m").await;

        assert_eq!(response.status(), StatusCode::OK);
        let visitor_id = header_str(response.headers(), "x-visitorid")
            .unwrap()
            .to_string();
        assert!(sitegate::services::is_valid_visitor_id(&visitor_id));
        assert_eq!(
            header_str(response.headers(), "x-search"),
            Some("?color=red&size=m")
        );

        let cookies = set_cookies(response.headers());
        assert!(cookies
            .iter()
            .any(|c| c.starts_with(&format!("visitorId={}", visitor_id))));
    }

    #[tokio::test]
    async fn test_search_header_empty_without_query() {
        let response = send(echo_app(state_with(|_| {})), "/products").await;
        assert_eq!(header_str(response.headers(), "x-search"), Some(""));
    }

    #[tokio::test]
    async fn test_existing_visitor_id_is_kept() {
        let response = send_with_cookie(
            echo_app(state_with(|_| {})),
            "/",
            "visitorId=returning-visitor-42; theme=dark",
        )
        .await;

        assert_eq!(
            header_str(response.headers(), "x-visitorid"),
            Some("returning-visitor-42")
        );
        assert!(set_cookies(response.headers())
            .iter()
            .any(|c| c.starts_with("visitorId=returning-visitor-42")));
    }

    #[tokio::test]
    async fn test_site_context_reaches_handlers() {
        let response = send_with_cookie(
            echo_app(state_with(|_| {})),
            "/context?a=1",
            "visitorId=returning-visitor-42",
        )
        .await;

        assert_eq!(
            body_text(response).await,
            "Some(\"returning-visitor-42\")|?a=1|false"
        );
    }

    #[tokio::test]
    async fn test_excluded_paths_skip_middleware() {
        let state = state_with(|_| {});

        for uri in ["/api/en/status", "/favicon.ico", "/assets/preview", "/_static/app"] {
            let response = send(echo_app(state.clone()), uri).await;
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
            assert!(header_str(response.headers(), "x-visitorid").is_none(), "{}", uri);
            assert_eq!(body_text(response).await, uri);
        }
    }

    #[tokio::test]
    async fn test_legacy_edit_url_fallback() {
        let response = send(echo_app(state_with(|_| {})), "/about?key=k1&epieditmode=true").await;

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            header_str(response.headers(), "location"),
            Some("/preview?key=k1&ctx=edit")
        );
    }

    #[tokio::test]
    async fn test_legacy_edit_url_fallback_disabled() {
        let state = state_with(|c| c.edit.legacy_fallback = false);
        let response = send(echo_app(state), "/about?epieditmode=true").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            header_str(response.headers(), "x-search"),
            Some("?epieditmode=true")
        );
    }
}

mod app_tests {
    use super::*;

    fn form_container_item() -> serde_json::Value {
        json!({
            "data": {
                "content": {
                    "item": {
                        "__typename": "OptiFormsContainerData",
                        "_metadata": {
                            "key": "abc",
                            "types": ["OptiFormsContainerData", "_Section"],
                            "displayName": "Contact form",
                            "locale": "en"
                        },
                        "Title": "Contact us"
                    }
                }
            }
        })
    }

    async fn graph_state(server: &MockServer) -> Arc<AppState> {
        let endpoint = format!("{}/content/v2", server.uri());
        state_with(move |c| c.graph.endpoint = endpoint)
    }

    #[tokio::test]
    async fn test_liveness_check() {
        let response = send(build_app(state_with(|_| {})), "/api/live").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(header_str(response.headers(), "x-visitorid").is_none());
        assert_eq!(body_text(response).await, "alive");
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = send(build_app(state_with(|_| {})), "/api/health").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["environment"], "development");
        assert_eq!(body["graph_configured"], true);
    }

    #[tokio::test]
    async fn test_preview_requires_key() {
        let response = send(build_app(state_with(|_| {})), "/preview").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_preview_renders_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/content/v2"))
            .and(query_param("cache", "false"))
            .and(header_eq("authorization", "Bearer preview-tok"))
            .and(body_partial_json(json!({
                "operationName": "getContentById",
                "variables": { "key": "abc", "version": "7" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(form_container_item()))
            .expect(1)
            .mount(&server)
            .await;

        let response = send(
            build_app(graph_state(&server).await),
            "/preview?key=abc&ver=7&ctx=edit&preview_token=preview-tok&breakout=1",
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            header_str(response.headers(), "cache-control"),
            Some("no-store")
        );
        // ctx=edit puts the request into edit mode before the page renders
        assert_eq!(header_str(response.headers(), "x-edit-mode"), Some("true"));

        let html = body_text(response).await;
        assert!(html.contains("<title>Contact form</title>"));
        assert!(html.contains("data-refresh-timeout=\"500\""));
        assert!(html.contains("Form Container"));
        assert!(html.contains("data-epi-block-id=\"abc\""));
        assert!(html.contains("&quot;Title&quot;: &quot;Contact us&quot;"));
    }

    #[tokio::test]
    async fn test_localized_page_is_loaded_by_stripped_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/content/v2"))
            .and(query_param("auth", "public-key"))
            .and(body_partial_json(json!({
                "operationName": "getContentByPath",
                "variables": { "path": "/contact" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(form_container_item()))
            .expect(1)
            .mount(&server)
            .await;

        let response = send(build_app(graph_state(&server).await), "/en/contact").await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Form Container"));
        assert!(!html.contains("data-epi-block-id"));
    }

    #[tokio::test]
    async fn test_page_in_edit_mode_renders_edit_attributes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/content/v2"))
            .and(body_partial_json(json!({
                "operationName": "getContentByPath",
                "variables": { "path": "/contact" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(form_container_item()))
            .expect(1)
            .mount(&server)
            .await;

        let response = send(build_app(graph_state(&server).await), "/contact?ctx=edit").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            header_str(response.headers(), "cache-control"),
            Some("no-store")
        );
        let html = body_text(response).await;
        assert!(html.contains("data-epi-block-id=\"abc\""));
    }

    #[tokio::test]
    async fn test_pages_only_answer_get() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/content/v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(form_container_item()))
            .expect(0)
            .mount(&server)
            .await;

        let request = Request::builder()
            .method("POST")
            .uri("/contact")
            .body(Body::empty())
            .unwrap();
        let response = build_app(graph_state(&server).await)
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_page_tracks_visitor() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/content/v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(form_container_item()))
            .mount(&server)
            .await;

        let response = send(build_app(graph_state(&server).await), "/contact?utm=x").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(header_str(response.headers(), "x-visitorid").is_some());
        assert_eq!(header_str(response.headers(), "x-search"), Some("?utm=x"));
    }

    #[tokio::test]
    async fn test_missing_page_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/content/v2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": { "content": { "item": null } } })),
            )
            .mount(&server)
            .await;

        let response = send(build_app(graph_state(&server).await), "/nowhere").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        // Visitor tracking still applies to error pages
        assert!(header_str(response.headers(), "x-visitorid").is_some());
    }

    #[tokio::test]
    async fn test_graph_errors_become_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/content/v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [{ "message": "Unknown type Locales" }]
            })))
            .mount(&server)
            .await;

        let response = send(build_app(graph_state(&server).await), "/contact").await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"], "graph_error");
    }

    #[tokio::test]
    async fn test_graph_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/content/v2"))
            // base64("app:secret")
            .and(header_eq("authorization", "Basic YXBwOnNlY3JldA=="))
            .respond_with(ResponseTemplate::new(200).set_body_json(form_container_item()))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = format!("{}/content/v2", server.uri());
        let state = state_with(move |c| {
            c.graph.endpoint = endpoint;
            c.graph.app_key = Some("app".into());
            c.graph.secret = Some("secret".into());
        });

        let response = send(build_app(state), "/contact").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
