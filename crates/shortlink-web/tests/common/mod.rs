//! Common test utilities for the web host integration tests

#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use serde_json::{Value, json};
use shortlink_core::Config;
use std::sync::Once;
use tower::ServiceExt;
use wiremock::MockServer;

/// Session ID used by tests that act as an already-known browser
pub const SESSION_ID: &str = "0f5e7c1a-0000-4000-8000-000000000001";

static INIT_LOGGER: Once = Once::new();

/// Initialize test logging (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

/// Default configuration pointed at a mock resource API
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.api.request_timeout = 2;
    config
}

/// Build the app for `config`
pub fn app(config: Config) -> Router {
    init_test_logging();
    shortlink_web::build_app(config).unwrap()
}

/// Send a GET through the router
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Send a GET carrying the test session cookie
pub async fn get_with_session(app: Router, uri: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header(header::COOKIE, format!("sessionId={SESSION_ID}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a JSON body carrying the test session cookie
pub async fn post_json(app: Router, uri: &str, body: &Value) -> Response<Body> {
    let request = Request::post(uri)
        .header(header::COOKIE, format!("sessionId={SESSION_ID}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body as text
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Collect a response body as JSON
pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

/// Successful resource API envelope
pub fn success(data: Value) -> Value {
    json!({"success": true, "code": 0, "msg": "", "data": data})
}

/// Failed resource API envelope
pub fn failure(code: i64, msg: &str) -> Value {
    json!({"success": false, "code": code, "msg": msg, "data": null})
}
