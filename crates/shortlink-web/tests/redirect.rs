//! Integration tests for the redirect page

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

mod common;

use axum::http::{StatusCode, header};
use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use shortlink_core::utils::unix_now;
use shortlink_protocol::{
    FreshnessWindow, ProtocolRevision, ResolvedMode, SchemeKind, SignatureScheme, Verifier,
};
use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const RESOLVER_PATH: &str = "/api/link-config/get_redirect_url";

/// Resolver double that checks signatures the way a real resolver does
struct VerifyingResolver {
    verifier: Verifier,
    url: &'static str,
}

impl Respond for VerifyingResolver {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let query: BTreeMap<String, String> = request
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        match self.verifier.verify(&query, unix_now()) {
            Ok(_) => ResponseTemplate::new(200).set_body_json(success(json!({"url": self.url}))),
            Err(e) => ResponseTemplate::new(200).set_body_json(failure(1, &e.to_string())),
        }
    }
}

/// In-memory log sink
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

async fn resolver_returns(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(RESOLVER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_resolved_link_navigates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RESOLVER_PATH))
        .and(query_param("key", "abc123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(success(json!({"url": "https://dest.example/x"}))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = get(app(test_config(&server)), "/s?key=abc123").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://dest.example/x"
    );
    assert_eq!(response.headers().get(header::CACHE_CONTROL).unwrap(), "no-store");
}

#[tokio::test]
async fn test_refused_link_renders_invalid_page() {
    let server = MockServer::start().await;
    resolver_returns(&server, failure(1, "signature mismatch for key abc123")).await;

    let config = test_config(&server);
    let message = config.redirect.invalid_message.clone();
    let response = get(app(config), "/s?key=abc123").await;

    assert_eq!(response.status(), StatusCode::GONE);
    let body = body_text(response).await;
    assert!(body.contains(&message));
    assert!(!body.contains("signature mismatch"));
}

#[tokio::test]
async fn test_success_false_wins_over_code_zero() {
    let server = MockServer::start().await;
    resolver_returns(
        &server,
        json!({"success": false, "code": 0, "msg": "", "data": {"url": "https://dest.example/x"}}),
    )
    .await;

    let response = get(app(test_config(&server)), "/s?key=abc123").await;
    assert_eq!(response.status(), StatusCode::GONE);
}

#[tokio::test]
async fn test_missing_key_makes_no_resolver_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = app(test_config(&server));
    assert_eq!(get(app.clone(), "/s").await.status(), StatusCode::GONE);
    assert_eq!(get(app, "/s?key=").await.status(), StatusCode::GONE);
}

#[tokio::test]
async fn test_malformed_resolver_body_expires() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RESOLVER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let response = get(app(test_config(&server)), "/s?key=abc123").await;
    assert_eq!(response.status(), StatusCode::GONE);
}

#[tokio::test]
async fn test_non_http_destination_is_refused() {
    let server = MockServer::start().await;
    resolver_returns(&server, success(json!({"url": "javascript:alert(1)"}))).await;

    let response = get(app(test_config(&server)), "/s?key=abc123").await;
    assert_eq!(response.status(), StatusCode::GONE);
}

#[tokio::test]
async fn test_slow_resolver_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RESOLVER_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(success(json!({"url": "https://dest.example/x"})))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.api.request_timeout = 1;

    let response = get(app(config), "/s?key=abc123").await;
    assert_eq!(response.status(), StatusCode::GONE);
}

#[tokio::test]
async fn test_embed_mode_frames_destination() {
    let server = MockServer::start().await;
    resolver_returns(&server, success(json!({"url": "https://dest.example/x?a=1&b=2"}))).await;

    let mut config = test_config(&server);
    config.redirect.mode = ResolvedMode::Embed;

    let response = get(app(config), "/s?key=abc123").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains(r#"<iframe src="https://dest.example/x?a=1&amp;b=2""#));
}

#[tokio::test]
async fn test_signature_verifies_at_resolver() {
    let server = MockServer::start().await;
    let window = FreshnessWindow {
        max_age_secs: Some(60),
        max_skew_secs: 5,
    };
    Mock::given(method("GET"))
        .and(path(RESOLVER_PATH))
        .respond_with(VerifyingResolver {
            verifier: Verifier::new(ProtocolRevision::QueryKey, SignatureScheme::Md5, window),
            url: "https://dest.example/verified",
        })
        .mount(&server)
        .await;

    let response = get(app(test_config(&server)), "/s?key=abc123").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://dest.example/verified"
    );
}

#[tokio::test]
async fn test_hmac_deployment_verifies_only_with_shared_secret() {
    let server = MockServer::start().await;
    let scheme = SignatureScheme::from_kind(SchemeKind::HmacSha256, Some("s3cret")).unwrap();
    Mock::given(method("GET"))
        .and(path(RESOLVER_PATH))
        .respond_with(VerifyingResolver {
            verifier: Verifier::new(ProtocolRevision::QueryKey, scheme, FreshnessWindow::unbounded()),
            url: "https://dest.example/hmac",
        })
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.signing.scheme = SchemeKind::HmacSha256;
    config.signing.secret = Some("s3cret".to_string());
    let response = get(app(config.clone()), "/s?key=abc123").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    config.signing.secret = Some("wrong".to_string());
    let response = get(app(config), "/s?key=abc123").await;
    assert_eq!(response.status(), StatusCode::GONE);
}

#[tokio::test]
async fn test_path_token_revision() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RESOLVER_PATH))
        .and(query_param("token", "tok42"))
        .and(query_param("md5_str", "9e107d9d372bb6826bd81d3542a419d6"))
        .and(query_param("t1", "1699999999"))
        .respond_with(VerifyingResolver {
            verifier: Verifier::new(
                ProtocolRevision::PathToken,
                SignatureScheme::Md5,
                FreshnessWindow::unbounded(),
            ),
            url: "https://dest.example/token",
        })
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.redirect.revision = ProtocolRevision::PathToken;
    let app = app(config);

    let response = get(
        app.clone(),
        "/s/tok42/9e107d9d372bb6826bd81d3542a419d6?t=1699999999",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // Missing t never reaches the resolver.
    let response = get(app.clone(), "/s/tok42/9e107d9d372bb6826bd81d3542a419d6").await;
    assert_eq!(response.status(), StatusCode::GONE);

    // The other revision is not mounted.
    let response = get(app, "/s?key=abc123").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = MockServer::start().await;
    let response = get(app(test_config(&server)), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let request_id = response.headers().get("x-request-id").unwrap();
    assert!(request_id.to_str().unwrap().starts_with("req_"));
}

#[tokio::test]
async fn test_link_keys_stay_out_of_request_logs() {
    let server = MockServer::start().await;
    resolver_returns(&server, success(json!({"url": "https://dest.example/x"}))).await;
    let app = app(test_config(&server));

    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter("shortlink_web=debug,tower_http=debug")
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let response = get(app, "/s?key=abc123").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let text = logs.text();
    assert!(text.contains("path=/s"), "{text}");
    assert!(!text.contains("abc123"), "{text}");
    assert!(!text.contains("key="), "{text}");
}
