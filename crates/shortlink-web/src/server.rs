//! Web server setup and configuration

use crate::{middleware::logging::request_logging_middleware, routes::build_routes, state::AppState};
use axum::{Router, body::Body, http::Request, middleware};
use shortlink_core::{Config, Result};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Build the complete web application with all routes and state
///
/// # Errors
///
/// Returns an error if the application state cannot be built from `config`.
pub fn build_app(config: Config) -> Result<Router> {
    Ok(build_app_with_state(AppState::new(config)?))
}

/// Span for one HTTP exchange, recording the path but never the query
fn http_span(request: &Request<Body>) -> tracing::Span {
    tracing::info_span!(
        "http",
        method = %request.method(),
        path = %request.uri().path(),
        version = ?request.version(),
    )
}

/// Build the application around prepared state
pub fn build_app_with_state(state: AppState) -> Router {
    let state = Arc::new(state);

    build_routes(&state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(http_span))
                .layer(middleware::from_fn(request_logging_middleware)),
        )
        .with_state(state)
}
