//! Route definitions

use crate::{
    handlers::{console, pages, redirect},
    session::{require_admin, require_login, session_middleware},
    state::AppState,
};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use shortlink_protocol::ProtocolRevision;
use std::sync::Arc;

/// Redirect page path for the query-key revision
pub const QUERY_KEY_PATH: &str = "/s";
/// Redirect page path for the path-token revision
pub const PATH_TOKEN_PATH: &str = "/s/:token/:md5_str";

/// Build the complete router.
///
/// Only the configured redirect revision is mounted.
pub fn build_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let redirect_routes = match state.config.redirect.revision {
        ProtocolRevision::QueryKey => {
            Router::new().route(QUERY_KEY_PATH, get(redirect::query_key_redirect))
        }
        ProtocolRevision::PathToken => {
            Router::new().route(PATH_TOKEN_PATH, get(redirect::path_token_redirect))
        }
    };

    let account_routes = Router::new()
        .route("/accounts", get(console::list_accounts))
        .route("/accounts/create", post(console::create_account))
        .route("/accounts/update", post(console::update_account))
        .route("/accounts/delete", post(console::delete_account))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let protected_routes = Router::new()
        .route("/user", get(console::current_user))
        .route("/configs", get(console::list_configs))
        .route("/configs/create", post(console::create_config))
        .route("/configs/update", post(console::update_config))
        .route("/configs/delete", post(console::delete_config))
        .route("/statistics", post(console::statistics))
        .route("/url", get(console::key_url))
        .merge(account_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_login));

    let console_routes = Router::new()
        .route("/login", post(console::login))
        .route("/logout", post(console::logout))
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware));

    Router::new()
        .merge(redirect_routes)
        .nest("/console/api", console_routes)
        .route("/health", get(pages::health_check))
}
