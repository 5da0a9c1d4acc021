//! Redirect page handlers
//!
//! Each request mounts its own [`RedirectFlow`], makes at most one resolver
//! call and renders the terminal state. Failures all look the same to the
//! visitor; the cause only reaches the logs.

use crate::{
    handlers::pages::{expired_page, frame_page},
    resolver::{destination, drive},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use shortlink_core::utils::{is_http_url, unix_now};
use shortlink_protocol::{RedirectFlow, ResolvedMode};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, info, warn};

/// `GET /s?key=...`
///
/// An unparseable query string counts as missing parameters.
pub async fn query_key_redirect(
    State(state): State<Arc<AppState>>,
    query: Option<Query<BTreeMap<String, String>>>,
) -> Response {
    let Query(query) = query.unwrap_or_default();
    handle(&state, None, &query).await
}

/// `GET /s/:token/:md5_str?t=...`
pub async fn path_token_redirect(
    State(state): State<Arc<AppState>>,
    Path((token, md5_str)): Path<(String, String)>,
    query: Option<Query<BTreeMap<String, String>>>,
) -> Response {
    let Query(query) = query.unwrap_or_default();
    handle(&state, Some((token.as_str(), md5_str.as_str())), &query).await
}

async fn handle(
    state: &AppState,
    path: Option<(&str, &str)>,
    query: &BTreeMap<String, String>,
) -> Response {
    let revision = state.config.redirect.revision;
    let (mut flow, mounted) = RedirectFlow::mount(revision, path, query, &state.scheme, unix_now());

    if let Err(e) = mounted {
        debug!(%revision, "Rejected inbound link: {}", e);
    }

    drive(&mut flow, state.resolver.as_ref(), state.api_client.timeout()).await;

    let response = match destination(&flow) {
        Some(url) if is_http_url(url) => {
            info!(%revision, "Link resolved");
            match state.config.redirect.mode {
                ResolvedMode::Navigate => Redirect::to(url).into_response(),
                ResolvedMode::Embed => frame_page(url).into_response(),
            }
        }
        Some(_) => {
            warn!(%revision, "Resolver returned a non-http destination");
            expired(state)
        }
        None => expired(state),
    };

    no_store(response)
}

fn expired(state: &AppState) -> Response {
    (
        StatusCode::GONE,
        expired_page(&state.config.redirect.invalid_message),
    )
        .into_response()
}

fn no_store(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
