//! Console session handling
//!
//! Every browser gets a random session ID cookie; the resource API ties the
//! login to it. Guards resolve the cookie to an [`Identity`] per request and
//! put it in the request extensions.

use crate::{error::WebError, state::AppState};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use shortlink_core::{Error, Identity};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Opaque session ID shared with the resource API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session(String);

impl Session {
    /// Wrap an existing session ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random session
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Session ID
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }

    /// `Cookie` header value carrying this session
    #[must_use]
    pub fn cookie(&self, name: &str) -> String {
        format!("{name}={}", self.0)
    }

    /// `Set-Cookie` header value issuing this session
    #[must_use]
    pub fn set_cookie(&self, name: &str) -> String {
        format!("{name}={}; Path=/; HttpOnly; SameSite=Lax", self.0)
    }

    /// Session ID from the request cookies, if it looks like one we issued
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, name: &str) -> Option<Self> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(cookie, _)| *cookie == name)
            .and_then(|(_, id)| Uuid::parse_str(id).ok())
            .map(|id| Self(id.to_string()))
    }
}

/// Attach a [`Session`] to every request, issuing a cookie when absent
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_name = &state.config.session.cookie_name;
    let (session, issued) = match Session::from_headers(request.headers(), cookie_name) {
        Some(session) => (session, false),
        None => (Session::generate(), true),
    };

    request.extensions_mut().insert(session.clone());
    let mut response = next.run(request).await;

    if issued {
        debug!("Issued new console session");
        match HeaderValue::from_str(&session.set_cookie(cookie_name)) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!("Invalid session cookie header: {}", e),
        }
    }

    response
}

/// Reject requests whose session is not logged in; inserts [`Identity`]
pub async fn require_login(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, WebError> {
    let session = request
        .extensions()
        .get::<Session>()
        .cloned()
        .ok_or_else(|| Error::Authentication("no session".to_string()))?;

    let identity = state.api_client.user_info(&session).await.map_err(|e| {
        debug!("Session lookup failed: {}", e);
        Error::Authentication("login required".to_string())
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Reject logged-in users without the configured admin role
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, WebError> {
    let required_role = &state.config.session.admin_role;
    let allowed = request
        .extensions()
        .get::<Identity>()
        .is_some_and(|identity| identity.has_role(required_role));

    if !allowed {
        warn!("Account management denied to non-admin user");
        return Err(Error::Forbidden {
            required_role: required_role.clone(),
        }
        .into());
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ID: &str = "0f5e7c1a-0000-4000-8000-000000000001";

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_session_from_cookie_header() {
        let session =
            Session::from_headers(&headers(&format!("theme=dark; sessionId={ID}")), "sessionId");
        assert_eq!(session, Some(Session::new(ID)));
    }

    #[test]
    fn test_session_ignores_other_cookies_and_garbage() {
        assert!(Session::from_headers(&headers("theme=dark"), "sessionId").is_none());
        assert!(Session::from_headers(&headers("sessionId=not-a-uuid"), "sessionId").is_none());
        assert!(Session::from_headers(&HeaderMap::new(), "sessionId").is_none());
    }

    #[test]
    fn test_generated_sessions_are_unique_uuids() {
        let a = Session::generate();
        let b = Session::generate();

        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.id()).is_ok());
    }

    #[test]
    fn test_cookie_rendering() {
        let session = Session::new(ID);

        assert_eq!(session.cookie("sessionId"), format!("sessionId={ID}"));
        assert_eq!(
            session.set_cookie("sessionId"),
            format!("sessionId={ID}; Path=/; HttpOnly; SameSite=Lax")
        );
    }
}
