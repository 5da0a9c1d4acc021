//! HTTP mapping of console errors

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shortlink_core::{ApiEnvelope, Error};
use tracing::{error, warn};

/// Console handler error, rendered as a failed envelope
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct WebError(#[from] pub Error);

impl From<validator::ValidationErrors> for WebError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self(Error::from(errors))
    }
}

impl WebError {
    /// Status code and envelope code for this error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Authentication(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            // Business failures pass through with the backend's message.
            Error::Upstream { .. } => StatusCode::OK,
            Error::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Error::Http(_) | Error::Serialization(_) => StatusCode::BAD_GATEWAY,
            Error::Io(_)
            | Error::Configuration { .. }
            | Error::Protocol(_)
            | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, msg) = match self.0 {
            Error::Upstream { code, message } => (code, message),
            Error::Validation { message, .. } => (i64::from(status.as_u16()), message),
            Error::Authentication(_) => (i64::from(status.as_u16()), "login required".to_string()),
            Error::Forbidden { .. } => (i64::from(status.as_u16()), "permission denied".to_string()),
            Error::NotFound { resource } => (i64::from(status.as_u16()), format!("{resource} not found")),
            other => {
                if status.is_server_error() {
                    error!("Console request failed: {}", other);
                } else {
                    warn!("Console request failed: {}", other);
                }
                (i64::from(status.as_u16()), "request failed".to_string())
            }
        };

        (status, Json(ApiEnvelope::<()>::failure(code, msg))).into_response()
    }
}

/// Result type for console handlers
pub type WebResult<T> = Result<T, WebError>;
