//! Resolver seam and the per-request redirect driver

use crate::api_client::ApiClient;
use async_trait::async_trait;
use shortlink_core::Result;
use shortlink_protocol::{RedirectFlow, RedirectState, SignedRequest};
use std::time::Duration;
use tracing::{debug, warn};

/// Anything that can turn a signed request into a destination URL
#[async_trait]
pub trait RedirectResolver: Send + Sync {
    /// Resolve `request`; every failure is an error
    async fn resolve(&self, request: &SignedRequest) -> Result<String>;
}

#[async_trait]
impl RedirectResolver for ApiClient {
    async fn resolve(&self, request: &SignedRequest) -> Result<String> {
        Self::resolve(self, request).await
    }
}

/// Run the single resolver call of a mounted flow.
///
/// A flow that is already terminal is left alone. A call that outlives
/// `timeout` counts as a failed resolve and expires the flow.
pub async fn drive(flow: &mut RedirectFlow, resolver: &dyn RedirectResolver, timeout: Duration) {
    let Some(request) = flow.request().cloned() else {
        return;
    };

    match tokio::time::timeout(timeout, resolver.resolve(&request)).await {
        Ok(outcome) => {
            if let Err(e) = &outcome {
                debug!("Resolver refused link: {}", e);
            }
            flow.complete(outcome);
        }
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis(), "Resolver call timed out");
            flow.complete::<()>(Err(()));
        }
    }
}

/// Destination URL if the flow resolved, `None` for every other outcome
#[must_use]
pub fn destination(flow: &RedirectFlow) -> Option<&str> {
    match flow.state() {
        RedirectState::Resolved(url) => Some(url),
        RedirectState::Pending | RedirectState::Expired => None,
    }
}
