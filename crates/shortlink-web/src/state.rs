//! Application state management

use crate::{api_client::ApiClient, resolver::RedirectResolver};
use shortlink_core::{Config, Result};
use shortlink_protocol::SignatureScheme;
use std::sync::Arc;

/// Application state holding configuration and clients
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// Client for the resource API
    pub api_client: ApiClient,
    /// Resolver used by the redirect page
    pub resolver: Arc<dyn RedirectResolver>,
    /// Scheme used to sign redirect requests
    pub scheme: SignatureScheme,
}

impl AppState {
    /// Create new application state, resolving through the resource API
    ///
    /// # Errors
    ///
    /// Returns an error if the signing scheme or HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let api_client = ApiClient::new(config.api.clone(), config.session.cookie_name.clone())?;
        let resolver = Arc::new(api_client.clone());
        Self::with_resolver(config, api_client, resolver)
    }

    /// Create state with a custom resolver
    ///
    /// # Errors
    ///
    /// Returns an error if the signing scheme cannot be built.
    pub fn with_resolver(
        config: Config,
        api_client: ApiClient,
        resolver: Arc<dyn RedirectResolver>,
    ) -> Result<Self> {
        let scheme = config.signing.scheme()?;
        Ok(Self {
            config,
            api_client,
            resolver,
            scheme,
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("api_client", &self.api_client)
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}
