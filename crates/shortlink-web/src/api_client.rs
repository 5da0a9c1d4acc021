//! HTTP client for the resource API
//!
//! One transport for the resolver and every console endpoint. Console calls
//! forward the browser's session cookie so the resource API sees the same
//! session it issued at login.

use crate::session::Session;
use reqwest::{Client, RequestBuilder, StatusCode, header};
use serde::{Serialize, de::DeserializeOwned};
use shortlink_core::config::ApiConfig;
use shortlink_core::types::{
    AccountList, AccountQuery, ApiEnvelope, ConfigQuery, ConfigStatistics, DeleteAccountForm,
    DeleteConfigForm, Identity, KeyQuery, LinkConfigList, LoginForm, NewAccountForm,
    NewConfigForm, RedirectUrl, StatisticsQuery, UpdateAccountForm, UpdateConfigForm,
};
use shortlink_core::{Error, Result};
use shortlink_protocol::SignedRequest;
use std::time::Duration;

/// API client for making HTTP requests to the resource API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    api: ApiConfig,
    cookie_name: String,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api: ApiConfig, cookie_name: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(api.timeout())
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api,
            cookie_name: cookie_name.into(),
        })
    }

    /// Configured request timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.api.timeout()
    }

    /// Ask the resolver for the destination of a signed request.
    ///
    /// # Errors
    ///
    /// Any transport failure, non-2xx status, malformed body, `success = false`
    /// or empty URL.
    pub async fn resolve(&self, request: &SignedRequest) -> Result<String> {
        let builder = self
            .client
            .get(self.api.resolver_url())
            .query(&request.query_pairs());

        let RedirectUrl { url } = self
            .send::<RedirectUrl>(builder, "resolve redirect")
            .await?
            .into_result()?;

        if url.is_empty() {
            return Err(Error::Upstream {
                code: 0,
                message: "resolver returned an empty url".to_string(),
            });
        }
        Ok(url)
    }

    /// Log in; the resource API binds the identity to `session`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the credentials are rejected.
    pub async fn login(&self, session: &Session, form: &LoginForm) -> Result<()> {
        self.post_unit("/api/login", session, form, "login").await
    }

    /// End the session
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn logout(&self, session: &Session) -> Result<()> {
        self.post_unit("/api/logout", session, &serde_json::json!({}), "logout")
            .await
    }

    /// Identity bound to `session`
    ///
    /// # Errors
    ///
    /// Returns an error if the session is unknown or the request fails.
    pub async fn user_info(&self, session: &Session) -> Result<Identity> {
        let builder = self.get("/api/user/info", session);
        self.send(builder, "fetch user info").await?.into_result()
    }

    /// One page of configs
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn list_configs(&self, session: &Session, query: &ConfigQuery) -> Result<LinkConfigList> {
        let builder = self.get("/api/link-config/list", session).query(query);
        self.send(builder, "list configs").await?.into_result()
    }

    /// Create a config
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn create_config(&self, session: &Session, form: &NewConfigForm) -> Result<()> {
        self.post_unit("/api/link-config/create", session, form, "create config")
            .await
    }

    /// Change a config's ratio
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn update_config(&self, session: &Session, form: &UpdateConfigForm) -> Result<()> {
        self.post_unit("/api/link-config/update", session, form, "update config")
            .await
    }

    /// Delete a config
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn delete_config(&self, session: &Session, form: DeleteConfigForm) -> Result<()> {
        self.post_unit("/api/link-config/delete", session, &form, "delete config")
            .await
    }

    /// Daily visitor statistics for up to twenty keys
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn statistics(&self, session: &Session, query: &StatisticsQuery) -> Result<ConfigStatistics> {
        let builder = self.post("/api/link-config/statistics", session).json(query);
        self.send(builder, "fetch statistics").await?.into_result()
    }

    /// Shareable URL of a key, for QR codes
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the key is unknown.
    pub async fn get_url(&self, session: &Session, query: &KeyQuery) -> Result<RedirectUrl> {
        let builder = self.get("/api/link-config/get_url", session).query(query);
        let found: RedirectUrl = self.send(builder, "fetch url").await?.into_result()?;

        if found.url.is_empty() {
            return Err(Error::NotFound {
                resource: format!("link key '{}'", query.key),
            });
        }
        Ok(found)
    }

    /// One page of accounts
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn list_accounts(&self, session: &Session, query: &AccountQuery) -> Result<AccountList> {
        let builder = self.get("/api/account/list", session).query(query);
        self.send(builder, "list accounts").await?.into_result()
    }

    /// Create an account
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn create_account(&self, session: &Session, form: &NewAccountForm) -> Result<()> {
        self.post_unit("/api/account/create", session, form, "create account")
            .await
    }

    /// Change an account password
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn update_account(&self, session: &Session, form: &UpdateAccountForm) -> Result<()> {
        self.post_unit("/api/account/update", session, form, "update account")
            .await
    }

    /// Delete an account
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn delete_account(&self, session: &Session, form: DeleteAccountForm) -> Result<()> {
        self.post_unit("/api/account/delete", session, &form, "delete account")
            .await
    }

    fn get(&self, path: &str, session: &Session) -> RequestBuilder {
        self.client
            .get(self.api.url(path))
            .header(header::COOKIE, session.cookie(&self.cookie_name))
    }

    fn post(&self, path: &str, session: &Session) -> RequestBuilder {
        self.client
            .post(self.api.url(path))
            .header(header::COOKIE, session.cookie(&self.cookie_name))
    }

    async fn post_unit<B: Serialize + Sync>(
        &self,
        path: &str,
        session: &Session,
        body: &B,
        what: &str,
    ) -> Result<()> {
        let builder = self.post(path, session).json(body);
        self.send::<serde_json::Value>(builder, what)
            .await?
            .into_unit()
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        what: &str,
    ) -> Result<ApiEnvelope<T>> {
        let response = builder
            .send()
            .await
            .map_err(|e| self.transport_error(&e, what))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication(format!("{what}: session rejected")));
        }
        if !status.is_success() {
            return Err(Error::Http(format!("{what}: resource API returned {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&e, what))?;

        Ok(serde_json::from_slice(&body)?)
    }

    fn transport_error(&self, error: &reqwest::Error, what: &str) -> Error {
        if error.is_timeout() {
            Error::Timeout {
                duration_ms: u64::try_from(self.api.timeout().as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            Error::Http(format!("Failed to {what}: {error}"))
        }
    }
}
