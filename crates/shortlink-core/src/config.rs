//! Configuration management for the short-link console

use serde::{Deserialize, Serialize};
use shortlink_protocol::{
    FreshnessWindow, ProtocolRevision, ResolvedMode, SchemeKind, SignatureScheme,
};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Resource API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Redirect page configuration
    #[serde(default)]
    pub redirect: RedirectConfig,

    /// Signing configuration
    #[serde(default)]
    pub signing: SigningConfig,

    /// Console session configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Resource API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the resource API, without trailing slash
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Path of the resolver endpoint
    #[serde(default = "default_resolver_path")]
    pub resolver_path: String,
}

/// Redirect page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectConfig {
    /// Which inbound URL scheme is mounted
    #[serde(default)]
    pub revision: ProtocolRevision,

    /// What to do with a resolved destination
    #[serde(default)]
    pub mode: ResolvedMode,

    /// The only text an end user sees when a link fails
    #[serde(default = "default_invalid_message")]
    pub invalid_message: String,
}

/// Signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Signature scheme
    #[serde(default)]
    pub scheme: SchemeKind,

    /// Shared secret, required by `hmac-sha256`
    #[serde(default, skip_serializing)]
    pub secret: Option<String>,

    /// Maximum request age accepted by the verifier; unset disables expiry
    #[serde(default)]
    pub max_age_secs: Option<u64>,

    /// Tolerated clock skew for timestamps ahead of the verifier
    #[serde(default = "default_max_skew_secs")]
    pub max_skew_secs: u64,
}

/// Console session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the session cookie shared with the resource API
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Role required for account management
    #[serde(default = "default_admin_role")]
    pub admin_role: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or text)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

const fn default_request_timeout() -> u64 {
    10
}

fn default_resolver_path() -> String {
    "/api/link-config/get_redirect_url".to_string()
}

fn default_invalid_message() -> String {
    "This link is invalid or has expired.".to_string()
}

const fn default_max_skew_secs() -> u64 {
    30
}

fn default_cookie_name() -> String {
    "sessionId".to_string()
}

fn default_admin_role() -> String {
    "admin".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            request_timeout: default_request_timeout(),
            resolver_path: default_resolver_path(),
        }
    }
}

impl ApiConfig {
    /// Request timeout as a `Duration`
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Absolute URL for a resource API path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Absolute URL of the resolver endpoint
    #[must_use]
    pub fn resolver_url(&self) -> String {
        self.url(&self.resolver_path)
    }
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            revision: ProtocolRevision::default(),
            mode: ResolvedMode::default(),
            invalid_message: default_invalid_message(),
        }
    }
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            scheme: SchemeKind::default(),
            secret: None,
            max_age_secs: None,
            max_skew_secs: default_max_skew_secs(),
        }
    }
}

impl SigningConfig {
    /// Build the configured signature scheme
    ///
    /// # Errors
    ///
    /// Returns an error if `hmac-sha256` is selected without a secret.
    pub fn scheme(&self) -> crate::Result<SignatureScheme> {
        Ok(SignatureScheme::from_kind(self.scheme, self.secret.as_deref())?)
    }

    /// Verifier freshness window
    #[must_use]
    pub const fn window(&self) -> FreshnessWindow {
        FreshnessWindow {
            max_age_secs: self.max_age_secs,
            max_skew_secs: self.max_skew_secs,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            admin_role: default_admin_role(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from environment and files
    ///
    /// Reads an optional `config.{toml,yaml,json}` file, then applies
    /// `SHORTLINK_<SECTION>__<FIELD>` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded, parsed or validated.
    pub fn load() -> crate::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("SHORTLINK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| crate::Error::Configuration {
                message: e.to_string(),
            })?;

        Self::from_source(config)
    }

    /// Parse configuration from an in-memory TOML document
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be parsed or validated.
    pub fn from_toml(document: &str) -> crate::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(document, config::FileFormat::Toml))
            .build()
            .map_err(|e| crate::Error::Configuration {
                message: e.to_string(),
            })?;

        Self::from_source(config)
    }

    fn from_source(source: config::Config) -> crate::Result<Self> {
        let config: Self = source
            .try_deserialize()
            .map_err(|e| crate::Error::Configuration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first problem found.
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://"))
        {
            return Err(crate::Error::Configuration {
                message: format!("api.base_url must be an http(s) URL: {}", self.api.base_url),
            });
        }
        if self.api.request_timeout == 0 {
            return Err(crate::Error::Configuration {
                message: "api.request_timeout must be greater than zero".to_string(),
            });
        }
        if !self.api.resolver_path.starts_with('/') {
            return Err(crate::Error::Configuration {
                message: "api.resolver_path must start with '/'".to_string(),
            });
        }
        if self.session.cookie_name.is_empty() {
            return Err(crate::Error::Configuration {
                message: "session.cookie_name must not be empty".to_string(),
            });
        }
        if !matches!(self.logging.format.as_str(), "json" | "text") {
            return Err(crate::Error::Configuration {
                message: format!("logging.format must be json or text: {}", self.logging.format),
            });
        }
        self.signing.scheme().map_err(|e| crate::Error::Configuration {
            message: format!("signing: {e}"),
        })?;
        Ok(())
    }
}
