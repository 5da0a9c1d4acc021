//! Resource API records and request forms

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

/// Most keys accepted by one statistics query
pub const MAX_STATISTICS_KEYS: usize = 20;

/// Default page size of list queries
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Response envelope shared by every resource API endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiEnvelope<T> {
    /// Backend status code; only meaningful alongside `success`
    #[serde(default)]
    pub code: i64,

    /// Whether the call succeeded
    pub success: bool,

    /// Human-readable message
    #[serde(default)]
    pub msg: String,

    /// Payload, absent or null on failure
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Successful envelope carrying `data`
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            success: true,
            msg: String::new(),
            data: Some(data),
        }
    }

    /// Failed envelope
    pub fn failure(code: i64, msg: impl Into<String>) -> Self {
        Self {
            code,
            success: false,
            msg: msg.into(),
            data: None,
        }
    }

    /// Unwrap the payload.
    ///
    /// `success = false` is a failure whatever `code` says.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Upstream`] when the call failed or carried no data.
    pub fn into_result(self) -> crate::Result<T> {
        if !self.success {
            return Err(crate::Error::Upstream {
                code: self.code,
                message: self.msg,
            });
        }
        self.data.ok_or_else(|| crate::Error::Upstream {
            code: self.code,
            message: "response carried no data".to_string(),
        })
    }

    /// Check success only, discarding any payload
    ///
    /// # Errors
    ///
    /// [`crate::Error::Upstream`] when `success` is false.
    pub fn into_unit(self) -> crate::Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(crate::Error::Upstream {
                code: self.code,
                message: self.msg,
            })
        }
    }
}

/// Resolver payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RedirectUrl {
    /// Destination URL
    pub url: String,
}

/// Unique visitors of one key on one day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UvData {
    /// Link key
    pub key: String,
    /// Day, `YYYY-MM-DD`
    pub date: String,
    /// Visitor count
    pub count: i64,
}

/// Mapping from an original key/URL to a secondary key/URL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkConfig {
    /// Config ID
    pub id: i64,
    /// Original link key
    pub original_key: String,
    /// Original destination
    pub original_url: String,
    /// Daily views of the original key
    #[serde(default)]
    pub original_count: Vec<UvData>,
    /// Daily views of the secondary key
    #[serde(default)]
    pub secondary_count: Vec<UvData>,
    /// Difference between original and secondary views
    #[serde(default)]
    pub difference: i64,
    /// Secondary key
    pub key: String,
    /// Secondary destination
    pub url: String,
    /// Share of traffic sent to the secondary destination
    pub ratio: f64,
    /// Active from (Unix seconds)
    #[serde(default)]
    pub start_at: i64,
    /// Active until (Unix seconds)
    #[serde(default)]
    pub end_at: i64,
    /// Created (Unix seconds)
    #[serde(default)]
    pub created_at: i64,
    /// Last update (Unix seconds)
    #[serde(default)]
    pub updated_at: i64,
}

/// One page of configs
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LinkConfigList {
    /// Total matching configs
    pub total: u64,
    /// Configs on this page
    #[serde(default)]
    pub configs: Vec<LinkConfig>,
}

/// Visitor history of one key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigStatisticsItem {
    /// Link key
    pub key: String,
    /// Total reported by the backend
    #[serde(default)]
    pub total: i64,
    /// Per-day visitors
    #[serde(default)]
    pub uv: Vec<UvData>,
}

impl ConfigStatisticsItem {
    /// Sum of the daily counts
    #[must_use]
    pub fn daily_total(&self) -> i64 {
        self.uv.iter().map(|day| day.count).sum()
    }

    /// Count on one day, zero when absent
    #[must_use]
    pub fn count_on(&self, date: &str) -> i64 {
        self.uv
            .iter()
            .filter(|day| day.date == date)
            .map(|day| day.count)
            .sum()
    }
}

/// Statistics query result
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigStatistics {
    /// One entry per requested key
    #[serde(default)]
    pub uv: Vec<ConfigStatisticsItem>,
}

impl ConfigStatistics {
    /// Every date that appears in any item, ascending and deduplicated
    #[must_use]
    pub fn dates(&self) -> Vec<String> {
        self.uv
            .iter()
            .flat_map(|item| item.uv.iter().map(|day| day.date.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Logged-in user as reported by the resource API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    /// User ID
    pub id: String,
    /// Login name
    pub name: String,
    /// Role name
    pub role: String,
}

impl Identity {
    /// Whether this user carries `role`
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}

/// Console account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountItem {
    /// Account ID
    pub id: i64,
    /// Login name
    pub name: String,
    /// Created (Unix seconds)
    #[serde(default)]
    pub created_at: i64,
    /// Last update (Unix seconds)
    #[serde(default)]
    pub updated_at: i64,
}

/// One page of accounts
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountList {
    /// Total matching accounts
    pub total: u64,
    /// Accounts on this page
    #[serde(default)]
    pub accounts: Vec<AccountItem>,
}

const fn default_page() -> u32 {
    1
}

const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Config list filter
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct ConfigQuery {
    /// Page number (1-based)
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u32,

    /// Page size
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100))]
    pub size: u32,

    /// Original key filter
    #[serde(default)]
    #[validate(length(max = 255))]
    pub original_key: String,

    /// Secondary key filter
    #[serde(default)]
    #[validate(length(max = 255))]
    pub key: String,

    /// Original URL filter
    #[serde(default)]
    #[validate(length(max = 2048))]
    pub original_url: String,
}

impl Default for ConfigQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            size: default_page_size(),
            original_key: String::new(),
            key: String::new(),
            original_url: String::new(),
        }
    }
}

/// Account list filter
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct AccountQuery {
    /// Page number (1-based)
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u32,

    /// Page size
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100))]
    pub size: u32,

    /// Name filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 64))]
    pub name: Option<String>,
}

impl Default for AccountQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            size: default_page_size(),
            name: None,
        }
    }
}

/// New config form
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct NewConfigForm {
    /// Original link key
    #[validate(length(min = 1, max = 255))]
    pub original_key: String,

    /// Original destination
    #[validate(length(min = 1, max = 2048))]
    pub original_url: String,

    /// Traffic ratio
    #[validate(range(min = 0.0))]
    pub ratio: f64,
}

/// Config ratio update
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct UpdateConfigForm {
    /// Config ID
    #[validate(range(min = 1))]
    pub config_id: i64,

    /// New traffic ratio
    #[validate(range(min = 0.0))]
    pub ratio: f64,
}

/// Config deletion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteConfigForm {
    /// Config ID
    pub config_id: i64,
}

/// Statistics query
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct StatisticsQuery {
    /// Keys to report on
    #[validate(length(min = 1, max = 20))]
    pub keys: Vec<String>,
}

/// Key lookup for QR codes
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct KeyQuery {
    /// Link key
    #[validate(length(min = 1, max = 255))]
    pub key: String,
}

/// Login form, password already digested
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct LoginForm {
    /// Login name
    #[validate(length(min = 1, max = 64))]
    pub name: String,

    /// Password digest
    #[validate(length(min = 1))]
    pub password: String,
}

/// New account form, password already digested
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct NewAccountForm {
    /// Login name
    #[validate(length(min = 1, max = 64))]
    pub name: String,

    /// Password digest
    #[validate(length(min = 1))]
    pub password: String,
}

/// Password change, password already digested
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct UpdateAccountForm {
    /// Account ID
    #[validate(range(min = 1))]
    pub id: i64,

    /// Password digest
    #[validate(length(min = 1))]
    pub password: String,
}

/// Account deletion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteAccountForm {
    /// Account ID
    pub id: i64,
}
