//! Console API handlers, proxied to the resource API
//!
//! Responses keep the `{code, success, msg, data}` envelope so the console
//! front end reads the same shape it gets from the backend.

use crate::{error::WebResult, session::Session, state::AppState};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use shortlink_core::types::{
    AccountList, AccountQuery, ApiEnvelope, ConfigQuery, DeleteAccountForm, DeleteConfigForm,
    Identity, KeyQuery, LinkConfigList, LoginForm, NewAccountForm, NewConfigForm, RedirectUrl,
    StatisticsQuery, UpdateAccountForm, UpdateConfigForm,
};
use shortlink_core::utils::{hash_password, page_after_delete, parse_statistics_keys};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

type Envelope<T> = Json<ApiEnvelope<T>>;

fn ok<T>(data: T) -> Envelope<T> {
    Json(ApiEnvelope::success(data))
}

/// Credentials as typed into the login form
#[derive(Debug, Deserialize, Validate)]
pub struct ConsoleLogin {
    /// Login name
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    /// Plaintext password; digested before it leaves the host
    #[validate(length(min = 1))]
    pub password: String,
}

/// Log in and return the resulting identity
pub async fn login(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(form): Json<ConsoleLogin>,
) -> WebResult<Envelope<Identity>> {
    form.validate()?;
    let login = LoginForm {
        name: form.name,
        password: hash_password(&form.password),
    };

    state.api_client.login(&session, &login).await?;
    let identity = state.api_client.user_info(&session).await?;
    info!(user = %identity.name, "Console login");
    Ok(ok(identity))
}

/// End the session
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> WebResult<Envelope<()>> {
    state.api_client.logout(&session).await?;
    Ok(ok(()))
}

/// Identity of the logged-in user
pub async fn current_user(Extension(identity): Extension<Identity>) -> Envelope<Identity> {
    ok(identity)
}

/// One page of configs
pub async fn list_configs(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(query): Query<ConfigQuery>,
) -> WebResult<Envelope<LinkConfigList>> {
    query.validate()?;
    Ok(ok(state.api_client.list_configs(&session, &query).await?))
}

/// Create a config
pub async fn create_config(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(identity): Extension<Identity>,
    Json(form): Json<NewConfigForm>,
) -> WebResult<Envelope<()>> {
    form.validate()?;
    state.api_client.create_config(&session, &form).await?;
    info!(user = %identity.name, original_key = %form.original_key, "Config created");
    Ok(ok(()))
}

/// Change a config's ratio
pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(identity): Extension<Identity>,
    Json(form): Json<UpdateConfigForm>,
) -> WebResult<Envelope<()>> {
    form.validate()?;
    state.api_client.update_config(&session, &form).await?;
    info!(user = %identity.name, config_id = form.config_id, "Config updated");
    Ok(ok(()))
}

/// Config deletion together with the list the user was looking at
#[derive(Debug, Deserialize)]
pub struct DeleteConfigRequest {
    /// Config to delete
    pub config_id: i64,
    /// Current list filter and page
    #[serde(default)]
    pub query: ConfigQuery,
}

/// Page shown after a deletion
#[derive(Debug, Serialize)]
pub struct PageAfterDelete {
    /// Page number actually shown
    pub page: u32,
    /// Its contents
    pub list: LinkConfigList,
}

/// Delete a config and reload the current page, stepping back when it empties
pub async fn delete_config(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<DeleteConfigRequest>,
) -> WebResult<Envelope<PageAfterDelete>> {
    let mut query = request.query;
    query.validate()?;

    state
        .api_client
        .delete_config(&session, DeleteConfigForm { config_id: request.config_id })
        .await?;
    info!(user = %identity.name, config_id = request.config_id, "Config deleted");

    let list = state.api_client.list_configs(&session, &query).await?;
    let page = page_after_delete(query.page, list.configs.len());
    if page == query.page {
        return Ok(ok(PageAfterDelete { page, list }));
    }

    query.page = page;
    let list = state.api_client.list_configs(&session, &query).await?;
    Ok(ok(PageAfterDelete { page, list }))
}

/// Multi-line key list from the statistics form
#[derive(Debug, Deserialize)]
pub struct StatisticsForm {
    /// One key per line
    pub keys: String,
}

/// One row of the statistics table
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StatisticsRow {
    /// Link key
    pub key: String,
    /// Sum over all days
    pub total: i64,
    /// Count per column of [`StatisticsTable::dates`]
    pub counts: Vec<i64>,
}

/// Visitor statistics pivoted by date
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StatisticsTable {
    /// Column dates, ascending
    pub dates: Vec<String>,
    /// One row per key
    pub rows: Vec<StatisticsRow>,
}

/// Daily visitors for up to twenty keys
pub async fn statistics(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(form): Json<StatisticsForm>,
) -> WebResult<Envelope<StatisticsTable>> {
    let query = StatisticsQuery {
        keys: parse_statistics_keys(&form.keys)?,
    };
    query.validate()?;

    let stats = state.api_client.statistics(&session, &query).await?;
    let dates = stats.dates();
    let rows = stats
        .uv
        .iter()
        .map(|item| StatisticsRow {
            key: item.key.clone(),
            total: item.daily_total(),
            counts: dates.iter().map(|date| item.count_on(date)).collect(),
        })
        .collect();

    Ok(ok(StatisticsTable { dates, rows }))
}

/// Shareable URL of a key, for QR codes
pub async fn key_url(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(query): Query<KeyQuery>,
) -> WebResult<Envelope<RedirectUrl>> {
    query.validate()?;
    Ok(ok(state.api_client.get_url(&session, &query).await?))
}

/// One page of accounts
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(query): Query<AccountQuery>,
) -> WebResult<Envelope<AccountList>> {
    query.validate()?;
    Ok(ok(state.api_client.list_accounts(&session, &query).await?))
}

/// Create an account; the password arrives in plaintext
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(identity): Extension<Identity>,
    Json(form): Json<ConsoleLogin>,
) -> WebResult<Envelope<()>> {
    form.validate()?;
    let account = NewAccountForm {
        name: form.name,
        password: hash_password(&form.password),
    };
    account.validate()?;

    state.api_client.create_account(&session, &account).await?;
    info!(user = %identity.name, account = %account.name, "Account created");
    Ok(ok(()))
}

/// Password change as typed into the console
#[derive(Debug, Deserialize, Validate)]
pub struct PasswordChange {
    /// Account ID
    #[validate(range(min = 1))]
    pub id: i64,
    /// New plaintext password
    #[validate(length(min = 1))]
    pub password: String,
}

/// Change an account password
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(identity): Extension<Identity>,
    Json(form): Json<PasswordChange>,
) -> WebResult<Envelope<()>> {
    form.validate()?;
    let update = UpdateAccountForm {
        id: form.id,
        password: hash_password(&form.password),
    };

    state.api_client.update_account(&session, &update).await?;
    info!(user = %identity.name, account_id = update.id, "Account password changed");
    Ok(ok(()))
}

/// Delete an account
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(identity): Extension<Identity>,
    Json(form): Json<DeleteAccountForm>,
) -> WebResult<Envelope<()>> {
    state.api_client.delete_account(&session, form).await?;
    info!(user = %identity.name, account_id = form.id, "Account deleted");
    Ok(ok(()))
}
