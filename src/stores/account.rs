//! Active trading account and the list of available accounts
//!
//! Read-refresh actions (`fetch_accounts`, `fetch_active_account`,
//! `fetch_account_info`) log and swallow failures. `activate_account`
//! propagates its failure so the caller can react.

use std::sync::Arc;

use reqwest::StatusCode;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::http::{ApiClient, ApiRequest, HttpError};
use crate::stores::notifications::NotificationStore;
use crate::stores::types::{Account, AccountInfo, AccountType};

pub const NO_ACCOUNT_NAME: &str = "No Account";
pub const NO_ACTIVE_ACCOUNT_WARNING: &str = "No active account selected.";
pub const EMPTY_ACCOUNT_INFO_ERROR: &str =
    "No account information returned. Please check the account's API credentials.";
pub const INVALID_CREDENTIALS_ERROR: &str = "Invalid API credentials for this account.";
pub const ACCOUNT_INFO_FALLBACK_ERROR: &str = "Failed to fetch account info";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountState {
    pub active_account: Option<Account>,
    pub accounts: Vec<Account>,
    pub account_info: Option<AccountInfo>,
    /// Human-readable reason the last info fetch failed
    pub info_error: Option<String>,
    pub loading: bool,
}

#[derive(Clone)]
pub struct AccountStore {
    client: ApiClient,
    notifications: NotificationStore,
    state: Arc<RwLock<AccountState>>,
}

impl AccountStore {
    pub fn new(client: ApiClient, notifications: NotificationStore) -> Self {
        Self {
            client,
            notifications,
            state: Arc::new(RwLock::new(AccountState::default())),
        }
    }

    // ------------------------------------------------------------------
    // Getters
    // ------------------------------------------------------------------

    pub async fn snapshot(&self) -> AccountState {
        self.state.read().await.clone()
    }

    pub async fn active_account(&self) -> Option<Account> {
        self.state.read().await.active_account.clone()
    }

    pub async fn accounts(&self) -> Vec<Account> {
        self.state.read().await.accounts.clone()
    }

    pub async fn active_account_id(&self) -> Option<i64> {
        self.state.read().await.active_account.as_ref().map(|a| a.id)
    }

    pub async fn active_account_name(&self) -> String {
        self.state
            .read()
            .await
            .active_account
            .as_ref()
            .map(|a| a.name.clone())
            .unwrap_or_else(|| NO_ACCOUNT_NAME.to_string())
    }

    pub async fn active_account_type(&self) -> Option<AccountType> {
        self.state.read().await.active_account.as_ref().map(|a| a.account_type)
    }

    pub async fn has_active_account(&self) -> bool {
        self.state.read().await.active_account.is_some()
    }

    pub async fn account_info(&self) -> Option<AccountInfo> {
        self.state.read().await.account_info.clone()
    }

    pub async fn info_error(&self) -> Option<String> {
        self.state.read().await.info_error.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Replace the cached list. Failures leave the previous list in place.
    pub async fn fetch_accounts(&self) {
        match self.client.get::<Vec<Account>>("/api/accounts").await {
            Ok(accounts) => {
                debug!(count = accounts.len(), "Fetched accounts");
                self.state.write().await.accounts = accounts;
            }
            Err(e) => {
                error!(error = %e, "Error fetching accounts");
            }
        }
    }

    /// Load the server's active account. When none is configured (404),
    /// fall back to activating the first account in the list.
    pub async fn fetch_active_account(&self) {
        let request = ApiRequest::get("/api/accounts/active").expect_status(StatusCode::NOT_FOUND);

        match self.client.execute::<Account>(request).await {
            Ok(account) => {
                info!(account_id = account.id, name = %account.name, "Active account loaded");
                self.state.write().await.active_account = Some(account);
            }
            Err(e) if e.is_not_found() => {
                info!("No active account configured, falling back to first account");
                self.fetch_accounts().await;

                let first = self.state.read().await.accounts.first().map(|a| a.id);
                if let Some(id) = first {
                    if let Err(e) = self.activate_account(id).await {
                        error!(account_id = id, error = %e, "Fallback activation failed");
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Error fetching active account");
            }
        }
    }

    /// Activate `account_id` remotely, then resolve it against the cached
    /// list. An id missing from the cache leaves no active account.
    pub async fn activate_account(&self, account_id: i64) -> Result<()> {
        let path = format!("/api/accounts/{}/activate", account_id);
        if let Err(e) = self.client.execute::<serde_json::Value>(ApiRequest::post(path)).await {
            error!(account_id, error = %e, "Error activating account");
            return Err(e.into());
        }

        let mut state = self.state.write().await;
        let resolved = state.accounts.iter().find(|a| a.id == account_id).cloned();
        if resolved.is_none() {
            warn!(account_id, "Activated account is not in the cached list");
        } else {
            info!(account_id, "Account activated");
        }
        state.active_account = resolved;
        Ok(())
    }

    /// Fetch the broker snapshot for the active account
    pub async fn fetch_account_info(&self) {
        let Some(account_id) = self.active_account_id().await else {
            self.notifications
                .add_warning(NO_ACTIVE_ACCOUNT_WARNING, None)
                .await;
            return;
        };

        self.state.write().await.loading = true;
        let loading = LoadingGuard::new(self.state.clone());

        let path = format!("/api/accounts/{}/info", account_id);
        match self.client.get::<AccountInfo>(&path).await {
            Ok(info) => {
                if info.is_empty() {
                    warn!(account_id, "Account info is empty");
                    self.notifications
                        .add_error(EMPTY_ACCOUNT_INFO_ERROR, None)
                        .await;
                }
                let mut state = self.state.write().await;
                state.account_info = Some(info);
                state.info_error = None;
            }
            Err(e) => {
                error!(account_id, error = %e, "Error fetching account info");
                self.report_info_failure(&e).await;
                self.state.write().await.info_error =
                    Some(e.detail().unwrap_or_else(|| ACCOUNT_INFO_FALLBACK_ERROR.to_string()));
            }
        }

        self.state.write().await.loading = false;
        loading.disarm();
    }

    async fn report_info_failure(&self, error: &HttpError) {
        let details = error.body().cloned();
        if error.status() == Some(403) {
            self.notifications
                .add_error(INVALID_CREDENTIALS_ERROR, details)
                .await;
        } else if let Some(detail) = error.detail() {
            self.notifications.add_error(detail, details).await;
        }
    }

    pub async fn clear_active_account(&self) {
        self.state.write().await.active_account = None;
    }
}

/// Clears `loading` if `fetch_account_info` is dropped before it finishes
struct LoadingGuard {
    state: Option<Arc<RwLock<AccountState>>>,
}

impl LoadingGuard {
    fn new(state: Arc<RwLock<AccountState>>) -> Self {
        Self { state: Some(state) }
    }

    fn disarm(mut self) {
        self.state = None;
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        debug!("Account info fetch cancelled, clearing loading flag");

        let reset_now = match state.try_write() {
            Ok(mut guard) => {
                guard.loading = false;
                true
            }
            Err(_) => false,
        };
        if !reset_now {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                // Lock is busy; finish the reset once it frees up
                handle.spawn(async move {
                    state.write().await.loading = false;
                });
            }
        }
    }
}
