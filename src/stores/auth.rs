//! Login/logout orchestration
//!
//! ANONYMOUS --login--> AUTHENTICATED --logout | 401--> ANONYMOUS
//!
//! The 401 transition is driven by `FailureReporter`, which ends the same
//! `Session` this store logs out of.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::constants::HOME_PATH;
use crate::error::{AppError, Result};
use crate::http::ApiClient;
use crate::navigation::Navigator;
use crate::session::Session;
use crate::stores::account::AccountStore;
use crate::stores::types::{LoginRequest, LoginResponse};

#[derive(Clone)]
pub struct AuthStore {
    client: ApiClient,
    session: Session,
    accounts: AccountStore,
    navigator: Arc<dyn Navigator>,
}

impl AuthStore {
    pub fn new(
        client: ApiClient,
        session: Session,
        accounts: AccountStore,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            client,
            session,
            accounts,
            navigator,
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.is_authenticated().await
    }

    pub async fn token(&self) -> Option<String> {
        self.session.token().await
    }

    pub async fn user(&self) -> Option<String> {
        self.session.user().await
    }

    /// Exchange credentials for a bearer token, load account context and
    /// go to the application root. Failures are returned to the caller.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let response: LoginResponse = self
            .client
            .post("/api/auth/login", &LoginRequest { username, password })
            .await
            .map_err(|e| {
                error!(username, error = %e, "Login failed");
                AppError::from(e)
            })?;

        if let Some(scheme) = response
            .token_type
            .as_deref()
            .filter(|t| !t.eq_ignore_ascii_case("bearer"))
        {
            warn!(username, token_type = scheme, "Unexpected token type, sending as bearer");
        }

        let token = response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                error!(username, "Login response carried no access token");
                AppError::Auth("login response did not include an access token".to_string())
            })?;

        self.session.begin(&token).await;
        self.session.set_user(Some(username.to_string())).await;
        info!(username, "Logged in");

        self.accounts.fetch_active_account().await;
        self.accounts.fetch_accounts().await;

        self.navigator.push(HOME_PATH).await;
        Ok(())
    }

    /// Clear user, token and the persisted slot. Navigation is the caller's job.
    pub async fn logout(&self) {
        self.session.end().await;
        info!("Logged out");
    }
}
