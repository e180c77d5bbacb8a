//! Composition root
//!
//! Builds the shared session, notification store, router, HTTP client and
//! stores in dependency order and hands them out as one handle.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{ApiClient, BearerAuth, FailureReporter};
use crate::navigation::{Navigator, Router};
use crate::session::{FileTokenStore, Session, TokenStore};
use crate::stores::{AccountStore, AuthStore, NotificationStore};

/// Every store of a running client, wired together
#[derive(Clone)]
pub struct DashboardClient {
    pub session: Session,
    pub notifications: NotificationStore,
    pub router: Arc<Router>,
    pub client: ApiClient,
    pub accounts: AccountStore,
    pub auth: AuthStore,
}

impl DashboardClient {
    /// Wire the client with the file-backed token slot from `config`
    pub fn bootstrap(config: &ClientConfig) -> Result<Self> {
        let store = FileTokenStore::new(config.session.token_path.clone());
        debug!(path = %store.path().display(), "Using file token slot");
        Self::with_token_store(config, Arc::new(store))
    }

    pub fn with_token_store(config: &ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        let base_url = config.api.resolve_base_url()?;

        let session = Session::restore(store)?;
        let notifications = NotificationStore::new(config.notifications.expiry_policy());
        let router = Arc::new(Router::new(session.clone()));
        let navigator: Arc<dyn Navigator> = router.clone();

        let client = ApiClient::builder(base_url)
            .with(Arc::new(BearerAuth::new(session.clone())))
            .with(Arc::new(FailureReporter::new(
                session.clone(),
                navigator.clone(),
                notifications.clone(),
            )))
            .build();

        let accounts = AccountStore::new(client.clone(), notifications.clone());
        let auth = AuthStore::new(client.clone(), session.clone(), accounts.clone(), navigator);

        info!(base_url = %client.base_url(), "Dashboard client ready");

        Ok(Self {
            session,
            notifications,
            router,
            client,
            accounts,
            auth,
        })
    }
}
