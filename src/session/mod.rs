//! Session context shared by the auth store and the HTTP chain
//!
//! Holds the bearer token and the signed-in user. Seeded from the persisted
//! token slot at startup; mutated only by `begin`/`end`, which the auth store
//! and the 401 handler call. The bearer middleware reads it on every request.

mod token_store;

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::Result;

pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub token: Option<String>,
    pub user: Option<String>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Cheap to clone; all clones see the same session
#[derive(Clone)]
pub struct Session {
    state: Arc<RwLock<SessionState>>,
    store: Arc<dyn TokenStore>,
}

impl Session {
    /// Start anonymous, ignoring whatever the slot holds
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            store,
        }
    }

    /// Seed the in-memory token from the persisted slot
    pub fn restore(store: Arc<dyn TokenStore>) -> Result<Self> {
        let token = store.load()?.filter(|t| !t.is_empty());
        if token.is_some() {
            info!("Restored persisted session token");
        }
        Ok(Self {
            state: Arc::new(RwLock::new(SessionState { token, user: None })),
            store,
        })
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    pub async fn user(&self) -> Option<String> {
        self.state.read().await.user.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Enter the authenticated state. An empty token leaves the session
    /// anonymous. Persistence is best effort.
    pub async fn begin(&self, token: &str) {
        if token.is_empty() {
            warn!("Refusing to start a session with an empty token");
            return;
        }

        self.state.write().await.token = Some(token.to_string());

        if let Err(e) = self.store.save(token) {
            warn!(error = %e, "Failed to persist session token");
        }
    }

    pub async fn set_user(&self, user: Option<String>) {
        self.state.write().await.user = user;
    }

    /// Back to anonymous: clear user and token, remove the persisted slot
    pub async fn end(&self) {
        {
            let mut state = self.state.write().await;
            state.token = None;
            state.user = None;
        }

        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to remove persisted session token");
        }
    }
}
