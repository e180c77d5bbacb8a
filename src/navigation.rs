//! Programmatic navigation and the authentication route guard

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::constants::{DASHBOARD_PATH, LOGIN_PATH};
use crate::session::Session;

/// Redirect chains longer than this stop where they are
const MAX_REDIRECTS: usize = 4;

/// `push(path)` capability consumed by the stores and the HTTP chain
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn push(&self, path: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub name: Option<&'static str>,
    pub requires_auth: bool,
    pub redirect: Option<&'static str>,
}

const fn view(path: &'static str, name: &'static str) -> Route {
    Route {
        path,
        name: Some(name),
        requires_auth: true,
        redirect: None,
    }
}

pub const ROUTES: &[Route] = &[
    Route {
        path: LOGIN_PATH,
        name: Some("login"),
        requires_auth: false,
        redirect: None,
    },
    Route {
        path: "/",
        name: None,
        requires_auth: true,
        redirect: Some(DASHBOARD_PATH),
    },
    view(DASHBOARD_PATH, "dashboard"),
    view("/signals", "signals"),
    view("/trades", "trades"),
    view("/positions", "positions"),
    view("/monitoring", "monitoring"),
    view("/script-manager", "script-manager"),
    view("/database-compare", "database-compare"),
    view("/settings", "settings"),
];

pub fn find_route(path: &str) -> Option<&'static Route> {
    ROUTES.iter().find(|r| r.path == path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(&'static str),
}

/// Decide whether `path` may be entered. Paths outside the route table
/// match nothing and are allowed.
pub fn guard(path: &str, authenticated: bool) -> GuardDecision {
    let requires_auth = find_route(path).is_some_and(|r| r.requires_auth);

    if requires_auth && !authenticated {
        GuardDecision::Redirect(LOGIN_PATH)
    } else if path == LOGIN_PATH && authenticated {
        GuardDecision::Redirect(DASHBOARD_PATH)
    } else {
        GuardDecision::Allow
    }
}

/// In-process router: applies the guard and route redirects, keeps history
pub struct Router {
    session: Session,
    current: RwLock<Option<String>>,
    history: RwLock<Vec<String>>,
}

impl Router {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            current: RwLock::new(None),
            history: RwLock::new(Vec::new()),
        }
    }

    /// Navigate to `path`, returning where the router actually landed
    pub async fn navigate(&self, path: &str) -> String {
        let authenticated = self.session.is_authenticated().await;
        let mut target = path.to_string();

        for _ in 0..MAX_REDIRECTS {
            let next = match guard(&target, authenticated) {
                GuardDecision::Redirect(to) => Some(to),
                GuardDecision::Allow => find_route(&target).and_then(|r| r.redirect),
            };
            match next {
                Some(to) if to != target => {
                    debug!(from = %target, to, "Redirecting");
                    target = to.to_string();
                }
                _ => break,
            }
        }

        *self.current.write().await = Some(target.clone());
        self.history.write().await.push(target.clone());
        target
    }

    pub async fn current(&self) -> Option<String> {
        self.current.read().await.clone()
    }

    pub async fn history(&self) -> Vec<String> {
        self.history.read().await.clone()
    }
}

#[async_trait]
impl Navigator for Router {
    async fn push(&self, path: &str) {
        self.navigate(path).await;
    }
}
