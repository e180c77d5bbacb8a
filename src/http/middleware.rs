//! Request/response middleware
//!
//! Two middlewares make up the session chain:
//! - [`BearerAuth`] reads the live session token before each request
//! - [`FailureReporter`] classifies failures and routes them to the session
//!   (401) or the notification store (everything else)
//!
//! Middlewares only observe failures; `ApiClient` always returns the
//! original error to the call site.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde_json::Value;
use tracing::{debug, warn};

use super::client::ApiRequest;
use super::errors::{HttpError, HttpResult};
use crate::config::constants::LOGIN_PATH;
use crate::navigation::Navigator;
use crate::session::Session;
use crate::stores::notifications::NotificationStore;

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please login again.";
pub const ACCESS_DENIED_MESSAGE: &str = "Access denied. Please check your API credentials.";
pub const NOT_FOUND_MESSAGE: &str = "Resource not found.";
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred.";

/// One link in the client's chain
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Transform the outgoing request. An error aborts the call.
    async fn on_request(&self, _request: &mut reqwest::Request) -> HttpResult<()> {
        Ok(())
    }

    /// Observe a failed call. Cannot suppress or replace the error.
    async fn on_error(&self, _request: &ApiRequest, _error: &HttpError) {}
}

/// Attaches `Authorization: Bearer <token>` when the session holds a token
pub struct BearerAuth {
    session: Session,
}

impl BearerAuth {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Middleware for BearerAuth {
    async fn on_request(&self, request: &mut reqwest::Request) -> HttpResult<()> {
        // Read at call time: the token changes on login/logout
        if let Some(token) = self.session.token().await {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| HttpError::Build(format!("invalid bearer token: {}", e)))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        Ok(())
    }
}

/// Failure classes, in the order they are checked
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    Unauthorized,
    Forbidden(Value),
    NotFound(Value),
    Server(Value),
    Client { message: String, body: Value },
    Network,
    Unexpected(String),
}

impl Failure {
    /// Notification text for this class
    pub fn message(&self) -> &str {
        match self {
            Failure::Unauthorized => SESSION_EXPIRED_MESSAGE,
            Failure::Forbidden(_) => ACCESS_DENIED_MESSAGE,
            Failure::NotFound(_) => NOT_FOUND_MESSAGE,
            Failure::Server(_) => SERVER_ERROR_MESSAGE,
            Failure::Client { message, .. } => message.as_str(),
            Failure::Network => NETWORK_ERROR_MESSAGE,
            Failure::Unexpected(_) => UNEXPECTED_ERROR_MESSAGE,
        }
    }

    /// Payload attached to the notification
    pub fn details(&self) -> Option<Value> {
        match self {
            Failure::Forbidden(body) | Failure::NotFound(body) | Failure::Server(body) => {
                Some(body.clone())
            }
            Failure::Client { body, .. } => Some(body.clone()),
            Failure::Unexpected(reason) => Some(Value::String(reason.clone())),
            Failure::Unauthorized | Failure::Network => None,
        }
    }
}

/// Map a transport failure onto its class
pub fn classify(error: &HttpError) -> Failure {
    match error {
        HttpError::Status { status: 401, .. } => Failure::Unauthorized,
        HttpError::Status { status: 403, body } => Failure::Forbidden(body.clone()),
        HttpError::Status { status: 404, body } => Failure::NotFound(body.clone()),
        HttpError::Status { status, body } if *status >= 500 => Failure::Server(body.clone()),
        HttpError::Status { body, .. } => Failure::Client {
            message: error
                .detail()
                .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
            body: body.clone(),
        },
        HttpError::Network(_) => Failure::Network,
        HttpError::Build(reason) | HttpError::InvalidResponse(reason) => {
            Failure::Unexpected(reason.clone())
        }
    }
}

/// Routes classified failures: 401 ends the session and redirects to the
/// login view, every other class becomes an error notification
pub struct FailureReporter {
    session: Session,
    navigator: Arc<dyn Navigator>,
    notifications: NotificationStore,
}

impl FailureReporter {
    pub fn new(
        session: Session,
        navigator: Arc<dyn Navigator>,
        notifications: NotificationStore,
    ) -> Self {
        Self {
            session,
            navigator,
            notifications,
        }
    }
}

#[async_trait]
impl Middleware for FailureReporter {
    async fn on_error(&self, request: &ApiRequest, error: &HttpError) {
        if let Some(status) = error.status() {
            if request.expects(status) {
                debug!(path = %request.path, status, "Expected status, handled by caller");
                return;
            }
        }

        let failure = classify(error);
        if failure == Failure::Unauthorized {
            warn!(path = %request.path, "Unauthorized response, ending session");
            self.session.end().await;
            self.navigator.push(LOGIN_PATH).await;
        } else {
            warn!(path = %request.path, error = %error, "Request failed");
        }

        self.notifications
            .add_error(failure.message(), failure.details())
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryTokenStore;
    use serde_json::json;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingNavigator {
        pushed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Navigator for RecordingNavigator {
        async fn push(&self, path: &str) {
            self.pushed.lock().await.push(path.to_string());
        }
    }

    fn status(code: u16, body: Value) -> HttpError {
        HttpError::Status { status: code, body }
    }

    #[test]
    fn test_classify_status_table() {
        assert_eq!(classify(&status(401, Value::Null)), Failure::Unauthorized);
        assert_eq!(
            classify(&status(403, json!({"detail": "bad key"}))),
            Failure::Forbidden(json!({"detail": "bad key"}))
        );
        assert_eq!(classify(&status(404, Value::Null)), Failure::NotFound(Value::Null));
        assert_eq!(classify(&status(500, json!("boom"))), Failure::Server(json!("boom")));
        assert_eq!(classify(&status(503, Value::Null)), Failure::Server(Value::Null));
    }

    #[test]
    fn test_classify_other_client_errors_use_body_message() {
        let failure = classify(&status(400, json!({"detail": "Quantity must be positive"})));
        assert_eq!(failure.message(), "Quantity must be positive");

        let failure = classify(&status(409, json!({"message": "Already exists"})));
        assert_eq!(failure.message(), "Already exists");

        let failure = classify(&status(422, json!({"errors": []})));
        assert_eq!(failure.message(), GENERIC_ERROR_MESSAGE);
        assert_eq!(failure.details(), Some(json!({"errors": []})));
    }

    #[test]
    fn test_classify_transport_and_unexpected() {
        let network = classify(&HttpError::Network("refused".into()));
        assert_eq!(network, Failure::Network);
        assert_eq!(network.details(), None);

        let unexpected = classify(&HttpError::Build("relative URL without a base".into()));
        assert_eq!(unexpected.message(), UNEXPECTED_ERROR_MESSAGE);
        assert_eq!(
            unexpected.details(),
            Some(json!("relative URL without a base"))
        );
    }

    #[tokio::test]
    async fn test_bearer_auth_reads_live_token() {
        let session = Session::new(Arc::new(MemoryTokenStore::default()));
        let auth = BearerAuth::new(session.clone());
        let client = reqwest::Client::new();

        let mut request = client.get("http://localhost/api/accounts").build().unwrap();
        auth.on_request(&mut request).await.unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());

        session.begin("tok-1").await;
        let mut request = client.get("http://localhost/api/accounts").build().unwrap();
        auth.on_request(&mut request).await.unwrap();
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer tok-1");

        session.end().await;
        let mut request = client.get("http://localhost/api/accounts").build().unwrap();
        auth.on_request(&mut request).await.unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_reporter_unauthorized_ends_session_and_redirects() {
        let session = Session::new(Arc::new(MemoryTokenStore::default()));
        session.begin("tok-1").await;
        let navigator = Arc::new(RecordingNavigator::default());
        let notifications = NotificationStore::default();
        let reporter = FailureReporter::new(session.clone(), navigator.clone(), notifications.clone());

        reporter
            .on_error(&ApiRequest::get("/api/signals"), &status(401, Value::Null))
            .await;

        assert!(!session.is_authenticated().await);
        assert_eq!(navigator.pushed.lock().await.as_slice(), &["/login".to_string()]);
        let entries = notifications.snapshot().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, SESSION_EXPIRED_MESSAGE);
    }

    #[tokio::test]
    async fn test_reporter_attaches_body_for_forbidden() {
        let session = Session::new(Arc::new(MemoryTokenStore::default()));
        session.begin("tok-1").await;
        let navigator = Arc::new(RecordingNavigator::default());
        let notifications = NotificationStore::default();
        let reporter = FailureReporter::new(session.clone(), navigator.clone(), notifications.clone());

        reporter
            .on_error(&ApiRequest::get("/api/accounts/1/info"), &status(403, json!({"detail": "bad key"})))
            .await;

        assert!(session.is_authenticated().await);
        assert!(navigator.pushed.lock().await.is_empty());
        let entries = notifications.snapshot().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, ACCESS_DENIED_MESSAGE);
        assert_eq!(entries[0].details, Some(json!({"detail": "bad key"})));
    }

    #[tokio::test]
    async fn test_reporter_skips_expected_status() {
        let session = Session::new(Arc::new(MemoryTokenStore::default()));
        let navigator = Arc::new(RecordingNavigator::default());
        let notifications = NotificationStore::default();
        let reporter = FailureReporter::new(session, navigator, notifications.clone());

        let request = ApiRequest::get("/api/accounts/active")
            .expect_status(reqwest::StatusCode::NOT_FOUND);
        reporter.on_error(&request, &status(404, Value::Null)).await;

        assert!(notifications.snapshot().await.is_empty());
    }
}
