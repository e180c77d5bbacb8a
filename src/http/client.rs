//! API client with an ordered middleware chain
//!
//! Every call goes through `ApiClient::execute`, which has a single exit:
//! either the decoded body, or an `HttpError` that every middleware has
//! already observed via `on_error`.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::errors::{HttpError, HttpResult};
use super::middleware::Middleware;

/// One outgoing call, described independently of the transport
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL (e.g. `/api/accounts`)
    pub path: String,
    pub body: Option<Value>,
    /// Statuses the call site handles itself; the failure reporter stays quiet for them
    expected_statuses: Vec<u16>,
    /// Deferred body serialization failure, surfaced when the request is built
    build_error: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            expected_statuses: Vec::new(),
            build_error: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.body = Some(value),
            Err(e) => self.build_error = Some(e.to_string()),
        }
        self
    }

    /// Mark a status as handled by the caller. 401 always ends the session
    /// and cannot be marked expected.
    pub fn expect_status(mut self, status: StatusCode) -> Self {
        if status != StatusCode::UNAUTHORIZED {
            self.expected_statuses.push(status.as_u16());
        }
        self
    }

    pub fn expects(&self, status: u16) -> bool {
        self.expected_statuses.contains(&status)
    }
}

/// Builder collecting middleware in registration order
pub struct ApiClientBuilder {
    base_url: String,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl ApiClientBuilder {
    pub fn with(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn build(self) -> ApiClient {
        ApiClient {
            // No explicit timeout: the transport default applies
            http: reqwest::Client::new(),
            base_url: self.base_url.trim_end_matches('/').to_string(),
            middleware: Arc::new(self.middleware),
        }
    }
}

/// Cheap to clone; clones share the connection pool and middleware chain
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    middleware: Arc<Vec<Arc<dyn Middleware>>>,
}

impl ApiClient {
    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder {
            base_url: base_url.into(),
            middleware: Vec::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> HttpResult<T> {
        self.execute(ApiRequest::get(path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> HttpResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::post(path).json(body)).await
    }

    /// Run the request through the chain. Failures are reported to every
    /// middleware and then returned unchanged.
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> HttpResult<T> {
        let outcome = self.dispatch(&request).await;

        if let Err(err) = &outcome {
            for middleware in self.middleware.iter() {
                middleware.on_error(&request, err).await;
            }
        }

        outcome
    }

    async fn dispatch<T: DeserializeOwned>(&self, request: &ApiRequest) -> HttpResult<T> {
        if let Some(reason) = &request.build_error {
            return Err(HttpError::Build(reason.clone()));
        }

        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.http.request(request.method.clone(), url.as_str());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let mut outgoing = builder
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        for middleware in self.middleware.iter() {
            middleware.on_request(&mut outgoing).await?;
        }

        debug!(method = %request.method, path = %request.path, "Sending request");

        let response = self
            .http
            .execute(outgoing)
            .await
            .map_err(|e| HttpError::Network(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| HttpError::Network(e.to_string()))?;

        if !status.is_success() {
            debug!(path = %request.path, status = status.as_u16(), "Request failed");
            return Err(HttpError::Status {
                status: status.as_u16(),
                body: parse_error_body(&bytes),
            });
        }

        let payload: &[u8] = if bytes.is_empty() { b"null" } else { &bytes[..] };
        serde_json::from_slice(payload).map_err(|e| {
            HttpError::InvalidResponse(format!("{} {}: {}", request.method, request.path, e))
        })
    }
}

/// Error bodies are kept as JSON when possible, as a JSON string otherwise
fn parse_error_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every error the chain reports
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<HttpError>>,
    }

    #[async_trait]
    impl Middleware for Recorder {
        async fn on_error(&self, _request: &ApiRequest, error: &HttpError) {
            self.seen.lock().unwrap().push(error.clone());
        }
    }

    fn client_with_recorder(base_url: &str) -> (ApiClient, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let client = ApiClient::builder(base_url).with(recorder.clone()).build();
        (client, recorder)
    }

    #[tokio::test]
    async fn test_get_decodes_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/accounts")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 1}]"#)
            .create_async()
            .await;

        let (client, recorder) = client_with_recorder(&server.url());
        let body: Value = client.get("/api/accounts").await.unwrap();

        assert_eq!(body, json!([{"id": 1}]));
        assert!(recorder.seen.lock().unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/auth/login")
            .match_body(mockito::Matcher::Json(json!({"username": "alice", "password": "pw"})))
            .with_status(200)
            .with_body(r#"{"access_token": "abc"}"#)
            .create_async()
            .await;

        let (client, _) = client_with_recorder(&server.url());
        let body: Value = client
            .post("/api/auth/login", &json!({"username": "alice", "password": "pw"}))
            .await
            .unwrap();

        assert_eq!(body["access_token"], "abc");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_success_body_decodes_as_null() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/accounts/3/activate")
            .with_status(200)
            .create_async()
            .await;

        let (client, _) = client_with_recorder(&server.url());
        let body: Value = client
            .execute(ApiRequest::post("/api/accounts/3/activate"))
            .await
            .unwrap();
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_error_status_is_reported_then_returned() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/accounts/active")
            .with_status(404)
            .with_body(r#"{"detail": "No active account found"}"#)
            .create_async()
            .await;

        let (client, recorder) = client_with_recorder(&server.url());
        let err = client
            .get::<Value>("/api/accounts/active")
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert_eq!(err.detail().as_deref(), Some("No active account found"));
        assert_eq!(recorder.seen.lock().unwrap().as_slice(), &[err]);
    }

    #[tokio::test]
    async fn test_plain_text_error_body_is_kept_as_string() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/accounts")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let (client, _) = client_with_recorder(&server.url());
        let err = client.get::<Value>("/api/accounts").await.unwrap_err();
        assert_eq!(err.body(), Some(&json!("Bad Gateway")));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let (client, recorder) = client_with_recorder("http://127.0.0.1:1");
        let err = client.get::<Value>("/api/accounts").await.unwrap_err();

        assert!(matches!(err, HttpError::Network(_)), "Got: {:?}", err);
        assert_eq!(recorder.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_base_url_is_build_error() {
        let (client, recorder) = client_with_recorder("not a url");
        let err = client.get::<Value>("/api/accounts").await.unwrap_err();

        assert!(matches!(err, HttpError::Build(_)), "Got: {:?}", err);
        assert_eq!(recorder.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_success_body_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/accounts")
            .with_status(200)
            .with_body("<html>proxy page</html>")
            .create_async()
            .await;

        let (client, _) = client_with_recorder(&server.url());
        let err = client.get::<Vec<Value>>("/api/accounts").await.unwrap_err();
        assert!(matches!(err, HttpError::InvalidResponse(_)), "Got: {:?}", err);
    }

    #[test]
    fn test_unauthorized_cannot_be_expected() {
        let request = ApiRequest::get("/api/accounts/active")
            .expect_status(StatusCode::NOT_FOUND)
            .expect_status(StatusCode::UNAUTHORIZED);
        assert!(request.expects(404));
        assert!(!request.expects(401));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::builder("http://localhost:8000/").build();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
