//! HTTP layer: API client plus the session middleware chain
//!
//! - [`client`] - `ApiClient` and `ApiRequest`
//! - [`middleware`] - `Middleware` trait, bearer auth, failure reporting
//! - [`errors`] - `HttpError`

pub mod client;
pub mod errors;
pub mod middleware;

pub use client::{ApiClient, ApiClientBuilder, ApiRequest};
pub use errors::{HttpError, HttpResult};
pub use middleware::{classify, BearerAuth, Failure, FailureReporter, Middleware};
