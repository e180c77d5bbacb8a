//! Application-wide error types using thiserror
//!
//! Store actions that propagate failures to their caller (`login`,
//! `activate_account`) return `AppError`. HTTP failures are wrapped
//! unchanged so call sites can still inspect the status and body.

use thiserror::Error;

use crate::http::HttpError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// HTTP status carried by the underlying failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Http(err) => err.status(),
            _ => None,
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
