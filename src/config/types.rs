//! Configuration types for the client
//!
//! Loaded from YAML (every section optional), then overlaid with
//! environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::error::AppError;
use crate::stores::notifications::ExpiryPolicy;

// ============================================================================
// Enums
// ============================================================================

/// Deployment mode, drives the base URL fallback
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Development,
    #[default]
    Production,
}

impl std::str::FromStr for RunMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(RunMode::Development),
            "production" | "prod" => Ok(RunMode::Production),
            other => Err(AppError::Config(format!(
                "Unknown run mode '{}' (expected development or production)",
                other
            ))),
        }
    }
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Remote API location
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Explicit backend URL; wins over every fallback
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub mode: RunMode,
    /// Origin the dashboard is served from; production fallback
    #[serde(default)]
    pub origin: Option<String>,
}

impl ApiConfig {
    /// Explicit URL, else the loopback backend in development, else the origin
    pub fn resolve_base_url(&self) -> Result<String, AppError> {
        if let Some(url) = self.base_url.as_deref().filter(|u| !u.is_empty()) {
            return Ok(url.trim_end_matches('/').to_string());
        }

        match self.mode {
            RunMode::Development => Ok(constants::dev_api_url()),
            RunMode::Production => self
                .origin
                .as_deref()
                .filter(|o| !o.is_empty())
                .map(|o| o.trim_end_matches('/').to_string())
                .ok_or_else(|| {
                    AppError::Config(
                        "No API base URL: set api.base_url or api.origin for production".to_string(),
                    )
                }),
        }
    }

    /// Absolute URL for a backend path, for links shared outside the client
    /// (e.g. webhook URLs)
    pub fn full_api_url(&self, path: &str) -> Result<String, AppError> {
        Ok(format!("{}{}", self.resolve_base_url()?, path))
    }

    pub fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [("base_url", &self.base_url), ("origin", &self.origin)] {
            if let Some(url) = value.as_deref().filter(|u| !u.is_empty()) {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(AppError::Config(format!(
                        "api.{} must start with http:// or https:// (got '{}')",
                        field, url
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Persisted session settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    #[serde(default = "constants::default_token_path")]
    pub token_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_path: constants::default_token_path(),
        }
    }
}

/// Auto-expiry delays in seconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationConfig {
    #[serde(default = "default_error_secs")]
    pub error_secs: u64,
    #[serde(default = "default_warning_secs")]
    pub warning_secs: u64,
    #[serde(default = "default_info_secs")]
    pub info_secs: u64,
}

fn default_error_secs() -> u64 {
    constants::ERROR_EXPIRY_SECS
}

fn default_warning_secs() -> u64 {
    constants::WARNING_EXPIRY_SECS
}

fn default_info_secs() -> u64 {
    constants::INFO_EXPIRY_SECS
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            error_secs: default_error_secs(),
            warning_secs: default_warning_secs(),
            info_secs: default_info_secs(),
        }
    }
}

impl NotificationConfig {
    pub fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy {
            error: Duration::from_secs(self.error_secs),
            warning: Duration::from_secs(self.warning_secs),
            info: Duration::from_secs(self.info_secs),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.error_secs == 0 || self.warning_secs == 0 || self.info_secs == 0 {
            return Err(AppError::Config(
                "Notification expiry delays must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        self.api.validate()?;
        self.notifications.validate()?;
        Ok(())
    }

    /// Overlay environment variables:
    /// - `DASHBOARD_API_URL` - explicit base URL
    /// - `DASHBOARD_MODE` - `development` or `production`
    /// - `DASHBOARD_ORIGIN` - production origin
    /// - `DASHBOARD_TOKEN_PATH` - persisted token file
    pub fn with_env_overrides(mut self) -> Result<Self, AppError> {
        if let Some(url) = env_non_empty("DASHBOARD_API_URL") {
            self.api.base_url = Some(url);
        }
        if let Some(mode) = env_non_empty("DASHBOARD_MODE") {
            self.api.mode = mode.parse()?;
        }
        if let Some(origin) = env_non_empty("DASHBOARD_ORIGIN") {
            self.api.origin = Some(origin);
        }
        if let Some(path) = env_non_empty("DASHBOARD_TOKEN_PATH") {
            self.session.token_path = PathBuf::from(path);
        }
        self.validate()?;
        Ok(self)
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
