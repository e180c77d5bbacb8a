//! Application-wide constants and configuration defaults
//!
//! Values that deployments may want to move are exposed as functions that
//! read an environment variable and fall back to the default.

use std::path::PathBuf;

// =============================================================================
// Navigation
// =============================================================================

/// Login view; target of the 401 redirect
pub const LOGIN_PATH: &str = "/login";

/// Application root; target after a successful login
pub const HOME_PATH: &str = "/";

/// Landing view behind the root redirect
pub const DASHBOARD_PATH: &str = "/dashboard";

// =============================================================================
// Remote API
// =============================================================================

/// Backend address used in development when no base URL is configured
pub const DEFAULT_DEV_API_URL: &str = "http://localhost:8000";

/// Development backend address (default: `http://localhost:8000`)
///
/// Environment variable: `DASHBOARD_DEV_API_URL`
pub fn dev_api_url() -> String {
    std::env::var("DASHBOARD_DEV_API_URL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_DEV_API_URL.to_string())
}

// =============================================================================
// Session
// =============================================================================

/// Persisted token slot (default: `.dashboard/token`)
///
/// Environment variable: `DASHBOARD_TOKEN_PATH`
pub fn default_token_path() -> PathBuf {
    std::env::var("DASHBOARD_TOKEN_PATH")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".dashboard").join("token"))
}

// =============================================================================
// Notifications
// =============================================================================

pub const ERROR_EXPIRY_SECS: u64 = 10;
pub const WARNING_EXPIRY_SECS: u64 = 8;
pub const INFO_EXPIRY_SECS: u64 = 5;

/// Buffered change events per notification subscriber
pub const NOTIFICATION_EVENT_CAPACITY: usize = 64;
