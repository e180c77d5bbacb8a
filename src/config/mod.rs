//! Client configuration and YAML loading
//!
//! - Configuration types (`ClientConfig`, `ApiConfig`, `SessionConfig`, `NotificationConfig`)
//! - YAML loading (`load_config`)
//! - Constants with environment variable overrides
//! - Logging setup

pub mod constants;
pub mod logging;
mod loader;
mod types;

pub use types::{ApiConfig, ClientConfig, NotificationConfig, RunMode, SessionConfig};

pub use loader::{load_config, load_config_from_str};
