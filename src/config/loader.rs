//! Reads `ClientConfig` from YAML
//!
//! Every section is optional; missing keys take their defaults. The result is
//! validated before it is returned. Environment overrides are applied
//! separately by `ClientConfig::with_env_overrides`.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::AppError;

use super::types::ClientConfig;

/// Read, parse and validate the file at `path`
pub fn load_config(path: &Path) -> Result<ClientConfig, AppError> {
    let yaml = match fs::read_to_string(path) {
        Ok(yaml) => yaml,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::Config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    debug!(path = %path.display(), "Parsing configuration");
    parse(&yaml).map_err(|e| AppError::Config(format!("{} ({})", e, path.display())))
}

/// Same as [`load_config`] for YAML already in memory
pub fn load_config_from_str(yaml: &str) -> Result<ClientConfig, AppError> {
    parse(yaml).map_err(AppError::Config)
}

fn parse(yaml: &str) -> Result<ClientConfig, String> {
    let config: ClientConfig =
        serde_yaml::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))?;
    config.validate().map_err(|e| match e {
        AppError::Config(reason) => reason,
        other => other.to_string(),
    })?;
    Ok(config)
}

// ============================================================================
// Tests
// ============================================================================
