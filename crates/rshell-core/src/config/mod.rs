//! Configuration management for rshell

mod client;
mod session;
pub mod serde_utils;

pub use client::{ClientConfig, RemoteConfig, SessionDefaults, WaitConfig};
pub use session::SessionConfig;

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rshell")
}

/// Get the default configuration file path
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Load configuration from a file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Load the client configuration.
///
/// An explicit path must exist. The default path is optional and falls back
/// to built-in defaults when absent.
pub fn load_client_config(explicit: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let path = default_config_path();
            if path.exists() {
                load_config(&path)
            } else {
                tracing::debug!("No config file at {:?}, using defaults", path);
                Ok(ClientConfig::default())
            }
        }
    }
}
