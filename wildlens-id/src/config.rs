//! Configuration resolution for wildlens-id
//!
//! Provides two-tier resolution with ENV → TOML priority on top of the
//! built-in defaults. The API key is secret material and never logged.

use tracing::{info, warn};
use wildlens_common::config::TomlConfig;

use crate::services::DEFAULT_SERVICE_URL;

/// Default HTTP port for the identification gateway
pub const DEFAULT_PORT: u16 = 5741;

/// Environment variable carrying the remote service API key
pub const API_KEY_ENV: &str = "WILDLENS_API_KEY";

/// Environment variable overriding the remote service base URL
pub const SERVICE_URL_ENV: &str = "WILDLENS_SERVICE_URL";

/// Environment variable overriding the gateway listen port
pub const PORT_ENV: &str = "WILDLENS_ID_PORT";

/// Resolved gateway configuration
#[derive(Debug, Clone)]
pub struct IdConfig {
    /// HTTP listen port (loopback only)
    pub port: u16,

    /// Base URL of the remote identification service
    pub service_url: String,

    /// API key for the remote service; `None` leaves the gateway running
    /// with identification requests rejected until a key is provided
    pub api_key: Option<String>,
}

impl IdConfig {
    /// Resolve configuration from environment variables and the TOML file.
    ///
    /// Missing values fall back to built-in defaults; a missing API key is
    /// reported by the caller, not here.
    pub fn resolve(toml_config: &TomlConfig) -> Self {
        let port = std::env::var(PORT_ENV)
            .ok()
            .and_then(|value| match value.trim().parse() {
                Ok(port) => Some(port),
                Err(_) => {
                    warn!("Ignoring non-numeric {PORT_ENV}={value}");
                    None
                }
            })
            .or(toml_config.port)
            .unwrap_or(DEFAULT_PORT);

        let service_url = std::env::var(SERVICE_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| toml_config.service_url.clone())
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());

        let api_key = resolve_api_key(toml_config);

        Self {
            port,
            service_url,
            api_key,
        }
    }
}

/// Resolve the remote service API key from 2-tier configuration
///
/// **Priority:** ENV → TOML
fn resolve_api_key(toml_config: &TomlConfig) -> Option<String> {
    let mut sources = Vec::new();

    let env_key = std::env::var(API_KEY_ENV).ok();
    if let Some(key) = &env_key {
        if is_valid_key(key) {
            sources.push("environment");
        }
    }

    let toml_key = toml_config.api_key.as_ref();
    if let Some(key) = toml_key {
        if is_valid_key(key) {
            sources.push("TOML");
        }
    }

    // Warn if multiple sources (potential misconfiguration)
    if sources.len() > 1 {
        warn!(
            "API key found in multiple sources: {}. Using environment (highest priority).",
            sources.join(", ")
        );
    }

    if let Some(key) = env_key {
        if is_valid_key(&key) {
            info!("API key loaded from environment variable");
            return Some(key);
        }
    }

    if let Some(key) = toml_key {
        if is_valid_key(key) {
            info!("API key loaded from TOML config");
            return Some(key.clone());
        }
    }

    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
