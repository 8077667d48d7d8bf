//! Configuration loading and root folder resolution
//!
//! All WildLens binaries share one optional TOML file plus a small set of
//! `WILDLENS_*` environment variables. Resolution priority for every setting:
//!
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML configuration file
//! 4. Built-in default (fallback)

use crate::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory name used under the platform config/data dirs
pub const APP_DIR: &str = "wildlens";

/// Configuration file name under the platform config dir
pub const CONFIG_FILE: &str = "wildlens.toml";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "WILDLENS_ROOT_FOLDER";

/// Settings loaded from the TOML configuration file
///
/// Every field is optional; binaries fall back to environment variables and
/// built-in defaults for anything not present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Root folder for locally persisted data (collection snapshot)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// API key for the remote identification service
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the remote identification service
    #[serde(default)]
    pub service_url: Option<String>,

    /// Base URL of the local identification gateway (used by clients)
    #[serde(default)]
    pub gateway_url: Option<String>,

    /// HTTP port for the identification gateway
    #[serde(default)]
    pub port: Option<u16>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default configuration file path for the platform
/// (e.g. `~/.config/wildlens/wildlens.toml` on Linux)
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
}

/// Load the TOML configuration from the platform default location.
///
/// A missing file is the normal first-run case and yields defaults.
pub fn load_toml_config() -> TomlConfig {
    match config_file_path() {
        Some(path) => load_toml_config_from(&path),
        None => TomlConfig::default(),
    }
}

/// Load the TOML configuration from an explicit path.
///
/// Unreadable or unparseable files yield defaults rather than an error so a
/// damaged config never prevents startup.
pub fn load_toml_config_from(path: &Path) -> TomlConfig {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => {
            debug!("No config file at {}, using defaults", path.display());
            return TomlConfig::default();
        }
    };

    match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to parse {}: {e}, using defaults", path.display());
            TomlConfig::default()
        }
    }
}

/// Resolve the root folder for locally persisted data.
///
/// Priority order:
/// 1. Command-line argument (highest priority)
/// 2. `WILDLENS_ROOT_FOLDER` environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/wildlens
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("/var/lib/wildlens"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/wildlens
        dirs::data_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/wildlens"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\wildlens
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\wildlens"))
    } else {
        PathBuf::from("./wildlens_data")
    }
}

/// Create the root folder if it does not exist yet
pub fn ensure_root_folder(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}
