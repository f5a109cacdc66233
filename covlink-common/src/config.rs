//! Bootstrap configuration loading and resolution
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments (parsed by the binary, handed in as overrides;
//!    clap folds the matching environment variables into this tier)
//! 2. TOML configuration file
//! 3. Built-in defaults
//!
//! A missing config file at the default location degrades to defaults with a
//! warning; a file named explicitly on the command line must load cleanly.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default HTTP listen port for covlink-edi
pub const DEFAULT_PORT: u16 = 7432;

/// Default base URL of the EDI integration gateway
pub const DEFAULT_EDI_BASE_URL: &str = "http://localhost:8702";

/// Default outbound request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Bootstrap configuration loaded from a TOML file
///
/// These settings cannot change while the service runs; restart to pick up
/// edits. Every field is optional so a partial file overrides only the keys
/// it names.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Path to the SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// HTTP listen port
    #[serde(default)]
    pub port: Option<u16>,

    /// Base URL of the EDI integration gateway
    #[serde(default)]
    pub edi_base_url: Option<String>,

    /// Outbound request timeout in seconds
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// Values the binary resolved ahead of the TOML tier (command-line arguments
/// and their environment-variable fallbacks).
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Explicit config file path; when set, a load failure is fatal
    pub config_file: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub edi_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database_path: PathBuf,
    pub port: u16,
    pub edi_base_url: String,
    pub request_timeout_secs: u64,
}

impl ServiceConfig {
    /// Resolve the effective configuration from overrides, the TOML file,
    /// and built-in defaults.
    pub fn resolve(overrides: ConfigOverrides) -> Result<ServiceConfig> {
        let file = match &overrides.config_file {
            // Explicitly requested file must parse
            Some(path) => Some(load_toml_config(path)?),
            // Default location is best-effort
            None => match default_config_path() {
                Some(path) if path.exists() => match load_toml_config(&path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        warn!("Ignoring unreadable config {}: {}", path.display(), e);
                        None
                    }
                },
                _ => None,
            },
        }
        .unwrap_or_default();

        Ok(ServiceConfig {
            database_path: overrides
                .database_path
                .or(file.database_path)
                .unwrap_or_else(default_database_path),
            port: overrides.port.or(file.port).unwrap_or(DEFAULT_PORT),
            edi_base_url: overrides
                .edi_base_url
                .or(file.edi_base_url)
                .unwrap_or_else(|| DEFAULT_EDI_BASE_URL.to_string()),
            request_timeout_secs: overrides
                .request_timeout_secs
                .or(file.request_timeout_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        })
    }
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Default config file location: `<config dir>/covlink/covlink-edi.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("covlink").join("covlink-edi.toml"))
}

/// Default database location: `<local data dir>/covlink/covlink.db`, falling
/// back to `./covlink.db` on platforms without a data dir.
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("covlink").join("covlink.db"))
        .unwrap_or_else(|| PathBuf::from("covlink.db"))
}
