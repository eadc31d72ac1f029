//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_HTTP_PORT: &str = "FRONTDOOR_HTTP_PORT";
pub const ENV_HTTPS_PORT: &str = "FRONTDOOR_HTTPS_PORT";
pub const ENV_TLS_KEY: &str = "FRONTDOOR_TLS_KEY";
pub const ENV_TLS_CHAIN: &str = "FRONTDOOR_TLS_CHAIN";
pub const ENV_SERVICES_FILE: &str = "FRONTDOOR_SERVICES_FILE";
pub const ENV_LIVE_DIR: &str = "FRONTDOOR_LIVE_DIR";

/// Error type for configuration loading. Every variant is fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config {path:?} unreadable: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config {path:?} malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("config invalid: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, override from the process environment, and validate a TOML config file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an injectable environment lookup.
pub fn load_config_with<F>(path: &Path, env: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: ProxyConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    apply_env_overrides(&mut config, env).map_err(|reason| ConfigError::Malformed {
        path: path.to_path_buf(),
        reason,
    })?;

    validate_config(&config).map_err(ConfigError::Invalid)?;

    Ok(config)
}

/// Overlay environment variables onto a parsed config.
///
/// A source override replaces whichever source the file named.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, env: F) -> Result<(), String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = env(ENV_HTTP_PORT) {
        config.listener.http_port = parse_port(ENV_HTTP_PORT, &port)?;
    }
    if let Some(port) = env(ENV_HTTPS_PORT) {
        config.listener.https_port = parse_port(ENV_HTTPS_PORT, &port)?;
    }
    if let Some(key) = env(ENV_TLS_KEY).filter(|v| !v.is_empty()) {
        config.tls.private_key = PathBuf::from(key);
    }
    if let Some(chain) = env(ENV_TLS_CHAIN).filter(|v| !v.is_empty()) {
        config.tls.full_chain = PathBuf::from(chain);
    }
    if let Some(file) = env(ENV_SERVICES_FILE).filter(|v| !v.is_empty()) {
        config.services.file = Some(PathBuf::from(file));
        config.services.live_dir = None;
        config.services.entries.clear();
    }
    if let Some(dir) = env(ENV_LIVE_DIR).filter(|v| !v.is_empty()) {
        config.services.live_dir = Some(PathBuf::from(dir));
        config.services.file = None;
        config.services.entries.clear();
    }
    Ok(())
}

fn parse_port(key: &str, value: &str) -> Result<u16, String> {
    value
        .trim()
        .trim_start_matches(':')
        .parse()
        .map_err(|_| format!("{key}={value:?} is not a port"))
}
