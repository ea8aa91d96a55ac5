//! Environment loading.
//!
//! # Design
//! - `load_from` takes a lookup closure so tests never touch the process environment.
//! - Unset or blank variables fall back to [`crate::defaults`]; set-but-invalid ones fail.

use std::path::PathBuf;

use tracing::debug;

use crate::defaults::{
    DEFAULT_BUILD_SHA, DEFAULT_DELETE_GRACE, DEFAULT_HTTP_ADDR, DEFAULT_LISTEN_INTERFACES,
    DEFAULT_LOG_LEVEL, DOWNLOAD_DIR_NAME, ENV_BUILD_SHA, ENV_DELETE_GRACE_MS, ENV_DOWNLOAD_DIR,
    ENV_FRONTEND, ENV_HTTP_ADDR, ENV_LISTEN_INTERFACES, ENV_LOG_FORMAT, ENV_LOG_LEVEL,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{AppConfig, FrontendMode};
use crate::validate::{
    parse_delete_grace, parse_directory, parse_frontend, parse_listen_interfaces,
    parse_log_level, parse_log_style, parse_socket_addr,
};

/// Load configuration from the process environment.
///
/// # Errors
///
/// Returns [`ConfigError`] when a variable is set to an invalid value or no save directory
/// can be resolved.
pub fn load() -> ConfigResult<AppConfig> {
    load_from(|key| std::env::var(key).ok())
}

/// Load configuration through an arbitrary key lookup.
///
/// # Errors
///
/// Returns [`ConfigError`] when a value is invalid or no save directory can be resolved.
pub fn load_from<F>(lookup: F) -> ConfigResult<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    let download_dir = match get(ENV_DOWNLOAD_DIR) {
        Some(value) => parse_directory(&value)?,
        None => default_download_dir()?,
    };
    let frontend = get(ENV_FRONTEND)
        .map(|value| parse_frontend(&value))
        .transpose()?
        .unwrap_or_default();
    let http_addr = parse_socket_addr(
        "http_addr",
        get(ENV_HTTP_ADDR).as_deref().unwrap_or(DEFAULT_HTTP_ADDR),
    )?;
    let listen_interfaces = parse_listen_interfaces(
        get(ENV_LISTEN_INTERFACES)
            .as_deref()
            .unwrap_or(DEFAULT_LISTEN_INTERFACES),
    )?;
    let deletion_grace = get(ENV_DELETE_GRACE_MS)
        .map(|value| parse_delete_grace(&value))
        .transpose()?
        .unwrap_or(DEFAULT_DELETE_GRACE);
    let log_level = parse_log_level(get(ENV_LOG_LEVEL).as_deref().unwrap_or(DEFAULT_LOG_LEVEL))?;
    let log_style = get(ENV_LOG_FORMAT)
        .map(|value| parse_log_style(&value))
        .transpose()?;
    let build_sha = get(ENV_BUILD_SHA).unwrap_or_else(|| DEFAULT_BUILD_SHA.to_string());

    let config = AppConfig {
        download_dir,
        frontend,
        http_addr,
        listen_interfaces,
        deletion_grace,
        log_level,
        log_style,
        build_sha,
    };
    debug!(
        download_dir = %config.download_dir.display(),
        frontend = %config.frontend,
        http_addr = %config.http_addr,
        "configuration loaded"
    );
    Ok(config)
}

/// `~/Downloads/Torrpeddo-Downloads`.
///
/// # Errors
///
/// Returns [`ConfigError::DownloadDirUnresolved`] when the home directory is unknown.
pub fn default_download_dir() -> ConfigResult<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join("Downloads").join(DOWNLOAD_DIR_NAME))
        .ok_or(ConfigError::DownloadDirUnresolved)
}

impl AppConfig {
    /// Override the front-end selected by the environment.
    #[must_use]
    pub const fn with_frontend(mut self, frontend: FrontendMode) -> Self {
        self.frontend = frontend;
        self
    }
}
