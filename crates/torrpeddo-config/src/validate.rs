//! Parsing helpers and sanity checks for individual settings.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::defaults::MAX_DELETE_GRACE;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{FrontendMode, LogStyle};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Parse the front-end selector.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for anything but `http` or `stdio`.
pub fn parse_frontend(value: &str) -> ConfigResult<FrontendMode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "http" => Ok(FrontendMode::Http),
        "stdio" | "bridge" => Ok(FrontendMode::Stdio),
        _ => Err(ConfigError::invalid(
            "frontend",
            value,
            "expected http or stdio",
        )),
    }
}

/// Parse a `host:port` socket address.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not a socket address.
pub fn parse_socket_addr(field: &'static str, value: &str) -> ConfigResult<SocketAddr> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(field, value, "expected host:port"))
}

/// Validate a comma-separated list of `host:port` listen interfaces and normalise spacing.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the list is empty or an entry has no valid port.
pub fn parse_listen_interfaces(value: &str) -> ConfigResult<String> {
    let entries: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect();
    if entries.is_empty() {
        return Err(ConfigError::invalid(
            "listen_interfaces",
            value,
            "at least one interface is required",
        ));
    }
    for entry in &entries {
        let valid = entry
            .rsplit_once(':')
            .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
        if !valid {
            return Err(ConfigError::invalid(
                "listen_interfaces",
                *entry,
                "expected host:port",
            ));
        }
    }
    Ok(entries.join(","))
}

/// Parse the deletion grace interval in milliseconds.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not an integer or exceeds
/// [`MAX_DELETE_GRACE`].
pub fn parse_delete_grace(value: &str) -> ConfigResult<Duration> {
    let millis: u64 = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid("delete_grace_ms", value, "expected milliseconds"))?;
    let grace = Duration::from_millis(millis);
    if grace > MAX_DELETE_GRACE {
        return Err(ConfigError::invalid(
            "delete_grace_ms",
            value,
            "exceeds the ten minute ceiling",
        ));
    }
    Ok(grace)
}

/// Validate a log level name.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for unknown levels.
pub fn parse_log_level(value: &str) -> ConfigResult<String> {
    let level = value.trim().to_ascii_lowercase();
    if LOG_LEVELS.contains(&level.as_str()) {
        Ok(level)
    } else {
        Err(ConfigError::invalid("log_level", value, "unknown log level"))
    }
}

/// Parse the log style selector.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for anything but `json` or `pretty`.
pub fn parse_log_style(value: &str) -> ConfigResult<LogStyle> {
    match value.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(LogStyle::Json),
        "pretty" => Ok(LogStyle::Pretty),
        _ => Err(ConfigError::invalid(
            "log_format",
            value,
            "expected json or pretty",
        )),
    }
}

/// Expand a leading `~` and reject empty paths.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for empty values and
/// [`ConfigError::DownloadDirUnresolved`] when `~` cannot be expanded.
pub fn parse_directory(value: &str) -> ConfigResult<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::invalid(
            "download_dir",
            value,
            "must not be empty",
        ));
    }
    if trimmed == "~" {
        return dirs::home_dir().ok_or(ConfigError::DownloadDirUnresolved);
    }
    if let Some(rest) = trimmed.strip_prefix("~/") {
        return dirs::home_dir()
            .map(|home| home.join(rest))
            .ok_or(ConfigError::DownloadDirUnresolved);
    }
    Ok(PathBuf::from(trimmed))
}
