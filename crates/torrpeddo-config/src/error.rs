//! Error types for configuration loading.

use thiserror::Error;

/// Primary error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting held a value that failed parsing or validation.
    #[error("invalid configuration field")]
    InvalidField {
        /// Setting name.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// No save directory was configured and no home directory could be resolved.
    #[error("download directory unresolved")]
    DownloadDirUnresolved,
}

impl ConfigError {
    /// Invalid field helper.
    #[must_use]
    pub fn invalid(field: &'static str, value: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidField {
            field,
            value: Some(value.into()),
            reason,
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
