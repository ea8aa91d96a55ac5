//! # Design
//!
//! - Centralize application-level errors for bootstrap and front-end selection.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: torrpeddo_config::ConfigError,
    },
    /// Telemetry setup failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: torrpeddo_telemetry::TelemetryError,
    },
    /// Filesystem preparation failed.
    #[error("filesystem operation failed")]
    FsOps {
        /// Operation identifier.
        operation: &'static str,
        /// Source fsops error.
        source: torrpeddo_fsops::FsOpsError,
    },
    /// Serving a front-end failed.
    #[error("api server operation failed")]
    ApiServer {
        /// Operation identifier.
        operation: &'static str,
        /// Source API server error.
        source: torrpeddo_api::ApiServerError,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: torrpeddo_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: torrpeddo_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn fsops(
        operation: &'static str,
        source: torrpeddo_fsops::FsOpsError,
    ) -> Self {
        Self::FsOps { operation, source }
    }

    pub(crate) const fn api_server(
        operation: &'static str,
        source: torrpeddo_api::ApiServerError,
    ) -> Self {
        Self::ApiServer { operation, source }
    }
}
