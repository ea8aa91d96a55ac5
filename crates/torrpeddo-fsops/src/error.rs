//! # Design
//!
//! - Constant messages; the operation and path travel as fields.
//! - Source errors are preserved, never interpolated.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for filesystem operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced by filesystem helpers.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// IO failure while touching the filesystem.
    #[error("fsops io failure")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Input validation failure.
    #[error("fsops invalid input")]
    InvalidInput {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// The desktop launcher is not installed.
    #[error("fsops launcher not found")]
    LauncherMissing {
        /// Program that was looked up on `PATH`.
        launcher: &'static str,
    },
}

impl FsOpsError {
    /// IO failure helper.
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Input validation helper.
    #[must_use]
    pub fn invalid_input(field: &'static str, reason: &'static str, value: Option<String>) -> Self {
        Self::InvalidInput {
            field,
            reason,
            value,
        }
    }
}
