//! Error taxonomy shared by the coordinator and its front-ends.
//!
//! # Design
//! - Messages are constant; the identifier, path or operation lives in fields so callers can
//!   log structured context without parsing strings.
//! - Synchronous failures (`MalformedDescriptor`, `NotFound`, `InvalidDirectory`) reach the
//!   caller directly. Background failures (`EngineRegistrationFailed`,
//!   `DeferredDeletionFailed`) are only ever logged and published as events.

use std::error::Error;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::TransferId;

/// Primary error type for coordinator operations.
#[derive(Debug, Error)]
pub enum TransferError {
    /// A magnet or metainfo payload could not be parsed.
    #[error("malformed transfer descriptor")]
    MalformedDescriptor {
        /// Descriptor flavour (`magnet` or `metainfo`).
        input: &'static str,
        /// What was wrong with it.
        reason: &'static str,
    },
    /// No record exists for the identifier.
    #[error("transfer not found")]
    NotFound {
        /// Missing identifier.
        id: TransferId,
    },
    /// A record already exists for the identifier.
    #[error("transfer already registered")]
    DuplicateIdentifier {
        /// Conflicting identifier.
        id: TransferId,
    },
    /// The record exists but its lifecycle state does not allow the operation.
    #[error("transfer state does not allow this operation")]
    InvalidState {
        /// Transfer identifier.
        id: TransferId,
        /// Rejected operation.
        operation: &'static str,
        /// Current lifecycle state label.
        state: &'static str,
    },
    /// The requested destination directory does not exist.
    #[error("destination directory is invalid")]
    InvalidDirectory {
        /// Rejected path.
        path: PathBuf,
    },
    /// The engine rejected a registration.
    #[error("engine registration failed")]
    EngineRegistrationFailed {
        /// Transfer identifier.
        id: TransferId,
        /// Engine failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// An engine call other than registration failed.
    #[error("engine operation failed")]
    EngineOperationFailed {
        /// Operation identifier.
        operation: &'static str,
        /// Transfer identifier.
        id: TransferId,
        /// Engine failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// Deferred payload deletion failed.
    #[error("deferred deletion failed")]
    DeferredDeletionFailed {
        /// Transfer identifier.
        id: TransferId,
        /// Path that could not be removed.
        path: PathBuf,
        /// Filesystem failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A path the operation needs is not on disk.
    #[error("path does not exist")]
    PathMissing {
        /// Missing path.
        path: PathBuf,
    },
    /// No desktop launcher is available to open folders.
    #[error("desktop launcher unavailable")]
    LauncherUnavailable {
        /// Launcher program that was looked up.
        launcher: &'static str,
    },
    /// The desktop launcher was found but could not be started.
    #[error("desktop launcher failed")]
    LaunchFailed {
        /// Folder that was being opened.
        path: PathBuf,
        /// Spawn failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The implementation does not provide the operation.
    #[error("transfer operation not supported")]
    Unsupported {
        /// Operation identifier.
        operation: &'static str,
    },
}

impl TransferError {
    /// Shorthand for a malformed magnet descriptor.
    #[must_use]
    pub const fn malformed_magnet(reason: &'static str) -> Self {
        Self::MalformedDescriptor {
            input: "magnet",
            reason,
        }
    }

    /// Shorthand for a malformed metainfo payload.
    #[must_use]
    pub const fn malformed_metainfo(reason: &'static str) -> Self {
        Self::MalformedDescriptor {
            input: "metainfo",
            reason,
        }
    }

    /// Wrap an engine failure for `operation` on `id`.
    #[must_use]
    pub fn engine(operation: &'static str, id: TransferId, source: anyhow::Error) -> Self {
        Self::EngineOperationFailed {
            operation,
            id,
            source: source.into(),
        }
    }

    /// Whether the error means the identifier is unknown.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience alias for coordinator results.
pub type TransferResult<T> = Result<T, TransferError>;
