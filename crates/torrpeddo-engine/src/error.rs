//! # Design
//!
//! - Keep error messages constant; store operational context in fields.
//! - Session failures travel as `anyhow::Error` wrapping [`EngineError`], so callers can
//!   downcast when they need the variant.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use torrpeddo_core::{EngineHandle, TransferId};
use torrpeddo_fsops::FsOpsError;

/// Failures raised by the engine session.
#[derive(Debug)]
pub enum EngineError {
    /// The handle is not (or no longer) known to the session.
    UnknownHandle {
        /// Handle that was looked up.
        handle: EngineHandle,
    },
    /// A transfer with the same identifier is already registered.
    DuplicateTransfer {
        /// Conflicting identifier.
        id: TransferId,
    },
    /// The payload location could not be prepared on disk.
    Storage {
        /// Operation that touched the filesystem.
        operation: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying filesystem error.
        source: FsOpsError,
    },
}

impl Display for EngineError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownHandle { handle } => write!(formatter, "unknown engine handle {handle}"),
            Self::DuplicateTransfer { id } => write!(formatter, "transfer {id} already registered"),
            Self::Storage { operation, .. } => {
                write!(formatter, "engine storage failure during {operation}")
            }
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage { source, .. } => Some(source),
            Self::UnknownHandle { .. } | Self::DuplicateTransfer { .. } => None,
        }
    }
}
