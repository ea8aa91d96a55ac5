//! Engine contract and the coordinator facade consumed by front-ends.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{TransferError, TransferResult};
use crate::model::{EngineHandle, EngineRegistration, EngineStatus, StatusRecord, TransferId};

/// Narrow handle-based contract over the external transfer engine.
///
/// Implementations must be safe to call concurrently; the coordinator never holds its
/// registry lock across these calls.
#[async_trait]
pub trait TransferEngine: Send + Sync {
    /// Admit a transfer and return the engine's handle for it.
    async fn register(&self, request: EngineRegistration) -> anyhow::Result<EngineHandle>;

    /// Live metrics for a handle.
    async fn status(&self, handle: EngineHandle) -> anyhow::Result<EngineStatus>;

    /// Signal pause.
    async fn pause(&self, handle: EngineHandle) -> anyhow::Result<()>;

    /// Signal resume.
    async fn resume(&self, handle: EngineHandle) -> anyhow::Result<()>;

    /// Toggle engine-side queue management for a handle.
    async fn set_auto_managed(&self, handle: EngineHandle, enabled: bool) -> anyhow::Result<()>;

    /// Stop the transfer and drop the handle. Payload data stays on disk.
    async fn unregister(&self, handle: EngineHandle) -> anyhow::Result<()>;
}

/// Mutating commands offered to front-ends.
#[async_trait]
pub trait TransferWorkflow: Send + Sync {
    /// Admit a magnet URI; returns as soon as the identifier is known.
    async fn add_magnet(&self, uri: &str) -> TransferResult<TransferId>;

    /// Admit a metainfo payload; returns as soon as the identifier is known.
    async fn add_metainfo(&self, payload: &[u8]) -> TransferResult<TransferId>;

    /// Pause a transfer.
    async fn pause(&self, id: TransferId) -> TransferResult<()>;

    /// Resume a transfer.
    async fn resume(&self, id: TransferId) -> TransferResult<()>;

    /// Detach a transfer from the engine while keeping its record.
    async fn cancel(&self, id: TransferId) -> TransferResult<()>;

    /// Detach and forget a transfer, leaving its data on disk.
    async fn remove(&self, id: TransferId) -> TransferResult<()>;

    /// Detach and forget a transfer, then delete its payload after a grace interval.
    async fn delete_with_files(&self, id: TransferId) -> TransferResult<()>;

    /// Replace the save directory used by future additions.
    async fn set_directory(&self, path: &Path) -> TransferResult<()>;

    /// Open the transfer's payload location in the desktop file manager.
    async fn open_folder(&self, id: TransferId) -> TransferResult<PathBuf> {
        let _ = id;
        Err(TransferError::Unsupported {
            operation: "open_folder",
        })
    }
}

/// Read-only views offered to front-ends.
#[async_trait]
pub trait TransferInspector: Send + Sync {
    /// Snapshot of every tracked transfer, in insertion order.
    async fn list_status(&self) -> Vec<StatusRecord>;

    /// Current default save directory.
    async fn directory(&self) -> PathBuf;
}
