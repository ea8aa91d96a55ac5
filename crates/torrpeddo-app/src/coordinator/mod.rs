//! The transfer coordinator: registry, ingestion, status aggregation, lifecycle control and
//! destination configuration behind the front-end traits.
//!
//! # Design
//! - The registry lock is never held across an engine call. Engine calls use handles copied
//!   out of the registry first.
//! - Engine registration and deferred deletion run on [`BackgroundTasks`]; callers learn only
//!   that the work was scheduled. Failures are logged, published and counted.
//! - Every event goes through [`Coordinator::emit`] so the event counter stays in step.

mod destination;
mod ingest;
mod lifecycle;
pub mod registry;
mod status;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use torrpeddo_core::{
    StatusRecord, TransferEngine, TransferId, TransferInspector, TransferResult,
    TransferWorkflow, parse_magnet, parse_metainfo,
};
use torrpeddo_events::{Event, EventBus};
use torrpeddo_fsops::DesktopLauncher;
use torrpeddo_telemetry::Metrics;

use crate::tasks::BackgroundTasks;
use registry::Registry;

/// Default grace interval before deferred payload deletion.
pub const DEFAULT_DELETION_GRACE: Duration = Duration::from_millis(1_500);

/// Tunables for a [`Coordinator`].
#[derive(Debug, Clone, Copy)]
pub struct CoordinatorSettings {
    /// Delay between detaching a transfer and deleting its payload.
    pub deletion_grace: Duration,
    /// Program used to open payload folders.
    pub launcher: DesktopLauncher,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            deletion_grace: DEFAULT_DELETION_GRACE,
            launcher: DesktopLauncher::default(),
        }
    }
}

/// Transfer coordinator over an engine `E`.
pub struct Coordinator<E> {
    engine: Arc<E>,
    registry: Arc<Registry>,
    directory: Arc<RwLock<PathBuf>>,
    events: EventBus,
    metrics: Metrics,
    tasks: BackgroundTasks,
    settings: CoordinatorSettings,
}

impl<E> Clone for Coordinator<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            registry: Arc::clone(&self.registry),
            directory: Arc::clone(&self.directory),
            events: self.events.clone(),
            metrics: self.metrics.clone(),
            tasks: self.tasks.clone(),
            settings: self.settings,
        }
    }
}

impl<E> Coordinator<E>
where
    E: TransferEngine + 'static,
{
    /// Build a coordinator saving new transfers under `download_dir`.
    #[must_use]
    pub fn new(
        engine: Arc<E>,
        download_dir: PathBuf,
        events: EventBus,
        metrics: Metrics,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            engine,
            registry: Arc::new(Registry::new()),
            directory: Arc::new(RwLock::new(download_dir)),
            events,
            metrics,
            tasks: BackgroundTasks::new(),
            settings,
        }
    }

    /// Registry backing this coordinator.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Wait for in-flight background registrations and deletions.
    pub async fn shutdown(&self) {
        let outstanding = self.tasks.len();
        info!(outstanding, "flushing background tasks");
        self.tasks.shutdown().await;
    }

    fn emit(&self, event: Event) {
        self.metrics.inc_event(event.kind());
        let _ = self.events.publish(event);
    }

    fn refresh_gauge(&self) {
        self.metrics.set_tracked_transfers(self.registry.len());
    }
}

#[async_trait]
impl<E> TransferWorkflow for Coordinator<E>
where
    E: TransferEngine + 'static,
{
    async fn add_magnet(&self, uri: &str) -> TransferResult<TransferId> {
        let descriptor = parse_magnet(uri)?;
        Ok(self.ingest(descriptor).await)
    }

    async fn add_metainfo(&self, payload: &[u8]) -> TransferResult<TransferId> {
        let descriptor = parse_metainfo(payload)?;
        Ok(self.ingest(descriptor).await)
    }

    async fn pause(&self, id: TransferId) -> TransferResult<()> {
        self.pause_transfer(id).await
    }

    async fn resume(&self, id: TransferId) -> TransferResult<()> {
        self.resume_transfer(id).await
    }

    async fn cancel(&self, id: TransferId) -> TransferResult<()> {
        self.cancel_transfer(id).await
    }

    async fn remove(&self, id: TransferId) -> TransferResult<()> {
        self.remove_transfer(id).await
    }

    async fn delete_with_files(&self, id: TransferId) -> TransferResult<()> {
        self.delete_transfer(id).await
    }

    async fn set_directory(&self, path: &Path) -> TransferResult<()> {
        self.replace_directory(path).await
    }

    async fn open_folder(&self, id: TransferId) -> TransferResult<PathBuf> {
        self.open_transfer_folder(id).await
    }
}

#[async_trait]
impl<E> TransferInspector for Coordinator<E>
where
    E: TransferEngine + 'static,
{
    async fn list_status(&self) -> Vec<StatusRecord> {
        self.snapshot().await
    }

    async fn directory(&self) -> PathBuf {
        self.current_directory().await
    }
}
