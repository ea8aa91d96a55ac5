//! Pause, resume, cancel, remove and delete-with-files.
//!
//! Every operation runs its check-then-mutate step inside one registry critical section and
//! only then talks to the engine with the handle it copied out.

use std::error::Error;
use std::path::PathBuf;

use tokio::task;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use torrpeddo_core::{
    EngineHandle, LifecycleState, TransferEngine, TransferError, TransferId, TransferResult,
};
use torrpeddo_events::Event;
use torrpeddo_fsops::{Removal, payload_path, remove_payload};

use super::Coordinator;

impl<E> Coordinator<E>
where
    E: TransferEngine + 'static,
{
    pub(super) async fn pause_transfer(&self, id: TransferId) -> TransferResult<()> {
        let handle = self.registry.update(id, |record| match record.state {
            LifecycleState::Pending => {
                record.pause_requested = true;
                Ok(None)
            }
            LifecycleState::Active | LifecycleState::Paused => Ok(record.handle),
            LifecycleState::Cancelled | LifecycleState::Failed { .. } => {
                Err(rejected(id, "pause", &record.state))
            }
        })?;

        match handle {
            Some(handle) => {
                self.pause_handle(id, handle).await?;
                self.settle_state(id, handle, LifecycleState::Paused);
            }
            None => debug!(transfer_id = %id, "pause deferred until registration completes"),
        }
        info!(transfer_id = %id, "transfer paused");
        self.emit(Event::TransferPaused {
            transfer_id: id.to_hex(),
        });
        Ok(())
    }

    pub(super) async fn resume_transfer(&self, id: TransferId) -> TransferResult<()> {
        let handle = self.registry.update(id, |record| match record.state {
            LifecycleState::Pending => {
                record.pause_requested = false;
                Ok(None)
            }
            LifecycleState::Active | LifecycleState::Paused => Ok(record.handle),
            LifecycleState::Cancelled | LifecycleState::Failed { .. } => {
                Err(rejected(id, "resume", &record.state))
            }
        })?;

        if let Some(handle) = handle {
            self.engine
                .set_auto_managed(handle, true)
                .await
                .map_err(|err| TransferError::engine("set_auto_managed", id, err))?;
            self.engine
                .resume(handle)
                .await
                .map_err(|err| TransferError::engine("resume", id, err))?;
            self.settle_state(id, handle, LifecycleState::Active);
        }
        info!(transfer_id = %id, "transfer resumed");
        self.emit(Event::TransferResumed {
            transfer_id: id.to_hex(),
        });
        Ok(())
    }

    /// Record the state the engine just confirmed, unless the record moved to another
    /// handle or lifecycle stage meanwhile.
    fn settle_state(&self, id: TransferId, handle: EngineHandle, next: LifecycleState) {
        let _ = self.registry.update(id, |record| {
            if record.handle == Some(handle)
                && matches!(record.state, LifecycleState::Active | LifecycleState::Paused)
            {
                record.state = next;
            }
            Ok(())
        });
    }

    /// Disable queue management first so the engine cannot silently restart the transfer.
    pub(super) async fn pause_handle(
        &self,
        id: TransferId,
        handle: EngineHandle,
    ) -> TransferResult<()> {
        self.engine
            .set_auto_managed(handle, false)
            .await
            .map_err(|err| TransferError::engine("set_auto_managed", id, err))?;
        self.engine
            .pause(handle)
            .await
            .map_err(|err| TransferError::engine("pause", id, err))
    }

    pub(super) async fn remove_transfer(&self, id: TransferId) -> TransferResult<()> {
        let record = self.registry.remove(id)?;
        if let Some(handle) = record.handle {
            self.release(id, handle).await;
        }
        info!(transfer_id = %id, "transfer removed");
        self.refresh_gauge();
        self.emit(Event::TransferRemoved {
            transfer_id: id.to_hex(),
            with_data: false,
        });
        Ok(())
    }

    pub(super) async fn cancel_transfer(&self, id: TransferId) -> TransferResult<()> {
        // Learn the payload name while the engine still knows it.
        let record = self.registry.get(id)?;
        if let Some(handle) = record.handle
            && let Ok(status) = self.engine.status(handle).await
            && status.has_metadata
            && !status.name.is_empty()
        {
            self.registry.record_name(id, handle, &status.name);
        }

        let transition = self.registry.update(id, |record| match record.state {
            LifecycleState::Cancelled => Ok(None),
            LifecycleState::Failed { .. } => Err(rejected(id, "cancel", &record.state)),
            LifecycleState::Pending | LifecycleState::Active | LifecycleState::Paused => {
                record.state = LifecycleState::Cancelled;
                record.pause_requested = false;
                Ok(Some(record.handle.take()))
            }
        })?;

        let Some(handle) = transition else {
            debug!(transfer_id = %id, "transfer already cancelled");
            return Ok(());
        };
        if let Some(handle) = handle {
            self.release(id, handle).await;
        }
        info!(transfer_id = %id, "transfer cancelled");
        self.emit(Event::TransferCancelled {
            transfer_id: id.to_hex(),
        });
        Ok(())
    }

    /// Forget the transfer, detach it and schedule payload deletion after the grace interval.
    pub(super) async fn delete_transfer(&self, id: TransferId) -> TransferResult<()> {
        let record = self.registry.remove(id)?;
        let (save_path, name) = self.payload_location(&record).await;
        if let Some(handle) = record.handle {
            self.release(id, handle).await;
        }
        self.refresh_gauge();
        self.emit(Event::TransferRemoved {
            transfer_id: id.to_hex(),
            with_data: true,
        });

        let target = name
            .as_deref()
            .and_then(|name| payload_path(&save_path, name).ok());
        let Some(target) = target else {
            warn!(
                transfer_id = %id,
                save_path = %save_path.display(),
                "payload name unknown; nothing to delete"
            );
            self.metrics.inc_deletion("skipped");
            return Ok(());
        };

        info!(transfer_id = %id, path = %target.display(), "payload deletion scheduled");
        self.emit(Event::DeletionScheduled {
            transfer_id: id.to_hex(),
            path: target.display().to_string(),
        });
        let coordinator = self.clone();
        self.tasks.spawn("delete", async move {
            coordinator.delete_payload(id, target).await;
        });
        Ok(())
    }

    async fn delete_payload(&self, id: TransferId, path: PathBuf) {
        sleep(self.settings.deletion_grace).await;
        let target = path.clone();
        let result = match task::spawn_blocking(move || remove_payload(&target)).await {
            Ok(result) => result.map_err(|err| -> Box<dyn Error + Send + Sync> { Box::new(err) }),
            Err(err) => Err(Box::new(err) as Box<dyn Error + Send + Sync>),
        };

        let path_label = path.display().to_string();
        match result {
            Ok(removal) => {
                let outcome = match removal {
                    Removal::Removed => "removed",
                    Removal::AlreadyAbsent => "absent",
                };
                info!(transfer_id = %id, path = %path_label, outcome, "payload deleted");
                self.metrics.inc_deletion(outcome);
                self.emit(Event::DeletionCompleted {
                    transfer_id: id.to_hex(),
                    path: path_label,
                });
            }
            Err(source) => {
                let message = source.to_string();
                let failure = TransferError::DeferredDeletionFailed { id, path, source };
                warn!(transfer_id = %id, error = %failure, detail = %message, "payload deletion failed");
                self.metrics.inc_deletion("failed");
                self.emit(Event::DeletionFailed {
                    transfer_id: id.to_hex(),
                    path: path_label,
                    message,
                });
            }
        }
    }

    /// Unregister a handle. Failure is logged only: the record is already gone.
    async fn release(&self, id: TransferId, handle: EngineHandle) {
        if let Err(err) = self.engine.unregister(handle).await {
            warn!(transfer_id = %id, %handle, error = %err, "engine unregister failed");
        }
    }
}

const fn rejected(
    id: TransferId,
    operation: &'static str,
    state: &LifecycleState,
) -> TransferError {
    TransferError::InvalidState {
        id,
        operation,
        state: state.label(),
    }
}
