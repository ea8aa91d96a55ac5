//! Ingestion: parsed descriptor in, identifier out, engine registration in the background.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use torrpeddo_core::{
    EngineRegistration, TransferDescriptor, TransferEngine, TransferError, TransferId,
    TransferRecord,
};
use torrpeddo_events::Event;

use super::Coordinator;
use super::registry::{Activation, Admission};

impl<E> Coordinator<E>
where
    E: TransferEngine + 'static,
{
    /// Record a pending transfer and schedule its engine registration.
    ///
    /// Returns once the record is visible; an identifier that is already live is returned
    /// unchanged without touching the engine.
    pub(super) async fn ingest(&self, descriptor: TransferDescriptor) -> TransferId {
        let save_dir = self.current_directory().await;
        let record = TransferRecord::pending(&descriptor, save_dir.clone());
        let record = match self.registry.admit(record) {
            Admission::Existing(existing) => {
                debug!(transfer_id = %existing.id, state = existing.state.label(), "transfer already tracked");
                return existing.id;
            }
            Admission::Inserted(record) => record,
            Admission::Queued(record) => {
                debug!(transfer_id = %record.id, "waiting on the registration already in flight");
                self.announce(&record, &descriptor, &save_dir);
                return record.id;
            }
        };

        let id = record.id;
        self.announce(&record, &descriptor, &save_dir);
        let coordinator = self.clone();
        self.tasks.spawn("register", async move {
            coordinator.register(descriptor, save_dir).await;
        });
        id
    }

    fn announce(&self, record: &TransferRecord, descriptor: &TransferDescriptor, save_dir: &Path) {
        let source = descriptor.source.kind();
        info!(transfer_id = %record.id, source, save_dir = %save_dir.display(), "transfer added");
        self.metrics.inc_transfer_added(source);
        self.refresh_gauge();
        self.emit(Event::TransferAdded {
            transfer_id: record.id.to_hex(),
            source: source.to_string(),
        });
    }

    /// Register with the engine until the handle lands on a pending record or nobody is
    /// waiting for it any more.
    async fn register(&self, descriptor: TransferDescriptor, mut save_path: PathBuf) {
        let id = descriptor.id;
        loop {
            let request = EngineRegistration {
                descriptor: descriptor.clone(),
                save_path: save_path.clone(),
            };
            let handle = match self.engine.register(request).await {
                Ok(handle) => handle,
                Err(err) => {
                    self.registration_failed(id, err);
                    return;
                }
            };
            match self.registry.activate(id, &save_path, handle) {
                Activation::Applied { pause_requested } => {
                    info!(transfer_id = %id, %handle, "transfer registered");
                    self.emit(Event::TransferRegistered {
                        transfer_id: id.to_hex(),
                    });
                    if pause_requested
                        && let Err(err) = self.pause_handle(id, handle).await
                    {
                        warn!(transfer_id = %id, error = %err, "deferred pause failed");
                    }
                    return;
                }
                Activation::Stale => {
                    debug!(transfer_id = %id, %handle, "registration outlived its record");
                    if let Err(err) = self.engine.unregister(handle).await {
                        warn!(transfer_id = %id, error = %err, "orphaned handle could not be released");
                    }
                }
            }
            let Some(next) = self.registry.settle(id) else {
                return;
            };
            debug!(transfer_id = %id, "re-added during release; registering again");
            save_path = next;
        }
    }

    fn registration_failed(&self, id: TransferId, err: anyhow::Error) {
        let message = format!("{err:#}");
        let failure = TransferError::EngineRegistrationFailed {
            id,
            source: err.into(),
        };
        warn!(transfer_id = %id, error = %failure, detail = %message, "engine registration failed");
        if self.registry.fail(id, message.clone()) {
            self.metrics.inc_registration_failure();
            self.emit(Event::RegistrationFailed {
                transfer_id: id.to_hex(),
                message,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::Result;
    use torrpeddo_core::{
        LifecycleState, TransferInspector, TransferWorkflow, model::METADATA_PENDING_NAME,
        model::PENDING_STATE_LABEL, model::REGISTRATION_FAILED_STATE_LABEL, parse_metainfo,
    };

    use super::super::Coordinator;
    use super::super::testing::{Call, ScriptedEngine, scripted};

    const MAGNET_UPPER: &str = "magnet:?xt=urn:btih:AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

    fn coordinator(
        engine: ScriptedEngine,
    ) -> Result<(Coordinator<ScriptedEngine>, Arc<ScriptedEngine>)> {
        scripted(engine, std::env::temp_dir(), Duration::ZERO)
    }

    fn sample_metainfo(name: &str) -> Vec<u8> {
        let mut document = b"d4:infod6:lengthi64e4:name".to_vec();
        document.extend_from_slice(format!("{}:{name}", name.len()).as_bytes());
        document.extend_from_slice(b"12:piece lengthi16384e6:pieces20:");
        document.extend_from_slice(&[0x33; 20]);
        document.extend_from_slice(b"ee");
        document
    }

    #[tokio::test]
    async fn magnet_is_pending_until_registration_completes() -> Result<()> {
        let (coordinator, engine) = coordinator(ScriptedEngine::gated())?;
        let id = coordinator.add_magnet(MAGNET_UPPER).await?;
        assert_eq!(id.to_string(), "a".repeat(40));

        let statuses = coordinator.list_status().await;
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].name, METADATA_PENDING_NAME);
        assert_eq!(statuses[0].state, PENDING_STATE_LABEL);
        assert!(statuses[0].download_rate.abs() < f64::EPSILON);

        engine.open_gate();
        coordinator.shutdown().await;
        let record = coordinator.registry().get(id)?;
        assert_eq!(record.state, LifecycleState::Active);
        assert!(record.handle.is_some());
        assert_eq!(coordinator.list_status().await[0].state, "downloading_metadata");
        Ok(())
    }

    #[tokio::test]
    async fn re_adding_is_idempotent() -> Result<()> {
        let (coordinator, engine) = coordinator(ScriptedEngine::default())?;
        let first = coordinator.add_magnet(MAGNET_UPPER).await?;
        let second = coordinator.add_magnet(&MAGNET_UPPER.to_lowercase()).await?;
        coordinator.shutdown().await;

        assert_eq!(first, second);
        assert_eq!(coordinator.registry().len(), 1);
        let registrations = engine
            .calls()
            .iter()
            .filter(|call| matches!(call, Call::Register(id) if *id == first))
            .count();
        assert_eq!(registrations, 1);
        Ok(())
    }

    #[tokio::test]
    async fn metainfo_identifier_matches_reparse() -> Result<()> {
        let (coordinator, _engine) = coordinator(ScriptedEngine::default())?;
        let payload = sample_metainfo("ubuntu.iso");
        let id = coordinator.add_metainfo(&payload).await?;
        assert_eq!(id, parse_metainfo(&payload)?.id);
        coordinator.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn malformed_input_leaves_registry_untouched() -> Result<()> {
        let (coordinator, engine) = coordinator(ScriptedEngine::default())?;
        assert!(coordinator.add_magnet("magnet:?dn=nothing").await.is_err());
        assert!(coordinator.add_metainfo(b"not bencode").await.is_err());
        assert!(coordinator.registry().is_empty());
        assert!(engine.calls().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn rejected_registration_is_terminal_and_visible() -> Result<()> {
        let (coordinator, engine) = coordinator(ScriptedEngine::rejecting())?;
        let id = coordinator.add_magnet(MAGNET_UPPER).await?;
        coordinator.shutdown().await;

        let record = coordinator.registry().get(id)?;
        assert!(matches!(record.state, LifecycleState::Failed { ref message } if message.contains("refused")));
        let statuses = coordinator.list_status().await;
        assert_eq!(statuses[0].state, REGISTRATION_FAILED_STATE_LABEL);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(engine.calls().len(), 1, "registration must not be retried");
        Ok(())
    }

    #[tokio::test]
    async fn late_registration_does_not_resurrect_removed_record() -> Result<()> {
        let (coordinator, engine) = coordinator(ScriptedEngine::gated())?;
        let id = coordinator.add_magnet(MAGNET_UPPER).await?;
        coordinator.remove(id).await?;

        engine.open_gate();
        coordinator.shutdown().await;

        assert!(coordinator.list_status().await.is_empty());
        assert!(engine.handle_for(id).is_none());
        assert!(
            engine
                .calls()
                .iter()
                .any(|call| matches!(call, Call::Unregister(_)))
        );
        Ok(())
    }

    #[tokio::test]
    async fn re_adding_after_remove_adopts_the_registration_in_flight() -> Result<()> {
        let (coordinator, engine) = coordinator(ScriptedEngine::gated())?;
        let id = coordinator.add_magnet(MAGNET_UPPER).await?;
        coordinator.remove(id).await?;
        assert_eq!(coordinator.add_magnet(MAGNET_UPPER).await?, id);

        engine.open_gate();
        coordinator.shutdown().await;

        let record = coordinator.registry().get(id)?;
        assert_eq!(record.state, LifecycleState::Active);
        assert_eq!(record.handle, engine.handle_for(id));
        assert!(!coordinator.registry().is_registering(id));
        let registrations = engine
            .calls()
            .iter()
            .filter(|call| matches!(call, Call::Register(_)))
            .count();
        assert_eq!(registrations, 1);
        assert!(
            !engine
                .calls()
                .iter()
                .any(|call| matches!(call, Call::Unregister(_)))
        );
        Ok(())
    }

    #[tokio::test]
    async fn re_adding_after_cancel_while_registering_becomes_active() -> Result<()> {
        let (coordinator, engine) = coordinator(ScriptedEngine::gated())?;
        let id = coordinator.add_magnet(MAGNET_UPPER).await?;
        coordinator.cancel(id).await?;
        assert_eq!(coordinator.add_magnet(MAGNET_UPPER).await?, id);
        assert_eq!(coordinator.registry().get(id)?.state, LifecycleState::Pending);

        engine.open_gate();
        coordinator.shutdown().await;

        let statuses = coordinator.list_status().await;
        assert_eq!(statuses.len(), 1);
        let status = &statuses[0];
        assert_eq!(status.identifier, id);
        assert_eq!(status.state, "downloading_metadata");
        assert!(!status.is_cancelled);
        assert_eq!(coordinator.registry().get(id)?.state, LifecycleState::Active);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_adds_keep_distinct_entries() -> Result<()> {
        let (coordinator, _engine) = coordinator(ScriptedEngine::default())?;
        let mut tasks = Vec::new();
        for byte in 0..16_u8 {
            let coordinator = coordinator.clone();
            tasks.push(tokio::spawn(async move {
                let uri = format!("magnet:?xt=urn:btih:{}", format!("{byte:02x}").repeat(20));
                coordinator.add_magnet(&uri).await
            }));
        }
        for task in tasks {
            task.await??;
        }
        coordinator.shutdown().await;
        assert_eq!(coordinator.list_status().await.len(), 16);
        Ok(())
    }
}
