//! Status aggregation across the registry and the engine.

use std::path::PathBuf;

use tracing::warn;

use torrpeddo_core::model::{
    CANCELLED_STATE_LABEL, METADATA_PENDING_NAME, MISSING_FILES_STATE_LABEL, PAUSED_STATE_LABEL,
    PENDING_STATE_LABEL, REGISTRATION_FAILED_STATE_LABEL,
};
use torrpeddo_core::{
    EngineHandle, EngineState, EngineStatus, LifecycleState, StatusRecord, TransferEngine,
    TransferRecord,
};
use torrpeddo_fsops::{path_exists, payload_path};

use super::Coordinator;

const BYTES_PER_KILOBYTE: f64 = 1_000.0;

impl<E> Coordinator<E>
where
    E: TransferEngine + 'static,
{
    /// One status record per tracked transfer, in insertion order.
    ///
    /// Handles whose engine status cannot be read are skipped for this snapshot only.
    pub(super) async fn snapshot(&self) -> Vec<StatusRecord> {
        let records = self.registry.list();
        let mut statuses = Vec::with_capacity(records.len());
        for record in records {
            let status = match (&record.state, record.handle) {
                (LifecycleState::Pending, _) => pending_status(&record),
                (LifecycleState::Failed { .. }, _) => {
                    StatusRecord::idle(&record, REGISTRATION_FAILED_STATE_LABEL)
                }
                (LifecycleState::Cancelled, _) => {
                    StatusRecord::idle(&record, CANCELLED_STATE_LABEL)
                }
                (LifecycleState::Active | LifecycleState::Paused, Some(handle)) => {
                    match self.live_status(&record, handle).await {
                        Some(status) => status,
                        None => continue,
                    }
                }
                (LifecycleState::Active | LifecycleState::Paused, None) => continue,
            };
            statuses.push(status);
        }
        statuses
    }

    async fn live_status(
        &self,
        record: &TransferRecord,
        handle: EngineHandle,
    ) -> Option<StatusRecord> {
        let engine_status = match self.engine.status(handle).await {
            Ok(status) => status,
            Err(err) => {
                warn!(transfer_id = %record.id, %handle, error = %err, "status unavailable; skipping");
                return None;
            }
        };

        let name = if engine_status.has_metadata && !engine_status.name.is_empty() {
            self.registry.record_name(record.id, handle, &engine_status.name);
            engine_status.name.clone()
        } else {
            record.display_name().to_string()
        };

        Some(StatusRecord {
            identifier: record.id,
            name,
            progress: engine_status.progress * 100.0,
            download_rate: kilobytes(engine_status.download_rate),
            upload_rate: kilobytes(engine_status.upload_rate),
            num_peers: engine_status.num_peers,
            state: state_label(&engine_status),
            is_seeding: engine_status.is_seeding,
            is_paused: engine_status.paused,
            is_cancelled: false,
        })
    }

    /// Payload location for a record, preferring what the engine reports.
    pub(super) async fn payload_location(
        &self,
        record: &TransferRecord,
    ) -> (PathBuf, Option<String>) {
        if let Some(handle) = record.handle
            && let Ok(status) = self.engine.status(handle).await
            && status.has_metadata
            && !status.name.is_empty()
        {
            return (status.save_path, Some(status.name));
        }
        (record.save_dir.clone(), record.name.clone())
    }
}

fn pending_status(record: &TransferRecord) -> StatusRecord {
    let mut status = StatusRecord::idle(record, PENDING_STATE_LABEL);
    status.name = METADATA_PENDING_NAME.to_string();
    status
}

/// Human-facing label: operator pause first, then a vanished payload, then the engine state.
fn state_label(status: &EngineStatus) -> String {
    if status.paused && status.state != EngineState::CheckingResumeData {
        return PAUSED_STATE_LABEL.to_string();
    }
    if status.has_metadata && status.progress > 0.0 && payload_missing(status) {
        return MISSING_FILES_STATE_LABEL.to_string();
    }
    status.state.as_str().to_string()
}

fn payload_missing(status: &EngineStatus) -> bool {
    payload_path(&status.save_path, &status.name).is_ok_and(|path| !path_exists(&path))
}

#[allow(clippy::cast_precision_loss)]
fn kilobytes(bytes_per_second: u64) -> f64 {
    bytes_per_second as f64 / BYTES_PER_KILOBYTE
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use anyhow::Result;
    use tempfile::tempdir;
    use torrpeddo_core::{TransferInspector, TransferWorkflow};

    use super::super::testing::{ScriptedEngine, fresh_status, scripted};
    use super::*;

    fn magnet(byte: u8) -> String {
        format!("magnet:?xt=urn:btih:{}&dn=hint", format!("{byte:02x}").repeat(20))
    }

    #[test]
    fn labels_follow_precedence() -> Result<()> {
        let root = tempdir()?;
        let mut status = fresh_status(root.path().to_path_buf());
        status.state = EngineState::Downloading;
        assert_eq!(state_label(&status), "downloading");

        status.has_metadata = true;
        status.name = "payload".into();
        status.progress = 0.4;
        assert_eq!(state_label(&status), MISSING_FILES_STATE_LABEL);

        fs::create_dir(root.path().join("payload"))?;
        assert_eq!(state_label(&status), "downloading");

        status.paused = true;
        assert_eq!(state_label(&status), PAUSED_STATE_LABEL);

        status.state = EngineState::CheckingResumeData;
        assert_eq!(state_label(&status), "checking_resume_data");
        Ok(())
    }

    #[test]
    fn unusable_names_are_not_reported_missing() {
        let mut status = fresh_status(PathBuf::from("/nonexistent"));
        status.has_metadata = true;
        status.progress = 0.5;
        status.state = EngineState::Seeding;
        status.name = "../escape".into();
        assert_eq!(state_label(&status), "seeding");
    }

    #[test]
    fn rates_are_reported_in_kilobytes() {
        assert!((kilobytes(2_500) - 2.5).abs() < f64::EPSILON);
        assert!(kilobytes(0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn live_status_is_scaled_and_named() -> Result<()> {
        let root = tempdir()?;
        fs::create_dir(root.path().join("Real Name"))?;
        let (coordinator, engine) =
            scripted(ScriptedEngine::default(), root.path().to_path_buf(), Duration::ZERO)?;
        let id = coordinator.add_magnet(&magnet(1)).await?;
        coordinator.shutdown().await;

        let handle = engine.handle_for(id).expect("registered");
        engine.set_status(handle, |status| {
            status.has_metadata = true;
            status.name = "Real Name".into();
            status.progress = 0.25;
            status.download_rate = 12_000;
            status.upload_rate = 500;
            status.num_peers = 7;
            status.state = EngineState::Downloading;
        });

        let statuses = coordinator.list_status().await;
        let status = &statuses[0];
        assert_eq!(status.name, "Real Name");
        assert!((status.progress - 25.0).abs() < 1e-9);
        assert!((status.download_rate - 12.0).abs() < 1e-9);
        assert!((status.upload_rate - 0.5).abs() < 1e-9);
        assert_eq!(status.num_peers, 7);
        assert_eq!(status.state, "downloading");
        assert_eq!(coordinator.registry().get(id)?.name.as_deref(), Some("Real Name"));
        Ok(())
    }

    #[tokio::test]
    async fn pending_records_hide_the_name_hint() -> Result<()> {
        let (coordinator, engine) =
            scripted(ScriptedEngine::gated(), std::env::temp_dir(), Duration::ZERO)?;
        coordinator.add_magnet(&magnet(2)).await?;
        let statuses = coordinator.list_status().await;
        assert_eq!(statuses[0].name, METADATA_PENDING_NAME);
        engine.open_gate();
        coordinator.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn active_magnet_without_metadata_shows_placeholder() -> Result<()> {
        let (coordinator, _engine) =
            scripted(ScriptedEngine::default(), std::env::temp_dir(), Duration::ZERO)?;
        coordinator.add_magnet(&magnet(5)).await?;
        coordinator.shutdown().await;

        let statuses = coordinator.list_status().await;
        assert_eq!(statuses[0].state, "downloading_metadata");
        assert_eq!(statuses[0].name, METADATA_PENDING_NAME);
        Ok(())
    }

    #[tokio::test]
    async fn failed_rows_hide_the_name_hint() -> Result<()> {
        let (coordinator, _engine) =
            scripted(ScriptedEngine::rejecting(), std::env::temp_dir(), Duration::ZERO)?;
        coordinator.add_magnet(&magnet(6)).await?;
        coordinator.shutdown().await;

        let statuses = coordinator.list_status().await;
        assert_eq!(statuses[0].state, REGISTRATION_FAILED_STATE_LABEL);
        assert_eq!(statuses[0].name, METADATA_PENDING_NAME);
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_handles_are_skipped() -> Result<()> {
        let (coordinator, engine) =
            scripted(ScriptedEngine::default(), std::env::temp_dir(), Duration::ZERO)?;
        let broken = coordinator.add_magnet(&magnet(3)).await?;
        let healthy = coordinator.add_magnet(&magnet(4)).await?;
        coordinator.shutdown().await;

        let handle = engine.handle_for(broken).expect("registered");
        engine.failing_status.lock().expect("failing").push(handle);

        let statuses = coordinator.list_status().await;
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].identifier, healthy);
        assert_eq!(coordinator.registry().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn listing_preserves_insertion_order() -> Result<()> {
        let (coordinator, _engine) =
            scripted(ScriptedEngine::default(), std::env::temp_dir(), Duration::ZERO)?;
        let mut expected = Vec::new();
        for byte in [9_u8, 3, 7, 1] {
            expected.push(coordinator.add_magnet(&magnet(byte)).await?);
        }
        coordinator.shutdown().await;
        let listed: Vec<_> = coordinator
            .list_status()
            .await
            .into_iter()
            .map(|status| status.identifier)
            .collect();
        assert_eq!(listed, expected);
        Ok(())
    }
}
