//! In-process session that models the engine's observable behaviour.
//!
//! # Design
//! - Magnets report `downloading_metadata` until `metadata_delay` elapses; metainfo
//!   registrations know their name immediately and start in `checking_files`.
//! - Once metadata is known the payload directory is created under the save path.
//! - Paused auto-managed transfers are resumed on the next tick, mirroring an engine queue;
//!   transfers paused with auto-management off stay paused.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tracing::debug;

use torrpeddo_core::{
    EngineHandle, EngineRegistration, EngineState, EngineStatus, TransferId, TransferSource,
};
use torrpeddo_fsops::{ensure_directory, payload_path};

use super::EngineSession;
use crate::error::EngineError;
use crate::types::EngineRuntimeConfig;

pub(crate) struct SimulatedSession {
    config: EngineRuntimeConfig,
    next_handle: u64,
    transfers: HashMap<EngineHandle, SimTransfer>,
}

struct SimTransfer {
    id: TransferId,
    metadata_name: String,
    name: String,
    save_path: PathBuf,
    total_bytes: u64,
    downloaded: u64,
    state: EngineState,
    paused: bool,
    auto_managed: bool,
    has_metadata: bool,
    metadata_wait: Duration,
}

impl SimTransfer {
    fn from_registration(request: &EngineRegistration, config: &EngineRuntimeConfig) -> Self {
        let descriptor = &request.descriptor;
        let metadata_name = descriptor
            .name
            .clone()
            .unwrap_or_else(|| descriptor.id.to_hex());
        let is_metainfo = matches!(descriptor.source, TransferSource::Metainfo { .. });
        Self {
            id: descriptor.id,
            name: if is_metainfo {
                metadata_name.clone()
            } else {
                String::new()
            },
            metadata_name,
            save_path: request.save_path.clone(),
            total_bytes: descriptor
                .total_size
                .unwrap_or(config.magnet_payload_bytes)
                .max(1),
            downloaded: 0,
            state: if is_metainfo {
                EngineState::CheckingFiles
            } else {
                EngineState::DownloadingMetadata
            },
            paused: false,
            auto_managed: true,
            has_metadata: is_metainfo,
            metadata_wait: if is_metainfo {
                Duration::ZERO
            } else {
                config.metadata_delay
            },
        }
    }

    /// Step one transfer forward; returns `true` when metadata just arrived.
    fn advance(&mut self, elapsed: Duration, rate: u64) -> bool {
        if self.paused && self.auto_managed {
            self.paused = false;
        }
        if self.paused {
            return false;
        }
        if !self.has_metadata {
            self.metadata_wait = self.metadata_wait.saturating_sub(elapsed);
            if self.metadata_wait.is_zero() {
                self.has_metadata = true;
                self.name = self.metadata_name.clone();
                self.state = EngineState::Downloading;
                return true;
            }
            return false;
        }
        match self.state {
            EngineState::CheckingFiles
            | EngineState::CheckingResumeData
            | EngineState::Allocating => self.state = EngineState::Downloading,
            EngineState::Downloading => {
                let step = u128::from(rate) * elapsed.as_millis() / 1_000;
                let step = u64::try_from(step).unwrap_or(u64::MAX);
                self.downloaded = self.downloaded.saturating_add(step).min(self.total_bytes);
                if self.downloaded >= self.total_bytes {
                    self.state = EngineState::Seeding;
                }
            }
            EngineState::DownloadingMetadata | EngineState::Finished | EngineState::Seeding => {}
        }
        false
    }

    #[allow(clippy::cast_precision_loss)]
    fn progress(&self) -> f64 {
        self.downloaded as f64 / self.total_bytes as f64
    }
}

impl SimulatedSession {
    pub(crate) fn new(config: EngineRuntimeConfig) -> Self {
        Self {
            config,
            next_handle: 1,
            transfers: HashMap::new(),
        }
    }

    fn transfer_mut(&mut self, handle: EngineHandle) -> Result<&mut SimTransfer> {
        self.transfers
            .get_mut(&handle)
            .ok_or_else(|| EngineError::UnknownHandle { handle }.into())
    }

    fn materialise(transfer: &SimTransfer) -> Result<()> {
        let path = payload_path(&transfer.save_path, &transfer.name).map_err(|source| {
            EngineError::Storage {
                operation: "resolve_payload",
                path: transfer.save_path.clone(),
                source,
            }
        })?;
        ensure_directory(&path).map_err(|source| EngineError::Storage {
            operation: "materialise_payload",
            path: path.clone(),
            source,
        })?;
        debug!(id = %transfer.id, path = %path.display(), "payload materialised");
        Ok(())
    }
}

impl EngineSession for SimulatedSession {
    fn register(&mut self, request: &EngineRegistration) -> Result<EngineHandle> {
        let id = request.descriptor.id;
        if self.transfers.values().any(|transfer| transfer.id == id) {
            return Err(EngineError::DuplicateTransfer { id }.into());
        }
        ensure_directory(&request.save_path).map_err(|source| EngineError::Storage {
            operation: "prepare_save_path",
            path: request.save_path.clone(),
            source,
        })?;

        let transfer = SimTransfer::from_registration(request, &self.config);
        if transfer.has_metadata {
            Self::materialise(&transfer)?;
        }
        let handle = EngineHandle::new(self.next_handle);
        self.next_handle += 1;
        self.transfers.insert(handle, transfer);
        debug!(%id, %handle, "transfer registered");
        Ok(handle)
    }

    fn status(&self, handle: EngineHandle) -> Result<EngineStatus> {
        let transfer = self
            .transfers
            .get(&handle)
            .ok_or(EngineError::UnknownHandle { handle })?;
        let active = !transfer.paused;
        let downloading = active
            && matches!(
                transfer.state,
                EngineState::Downloading | EngineState::DownloadingMetadata
            );
        let seeding = transfer.state == EngineState::Seeding;
        Ok(EngineStatus {
            progress: transfer.progress(),
            download_rate: if downloading && transfer.has_metadata {
                self.config.download_rate
            } else {
                0
            },
            upload_rate: if active && transfer.has_metadata {
                self.config.upload_rate
            } else {
                0
            },
            num_peers: if active { 4 } else { 0 },
            state: transfer.state,
            paused: transfer.paused,
            auto_managed: transfer.auto_managed,
            has_metadata: transfer.has_metadata,
            is_seeding: seeding,
            name: transfer.name.clone(),
            save_path: transfer.save_path.clone(),
        })
    }

    fn pause(&mut self, handle: EngineHandle) -> Result<()> {
        self.transfer_mut(handle)?.paused = true;
        Ok(())
    }

    fn resume(&mut self, handle: EngineHandle) -> Result<()> {
        self.transfer_mut(handle)?.paused = false;
        Ok(())
    }

    fn set_auto_managed(&mut self, handle: EngineHandle, enabled: bool) -> Result<()> {
        self.transfer_mut(handle)?.auto_managed = enabled;
        Ok(())
    }

    fn unregister(&mut self, handle: EngineHandle) -> Result<()> {
        self.transfers
            .remove(&handle)
            .map(|_| ())
            .ok_or_else(|| EngineError::UnknownHandle { handle }.into())
    }

    fn advance(&mut self, elapsed: Duration) -> Result<()> {
        let rate = self.config.download_rate;
        let mut first_failure = None;
        for transfer in self.transfers.values_mut() {
            if transfer.advance(elapsed, rate)
                && let Err(err) = Self::materialise(transfer)
                && first_failure.is_none()
            {
                first_failure = Some(err);
            }
        }
        first_failure.map_or(Ok(()), Err)
    }
}
