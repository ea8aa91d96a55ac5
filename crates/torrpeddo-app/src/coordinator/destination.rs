//! Default save directory and folder opening.

use std::path::{Path, PathBuf};

use tokio::task;
use tracing::info;

use torrpeddo_core::{TransferEngine, TransferError, TransferId, TransferResult};
use torrpeddo_events::Event;
use torrpeddo_fsops::{FsOpsError, folder_to_open, is_directory, path_exists};

use super::Coordinator;

impl<E> Coordinator<E>
where
    E: TransferEngine + 'static,
{
    /// Swap the save directory used by future additions. Existing records keep theirs.
    pub(super) async fn replace_directory(&self, path: &Path) -> TransferResult<()> {
        if !is_directory(path) {
            return Err(TransferError::InvalidDirectory {
                path: path.to_path_buf(),
            });
        }
        *self.directory.write().await = path.to_path_buf();
        info!(path = %path.display(), "download directory changed");
        self.emit(Event::DirectoryChanged {
            path: path.display().to_string(),
        });
        Ok(())
    }

    pub(super) async fn current_directory(&self) -> PathBuf {
        self.directory.read().await.clone()
    }

    pub(super) async fn open_transfer_folder(&self, id: TransferId) -> TransferResult<PathBuf> {
        let record = self.registry.get(id)?;
        let (save_path, name) = self.payload_location(&record).await;
        let folder = folder_to_open(&save_path, name.as_deref());
        if !path_exists(&folder) {
            return Err(TransferError::PathMissing { path: folder });
        }

        let launcher = self.settings.launcher;
        let target = folder.clone();
        let launched = task::spawn_blocking(move || launcher.open(&target))
            .await
            .map_err(|err| TransferError::LaunchFailed {
                path: folder.clone(),
                source: Box::new(err),
            })?;
        match launched {
            Ok(()) => Ok(folder),
            Err(FsOpsError::LauncherMissing { launcher }) => {
                Err(TransferError::LauncherUnavailable { launcher })
            }
            Err(err) => Err(TransferError::LaunchFailed {
                path: folder,
                source: Box::new(err),
            }),
        }
    }
}
