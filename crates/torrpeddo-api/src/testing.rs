//! Coordinator stand-in shared by the front-end tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use torrpeddo_core::{
    StatusRecord, TransferError, TransferId, TransferInspector, TransferResult, TransferWorkflow,
    parse_magnet, parse_metainfo,
};

use crate::state::TransferHandles;

/// In-memory coordinator stand-in.
#[derive(Default)]
pub(crate) struct StubCoordinator {
    known: Mutex<HashMap<TransferId, bool>>,
    directory: Mutex<PathBuf>,
}

impl StubCoordinator {
    /// Fresh stub plus handles onto it.
    pub(crate) fn handles() -> (TransferHandles, Arc<Self>) {
        let stub = Arc::new(Self::default());
        (TransferHandles::new(stub.clone(), stub.clone()), stub)
    }

    /// Make `id` known; `live = false` makes lifecycle calls fail with a state conflict.
    pub(crate) fn track(&self, id: TransferId, live: bool) {
        self.known.lock().expect("known").insert(id, live);
    }

    fn lookup(&self, id: TransferId) -> TransferResult<()> {
        match self.known.lock().expect("known").get(&id) {
            Some(true) => Ok(()),
            Some(false) => Err(TransferError::InvalidState {
                id,
                operation: "pause",
                state: "failed",
            }),
            None => Err(TransferError::NotFound { id }),
        }
    }
}

#[async_trait]
impl TransferWorkflow for StubCoordinator {
    async fn add_magnet(&self, uri: &str) -> TransferResult<TransferId> {
        let id = parse_magnet(uri)?.id;
        self.known.lock().expect("known").insert(id, true);
        Ok(id)
    }

    async fn add_metainfo(&self, payload: &[u8]) -> TransferResult<TransferId> {
        let id = parse_metainfo(payload)?.id;
        self.known.lock().expect("known").insert(id, true);
        Ok(id)
    }

    async fn pause(&self, id: TransferId) -> TransferResult<()> {
        self.lookup(id)
    }

    async fn resume(&self, id: TransferId) -> TransferResult<()> {
        self.lookup(id)
    }

    async fn cancel(&self, id: TransferId) -> TransferResult<()> {
        self.lookup(id)
    }

    async fn remove(&self, id: TransferId) -> TransferResult<()> {
        self.lookup(id)?;
        self.known.lock().expect("known").remove(&id);
        Ok(())
    }

    async fn delete_with_files(&self, id: TransferId) -> TransferResult<()> {
        self.remove(id).await
    }

    async fn set_directory(&self, path: &Path) -> TransferResult<()> {
        if !path.is_dir() {
            return Err(TransferError::InvalidDirectory {
                path: path.to_path_buf(),
            });
        }
        *self.directory.lock().expect("directory") = path.to_path_buf();
        Ok(())
    }
}

#[async_trait]
impl TransferInspector for StubCoordinator {
    async fn list_status(&self) -> Vec<StatusRecord> {
        Vec::new()
    }

    async fn directory(&self) -> PathBuf {
        self.directory.lock().expect("directory").clone()
    }
}

