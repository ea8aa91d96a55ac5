//! Transfer records, engine status snapshots and the status schema served to front-ends.

mod id;

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::descriptor::TransferDescriptor;

pub use id::{ParseTransferIdError, TransferId};

/// Display name shown until the engine knows the transfer's metadata.
pub const METADATA_PENDING_NAME: &str = "Fetching metadata...";
/// State label for records still waiting on engine registration.
pub const PENDING_STATE_LABEL: &str = "Pending: fetching metadata";
/// State label for transfers paused by the operator.
pub const PAUSED_STATE_LABEL: &str = "Paused";
/// State label for transfers whose payload vanished from disk.
pub const MISSING_FILES_STATE_LABEL: &str = "Error: Missing Files";
/// State label for cancelled transfers.
pub const CANCELLED_STATE_LABEL: &str = "Cancelled";
/// State label for transfers the engine refused.
pub const REGISTRATION_FAILED_STATE_LABEL: &str = "Error: Registration Failed";

/// Opaque reference to engine-side transfer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineHandle(u64);

impl EngineHandle {
    /// Wrap an engine-issued handle value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Display for EngineHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Raw descriptor handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferSource {
    /// Magnet URI, verbatim.
    Magnet {
        /// The URI as supplied.
        uri: String,
    },
    /// Bencoded metainfo document.
    Metainfo {
        /// Payload bytes as supplied.
        bytes: Vec<u8>,
    },
}

impl TransferSource {
    /// Short label used in logs, events and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Magnet { .. } => "magnet",
            Self::Metainfo { .. } => "metainfo",
        }
    }
}

/// Everything the engine needs to admit a transfer.
#[derive(Debug, Clone)]
pub struct EngineRegistration {
    /// Parsed descriptor.
    pub descriptor: TransferDescriptor,
    /// Directory the payload is written under.
    pub save_path: PathBuf,
}

/// Engine-side state labels, named the way the engine reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Verifying existing files.
    CheckingFiles,
    /// Waiting for metadata from the swarm.
    DownloadingMetadata,
    /// Fetching pieces.
    Downloading,
    /// All wanted pieces present, not seeding.
    Finished,
    /// Complete and uploading.
    Seeding,
    /// Preallocating storage.
    Allocating,
    /// Validating resume data on startup.
    CheckingResumeData,
}

impl EngineState {
    /// Snake-case label surfaced verbatim in status records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CheckingFiles => "checking_files",
            Self::DownloadingMetadata => "downloading_metadata",
            Self::Downloading => "downloading",
            Self::Finished => "finished",
            Self::Seeding => "seeding",
            Self::Allocating => "allocating",
            Self::CheckingResumeData => "checking_resume_data",
        }
    }
}

impl Display for EngineState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live metrics reported by the engine for one handle.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineStatus {
    /// Fractional completion in `0.0..=1.0`.
    pub progress: f64,
    /// Download rate in bytes per second.
    pub download_rate: u64,
    /// Upload rate in bytes per second.
    pub upload_rate: u64,
    /// Connected peers.
    pub num_peers: u32,
    /// Raw engine state.
    pub state: EngineState,
    /// Whether the engine considers the transfer paused.
    pub paused: bool,
    /// Whether the engine queue may start or stop the transfer on its own.
    pub auto_managed: bool,
    /// Whether the engine holds the metadata (name, file layout).
    pub has_metadata: bool,
    /// Whether the transfer is seeding.
    pub is_seeding: bool,
    /// Engine-reported name; empty before metadata arrives.
    pub name: String,
    /// Directory the payload lives under.
    pub save_path: PathBuf,
}

/// Coordinator lifecycle of a transfer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LifecycleState {
    /// Identifier known, engine registration in flight.
    Pending,
    /// Registered with the engine.
    Active,
    /// Registered and paused by the operator.
    Paused,
    /// Detached from the engine; kept so the payload can still be located.
    Cancelled,
    /// The engine refused the registration. Terminal.
    Failed {
        /// Engine-provided reason.
        message: String,
    },
}

impl LifecycleState {
    /// Short label for logs and errors.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
            Self::Failed { .. } => "failed",
        }
    }

    /// Cancelled and failed records are never handed back to the engine.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Failed { .. })
    }
}

/// Registry entry for one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    /// Transfer identifier.
    pub id: TransferId,
    /// Engine handle, present once registration completes.
    pub handle: Option<EngineHandle>,
    /// Known display name; `None` while metadata is unavailable.
    pub name: Option<String>,
    /// Directory the payload is written under.
    pub save_dir: PathBuf,
    /// Lifecycle state.
    pub state: LifecycleState,
    /// Descriptor flavour the record was created from.
    pub source: &'static str,
    /// Pause requested while registration was still in flight.
    pub pause_requested: bool,
    /// Insertion order, assigned by the registry.
    pub sequence: u64,
}

impl TransferRecord {
    /// Fresh pending record for a parsed descriptor.
    ///
    /// Only a metainfo `info.name` is trusted as the payload name. A magnet `dn` is a hint
    /// for the engine and never names anything on disk.
    #[must_use]
    pub fn pending(descriptor: &TransferDescriptor, save_dir: PathBuf) -> Self {
        let name = match descriptor.source {
            TransferSource::Metainfo { .. } => descriptor.name.clone(),
            TransferSource::Magnet { .. } => None,
        };
        Self {
            id: descriptor.id,
            handle: None,
            name,
            save_dir,
            state: LifecycleState::Pending,
            source: descriptor.source.kind(),
            pause_requested: false,
            sequence: 0,
        }
    }

    /// Name to show, falling back to the metadata placeholder.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(METADATA_PENDING_NAME)
    }
}

/// Point-in-time status of one transfer as served to front-ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Transfer identifier.
    pub identifier: TransferId,
    /// Display name, possibly the metadata placeholder.
    pub name: String,
    /// Completion percentage in `0.0..=100.0`.
    pub progress: f64,
    /// Download rate in kB/s.
    pub download_rate: f64,
    /// Upload rate in kB/s.
    pub upload_rate: f64,
    /// Connected peers.
    pub num_peers: u32,
    /// Human-facing state label.
    pub state: String,
    /// Whether the transfer is seeding.
    pub is_seeding: bool,
    /// Whether the transfer is paused.
    pub is_paused: bool,
    /// Whether the transfer was cancelled.
    pub is_cancelled: bool,
}

impl StatusRecord {
    /// Status with zeroed metrics for records the engine cannot report on.
    #[must_use]
    pub fn idle(record: &TransferRecord, state: impl Into<String>) -> Self {
        Self {
            identifier: record.id,
            name: record.display_name().to_string(),
            progress: 0.0,
            download_rate: 0.0,
            upload_rate: 0.0,
            num_peers: 0,
            state: state.into(),
            is_seeding: false,
            is_paused: record.pause_requested || record.state == LifecycleState::Paused,
            is_cancelled: record.state == LifecycleState::Cancelled,
        }
    }
}
