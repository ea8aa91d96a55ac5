use tokio::sync::oneshot;
use torrpeddo_core::{EngineHandle, EngineRegistration, EngineStatus};

/// Reply channel carried by every command.
pub type Responder<T> = oneshot::Sender<anyhow::Result<T>>;

/// Requests handled by the session worker.
#[derive(Debug)]
pub enum EngineCommand {
    /// Admit a transfer.
    Register {
        /// Descriptor and save path.
        request: Box<EngineRegistration>,
        /// Receives the issued handle.
        respond_to: Responder<EngineHandle>,
    },
    /// Read live metrics.
    Status {
        /// Target handle.
        handle: EngineHandle,
        /// Receives the snapshot.
        respond_to: Responder<EngineStatus>,
    },
    /// Pause a transfer.
    Pause {
        /// Target handle.
        handle: EngineHandle,
        /// Completion signal.
        respond_to: Responder<()>,
    },
    /// Resume a transfer.
    Resume {
        /// Target handle.
        handle: EngineHandle,
        /// Completion signal.
        respond_to: Responder<()>,
    },
    /// Toggle queue management.
    SetAutoManaged {
        /// Target handle.
        handle: EngineHandle,
        /// New flag value.
        enabled: bool,
        /// Completion signal.
        respond_to: Responder<()>,
    },
    /// Stop a transfer and forget its handle. Payload stays on disk.
    Unregister {
        /// Target handle.
        handle: EngineHandle,
        /// Completion signal.
        respond_to: Responder<()>,
    },
}

impl EngineCommand {
    /// Operation name used in logs.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::Status { .. } => "status",
            Self::Pause { .. } => "pause",
            Self::Resume { .. } => "resume",
            Self::SetAutoManaged { .. } => "set_auto_managed",
            Self::Unregister { .. } => "unregister",
        }
    }
}
