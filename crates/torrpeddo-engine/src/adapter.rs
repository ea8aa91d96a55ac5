//! Cloneable front for the session worker.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

use torrpeddo_core::{EngineHandle, EngineRegistration, EngineStatus, TransferEngine};
use torrpeddo_events::EventBus;

use crate::command::{EngineCommand, Responder};
use crate::session;
use crate::types::EngineRuntimeConfig;
use crate::worker;

const COMMAND_BUFFER: usize = 128;

/// Engine adapter that forwards every call to the background session worker.
#[derive(Clone)]
pub struct SessionEngine {
    commands: mpsc::Sender<EngineCommand>,
}

impl SessionEngine {
    /// Start a session with `config` and spawn its worker on the current runtime.
    ///
    /// The worker publishes health changes onto `events` and stops once every clone of the
    /// returned engine has been dropped.
    #[must_use]
    pub fn start(events: EventBus, config: EngineRuntimeConfig) -> Self {
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        info!(
            listen_interfaces = %config.listen_interfaces.join(","),
            "engine session starting"
        );
        let tick_interval = config.tick_interval;
        let _worker = worker::spawn(events, rx, session::create_session(config), tick_interval);
        Self { commands }
    }

    async fn send_command(&self, command: EngineCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|err| anyhow!("failed to enqueue engine command: {err}"))
    }

    async fn request<T>(
        &self,
        operation: &'static str,
        build: impl FnOnce(Responder<T>) -> EngineCommand + Send,
    ) -> Result<T>
    where
        T: Send,
    {
        let (respond_to, rx) = oneshot::channel();
        self.send_command(build(respond_to)).await?;
        rx.await
            .map_err(|err| anyhow!("engine {operation} response dropped: {err}"))?
    }
}

#[async_trait]
impl TransferEngine for SessionEngine {
    async fn register(&self, request: EngineRegistration) -> Result<EngineHandle> {
        self.request("register", |respond_to| EngineCommand::Register {
            request: Box::new(request),
            respond_to,
        })
        .await
    }

    async fn status(&self, handle: EngineHandle) -> Result<EngineStatus> {
        self.request("status", |respond_to| EngineCommand::Status {
            handle,
            respond_to,
        })
        .await
    }

    async fn pause(&self, handle: EngineHandle) -> Result<()> {
        self.request("pause", |respond_to| EngineCommand::Pause {
            handle,
            respond_to,
        })
        .await
    }

    async fn resume(&self, handle: EngineHandle) -> Result<()> {
        self.request("resume", |respond_to| EngineCommand::Resume {
            handle,
            respond_to,
        })
        .await
    }

    async fn set_auto_managed(&self, handle: EngineHandle, enabled: bool) -> Result<()> {
        self.request("set_auto_managed", |respond_to| {
            EngineCommand::SetAutoManaged {
                handle,
                enabled,
                respond_to,
            }
        })
        .await
    }

    async fn unregister(&self, handle: EngineHandle) -> Result<()> {
        self.request("unregister", |respond_to| EngineCommand::Unregister {
            handle,
            respond_to,
        })
        .await
    }
}
