#![allow(clippy::redundant_pub_crate)]

use anyhow::Result;
use torrpeddo_core::{EngineHandle, EngineRegistration, EngineStatus};

use crate::types::EngineRuntimeConfig;

mod sim;

pub(crate) use sim::SimulatedSession;

/// Operations the worker performs against the owned session.
pub(crate) trait EngineSession: Send {
    fn register(&mut self, request: &EngineRegistration) -> Result<EngineHandle>;
    fn status(&self, handle: EngineHandle) -> Result<EngineStatus>;
    fn pause(&mut self, handle: EngineHandle) -> Result<()>;
    fn resume(&mut self, handle: EngineHandle) -> Result<()>;
    fn set_auto_managed(&mut self, handle: EngineHandle, enabled: bool) -> Result<()>;
    fn unregister(&mut self, handle: EngineHandle) -> Result<()>;
    /// Advance the session clock; returns the first storage failure, if any.
    fn advance(&mut self, elapsed: std::time::Duration) -> Result<()>;
}

pub(crate) fn create_session(config: EngineRuntimeConfig) -> Box<dyn EngineSession> {
    Box::new(SimulatedSession::new(config))
}
