//! Coordinator handles shared by the HTTP and line front-ends.

use std::sync::Arc;

use torrpeddo_core::{TransferId, TransferInspector, TransferWorkflow};
use torrpeddo_telemetry::Metrics;

/// Trait-object handles onto the coordinator.
#[derive(Clone)]
pub struct TransferHandles {
    workflow: Arc<dyn TransferWorkflow>,
    inspector: Arc<dyn TransferInspector>,
}

impl TransferHandles {
    /// Bundle the mutating and read-only halves of the coordinator.
    #[must_use]
    pub fn new(workflow: Arc<dyn TransferWorkflow>, inspector: Arc<dyn TransferInspector>) -> Self {
        Self {
            workflow,
            inspector,
        }
    }

    /// Mutating commands.
    #[must_use]
    pub fn workflow(&self) -> &Arc<dyn TransferWorkflow> {
        &self.workflow
    }

    /// Read-only views.
    #[must_use]
    pub fn inspector(&self) -> &Arc<dyn TransferInspector> {
        &self.inspector
    }
}

pub(crate) struct ApiState {
    pub(crate) transfers: TransferHandles,
    pub(crate) telemetry: Metrics,
}

impl ApiState {
    pub(crate) const fn new(transfers: TransferHandles, telemetry: Metrics) -> Self {
        Self {
            transfers,
            telemetry,
        }
    }
}

/// Identifiers arrive as free-form strings; anything unparseable is simply unknown.
pub(crate) fn parse_identifier(raw: &str) -> Option<TransferId> {
    raw.trim().parse().ok()
}
