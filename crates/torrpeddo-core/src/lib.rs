#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs
)]

//! Engine-agnostic transfer model shared by the coordinator, engine adapters and front-ends.
//!
//! Layout:
//! - `model/`: identifiers, records, engine status and the public status schema
//! - `descriptor.rs`: magnet and metainfo parsing into a [`TransferDescriptor`]
//! - `service/`: the engine contract and the front-end facing traits
//! - `error.rs`: the shared error taxonomy

pub mod descriptor;
pub mod error;
pub mod model;
pub mod service;

pub use descriptor::{TransferDescriptor, parse_magnet, parse_metainfo};
pub use error::{TransferError, TransferResult};
pub use model::{
    EngineHandle, EngineRegistration, EngineState, EngineStatus, LifecycleState,
    ParseTransferIdError, StatusRecord, TransferId, TransferRecord, TransferSource,
};
pub use service::{TransferEngine, TransferInspector, TransferWorkflow};
