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
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Engine adapter: a command channel in front of a single-owner session worker.
//!
//! The coordinator talks to [`SessionEngine`] through the handle-based
//! [`torrpeddo_core::TransferEngine`] contract. Every call is turned into an
//! [`command::EngineCommand`] and answered by the background worker, so the session itself is
//! never shared between tasks.

/// Engine command definitions.
pub mod command;
/// Adapter errors.
pub mod error;
/// Session abstraction and the simulated session.
pub mod session;
/// Runtime parameters.
pub mod types;
/// Background worker that drives the session.
pub mod worker;

mod adapter;

pub use adapter::SessionEngine;
pub use error::EngineError;
pub use types::EngineRuntimeConfig;
