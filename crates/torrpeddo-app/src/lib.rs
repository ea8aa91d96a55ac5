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

//! Torrpeddo application: the transfer coordinator and the process bootstrap.
//!
//! Layout: `coordinator/` (registry, ingestion, status, lifecycle, destination),
//! `tasks.rs` (background work tracking), `bootstrap.rs` (service wiring), `cli.rs`
//! (binary arguments).

/// Application bootstrap and front-end selection.
pub mod bootstrap;
/// Command-line arguments of the `torrpeddo` binary.
pub mod cli;
/// Transfer coordinator.
pub mod coordinator;
/// Application error type.
pub mod error;
/// Background task tracking.
pub mod tasks;

pub use bootstrap::{run_app, run_app_with};
pub use coordinator::{Coordinator, CoordinatorSettings, DEFAULT_DELETION_GRACE};
pub use error::{AppError, AppResult};
pub use tasks::BackgroundTasks;
