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
#![allow(clippy::module_name_repetitions)]

//! Filesystem contract used by the transfer coordinator.
//!
//! Layout:
//! - `payload.rs`: existence checks, safe `join(directory, name)`, idempotent recursive delete
//! - `launcher.rs`: desktop folder launcher lookup and spawn
//! - `error.rs`: structured error type

pub mod error;
pub mod launcher;
pub mod payload;

pub use error::{FsOpsError, FsOpsResult};
pub use launcher::DesktopLauncher;
pub use payload::{
    Removal, ensure_directory, folder_to_open, is_directory, path_exists, payload_path,
    remove_payload,
};
