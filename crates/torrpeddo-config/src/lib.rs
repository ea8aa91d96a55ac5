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

//! Environment-driven runtime configuration.
//!
//! Layout: `model.rs` (typed settings), `defaults.rs` (fallback values and variable names),
//! `loader.rs` (environment lookup), `validate.rs` (parsing and sanity checks).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load, load_from};
pub use model::{AppConfig, FrontendMode, LogStyle};
