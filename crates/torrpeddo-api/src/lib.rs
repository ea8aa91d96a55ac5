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

//! Front-ends over the transfer coordinator: an axum HTTP API and a line-delimited JSON
//! command bridge on stdio.
//!
//! Layout:
//! - `http/`: router, handlers, problem responses, metrics middleware
//! - `bridge.rs`: `{id, command, args}` request lines in, `{id, data | error}` lines out
//! - `models.rs`: request and response bodies
//! - `state.rs`: handles to the coordinator shared by both front-ends

pub mod bridge;
pub mod error;
pub mod http;
pub mod models;
pub mod state;

#[cfg(test)]
mod testing;

pub use bridge::{serve_lines, serve_stdio};
pub use error::{ApiServerError, ApiServerResult};
pub use http::router::ApiServer;
pub use state::TransferHandles;
