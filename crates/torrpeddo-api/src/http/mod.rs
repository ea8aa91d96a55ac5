//! HTTP surface: router, handlers and middleware.

/// Shared constants and header names.
pub mod constants;
/// Problem response helpers.
pub mod errors;
/// Health and metrics endpoints.
pub mod health;
/// Router construction and server host.
pub mod router;
/// Request counting middleware.
pub mod telemetry;
/// Transfer and configuration handlers.
pub mod transfers;
