//! Typed runtime settings.

use std::fmt::{self, Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which command front-end the binary runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrontendMode {
    /// JSON over HTTP.
    #[default]
    Http,
    /// Line-delimited JSON over stdin/stdout.
    Stdio,
}

impl FrontendMode {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Stdio => "stdio",
        }
    }
}

impl Display for FrontendMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested log rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStyle {
    /// Structured JSON lines.
    Json,
    /// Human-readable output.
    Pretty,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default save directory for new transfers.
    pub download_dir: PathBuf,
    /// Selected front-end.
    pub frontend: FrontendMode,
    /// HTTP bind address.
    pub http_addr: SocketAddr,
    /// Engine listen interfaces.
    pub listen_interfaces: String,
    /// Grace interval before deferred payload deletion.
    pub deletion_grace: Duration,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Log style; `None` lets telemetry pick per build profile.
    pub log_style: Option<LogStyle>,
    /// Build identifier recorded in logs.
    pub build_sha: String,
}
