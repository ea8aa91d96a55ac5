//! Runtime parameters applied to the engine session.

use std::time::Duration;

/// Default listen interface.
pub const DEFAULT_LISTEN_INTERFACE: &str = "0.0.0.0:6881";

/// Runtime parameters applied to the engine session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRuntimeConfig {
    /// `host:port` pairs the session listens on.
    pub listen_interfaces: Vec<String>,
    /// Time a magnet spends fetching metadata before its payload is known.
    pub metadata_delay: Duration,
    /// Download rate in bytes per second while a transfer is downloading.
    pub download_rate: u64,
    /// Upload rate in bytes per second while a transfer is active.
    pub upload_rate: u64,
    /// Payload size assumed for magnets, whose metadata carries no length.
    pub magnet_payload_bytes: u64,
    /// Interval between session ticks.
    pub tick_interval: Duration,
}

impl EngineRuntimeConfig {
    /// Default parameters listening on a comma-separated interface list.
    #[must_use]
    pub fn with_listen_interfaces(list: &str) -> Self {
        let listen_interfaces: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect();
        if listen_interfaces.is_empty() {
            return Self::default();
        }
        Self {
            listen_interfaces,
            ..Self::default()
        }
    }
}

impl Default for EngineRuntimeConfig {
    fn default() -> Self {
        Self {
            listen_interfaces: vec![DEFAULT_LISTEN_INTERFACE.to_string()],
            metadata_delay: Duration::from_secs(2),
            download_rate: 4 * 1024 * 1024,
            upload_rate: 512 * 1024,
            magnet_payload_bytes: 256 * 1024 * 1024,
            tick_interval: Duration::from_millis(200),
        }
    }
}
