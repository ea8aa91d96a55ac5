//! Default values and the environment variables that override them.

use std::time::Duration;

/// Save directory override.
pub const ENV_DOWNLOAD_DIR: &str = "TORRPEDDO_DOWNLOAD_DIR";
/// Front-end selection (`http` or `stdio`).
pub const ENV_FRONTEND: &str = "TORRPEDDO_FRONTEND";
/// HTTP bind address.
pub const ENV_HTTP_ADDR: &str = "TORRPEDDO_HTTP_ADDR";
/// Engine listen interfaces (`host:port[,host:port]`).
pub const ENV_LISTEN_INTERFACES: &str = "TORRPEDDO_LISTEN_INTERFACES";
/// Grace interval before deferred payload deletion, in milliseconds.
pub const ENV_DELETE_GRACE_MS: &str = "TORRPEDDO_DELETE_GRACE_MS";
/// Log level used when `RUST_LOG` is unset.
pub const ENV_LOG_LEVEL: &str = "TORRPEDDO_LOG_LEVEL";
/// Log output style (`json` or `pretty`).
pub const ENV_LOG_FORMAT: &str = "TORRPEDDO_LOG_FORMAT";
/// Build identifier recorded in logs.
pub const ENV_BUILD_SHA: &str = "TORRPEDDO_BUILD_SHA";

/// Directory created under `~/Downloads` when no save directory is configured.
pub const DOWNLOAD_DIR_NAME: &str = "Torrpeddo-Downloads";
/// Default HTTP bind address.
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:5000";
/// Default engine listen interfaces.
pub const DEFAULT_LISTEN_INTERFACES: &str = "0.0.0.0:6881";
/// Default deletion grace interval.
pub const DEFAULT_DELETE_GRACE: Duration = Duration::from_millis(1_500);
/// Upper bound accepted for the deletion grace interval.
pub const MAX_DELETE_GRACE: Duration = Duration::from_secs(600);
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Build identifier used when none is provided.
pub const DEFAULT_BUILD_SHA: &str = "dev";
