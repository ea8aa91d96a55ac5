//! Error types for logging and metrics setup.

use thiserror::Error;
use tracing_subscriber::util::TryInitError;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised by telemetry helpers.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global tracing subscriber was already installed.
    #[error("tracing subscriber could not be installed")]
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        #[source]
        source: TryInitError,
    },
    /// A collector could not be built or added to the registry.
    #[error("metric {name} could not be {stage}")]
    Metric {
        /// Metric name.
        name: &'static str,
        /// `built` or `registered`.
        stage: &'static str,
        /// Underlying Prometheus error.
        #[source]
        source: prometheus::Error,
    },
    /// The text exposition could not be produced.
    #[error("metrics could not be rendered")]
    Render {
        /// Underlying Prometheus error.
        #[source]
        source: prometheus::Error,
    },
}

impl TelemetryError {
    pub(crate) const fn built(name: &'static str, source: prometheus::Error) -> Self {
        Self::Metric {
            name,
            stage: "built",
            source,
        }
    }

    pub(crate) const fn registered(name: &'static str, source: prometheus::Error) -> Self {
        Self::Metric {
            name,
            stage: "registered",
            source,
        }
    }
}
