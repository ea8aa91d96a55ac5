//! # Design
//!
//! - One crate-level error for serving either front-end.
//! - Messages are constant; the address lives in a field.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::io;
use std::net::SocketAddr;

/// Result alias for front-end operations.
pub type ApiServerResult<T> = std::result::Result<T, ApiServerError>;

/// Errors raised while serving a front-end.
#[derive(Debug)]
pub enum ApiServerError {
    /// Binding the HTTP listener failed.
    Bind {
        /// Address attempted.
        addr: SocketAddr,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Serving HTTP failed.
    Serve {
        /// Underlying IO error.
        source: io::Error,
    },
    /// Reading or writing the command stream failed.
    Bridge {
        /// Underlying IO error.
        source: io::Error,
    },
}

impl Display for ApiServerError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { .. } => formatter.write_str("failed to bind api listener"),
            Self::Serve { .. } => formatter.write_str("api server terminated unexpectedly"),
            Self::Bridge { .. } => formatter.write_str("command bridge stream failed"),
        }
    }
}

impl Error for ApiServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Bind { source, .. } | Self::Serve { source } | Self::Bridge { source } => {
                Some(source)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_server_error_display_and_source() -> Result<(), Box<dyn Error>> {
        let bind = ApiServerError::Bind {
            addr: "127.0.0.1:5000".parse()?,
            source: io::Error::new(io::ErrorKind::AddrInUse, "busy"),
        };
        assert_eq!(bind.to_string(), "failed to bind api listener");
        assert!(bind.source().is_some());

        let serve = ApiServerError::Serve {
            source: io::Error::new(io::ErrorKind::BrokenPipe, "lost"),
        };
        assert_eq!(serve.to_string(), "api server terminated unexpectedly");

        let bridge = ApiServerError::Bridge {
            source: io::Error::new(io::ErrorKind::UnexpectedEof, "closed"),
        };
        assert_eq!(bridge.to_string(), "command bridge stream failed");
        assert!(bridge.source().is_some());
        Ok(())
    }
}
