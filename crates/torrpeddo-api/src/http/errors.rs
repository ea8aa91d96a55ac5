//! RFC 9457-style API error wrapper.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use torrpeddo_core::TransferError;
use tracing::error;

use crate::http::constants::{
    PROBLEM_BAD_REQUEST, PROBLEM_CONFLICT, PROBLEM_INTERNAL, PROBLEM_NOT_FOUND,
    PROBLEM_SERVICE_UNAVAILABLE,
};
use crate::models::ProblemDetails;

/// Structured API error rendered as a problem document.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    kind: &'static str,
    title: &'static str,
    detail: Option<String>,
}

impl ApiError {
    const fn new(status: StatusCode, kind: &'static str, title: &'static str) -> Self {
        Self {
            status,
            kind,
            title,
            detail: None,
        }
    }

    pub(crate) fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            PROBLEM_INTERNAL,
            "internal server error",
        )
        .with_detail(message)
    }

    pub(crate) fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, PROBLEM_BAD_REQUEST, "bad request").with_detail(detail)
    }

    pub(crate) fn not_found(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            PROBLEM_NOT_FOUND,
            "resource not found",
        )
        .with_detail(detail)
    }

    pub(crate) fn conflict(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, PROBLEM_CONFLICT, "conflict").with_detail(detail)
    }

    pub(crate) fn service_unavailable(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            PROBLEM_SERVICE_UNAVAILABLE,
            "service unavailable",
        )
        .with_detail(detail)
    }
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        match &err {
            TransferError::MalformedDescriptor { input, reason } => {
                Self::bad_request(format!("invalid {input}: {reason}"))
            }
            TransferError::InvalidDirectory { .. } => Self::bad_request("Invalid directory"),
            TransferError::NotFound { .. } => Self::not_found("transfer not found"),
            TransferError::PathMissing { path } => {
                Self::not_found(format!("path does not exist: {}", path.display()))
            }
            TransferError::InvalidState {
                operation, state, ..
            } => Self::conflict(format!("cannot {operation} a {state} transfer")),
            TransferError::DuplicateIdentifier { .. } => Self::conflict(err.to_string()),
            TransferError::LauncherUnavailable { launcher } => {
                Self::service_unavailable(format!("{launcher} is not installed"))
            }
            TransferError::EngineRegistrationFailed { .. }
            | TransferError::EngineOperationFailed { .. }
            | TransferError::DeferredDeletionFailed { .. }
            | TransferError::LaunchFailed { .. }
            | TransferError::Unsupported { .. } => {
                error!(error = %err, error_debug = ?err, "transfer operation failed");
                Self::internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use torrpeddo_core::TransferId;

    #[test]
    fn transfer_errors_map_to_statuses() {
        let id = TransferId::from_bytes([1; 20]);
        let cases = [
            (TransferError::malformed_magnet("bad"), StatusCode::BAD_REQUEST),
            (
                TransferError::InvalidDirectory {
                    path: PathBuf::from("/nope"),
                },
                StatusCode::BAD_REQUEST,
            ),
            (TransferError::NotFound { id }, StatusCode::NOT_FOUND),
            (
                TransferError::InvalidState {
                    id,
                    operation: "pause",
                    state: "failed",
                },
                StatusCode::CONFLICT,
            ),
            (
                TransferError::LauncherUnavailable {
                    launcher: "xdg-open",
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                TransferError::Unsupported {
                    operation: "open_folder",
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn invalid_directory_detail_is_stable() {
        let err = ApiError::from(TransferError::InvalidDirectory {
            path: PathBuf::from("/nope"),
        });
        assert_eq!(err.detail.as_deref(), Some("Invalid directory"));
        assert_eq!(err.kind, PROBLEM_BAD_REQUEST);
    }
}
