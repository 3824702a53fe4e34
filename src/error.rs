//! HTTP-facing error type.
//!
//! Wraps protocol failures so axum handlers can return them with `?` and
//! get a consistent JSON error shape and status code.

use crate::protocol::PortId;
use crate::session::SwitchError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A specialized `Result` type for HTTP handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Unified application error type for the web layer.
#[derive(Debug)]
pub enum AppError {
    /// A protocol operation failed.
    Switch(SwitchError),
    /// The device read back a different port than the one requested.
    SwitchMismatch { requested: PortId, reported: PortId },
    /// The request did not name a port.
    PortNotSpecified,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Switch(e) => write!(f, "{e}"),
            Self::SwitchMismatch { requested, .. } => {
                write!(f, "Failed to switch to port {requested}")
            }
            Self::PortNotSpecified => write!(f, "Port not specified"),
        }
    }
}

impl From<SwitchError> for AppError {
    fn from(err: SwitchError) -> Self {
        AppError::Switch(err)
    }
}

/// Allows axum to convert `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Self::Switch(SwitchError::InvalidPort(_)) => (StatusCode::BAD_REQUEST, "InvalidPort"),
            Self::Switch(SwitchError::LinkUnavailable) => {
                (StatusCode::SERVICE_UNAVAILABLE, "LinkUnavailable")
            }
            Self::Switch(SwitchError::ResponseTimeout(_)) => {
                (StatusCode::GATEWAY_TIMEOUT, "ResponseTimeout")
            }
            Self::Switch(SwitchError::NoPortReported) => {
                (StatusCode::BAD_GATEWAY, "NoPortReported")
            }
            Self::Switch(SwitchError::Io(_)) => (StatusCode::BAD_GATEWAY, "IoFailure"),
            Self::SwitchMismatch { .. } => (StatusCode::BAD_GATEWAY, "SwitchFailed"),
            Self::PortNotSpecified => (StatusCode::BAD_REQUEST, "InvalidPayload"),
        };

        let body = axum::Json(json!({
            "status": "error",
            "error": { "type": error_type, "message": self.to_string() }
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_message_names_requested_port() {
        let err = AppError::SwitchMismatch {
            requested: PortId::from("03"),
            reported: PortId::from("01"),
        };
        assert_eq!(err.to_string(), "Failed to switch to port 03");
    }

    #[test]
    fn test_switch_error_passthrough() {
        let err = AppError::from(SwitchError::LinkUnavailable);
        assert_eq!(err.to_string(), "Serial link unavailable");
    }
}
