//! Error types for the relay service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use linkdrop::{ErrorKind, LinkdropError};
use serde::Serialize;

/// Errors returned by relay endpoints.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The campaign rejected the operation.
    #[error(transparent)]
    Linkdrop(#[from] LinkdropError),

    /// The request does not fit the campaign variant.
    #[error("invalid request: {0}")]
    BadRequest(String),
}

/// Machine-readable failure category in error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReason {
    /// See [`ErrorKind::Authorization`].
    Authorization,
    /// See [`ErrorKind::Replay`].
    Replay,
    /// See [`ErrorKind::Guard`].
    Guard,
    /// See [`ErrorKind::Funding`].
    Funding,
    /// See [`ErrorKind::Configuration`].
    Configuration,
    /// Malformed or mismatched request.
    BadRequest,
}

impl From<ErrorKind> for ErrorReason {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Authorization => Self::Authorization,
            ErrorKind::Replay => Self::Replay,
            ErrorKind::Guard => Self::Guard,
            ErrorKind::Funding => Self::Funding,
            ErrorKind::Configuration => Self::Configuration,
        }
    }
}

impl RelayError {
    /// Failure category reported to the client.
    #[must_use]
    pub fn reason(&self) -> ErrorReason {
        match self {
            Self::Linkdrop(e) => e.kind().into(),
            Self::BadRequest(_) => ErrorReason::BadRequest,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Linkdrop(LinkdropError::Paused) => StatusCode::LOCKED,
            Self::Linkdrop(LinkdropError::AlreadyClaimed(_)) => StatusCode::CONFLICT,
            Self::Linkdrop(LinkdropError::Funding(_)) => StatusCode::PAYMENT_REQUIRED,
            Self::Linkdrop(LinkdropError::InvalidConfig(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Linkdrop(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Relay request failed");
        } else {
            tracing::debug!(error = %self, %status, "Relay request rejected");
        }
        let body = serde_json::json!({
            "error": self.to_string(),
            "kind": self.reason(),
        });
        (status, axum::Json(body)).into_response()
    }
}
