//! HTTP error responses

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chaincare_core::{ChaincareError, ErrorKind};
use serde::Serialize;
use tracing::{error, warn};

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Error returned by relay handlers, rendered as `{message, error}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    error: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// A failure inside a ledger read or write sequence. Always a 500 that
    /// carries the underlying message.
    pub fn ledger(context: &str, err: ChaincareError) -> Self {
        error!("{}: {}", context, err);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: context.to_string(),
            error: Some(err.to_string()),
        }
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::State => StatusCode::CONFLICT,
        ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ChaincareError> for ApiError {
    fn from(err: ChaincareError) -> Self {
        let status = status_for(err.kind());
        if status.is_server_error() {
            error!("Request failed: {}", err);
        } else {
            warn!("Request refused: {}", err);
        }
        Self {
            status,
            message: err.to_string(),
            error: None,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Malformed request body: {}", rejection.body_text());
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Invalid request body".to_string(),
            error: Some(rejection.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        warn!("Malformed path parameter: {}", rejection.body_text());
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Invalid path parameter".to_string(),
            error: Some(rejection.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            message: self.message,
            error: self.error,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_kinds_to_status_codes() {
        let cases = [
            (ChaincareError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ChaincareError::Unauthorized, StatusCode::FORBIDDEN),
            (
                ChaincareError::PolicyNotFound { policy_id: 3 },
                StatusCode::NOT_FOUND,
            ),
            (ChaincareError::UserExists, StatusCode::BAD_REQUEST),
            (
                ChaincareError::ClaimAlreadyResolved { claim_id: 0 },
                StatusCode::CONFLICT,
            ),
            (
                ChaincareError::unavailable("down"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn ledger_failures_are_server_errors_with_cause() {
        let err = ApiError::ledger("Failed to approve claim", ChaincareError::Unauthorized);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Failed to approve claim");
        assert_eq!(err.error.as_deref(), Some("Only admin can perform this action"));
    }
}
