use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::envelope::ErrorBody;

/// Error taxonomy shared by all Agora services.
///
/// Each variant carries a human-readable detail message. The variant decides
/// the HTTP status code and the machine-readable `error` code placed in the
/// failure envelope; the message goes into `details`.
#[derive(Debug, Clone)]
pub enum ApiError {
    /// Missing, malformed, expired, or revoked credentials.
    Unauthenticated(String),

    /// Valid identity, insufficient permission.
    Unauthorized(String),

    /// The addressed resource does not exist (or is not visible to the caller).
    NotFound(String),

    /// Malformed or rule-violating input (bad id, empty cart, weak password).
    InvalidRequest(String),

    /// A business precondition failed (product inactive, insufficient stock).
    Unavailable(String),

    /// An illegal state-machine transition was requested.
    InvalidTransition(String),

    /// A dependency could not be reached; the caller cannot tell whether the
    /// operation would have been allowed.
    UpstreamUnavailable(String),

    /// Unexpected internal failure.
    Internal(String),
}

impl ApiError {
    /// Machine-readable code for the envelope `error` field.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::NotFound(_) => "not_found",
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::Unavailable(_) => "unavailable",
            ApiError::InvalidTransition(_) => "invalid_transition",
            ApiError::UpstreamUnavailable(_) => "upstream_unavailable",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidTransition(_) => StatusCode::CONFLICT,
            ApiError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            ApiError::Unauthenticated(s)
            | ApiError::Unauthorized(s)
            | ApiError::NotFound(s)
            | ApiError::InvalidRequest(s)
            | ApiError::Unavailable(s)
            | ApiError::InvalidTransition(s)
            | ApiError::UpstreamUnavailable(s)
            | ApiError::Internal(s) => s,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody::new(self.error_code(), self.detail());
        (self.status_code(), Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.detail())
    }
}

impl std::error::Error for ApiError {}
