//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use vgen_sequencer::SequencerError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    /// A scene's continuity source cannot be used
    #[error("{0}")]
    Continuity(String),

    /// Export failures are safe to show and worth retrying
    #[error("{0}")]
    Export(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) | ApiError::Continuity(_) => StatusCode::CONFLICT,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Export(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Validation(_) => "validation_error",
            ApiError::Conflict(_) => "conflict",
            ApiError::Continuity(_) => "continuity_error",
            ApiError::Export(_) => "export_failed",
            ApiError::RateLimited => "rate_limited",
            ApiError::Unavailable(_) => "unavailable",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, ApiError::Internal(_) | ApiError::Unavailable(_))
    }
}

impl From<SequencerError> for ApiError {
    fn from(err: SequencerError) -> Self {
        match err {
            SequencerError::Validation(e) => ApiError::Validation(e.to_string()),
            SequencerError::NotFound(what) => ApiError::NotFound(what),
            SequencerError::Conflict(msg) => ApiError::Conflict(msg),
            SequencerError::Continuity(e) => ApiError::Continuity(e.to_string()),
            SequencerError::WriteConflict(_) => {
                ApiError::Conflict("The sequence was changed by another request, please retry".to_string())
            }
            SequencerError::Export(msg) => ApiError::Export(msg),
            SequencerError::Firestore(e) if e.is_retryable() => ApiError::Unavailable(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = if self.is_internal() {
            error!(error = %self, "Request failed");
            if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                "An internal error occurred".to_string()
            } else {
                self.to_string()
            }
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            detail,
            code: self.code(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgen_models::{ContinuityError, ValidationError};

    #[test]
    fn test_sequencer_errors_map_to_status_codes() {
        let cases = [
            (
                SequencerError::from(ValidationError::field("title must be 1-200 characters")),
                StatusCode::BAD_REQUEST,
            ),
            (SequencerError::not_found("Sequence abc"), StatusCode::NOT_FOUND),
            (SequencerError::conflict("already running"), StatusCode::CONFLICT),
            (
                SequencerError::from(ContinuityError::SourceNotReady {
                    scene: 2,
                    source_scene: 1,
                }),
                StatusCode::CONFLICT,
            ),
            (SequencerError::Export("concat failed".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (SequencerError::config("missing key"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_validation_message_is_passed_through() {
        let err = ApiError::from(SequencerError::from(ValidationError::PromptTooShort {
            min: 10,
            actual: 9,
        }));
        assert_eq!(err.code(), "validation_error");
        assert!(err.to_string().contains("too short"));
    }
}
