/// Error handling for the API server
///
/// A unified error type that maps to HTTP responses. All handlers return
/// `Result<T, ApiError>`; the `IntoResponse` impl owns the status mapping
/// and the wire shape, which is `{"error_message": "..."}` on every error.
/// Internal failures are logged with their cause and surfaced to the
/// client as a fixed generic message.
///
/// # Example
///
/// ```
/// use gatherly_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler() -> ApiResult<Json<serde_json::Value>> {
///     Err(ApiError::NotFound("Event not found.".to_string()))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use gatherly_shared::models::{
    attendee::RegistrationError,
    event::EventError,
    question::{QuestionError, VoteError},
    user::UserError,
};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Malformed, missing or out-of-policy input (400)
    Validation(String),

    /// Missing, invalid or expired session token (401)
    Unauthorized(String),

    /// Authenticated but not permitted (403)
    Forbidden(String),

    /// Referenced entity absent (404)
    NotFound(String),

    /// Duplicate registration or vote.
    ///
    /// Surfaced as 403, not 409 — the wire contract predates this
    /// implementation and clients key on 403 for duplicates.
    Conflict(String),

    /// Store or infrastructure failure (500, generic message)
    Internal(String),
}

/// Error response wire shape
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error_message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(msg) => write!(f, "Validation failed: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) | ApiError::Conflict(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message; internal detail never leaks
    fn client_message(&self) -> String {
        match self {
            ApiError::Validation(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => msg.clone(),
            ApiError::Internal(_) => "Internal server error.".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "internal server error");
        }

        let status = self.status_code();
        let body = Json(ErrorResponse {
            error_message: self.client_message(),
        });

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::EmailTaken => ApiError::Conflict(e.to_string()),
            UserError::Database(db) => ApiError::Internal(db.to_string()),
        }
    }
}

impl From<EventError> for ApiError {
    fn from(e: EventError) -> Self {
        match e {
            EventError::NotFound => ApiError::NotFound("Event not found.".to_string()),
            EventError::NotOwner | EventError::Archived => ApiError::Forbidden(e.to_string()),
            EventError::NothingToUpdate => ApiError::Validation(e.to_string()),
            EventError::InvalidSchedule(msg) => ApiError::Validation(msg),
            EventError::Database(db) => ApiError::Internal(db.to_string()),
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::EventNotFound => ApiError::NotFound("Event not found.".to_string()),
            RegistrationError::AlreadyRegistered => ApiError::Conflict(e.to_string()),
            RegistrationError::OwnEvent
            | RegistrationError::EventArchived
            | RegistrationError::DeadlinePassed
            | RegistrationError::CapacityReached => ApiError::Forbidden(e.to_string()),
            RegistrationError::Database(db) => ApiError::Internal(db.to_string()),
        }
    }
}

impl From<QuestionError> for ApiError {
    fn from(e: QuestionError) -> Self {
        match e {
            QuestionError::EventNotFound => ApiError::NotFound("Event not found.".to_string()),
            QuestionError::NotFound => {
                ApiError::NotFound("You cannot delete a question that does not exist.".to_string())
            }
            QuestionError::NotAttendee | QuestionError::OwnEvent | QuestionError::NotPermitted => {
                ApiError::Forbidden(e.to_string())
            }
            QuestionError::Database(db) => ApiError::Internal(db.to_string()),
        }
    }
}

impl From<VoteError> for ApiError {
    fn from(e: VoteError) -> Self {
        match e {
            VoteError::QuestionNotFound => ApiError::NotFound("Question not found.".to_string()),
            VoteError::AlreadyVoted => ApiError::Conflict(e.to_string()),
            VoteError::Database(db) => ApiError::Internal(db.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_conflict_maps_to_403_not_409() {
        assert_eq!(
            ApiError::Conflict("dup".into()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_internal_message_is_generic() {
        let err = ApiError::Internal("connection refused on 10.0.0.3".into());
        assert_eq!(err.client_message(), "Internal server error.");
    }

    #[test]
    fn test_duplicate_vote_maps_to_conflict() {
        let api: ApiError = VoteError::AlreadyVoted.into();
        assert_eq!(api.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_registration_errors_map_per_contract() {
        let cases: Vec<(RegistrationError, StatusCode)> = vec![
            (RegistrationError::EventNotFound, StatusCode::NOT_FOUND),
            (RegistrationError::OwnEvent, StatusCode::FORBIDDEN),
            (RegistrationError::AlreadyRegistered, StatusCode::FORBIDDEN),
            (RegistrationError::EventArchived, StatusCode::FORBIDDEN),
            (RegistrationError::DeadlinePassed, StatusCode::FORBIDDEN),
            (RegistrationError::CapacityReached, StatusCode::FORBIDDEN),
        ];
        for (err, expected) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status_code(), expected);
        }
    }

    #[test]
    fn test_error_response_shape() {
        let body = ErrorResponse {
            error_message: "Event not found.".to_string(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"error_message":"Event not found."}"#);
    }
}
