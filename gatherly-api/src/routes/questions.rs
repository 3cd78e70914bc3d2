/// Question and voting endpoints
///
/// # Endpoints
///
/// - `POST /event/:event_id/question` - Ask a question (attendee only)
/// - `DELETE /question/:question_id` - Delete (asker or event creator)
/// - `POST /question/:question_id/vote` - Upvote
/// - `DELETE /question/:question_id/vote` - Downvote
///
/// A user gets exactly one vote per question, in either direction; there
/// is no retraction or vote-change path.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::{AppState, AuthUser},
    error::{ApiError, ApiResult},
    routes::users::{validation_message, MessageResponse},
};
use gatherly_shared::models::question::{Question, VoteDirection};

/// Ask question request
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AskQuestionRequest {
    #[validate(length(min = 1, max = 1000, message = "question must be 1-1000 characters"))]
    pub question: String,
}

/// Ask question response
#[derive(Debug, Serialize)]
pub struct AskQuestionResponse {
    pub question_id: Uuid,
}

/// Ask a question on an event
///
/// The requester must be registered for the event, and creators may not
/// ask questions on their own events.
#[instrument(skip(state, payload))]
pub async fn ask_question(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(event_id): Path<Uuid>,
    payload: Result<Json<AskQuestionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AskQuestionResponse>)> {
    let Json(req) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    req.validate()
        .map_err(|e| ApiError::Validation(validation_message(&e)))?;

    let question = Question::ask(&state.db, event_id, user_id, &req.question).await?;

    info!(question_id = %question.id, %event_id, "question asked");
    Ok((
        StatusCode::CREATED,
        Json(AskQuestionResponse {
            question_id: question.id,
        }),
    ))
}

/// Delete a question
///
/// Permitted for the question's asker and for the creator of the owning
/// event.
#[instrument(skip(state))]
pub async fn delete_question(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(question_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    Question::delete(&state.db, question_id, user_id).await?;

    info!(%question_id, "question deleted");
    Ok(StatusCode::OK)
}

/// Upvote a question
#[instrument(skip(state))]
pub async fn upvote_question(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(question_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    Question::cast_vote(&state.db, question_id, user_id, VoteDirection::Up).await?;

    Ok(Json(MessageResponse {
        message: "Successfully upvoted the question.".to_string(),
    }))
}

/// Downvote a question
#[instrument(skip(state))]
pub async fn downvote_question(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(question_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    Question::cast_vote(&state.db, question_id, user_id, VoteDirection::Down).await?;

    Ok(Json(MessageResponse {
        message: "Successfully downvoted the question.".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_question_request_rejects_unknown_fields() {
        let body = r#"{"question": "When does it start?", "anonymous": true}"#;
        assert!(serde_json::from_str::<AskQuestionRequest>(body).is_err());
    }

    #[test]
    fn test_ask_question_request_rejects_empty_text() {
        let req = AskQuestionRequest {
            question: String::new(),
        };
        let errors = req.validate().unwrap_err();
        assert_eq!(
            validation_message(&errors),
            "question must be 1-1000 characters"
        );
    }
}
