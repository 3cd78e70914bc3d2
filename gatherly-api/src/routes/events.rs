/// Event endpoints: creation, detail, registration, update, archive, search
///
/// # Endpoints
///
/// - `POST /events` - Create an event (creator auto-registered)
/// - `GET /event/:event_id` - Event details with questions
/// - `POST /event/:event_id` - Register for an event
/// - `PATCH /event/:event_id` - Partial update (creator only)
/// - `DELETE /event/:event_id` - Archive (creator only, idempotent)
/// - `GET /search` - Filtered, paginated search

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::{AppState, AuthUser, MaybeAuthUser},
    error::{ApiError, ApiResult},
    routes::users::{validation_message, MessageResponse},
};
use gatherly_shared::models::{
    attendee,
    event::{CreateEvent, CreatorSummary, Event, EventFilter, EventSummary, UpdateEvent},
    question::Question,
    user::User,
};

/// Create event request
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,

    #[validate(length(min = 1, max = 200, message = "location must be 1-200 characters"))]
    pub location: String,

    /// UNIX seconds
    #[serde(with = "chrono::serde::ts_seconds")]
    pub start_at: DateTime<Utc>,

    /// UNIX seconds; must fall strictly between now and `start_at`
    #[serde(with = "chrono::serde::ts_seconds")]
    pub close_registration: DateTime<Utc>,

    #[validate(range(min = 1, message = "max_attendees must be at least 1"))]
    pub max_attendees: i32,
}

/// Create event response
#[derive(Debug, Serialize)]
pub struct CreateEventResponse {
    pub event_id: Uuid,
}

/// Partial update request; omitted fields keep their stored value
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 200, message = "location must be 1-200 characters"))]
    pub location: Option<String>,

    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub start_at: Option<DateTime<Utc>>,

    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub close_registration: Option<DateTime<Utc>>,

    #[validate(range(min = 1, message = "max_attendees must be at least 1"))]
    pub max_attendees: Option<i32>,
}

/// Update event response
#[derive(Debug, Serialize)]
pub struct UpdateEventResponse {
    pub message: String,
    pub event: Event,
}

/// Event details: the event itself, its creator, attendance and questions
#[derive(Debug, Serialize)]
pub struct EventDetailsResponse {
    #[serde(flatten)]
    pub event: Event,

    /// Creator summary
    pub creator: CreatorSummary,

    /// Registered attendee count (includes the creator)
    pub attendee_count: i64,

    /// Questions, most-voted first
    pub questions: Vec<Question>,
}

/// Search query parameters
///
/// Unknown parameters are rejected rather than ignored.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchQuery {
    /// Case-insensitive substring matched on name and description
    pub q: Option<String>,

    /// Status filter
    pub status: Option<EventFilter>,

    /// Page size, default 20
    pub limit: Option<i64>,

    /// Rows to skip, default 0
    pub offset: Option<i64>,
}

const DEFAULT_SEARCH_LIMIT: i64 = 20;

/// Create a new event
///
/// The creator is registered as the first attendee in the same
/// transaction, so a created event is never observable at zero attendance.
#[instrument(skip(state, payload))]
pub async fn create_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreateEventResponse>)> {
    let Json(req) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    req.validate()
        .map_err(|e| ApiError::Validation(validation_message(&e)))?;

    let event = Event::create(
        &state.db,
        user_id,
        CreateEvent {
            name: req.name,
            description: req.description,
            location: req.location,
            start_at: req.start_at,
            close_registration: req.close_registration,
            max_attendees: req.max_attendees,
        },
    )
    .await?;

    info!(event_id = %event.id, creator_id = %user_id, "event created");
    Ok((
        StatusCode::CREATED,
        Json(CreateEventResponse { event_id: event.id }),
    ))
}

/// Fetch one event with its attendance count and questions
///
/// Anonymous callers are welcome, but a token that is present and invalid
/// is still rejected rather than ignored.
#[instrument(skip(state))]
pub async fn get_event(
    State(state): State<AppState>,
    MaybeAuthUser(_): MaybeAuthUser,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<EventDetailsResponse>> {
    let event = Event::find_by_id(&state.db, event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found.".to_string()))?;

    // Creator rows outlive their events (FK), so absence here is a bug
    let creator = User::find_by_id(&state.db, event.creator_id)
        .await?
        .ok_or_else(|| ApiError::Internal("event creator row missing".to_string()))?;

    let attendee_count = attendee::count(&state.db, event_id).await?;
    let questions = Question::list_for_event(&state.db, event_id).await?;

    Ok(Json(EventDetailsResponse {
        creator: CreatorSummary {
            creator_id: creator.id,
            first_name: creator.first_name,
            last_name: creator.last_name,
            email: creator.email,
        },
        event,
        attendee_count,
        questions,
    }))
}

/// Register the requester as an attendee
#[instrument(skip(state))]
pub async fn register_for_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    attendee::register(&state.db, event_id, user_id).await?;

    info!(%event_id, %user_id, "attendee registered");
    Ok(Json(MessageResponse {
        message: "Successfully registered for the event.".to_string(),
    }))
}

/// Partially update an event
///
/// Only the creator may update; the merged schedule must remain valid and
/// at least one field must actually change.
#[instrument(skip(state, payload))]
pub async fn update_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(event_id): Path<Uuid>,
    payload: Result<Json<UpdateEventRequest>, JsonRejection>,
) -> ApiResult<Json<UpdateEventResponse>> {
    let Json(req) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    req.validate()
        .map_err(|e| ApiError::Validation(validation_message(&e)))?;

    let event = Event::update(
        &state.db,
        user_id,
        event_id,
        UpdateEvent {
            name: req.name,
            description: req.description,
            location: req.location,
            start_at: req.start_at,
            close_registration: req.close_registration,
            max_attendees: req.max_attendees,
        },
    )
    .await?;

    info!(%event_id, "event updated");
    Ok(Json(UpdateEventResponse {
        message: "Event updated successfully.".to_string(),
        event,
    }))
}

/// Archive an event
///
/// Idempotent: archiving an already archived event is a second success.
/// This endpoint's wire contract is status-only — the body stays empty on
/// success and on every error, so failures are mapped to bare status
/// codes here instead of flowing through `ApiError::into_response`.
#[instrument(skip(state, auth))]
pub async fn delete_event(
    State(state): State<AppState>,
    auth: Result<AuthUser, ApiError>,
    event_id: Result<Path<Uuid>, PathRejection>,
) -> StatusCode {
    let AuthUser(user_id) = match auth {
        Ok(auth) => auth,
        Err(e) => return e.status_code(),
    };
    let Path(event_id) = match event_id {
        Ok(path) => path,
        Err(_) => return StatusCode::BAD_REQUEST,
    };

    match Event::archive(&state.db, user_id, event_id).await {
        Ok(()) => {
            info!(%event_id, "event archived");
            StatusCode::OK
        }
        Err(e) => {
            let err = ApiError::from(e);
            if let ApiError::Internal(detail) = &err {
                tracing::error!(error = %detail, "internal server error");
            }
            err.status_code()
        }
    }
}

/// Search events
///
/// Anonymous callers may use `q`, `OPEN` and `ARCHIVE`; the identity-bound
/// filters `MY_EVENTS` and `ATTENDING` require a session.
#[instrument(skip(state, query))]
pub async fn search_events(
    State(state): State<AppState>,
    MaybeAuthUser(user_id): MaybeAuthUser,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<EventSummary>>> {
    let Query(params) = query.map_err(|e| ApiError::Validation(e.body_text()))?;

    if let Some(q) = params.q.as_deref() {
        if q.is_empty() {
            return Err(ApiError::Validation("q must not be empty".to_string()));
        }
    }

    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    if limit < 1 {
        return Err(ApiError::Validation("limit must be at least 1".to_string()));
    }

    let offset = params.offset.unwrap_or(0);
    if offset < 0 {
        return Err(ApiError::Validation(
            "offset must not be negative".to_string(),
        ));
    }

    if let Some(filter) = params.status {
        if filter.requires_identity() && user_id.is_none() {
            return Err(ApiError::Unauthorized("User not logged in.".to_string()));
        }
    }

    let results = Event::search(
        &state.db,
        params.q.as_deref(),
        params.status,
        user_id,
        limit,
        offset,
    )
    .await?;

    Ok(Json(results))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_event_request_rejects_unknown_fields() {
        let body = r#"{
            "name": "RustConf",
            "description": "All things Rust",
            "location": "Portland",
            "start_at": 1900000000,
            "close_registration": 1890000000,
            "max_attendees": 100,
            "category": "tech"
        }"#;
        assert!(serde_json::from_str::<CreateEventRequest>(body).is_err());
    }

    #[test]
    fn test_create_event_request_parses_unix_seconds() {
        let body = r#"{
            "name": "RustConf",
            "description": "All things Rust",
            "location": "Portland",
            "start_at": 1900000000,
            "close_registration": 1890000000,
            "max_attendees": 100
        }"#;
        let req: CreateEventRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.start_at.timestamp(), 1_900_000_000);
        assert_eq!(req.close_registration.timestamp(), 1_890_000_000);
    }

    #[test]
    fn test_create_event_request_rejects_zero_capacity() {
        let req = CreateEventRequest {
            name: "RustConf".to_string(),
            description: "All things Rust".to_string(),
            location: "Portland".to_string(),
            start_at: Utc::now(),
            close_registration: Utc::now(),
            max_attendees: 0,
        };
        let errors = req.validate().unwrap_err();
        assert_eq!(
            validation_message(&errors),
            "max_attendees must be at least 1"
        );
    }

    #[test]
    fn test_update_event_request_allows_partial_bodies() {
        let req: UpdateEventRequest = serde_json::from_str(r#"{"name": "New name"}"#).unwrap();
        assert_eq!(req.name.as_deref(), Some("New name"));
        assert!(req.start_at.is_none());
        assert!(req.max_attendees.is_none());
    }

    #[test]
    fn test_search_query_rejects_unknown_params() {
        let parsed: Result<SearchQuery, _> =
            serde_urlencoded::from_str("q=rust&sort=votes");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_search_query_parses_status_filter() {
        let parsed: SearchQuery = serde_urlencoded::from_str("status=MY_EVENTS&limit=5").unwrap();
        assert_eq!(parsed.status, Some(EventFilter::MyEvents));
        assert_eq!(parsed.limit, Some(5));
    }
}
