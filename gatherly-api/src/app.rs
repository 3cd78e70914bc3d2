/// Application state, authentication extractors and router builder
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET    /health                     # Health check (public)
/// ├── POST   /users                      # Create account (public)
/// ├── POST   /login                      # Login (public)
/// ├── POST   /logout                     # Logout (session)
/// ├── POST   /events                     # Create event (session)
/// ├── GET    /event/:event_id            # Event with questions (public)
/// ├── POST   /event/:event_id            # Register as attendee (session)
/// ├── PATCH  /event/:event_id            # Update event (session, creator)
/// ├── DELETE /event/:event_id            # Archive event (session, creator)
/// ├── GET    /search                     # Search events (public, filters may need session)
/// ├── POST   /event/:event_id/question   # Ask question (session, attendee)
/// ├── DELETE /question/:question_id      # Delete question (session, asker/creator)
/// ├── POST   /question/:id/vote          # Upvote (session)
/// └── DELETE /question/:id/vote          # Downvote (session)
/// ```

use crate::{config::Config, error::ApiError, routes};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use gatherly_shared::auth::session::{resolve_session, SESSION_HEADER};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; `Arc`
/// keeps the clone cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Authenticated requester, resolved from the `X-Authorization` header
///
/// Extracting this is the session-resolution step every protected
/// operation runs before its business rules.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("User not logged in.".to_string()))?;

        let user_id = resolve_session(&state.db, token)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
            .ok_or_else(|| {
                ApiError::Unauthorized("Invalid or expired session token.".to_string())
            })?;

        Ok(AuthUser(user_id))
    }
}

/// Optionally authenticated requester
///
/// Public endpoints accept anonymous callers, but a token that is present
/// and invalid is still a 401 — it is never silently downgraded to
/// anonymous.
pub struct MaybeAuthUser(pub Option<Uuid>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match parts.headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()) {
            Some(t) => t,
            None => return Ok(MaybeAuthUser(None)),
        };

        let user_id = resolve_session(&state.db, token)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
            .ok_or_else(|| {
                ApiError::Unauthorized("Invalid or expired session token.".to_string())
            })?;

        Ok(MaybeAuthUser(Some(user_id)))
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
pub fn build_router(state: AppState) -> Router {
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::CONTENT_TYPE,
                header::HeaderName::from_static("x-authorization"),
            ])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/users", post(routes::users::create_account))
        .route("/login", post(routes::users::login))
        .route("/logout", post(routes::users::logout))
        .route("/events", post(routes::events::create_event))
        .route(
            "/event/:event_id",
            get(routes::events::get_event)
                .post(routes::events::register_for_event)
                .patch(routes::events::update_event)
                .delete(routes::events::delete_event),
        )
        .route("/search", get(routes::events::search_events))
        .route(
            "/event/:event_id/question",
            post(routes::questions::ask_question),
        )
        .route(
            "/question/:question_id",
            delete(routes::questions::delete_question),
        )
        .route(
            "/question/:question_id/vote",
            post(routes::questions::upvote_question)
                .delete(routes::questions::downvote_question),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
