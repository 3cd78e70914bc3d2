/// Account and session endpoints
///
/// # Endpoints
///
/// - `POST /users` - Create an account
/// - `POST /login` - Authenticate and obtain a session token
/// - `POST /logout` - Clear the active session
///
/// Login is idempotent with respect to a live session: a second login
/// with valid credentials returns the same token instead of rotating it.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use gatherly_shared::{
    auth::{
        password::{hash_password, validate_password_policy, verify_password},
        session::{generate_session_token, SESSION_HEADER},
    },
    models::user::{CreateUser, User},
};

/// Create account request
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateAccountRequest {
    /// Given name
    #[validate(length(min = 1, max = 50, message = "first_name must be 1-50 characters"))]
    pub first_name: String,

    /// Family name
    #[validate(length(min = 1, max = 50, message = "last_name must be 1-50 characters"))]
    pub last_name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Plaintext password, checked against the signup policy
    pub password: String,
}

/// Create account response
#[derive(Debug, Serialize)]
pub struct CreateAccountResponse {
    /// ID of the new account
    pub user_id: Uuid,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Opaque bearer token for subsequent requests
    pub session_token: String,
}

/// Message-only response body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Extracts the first human-readable message out of validator errors
pub(crate) fn validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(_, errs)| errs.iter())
        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .next()
        .unwrap_or_else(|| "Invalid request body".to_string())
}

/// Create a new account
///
/// # Errors
///
/// - `400`: body malformed, name/email validation failed, or the password
///   fails the complexity policy
/// - `403`: email already in use (duplicate surfaces as 403 per contract)
/// - `500`: hash or store failure
#[instrument(skip(state, payload))]
pub async fn create_account(
    State(state): State<AppState>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreateAccountResponse>)> {
    let Json(req) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    req.validate()
        .map_err(|e| ApiError::Validation(validation_message(&e)))?;

    validate_password_policy(&req.password).map_err(ApiError::Validation)?;

    let password_hash =
        hash_password(&req.password).map_err(|e| ApiError::Internal(e.to_string()))?;

    let user = User::create(
        &state.db,
        CreateUser {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            password_hash,
        },
    )
    .await?;

    info!(user_id = %user.id, "user account created");
    Ok((
        StatusCode::CREATED,
        Json(CreateAccountResponse { user_id: user.id }),
    ))
}

/// Authenticate by email and password
///
/// Unknown email and wrong password produce the identical error so the
/// response does not leak which one failed.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    req.validate()
        .map_err(|e| ApiError::Validation(validation_message(&e)))?;

    let invalid = || ApiError::Validation("Invalid email or password.".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(invalid)?;

    let ok = verify_password(&req.password, &user.password_hash)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !ok {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(invalid());
    }

    // Reuse a live session instead of rotating it
    let session_token = match user.session_token {
        Some(token) => token,
        None => {
            let token = generate_session_token();
            User::set_session_token(&state.db, user.id, &token).await?;
            token
        }
    };

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        user_id: user.id,
        session_token,
    }))
}

/// Clear the active session
///
/// # Errors
///
/// - `401`: no token supplied, or no user currently holds it
#[instrument(skip(state, headers))]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<MessageResponse>> {
    let token = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("User not logged in.".to_string()))?;

    let cleared = User::clear_session_token(&state.db, token).await?;
    if !cleared {
        return Err(ApiError::Unauthorized(
            "Invalid or expired session token.".to_string(),
        ));
    }

    Ok(Json(MessageResponse {
        message: "Logout successful.".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_account_request_rejects_unknown_fields() {
        let body = r#"{
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "password": "MyP@ssw0rd",
            "role": "admin"
        }"#;
        assert!(serde_json::from_str::<CreateAccountRequest>(body).is_err());
    }

    #[test]
    fn test_create_account_request_validation() {
        let req = CreateAccountRequest {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "not-an-email".to_string(),
            password: "MyP@ssw0rd".to_string(),
        };
        let errors = req.validate().unwrap_err();
        assert_eq!(validation_message(&errors), "Invalid email format");
    }

    #[test]
    fn test_login_request_rejects_unknown_fields() {
        let body = r#"{"email": "a@b.com", "password": "x", "remember_me": true}"#;
        assert!(serde_json::from_str::<LoginRequest>(body).is_err());
    }

    #[test]
    fn test_login_response_serialization() {
        let response = LoginResponse {
            user_id: Uuid::new_v4(),
            session_token: "abc123".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("session_token"));
        assert!(json.contains("abc123"));
    }
}
