/// User model and database operations
///
/// Users carry their credential (Argon2id PHC hash) and at most one active
/// session token. A NULL token means logged out.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     first_name VARCHAR(50) NOT NULL,
///     last_name VARCHAR(50) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     session_token VARCHAR(64) UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::is_unique_violation;

/// Error type for user operations
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// Another account already holds this email
    #[error("Email already in use")]
    EmailTaken,

    /// Underlying store failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// User account record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Email address, unique across all users (case-sensitive exact match)
    pub email: String,

    /// Argon2id PHC hash, never exposed in JSON
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Active session token, if logged in; never exposed in JSON
    #[serde(skip_serializing)]
    pub session_token: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Email address
    pub email: String,

    /// Argon2id PHC hash (NOT the plaintext password)
    pub password_hash: String,
}

impl User {
    /// Creates a new user account
    ///
    /// Relies on the UNIQUE constraint on `email` rather than a pre-check,
    /// so two concurrent signups with the same email cannot both succeed.
    ///
    /// # Errors
    ///
    /// `UserError::EmailTaken` on a duplicate email, `UserError::Database`
    /// otherwise.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, UserError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, first_name, last_name, email, password_hash, session_token, created_at
            "#,
        )
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(e) if is_unique_violation(&e) => Err(UserError::EmailTaken),
            Err(e) => Err(e.into()),
        }
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, session_token, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by email (exact match)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, session_token, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user holding the given session token
    ///
    /// The UNIQUE constraint on `session_token` guarantees at most one row.
    pub async fn find_by_session_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, session_token, created_at
            FROM users
            WHERE session_token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await
    }

    /// Stores a freshly minted session token for the user
    ///
    /// Only called when the user holds no live token — login with a live
    /// session returns the existing token instead of rotating it.
    pub async fn set_session_token(
        pool: &PgPool,
        user_id: Uuid,
        token: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET session_token = $2 WHERE id = $1")
            .bind(user_id)
            .bind(token)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Clears the session holding this token
    ///
    /// # Returns
    ///
    /// `true` if a session was cleared, `false` if no user held the token.
    pub async fn clear_session_token(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET session_token = NULL WHERE session_token = $1")
            .bind(token)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serialization_hides_credentials() {
        let user = User {
            id: Uuid::new_v4(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            session_token: Some("tok".to_string()),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("ada@example.com"));
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("session_token"));
    }
}
