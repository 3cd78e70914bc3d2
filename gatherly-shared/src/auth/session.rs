/// Opaque session tokens and session resolution
///
/// Sessions are opaque bearer credentials: a random base62 string stored
/// verbatim on the user row. Login reuses a live token instead of rotating
/// it, so the stored value must be the value the client holds — tokens are
/// not hashed at rest.
///
/// Clients send the token on every authenticated request in the
/// `X-Authorization` header (not `Authorization`).
///
/// # Example
///
/// ```
/// use gatherly_shared::auth::session::{generate_session_token, SESSION_TOKEN_LENGTH};
///
/// let token = generate_session_token();
/// assert_eq!(token.len(), SESSION_TOKEN_LENGTH);
/// assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```

use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::User;

/// Header carrying the session token on authenticated requests
pub const SESSION_HEADER: &str = "X-Authorization";

/// Length of a session token in characters
pub const SESSION_TOKEN_LENGTH: usize = 48;

/// Generates a new opaque session token
///
/// 48 random base62 characters from the thread RNG (~2^286 combinations),
/// URL- and header-safe.
pub fn generate_session_token() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    (0..SESSION_TOKEN_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Resolves a session token to a user id
///
/// Returns `Ok(None)` when no user currently holds the token — the caller
/// maps that to a 401, never to a silent fallback identity.
pub async fn resolve_session(pool: &PgPool, token: &str) -> Result<Option<Uuid>, sqlx::Error> {
    let user = User::find_by_session_token(pool, token).await?;
    Ok(user.map(|u| u.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_length_and_charset() {
        let token = generate_session_token();
        assert_eq!(token.len(), SESSION_TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_ne!(a, b);
    }

    #[test]
    fn test_session_header_is_custom() {
        // The wire contract uses a custom header, not Authorization
        assert_eq!(SESSION_HEADER, "X-Authorization");
    }
}
