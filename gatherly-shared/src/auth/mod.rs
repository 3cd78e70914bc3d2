/// Authentication primitives for Gatherly
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the signup password policy
/// - [`session`]: Opaque bearer session tokens and session resolution
///
/// The session model is deliberately minimal: one active token per user,
/// stored on the user row, cleared on logout. Every protected endpoint
/// resolves the token to a user id before any business rule runs.

pub mod password;
pub mod session;
