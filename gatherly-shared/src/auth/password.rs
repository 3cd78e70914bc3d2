/// Password hashing and signup password policy
///
/// Hashing uses Argon2id with a fresh random salt per password; the PHC
/// string stored in `users.password_hash` carries the algorithm,
/// parameters, salt and digest. Plaintext passwords never reach the store.
///
/// # Example
///
/// ```
/// use gatherly_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("S3cret!pw")?;
/// assert!(verify_password("S3cret!pw", &hash)?);
/// assert!(!verify_password("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Punctuation accepted by the signup password policy.
///
/// Mirrors the allow-list enforced at account creation: the password must
/// contain at least one of these, and no character outside letters, digits
/// and this set.
pub const ALLOWED_SYMBOLS: &str = "@$!%*?&#^(){}[]:;<>,.+~=";

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a password using Argon2id
///
/// Parameters: 64 MB memory, 3 iterations, 4 lanes, 32-byte output,
/// 16-byte random salt from the OS RNG.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored PHC hash
///
/// # Returns
///
/// `Ok(true)` on match, `Ok(false)` on mismatch.
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the stored hash cannot be
/// parsed, `PasswordError::VerifyError` on other failures.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!(
            "Verification failed: {}",
            e
        ))),
    }
}

/// Validates the signup password policy
///
/// Requirements:
/// - at least 8 characters
/// - at least one lowercase letter, one uppercase letter, one digit
/// - at least one symbol from [`ALLOWED_SYMBOLS`]
/// - no characters outside letters, digits and the allowed symbol set
///
/// # Returns
///
/// `Ok(())` if the password passes, `Err` with a description otherwise.
///
/// # Example
///
/// ```
/// use gatherly_shared::auth::password::validate_password_policy;
///
/// assert!(validate_password_policy("MyP@ssw0rd").is_ok());
/// assert!(validate_password_policy("Sh0rt!").is_err());
/// assert!(validate_password_policy("Password123").is_err());
/// ```
pub fn validate_password_policy(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".to_string());
    }

    if !password.chars().any(|c| ALLOWED_SYMBOLS.contains(c)) {
        return Err(format!(
            "Password must contain at least one symbol from: {}",
            ALLOWED_SYMBOLS
        ));
    }

    if !password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || ALLOWED_SYMBOLS.contains(c))
    {
        return Err("Password contains characters outside the allowed set".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_format() {
        let hash = hash_password("test_password_123").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_hash_password_produces_different_salts() {
        let hash1 = hash_password("same_password").expect("Hash 1 should succeed");
        let hash2 = hash_password("same_password").expect("Hash 2 should succeed");

        // Different salts = different hashes
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_correct() {
        let hash = hash_password("correct_password").expect("Hash should succeed");
        assert!(verify_password("correct_password", &hash).expect("Verify should succeed"));
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = hash_password("correct_password").expect("Hash should succeed");
        assert!(!verify_password("wrong_password", &hash).expect("Verify should succeed"));
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "not-a-valid-hash").is_err());
    }

    #[test]
    fn test_policy_accepts_valid_passwords() {
        for password in ["MyP@ssw0rd", "Str0ng!Pass", "C0mpl3x#Pwd", "S3cure$Password"] {
            assert!(
                validate_password_policy(password).is_ok(),
                "Password '{}' should be valid",
                password
            );
        }
    }

    #[test]
    fn test_policy_rejects_too_short() {
        let result = validate_password_policy("Sh0rt!");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("at least 8 characters"));
    }

    #[test]
    fn test_policy_rejects_missing_classes() {
        assert!(validate_password_policy("lowercase1!")
            .unwrap_err()
            .contains("uppercase"));
        assert!(validate_password_policy("UPPERCASE1!")
            .unwrap_err()
            .contains("lowercase"));
        assert!(validate_password_policy("NoDigits!!")
            .unwrap_err()
            .contains("digit"));
        assert!(validate_password_policy("Password123")
            .unwrap_err()
            .contains("symbol"));
    }

    #[test]
    fn test_policy_rejects_disallowed_characters() {
        // Space is not in the allowed set
        let result = validate_password_policy("My P@ssw0rd");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("allowed set"));
    }
}
