/// Database layer for Gatherly
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: Database migration runner
///
/// Models live in the `models` module at the crate root.

pub mod migrations;
pub mod pool;

/// Returns true if the error is a store-level uniqueness violation.
///
/// Every uniqueness invariant in the schema (email, attendee pair, vote
/// pair, session token) is enforced by a constraint, so concurrent
/// check-then-insert sequences surface here rather than racing past an
/// application-level existence check.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_error_is_not_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
