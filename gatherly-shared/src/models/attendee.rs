/// Attendee model: event registration
///
/// A row in `attendees` means "registered". The composite primary key
/// `(event_id, user_id)` is the store-level guard against duplicate
/// registration; the capacity check runs under a row lock on the event so
/// concurrent registrations cannot overshoot `max_attendees`.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::is_unique_violation;
use crate::models::event::EventStatus;

/// Error type for registration
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// Referenced event does not exist
    #[error("Event not found")]
    EventNotFound,

    /// Creators are attendees from creation and cannot register again
    #[error("You cannot register for your own event")]
    OwnEvent,

    /// Requester already holds an attendee record
    #[error("You are already registered")]
    AlreadyRegistered,

    /// Event was archived by its creator
    #[error("Registration is closed")]
    EventArchived,

    /// The registration deadline has passed
    #[error("The registration window for this event has closed")]
    DeadlinePassed,

    /// Event is at capacity
    #[error("Event is at full capacity")]
    CapacityReached,

    /// Underlying store failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Row shape locked during registration
#[derive(Debug, sqlx::FromRow)]
struct EventGate {
    creator_id: Uuid,
    close_registration: chrono::DateTime<Utc>,
    max_attendees: i32,
    status: EventStatus,
}

/// Registers a user for an event
///
/// The whole check-then-insert sequence runs in one transaction with
/// `SELECT ... FOR UPDATE` on the event row, so the attendee count read
/// for the capacity check cannot race another registration. Archival and
/// deadline expiry are distinct conditions and both are enforced.
///
/// # Errors
///
/// One `RegistrationError` per rejected business rule; see the enum.
pub async fn register(
    pool: &PgPool,
    event_id: Uuid,
    user_id: Uuid,
) -> Result<(), RegistrationError> {
    let mut tx = pool.begin().await?;

    let gate = sqlx::query_as::<_, EventGate>(
        r#"
        SELECT creator_id, close_registration, max_attendees, status
        FROM events
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(event_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(RegistrationError::EventNotFound)?;

    if gate.creator_id == user_id {
        return Err(RegistrationError::OwnEvent);
    }

    let already: Option<(i32,)> =
        sqlx::query_as("SELECT 1 FROM attendees WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
    if already.is_some() {
        return Err(RegistrationError::AlreadyRegistered);
    }

    if gate.status.is_archived() {
        return Err(RegistrationError::EventArchived);
    }

    if gate.close_registration <= Utc::now() {
        return Err(RegistrationError::DeadlinePassed);
    }

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attendees WHERE event_id = $1")
        .bind(event_id)
        .fetch_one(&mut *tx)
        .await?;
    if count >= i64::from(gate.max_attendees) {
        return Err(RegistrationError::CapacityReached);
    }

    let inserted = sqlx::query("INSERT INTO attendees (event_id, user_id) VALUES ($1, $2)")
        .bind(event_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await;

    match inserted {
        Ok(_) => {}
        // The composite PK is authoritative even if the existence check
        // above somehow missed a concurrent insert.
        Err(e) if is_unique_violation(&e) => return Err(RegistrationError::AlreadyRegistered),
        Err(e) => return Err(e.into()),
    }

    tx.commit().await?;

    Ok(())
}

/// Returns whether the user is registered for the event
///
/// Used as an authorization predicate by the question manager.
pub async fn is_attendee(
    pool: &PgPool,
    event_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT 1 FROM attendees WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.is_some())
}

/// Returns the current attendee count for an event
pub async fn count(pool: &PgPool, event_id: Uuid) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attendees WHERE event_id = $1")
        .bind(event_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
